//! Action lists.
//!
//! Lists are persistent: nodes are never modified after creation and the same
//! sublist can be shared by any number of parents.

use std::fmt::{self, Debug, Formatter};
use std::iter::FromIterator;
use std::rc::Rc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::action::Action;
use crate::client_set::ClientSet;
use crate::filter::Filter;
use crate::host::ClientProvider;

/// Shared sequence of actions and conditionals.
#[derive(Clone, Default)]
pub struct ActionList {
    head: Option<Rc<Node>>,
}

struct Node {
    entry: Entry,
    next: Option<Rc<Node>>,
}

impl ActionList {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a list with a single entry.
    pub fn single(entry: Entry) -> Self {
        Self { head: Some(Rc::new(Node { entry, next: None })) }
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// First entry of the list.
    pub fn first(&self) -> Option<&Entry> {
        self.head.as_ref().map(|node| &node.entry)
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter { node: self.head.as_deref() }
    }

    /// Append `other` to a copy of this list.
    ///
    /// Nodes of `other` are shared with the new list.
    pub fn concat(&self, other: &ActionList) -> ActionList {
        let entries: Vec<_> = self.iter().cloned().collect();
        Self::from_entries(entries, other.head.clone())
    }

    /// Number of lists sharing this list's first node.
    pub fn strong_count(&self) -> usize {
        self.head.as_ref().map_or(0, Rc::strong_count)
    }

    fn from_entries(entries: Vec<Entry>, tail: Option<Rc<Node>>) -> Self {
        let head = entries
            .into_iter()
            .rev()
            .fold(tail, |next, entry| Some(Rc::new(Node { entry, next })));
        Self { head }
    }
}

impl FromIterator<Entry> for ActionList {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self::from_entries(iter.into_iter().collect(), None)
    }
}

impl Drop for ActionList {
    fn drop(&mut self) {
        // Release uniquely owned nodes iteratively, stopping at the first node
        // which is still referenced elsewhere.
        let mut next = self.head.take();
        while let Some(node) = next {
            next = match Rc::try_unwrap(node) {
                Ok(mut node) => node.next.take(),
                Err(_) => None,
            };
        }
    }
}

impl PartialEq for ActionList {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Debug for ActionList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Serialize for ActionList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        for entry in self.iter() {
            seq.serialize_element(entry)?;
        }
        seq.end()
    }
}

/// Action list iterator.
pub struct Iter<'a> {
    node: Option<&'a Node>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Entry;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.node?;
        self.node = node.next.as_deref();
        Some(&node.entry)
    }
}

/// Element of an action list.
#[derive(Clone, PartialEq, Debug)]
pub enum Entry {
    Action(Action),
    Conditional(Conditional),
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Action(action) => action.serialize(serializer),
            Self::Conditional(conditional) => conditional.serialize(serializer),
        }
    }
}

/// Filtered branch.
#[derive(Clone, PartialEq, Debug)]
pub struct Conditional {
    /// Filter chain selecting the clients, `None` to use the default filter
    /// of the first action in `then`.
    pub test: Option<TestChain>,
    pub then: ActionList,
    pub otherwise: ActionList,
}

impl Conditional {
    pub fn new(test: Option<TestChain>, then: ActionList, otherwise: ActionList) -> Self {
        Self { test, then, otherwise }
    }
}

impl Serialize for Conditional {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("test", &self.test)?;
        map.serialize_entry("then", &self.then)?;
        map.serialize_entry("else", &self.otherwise)?;
        map.end()
    }
}

/// Relation between a test and its successor.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Combinator {
    And,
    Or,
}

/// Single test of a filter chain.
#[derive(Clone, PartialEq, Debug)]
pub struct TestTerm {
    /// Test filter, `None` for unknown filters which never match.
    pub filter: Option<Filter>,

    /// Combination with the next test in the chain.
    pub combinator: Combinator,
}

impl TestTerm {
    pub fn new(filter: Option<Filter>, combinator: Combinator) -> Self {
        Self { filter, combinator }
    }
}

impl Serialize for TestTerm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("test", &self.filter)?;
        map.serialize_entry("and", &(self.combinator == Combinator::And))?;
        map.end()
    }
}

/// Chain of tests combined by AND and OR.
///
/// AND binds tighter than OR, so `a,b|c|d,e` selects `(a^b)|c|(d^e)`.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct TestChain {
    terms: Vec<TestTerm>,
}

impl TestChain {
    pub fn new(terms: Vec<TestTerm>) -> Self {
        Self { terms }
    }

    pub fn terms(&self) -> &[TestTerm] {
        &self.terms
    }

    /// Resolve the clients matching this chain.
    ///
    /// When an `incoming` set from an enclosing conditional is present, the
    /// result never exceeds it. The incoming set itself is not modified.
    pub fn evaluate(
        &self,
        incoming: Option<&ClientSet>,
        clients: &dyn ClientProvider,
    ) -> ClientSet {
        let mut result: Option<ClientSet> = None;
        let mut group: Option<ClientSet> = None;

        for (i, term) in self.terms.iter().enumerate() {
            let set = filter_set(term, incoming, clients);

            // Fold the test into the pending AND group.
            group = Some(match group.take() {
                Some(group) => group.intersection(set),
                None => set,
            });

            // Close the group when the test ORs into the next one.
            let last = i + 1 == self.terms.len();
            if term.combinator == Combinator::Or || last {
                if let Some(group) = group.take() {
                    result = Some(match result.take() {
                        Some(result) => result.union(group),
                        None => group,
                    });
                }
            }
        }

        let result = result.unwrap_or_else(ClientSet::empty);
        match incoming {
            Some(incoming) => result.intersection(incoming.duplicate()),
            None => result,
        }
    }
}

impl Serialize for TestChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.terms.serialize(serializer)
    }
}

/// Clients matching a single test.
///
/// Without an incoming set the matching clients are collected from nothing,
/// otherwise a copy of the incoming set is narrowed down.
fn filter_set(
    term: &TestTerm,
    incoming: Option<&ClientSet>,
    clients: &dyn ClientProvider,
) -> ClientSet {
    let filter = match &term.filter {
        Some(filter) => filter,
        None => return ClientSet::empty(),
    };

    match incoming {
        Some(incoming) => {
            filter.reduce(incoming.duplicate(), clients).unwrap_or_else(ClientSet::empty)
        },
        None => filter.expand(None, clients),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::client::ClientList;
    use crate::testing::{self, TestRig};

    /// Evaluate `a,b|c|d,e,f|g,h` against fixed client subsets.
    #[test]
    fn chain_precedence() {
        const UNIVERSE: u32 = 12;

        let subsets: [&[u32]; 8] = [
            &[0, 1, 2, 3, 8],
            &[1, 2, 5, 9],
            &[4],
            &[3, 5, 6, 7, 11],
            &[5, 6, 7, 10],
            &[6, 7, 11],
            &[2, 8, 9],
            &[8, 10],
        ];

        let mut rig = TestRig::new(UNIVERSE);
        let names = ["a", "b", "c", "d", "e", "f", "g", "h"];
        for (name, subset) in names.iter().zip(subsets) {
            rig.subset_filter(name, subset);
        }

        let combinators = ["and", "or", "or", "and", "and", "or", "and", "or"];
        let terms = names
            .iter()
            .zip(combinators)
            .map(|(name, combinator)| {
                let filter = Filter::new(&rig.engine.filters, name, None);
                let combinator = if combinator == "and" { Combinator::And } else { Combinator::Or };
                TestTerm::new(filter, combinator)
            })
            .collect();
        let chain = TestChain::new(terms);

        let set = chain.evaluate(None, &rig.host);

        let contains = |index: usize, window: u32| subsets[index].contains(&window);
        let expected: Vec<u32> = (0..UNIVERSE)
            .filter(|&w| {
                (contains(0, w) && contains(1, w))
                    || contains(2, w)
                    || (contains(3, w) && contains(4, w) && contains(5, w))
                    || (contains(6, w) && contains(7, w))
            })
            .collect();

        assert_eq!(testing::windows(&set, &rig.host), expected);
        assert_eq!(expected, vec![1, 2, 4, 6, 7, 8]);
    }

    #[test]
    fn leading_and_group() {
        let mut rig = TestRig::new(4);
        rig.subset_filter("a", &[0, 1]);
        rig.subset_filter("b", &[1, 2]);

        let chain = rig.chain(&[("a", Combinator::And), ("b", Combinator::Or)]);
        assert_eq!(testing::windows(&chain.evaluate(None, &rig.host), &rig.host), vec![1]);

        let chain = rig.chain(&[("a", Combinator::Or), ("b", Combinator::And)]);
        assert_eq!(testing::windows(&chain.evaluate(None, &rig.host), &rig.host), vec![0, 1, 2]);
    }

    #[test]
    fn incoming_limits_result() {
        let mut rig = TestRig::new(5);
        rig.subset_filter("a", &[0, 1, 2]);
        rig.subset_filter("b", &[3]);

        let incoming = testing::set_of(&rig.host, &[1, 2, 3, 4]);
        let chain = rig.chain(&[("a", Combinator::Or), ("b", Combinator::Or)]);
        let set = chain.evaluate(Some(&incoming), &rig.host);

        assert_eq!(testing::windows(&set, &rig.host), vec![1, 2, 3]);
        assert_eq!(testing::windows(&incoming, &rig.host), vec![1, 2, 3, 4]);
    }

    #[test]
    fn unknown_filters_never_match() {
        let mut rig = TestRig::new(3);
        rig.subset_filter("a", &[0, 1]);

        let terms = vec![
            TestTerm::new(None, Combinator::Or),
            TestTerm::new(Filter::new(&rig.engine.filters, "a", None), Combinator::Or),
        ];
        let set = TestChain::new(terms).evaluate(None, &rig.host);
        assert_eq!(testing::windows(&set, &rig.host), vec![0, 1]);

        let terms = vec![
            TestTerm::new(None, Combinator::And),
            TestTerm::new(Filter::new(&rig.engine.filters, "a", None), Combinator::Or),
        ];
        let set = TestChain::new(terms).evaluate(None, &rig.host);
        assert!(!set.test_boolean());

        let empty = TestChain::default().evaluate(None, &ClientList::new());
        assert!(!empty.test_boolean());
    }

    #[test]
    fn shared_sublists() {
        let rig = TestRig::new(1);
        let action = rig.action("record");

        let shared = ActionList::single(Entry::Action(action.clone()));
        let first = ActionList::single(Entry::Conditional(Conditional::new(
            None,
            shared.clone(),
            ActionList::empty(),
        )));
        let second = shared.concat(&first);

        assert_eq!(second.len(), 2);
        assert_eq!(shared.strong_count(), 2);

        drop(first);
        assert_eq!(shared.strong_count(), 2);

        drop(second);
        assert_eq!(shared.strong_count(), 1);

        // Only the test's handle and the shared list remain.
        assert_eq!(action.strong_count(), 2);
        drop(shared);
        assert_eq!(action.strong_count(), 1);
    }

    #[test]
    fn concat_shares_tail() {
        let rig = TestRig::new(1);
        let head: ActionList =
            ["record", "record"].iter().map(|name| Entry::Action(rig.action(name))).collect();
        let tail = ActionList::single(Entry::Action(rig.action("record")));

        let list = head.concat(&tail);
        assert_eq!(list.len(), 3);
        assert_eq!(head.len(), 2);
        assert_eq!(tail.strong_count(), 2);
    }

    #[test]
    fn long_lists_drop() {
        let rig = TestRig::new(1);
        let action = rig.action("record");

        let list: ActionList = (0..100_000).map(|_| Entry::Action(action.clone())).collect();
        assert_eq!(list.len(), 100_000);

        drop(list);
        assert_eq!(action.strong_count(), 1);
    }
}
