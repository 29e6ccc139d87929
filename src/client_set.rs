//! Client set algebra.
//!
//! Sets are moved into every operation combining them, so a set handed to
//! [`ClientSet::union`] or [`ClientSet::intersection`] can not be used again.

use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::client::{Client, WindowId};
use crate::host::ClientProvider;

/// Collection of managed clients.
///
/// Members are held weakly, clients which are no longer managed silently
/// disappear from every set they were part of.
#[derive(Debug)]
pub struct ClientSet {
    members: Members,
}

#[derive(Debug)]
enum Members {
    /// Every managed client, including ones which are not known yet.
    All,
    Some(IndexMap<WindowId, Weak<Client>>),
}

impl ClientSet {
    /// Create a set without any clients.
    pub fn empty() -> Self {
        Self { members: Members::Some(IndexMap::new()) }
    }

    /// Create a set containing exactly one client.
    pub fn single(client: &Rc<Client>) -> Self {
        let mut set = Self::empty();
        set.insert(client);
        set
    }

    /// Create the universal set.
    pub fn all() -> Self {
        Self { members: Members::All }
    }

    /// Check if this is the universal set.
    pub fn is_universal(&self) -> bool {
        matches!(self.members, Members::All)
    }

    /// Explicitly copy the set.
    pub fn duplicate(&self) -> Self {
        match &self.members {
            Members::All => Self::all(),
            Members::Some(members) => {
                let members = members
                    .iter()
                    .filter(|(_, client)| client.strong_count() > 0)
                    .map(|(window, client)| (*window, client.clone()))
                    .collect();
                Self { members: Members::Some(members) }
            },
        }
    }

    /// Add a client to the set.
    pub fn insert(&mut self, client: &Rc<Client>) {
        if let Members::Some(members) = &mut self.members {
            members.insert(client.window(), Rc::downgrade(client));
        }
    }

    /// Check if a window is part of this set.
    pub fn contains(&self, window: WindowId) -> bool {
        match &self.members {
            Members::All => true,
            Members::Some(members) => {
                members.get(&window).map_or(false, |client| client.strong_count() > 0)
            },
        }
    }

    /// Number of live clients in the set.
    ///
    /// Returns `None` for the universal set.
    pub fn size(&self) -> Option<usize> {
        match &self.members {
            Members::All => None,
            Members::Some(members) => {
                Some(members.values().filter(|client| client.strong_count() > 0).count())
            },
        }
    }

    /// Truth value of the set.
    ///
    /// The universal set is always true, even without any managed clients.
    pub fn test_boolean(&self) -> bool {
        self.size().map_or(true, |size| size > 0)
    }

    /// Resolve all live clients of the set.
    pub fn clients(&self, provider: &dyn ClientProvider) -> Vec<Rc<Client>> {
        match &self.members {
            Members::All => provider.clients(),
            Members::Some(members) => members.values().filter_map(Weak::upgrade).collect(),
        }
    }

    /// Merge two sets.
    pub fn union(mut self, other: Self) -> Self {
        let other = match other.members {
            Members::All => return other,
            Members::Some(other) => other,
        };

        if let Members::Some(members) = &mut self.members {
            for (window, client) in other {
                if client.strong_count() > 0 {
                    members.insert(window, client);
                }
            }
        }

        self
    }

    /// Remove all clients which are not part of `other`.
    pub fn intersection(mut self, other: Self) -> Self {
        if self.is_universal() {
            return other;
        }

        if let (Members::Some(members), false) = (&mut self.members, other.is_universal()) {
            members.retain(|window, client| client.strong_count() > 0 && other.contains(*window));
        }

        self
    }

    /// Remove every client failing `predicate`.
    ///
    /// Returns `None` when no clients are left in the set.
    pub fn reduce<F>(self, provider: &dyn ClientProvider, mut predicate: F) -> Option<Self>
    where
        F: FnMut(&Client) -> bool,
    {
        let members = match self.members {
            Members::All => provider
                .clients()
                .into_iter()
                .filter(|client| predicate(client.as_ref()))
                .map(|client| (client.window(), Rc::downgrade(&client)))
                .collect(),
            Members::Some(mut members) => {
                members.retain(|_, client| {
                    client.upgrade().map_or(false, |client| predicate(client.as_ref()))
                });
                members
            },
        };

        if members.is_empty() {
            None
        } else {
            Some(Self { members: Members::Some(members) })
        }
    }

    /// Add every managed client passing `predicate`.
    ///
    /// A new set is created if `set` is `None`.
    pub fn expand<F>(set: Option<Self>, provider: &dyn ClientProvider, mut predicate: F) -> Self
    where
        F: FnMut(&Client) -> bool,
    {
        let mut set = set.unwrap_or_else(Self::empty);
        if set.is_universal() {
            return set;
        }

        for client in provider.clients() {
            if !set.contains(client.window()) && predicate(client.as_ref()) {
                set.insert(&client);
            }
        }

        set
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::client::{ClientList, ClientState};

    fn clients(count: u32) -> ClientList {
        let mut clients = ClientList::new();
        for window in 0..count {
            clients.manage(window, ClientState::default());
        }
        clients
    }

    fn set_of(clients: &ClientList, windows: &[WindowId]) -> ClientSet {
        let mut set = ClientSet::empty();
        for window in windows {
            set.insert(&clients.find(*window).unwrap());
        }
        set
    }

    fn windows(set: &ClientSet, clients: &ClientList) -> Vec<WindowId> {
        let mut windows: Vec<_> = set.clients(clients).iter().map(|c| c.window()).collect();
        windows.sort_unstable();
        windows
    }

    #[test]
    fn union_commutes() {
        let clients = clients(5);

        let left = set_of(&clients, &[0, 1]).union(set_of(&clients, &[1, 3]));
        let right = set_of(&clients, &[1, 3]).union(set_of(&clients, &[0, 1]));

        assert_eq!(windows(&left, &clients), vec![0, 1, 3]);
        assert_eq!(windows(&left, &clients), windows(&right, &clients));
    }

    #[test]
    fn union_associates() {
        let clients = clients(6);

        let left = set_of(&clients, &[0])
            .union(set_of(&clients, &[2, 4]))
            .union(set_of(&clients, &[4, 5]));
        let right = set_of(&clients, &[0])
            .union(set_of(&clients, &[2, 4]).union(set_of(&clients, &[4, 5])));

        assert_eq!(windows(&left, &clients), windows(&right, &clients));
    }

    #[test]
    fn universal_laws() {
        let clients = clients(4);

        let set = ClientSet::all().intersection(set_of(&clients, &[1, 2]));
        assert_eq!(windows(&set, &clients), vec![1, 2]);
        assert!(!set.is_universal());

        let set = set_of(&clients, &[1, 2]).intersection(ClientSet::all());
        assert_eq!(windows(&set, &clients), vec![1, 2]);

        assert!(ClientSet::all().union(set_of(&clients, &[3])).is_universal());
        assert!(set_of(&clients, &[3]).union(ClientSet::all()).is_universal());
    }

    #[test]
    fn truth_values() {
        assert!(!ClientSet::empty().test_boolean());
        assert!(ClientSet::all().test_boolean());

        let empty = ClientList::new();
        assert!(ClientSet::all().test_boolean());
        assert!(ClientSet::all().clients(&empty).is_empty());
        assert_eq!(ClientSet::all().size(), None);
        assert!(ClientSet::all().contains(42));
    }

    #[test]
    fn intersection_keeps_common() {
        let clients = clients(5);
        let set = set_of(&clients, &[0, 1, 2]).intersection(set_of(&clients, &[1, 2, 4]));
        assert_eq!(windows(&set, &clients), vec![1, 2]);
    }

    #[test]
    fn reduce_to_nothing() {
        let clients = clients(3);

        let set = set_of(&clients, &[0, 1]).reduce(&clients, |client| client.window() == 1);
        assert_eq!(windows(&set.unwrap(), &clients), vec![1]);

        let set = set_of(&clients, &[0, 1]).reduce(&clients, |_| false);
        assert!(set.is_none());
    }

    #[test]
    fn reduce_universal_materializes() {
        let clients = clients(4);
        let set = ClientSet::all().reduce(&clients, |client| client.window() % 2 == 0).unwrap();

        assert!(!set.is_universal());
        assert_eq!(windows(&set, &clients), vec![0, 2]);
    }

    #[test]
    fn expand_from_nothing() {
        let clients = clients(4);

        let set = ClientSet::expand(None, &clients, |client| client.window() > 1);
        assert_eq!(windows(&set, &clients), vec![2, 3]);

        let set = ClientSet::expand(Some(set), &clients, |client| client.window() == 0);
        assert_eq!(windows(&set, &clients), vec![0, 2, 3]);

        let set = ClientSet::expand(Some(ClientSet::all()), &clients, |_| false);
        assert!(set.is_universal());
    }

    #[test]
    fn destroyed_clients_are_pruned() {
        let mut clients = clients(3);
        let set = set_of(&clients, &[0, 1, 2]);
        let copy = set.duplicate();

        clients.unmanage(1);

        assert!(!set.contains(1));
        assert_eq!(set.size(), Some(2));
        assert_eq!(copy.size(), Some(2));

        // Reusing the window handle must not revive the old membership.
        clients.manage(1, ClientState::default());
        assert!(!set.contains(1));
        assert_eq!(windows(&set, &clients), vec![0, 2]);
    }

    #[test]
    fn single_set() {
        let clients = clients(2);
        let set = ClientSet::single(&clients.find(1).unwrap());

        assert_eq!(set.size(), Some(1));
        assert!(set.contains(1));
        assert!(!set.contains(0));
        assert!(set.test_boolean());
    }
}
