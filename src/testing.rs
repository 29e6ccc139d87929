//! Shared test fixtures.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::action::{Action, ActionBehavior, DefaultFilter};
use crate::client::{Client, ClientState, WindowId};
use crate::client_set::ClientSet;
use crate::engine::Engine;
use crate::event::{ActionData, InputEvent, InputKind, InputOutcome, ModifierState};
use crate::filter::{Filter, PredicateFilter};
use crate::host::{ClientProvider, HeadlessHost};
use crate::list::{Combinator, TestChain, TestTerm};
use crate::value::Options;

/// Shared log of action callbacks.
pub type Log = Rc<RefCell<Vec<String>>>;

/// Engine with recording actions and a headless host.
pub struct TestRig {
    pub engine: Engine,
    pub host: HeadlessHost,
    pub log: Log,

    /// Number of released action options.
    pub freed: Rc<Cell<usize>>,
}

impl TestRig {
    /// Create a rig managing `count` clients with windows `0..count`.
    pub fn new(count: u32) -> Self {
        let mut host = HeadlessHost::default();
        for window in 0..count {
            let state = ClientState { title: format!("client{window}"), ..Default::default() };
            host.clients.manage(window, state);
        }

        let log = Log::default();
        let freed = Rc::new(Cell::new(0));
        let mut engine = Engine::new();

        let recorders = [
            ("record", DefaultFilter::Single),
            ("recordall", DefaultFilter::All),
            ("recordempty", DefaultFilter::Empty),
        ];
        for (name, default_filter) in recorders {
            let (log, freed) = (log.clone(), freed.clone());
            engine.actions.register(name, default_filter, move |options| {
                let tag = options.string("tag").unwrap_or(name).to_owned();
                Some(Box::new(Record { tag, log: log.clone(), freed: freed.clone() }))
            });
        }

        for name in ["interactive", "other"] {
            let log = log.clone();
            engine.actions.register_interactive(name, DefaultFilter::Empty, move |options| {
                let refuse = options.get("refuse").map_or(false, |value| value.boolean());
                Some(Box::new(Interactive { name, refuse, log: log.clone() }))
            });
        }

        Self { engine, host, log, freed }
    }

    /// Register a filter matching a fixed set of windows.
    pub fn subset_filter(&mut self, name: &str, windows: &[WindowId]) {
        let windows = windows.to_vec();
        self.engine.filters.register(name, move |invert, _| {
            let windows = windows.clone();
            let predicate = move |client: &Client| windows.contains(&client.window());
            Some(Box::new(PredicateFilter::new(invert, predicate)))
        });
    }

    /// Build a test chain from registered filter names.
    pub fn chain(&self, terms: &[(&str, Combinator)]) -> TestChain {
        let terms = terms
            .iter()
            .map(|(name, combinator)| {
                TestTerm::new(Filter::new(&self.engine.filters, name, None), *combinator)
            })
            .collect();
        TestChain::new(terms)
    }

    /// Create a registered action without options.
    pub fn action(&self, name: &str) -> Action {
        Action::new(&self.engine.actions, name, Options::new()).unwrap()
    }

    pub fn client(&self, window: WindowId) -> Rc<Client> {
        self.host.clients.find(window).unwrap()
    }

    /// Take all log entries recorded so far.
    pub fn take_log(&self) -> Vec<String> {
        self.log.borrow_mut().drain(..).collect()
    }
}

/// Create a set from window handles.
pub fn set_of(clients: &dyn ClientProvider, windows: &[WindowId]) -> ClientSet {
    let mut set = ClientSet::empty();
    for window in windows {
        set.insert(&clients.client(*window).unwrap());
    }
    set
}

/// Sorted windows of a set.
pub fn windows(set: &ClientSet, clients: &dyn ClientProvider) -> Vec<WindowId> {
    let mut windows: Vec<_> = set.clients(clients).iter().map(|client| client.window()).collect();
    windows.sort_unstable();
    windows
}

/// Action logging the clients it was run against.
struct Record {
    tag: String,
    log: Log,
    freed: Rc<Cell<usize>>,
}

impl ActionBehavior for Record {
    fn run(&self, set: Option<&ClientSet>, _: &ActionData, clients: &dyn ClientProvider) -> bool {
        let entry = match set {
            None => format!("{} none", self.tag),
            Some(set) if set.is_universal() => format!("{} all", self.tag),
            Some(set) => format!("{} {:?}", self.tag, windows(set, clients)),
        };
        self.log.borrow_mut().push(entry);

        false
    }
}

impl Drop for Record {
    fn drop(&mut self) {
        self.freed.set(self.freed.get() + 1);
    }
}

/// Interactive action logging all session callbacks.
///
/// The session ends once all initially held modifiers are released.
struct Interactive {
    name: &'static str,
    refuse: bool,
    log: Log,
}

impl ActionBehavior for Interactive {
    fn run(&self, _: Option<&ClientSet>, _: &ActionData, _: &dyn ClientProvider) -> bool {
        self.log.borrow_mut().push(format!("run {}", self.name));
        true
    }

    fn pre(&self, _: ModifierState, _: &ActionData) -> bool {
        self.log.borrow_mut().push(format!("pre {}", self.name));
        !self.refuse
    }

    fn input(
        &self,
        initial_state: ModifierState,
        event: &InputEvent,
        clients: &dyn ClientProvider,
    ) -> InputOutcome {
        let count = clients.clients().len();
        self.log.borrow_mut().push(format!("input {} {count}", self.name));
        if event.kind == InputKind::KeyRelease && event.state & initial_state == 0 {
            InputOutcome::stop(true)
        } else {
            InputOutcome::resume(true)
        }
    }

    fn cancel(&self, clients: &dyn ClientProvider) {
        let count = clients.clients().len();
        self.log.borrow_mut().push(format!("cancel {} {count}", self.name));
    }

    fn post(&self) {
        self.log.borrow_mut().push(format!("post {}", self.name));
    }
}
