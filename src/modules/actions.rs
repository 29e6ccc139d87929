//! Builtin actions.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::action::{ActionBehavior, ActionRegistry, DefaultFilter};
use crate::client::Client;
use crate::client_set::ClientSet;
use crate::daemon;
use crate::event::{ActionData, InputEvent, InputKind, InputOutcome, ModifierState, KEY_ESCAPE};
use crate::host::ClientProvider;
use crate::modules::check_registration;

/// Register all builtin actions.
pub fn register(actions: &mut ActionRegistry) {
    let registered = actions.register("Close", DefaultFilter::Single, |_| Some(Box::new(Close)));
    check_registration("action", "Close", registered);

    let registered =
        actions.register("Activate", DefaultFilter::Single, |_| Some(Box::new(Activate)));
    check_registration("action", "Activate", registered);

    let registered =
        actions.register("Iconify", DefaultFilter::Single, |_| Some(Box::new(Iconify)));
    check_registration("action", "Iconify", registered);

    let registered = actions.register("Execute", DefaultFilter::Empty, |options| {
        let command = options.string("command")?.to_owned();
        Some(Box::new(Execute { command }))
    });
    check_registration("action", "Execute", registered);

    // Every instance of a cycle action drives the same session state.
    for (name, forward) in [("NextWindow", true), ("PreviousWindow", false)] {
        let state = Rc::new(RefCell::new(CycleState::default()));
        let registered = actions.register_interactive(name, DefaultFilter::All, move |_| {
            Some(Box::new(Cycle { forward, state: state.clone() }))
        });
        check_registration("action", name, registered);
    }
}

/// Request clients to close.
struct Close;

impl ActionBehavior for Close {
    fn run(&self, set: Option<&ClientSet>, _: &ActionData, clients: &dyn ClientProvider) -> bool {
        for client in set.map(|set| set.clients(clients)).unwrap_or_default() {
            client.state_mut().closed = true;
        }

        false
    }
}

/// Focus the first client.
struct Activate;

impl ActionBehavior for Activate {
    fn run(&self, set: Option<&ClientSet>, _: &ActionData, clients: &dyn ClientProvider) -> bool {
        let target = set.and_then(|set| set.clients(clients).into_iter().next());
        if let Some(target) = target {
            focus(clients, &target);
        }

        false
    }
}

/// Minimize clients.
struct Iconify;

impl ActionBehavior for Iconify {
    fn run(&self, set: Option<&ClientSet>, _: &ActionData, clients: &dyn ClientProvider) -> bool {
        for client in set.map(|set| set.clients(clients)).unwrap_or_default() {
            let mut state = client.state_mut();
            state.iconic = true;
            state.focused = false;
        }

        false
    }
}

/// Run a shell command.
struct Execute {
    command: String,
}

impl ActionBehavior for Execute {
    fn run(&self, _: Option<&ClientSet>, _: &ActionData, _: &dyn ClientProvider) -> bool {
        debug!("executing {:?}", self.command);

        if let Err(err) = daemon::spawn_shell(&self.command) {
            warn!("unable to execute {:?}: {err}", self.command);
        }

        false
    }
}

/// Interactively cycle keyboard focus.
///
/// Every run moves the focus preview to the next client, the preview is
/// committed once all modifiers held at the start are released.
///
/// The session state is shared with all other instances of the same action,
/// so separately bound `NextWindow` lists continue one another's session.
struct Cycle {
    forward: bool,
    state: Rc<RefCell<CycleState>>,
}

#[derive(Default)]
struct CycleState {
    /// Clients in cycling order.
    candidates: Vec<Weak<Client>>,

    /// Focus state before the first preview.
    original_focus: Vec<(Weak<Client>, bool)>,

    /// Index of the previewed candidate.
    cursor: Option<usize>,
}

impl Cycle {
    /// Focus the previewed client permanently.
    fn commit(&self, clients: &dyn ClientProvider) {
        let state = self.state.borrow();
        let target = state.cursor.and_then(|cursor| state.candidates[cursor].upgrade());
        if let Some(target) = target {
            focus(clients, &target);
        }
    }

    /// Restore focus from before the first preview.
    ///
    /// Clients managed during the session lose their focus.
    fn revert(&self, clients: &dyn ClientProvider) {
        let state = self.state.borrow();
        for client in clients.clients() {
            let original = state.original_focus.iter().find(|(original, _)| {
                original.upgrade().is_some_and(|original| Rc::ptr_eq(&original, &client))
            });
            client.state_mut().focused = original.map_or(false, |(_, focused)| *focused);
        }
    }
}

impl ActionBehavior for Cycle {
    fn run(
        &self,
        set: Option<&ClientSet>,
        data: &ActionData,
        clients: &dyn ClientProvider,
    ) -> bool {
        let mut state = self.state.borrow_mut();

        // Collect candidates when the session starts.
        if state.candidates.is_empty() {
            let set = match set {
                Some(set) => set,
                None => return false,
            };

            let candidates: Vec<_> = set
                .clients(clients)
                .into_iter()
                .filter(|client| !client.state().closed)
                .collect();

            state.cursor = candidates.iter().position(|client| client.state().focused);
            state.candidates = candidates.iter().map(Rc::downgrade).collect();
            state.original_focus = clients
                .clients()
                .iter()
                .map(|client| (Rc::downgrade(client), client.state().focused))
                .collect();
        }

        let len = state.candidates.len();
        if len == 0 {
            return false;
        }

        let cursor = match (state.cursor, self.forward) {
            (Some(cursor), true) => (cursor + 1) % len,
            (Some(cursor), false) => (cursor + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        };
        state.cursor = Some(cursor);

        if let Some(target) = state.candidates[cursor].upgrade() {
            preview(&state.original_focus, &target);
        }

        drop(state);

        // Without held modifiers there is no release to wait for.
        if data.state == 0 {
            self.commit(clients);
            return false;
        }

        true
    }

    fn input(
        &self,
        initial_state: ModifierState,
        event: &InputEvent,
        clients: &dyn ClientProvider,
    ) -> InputOutcome {
        match event.kind {
            InputKind::KeyPress if event.detail == KEY_ESCAPE => {
                self.revert(clients);
                InputOutcome::stop(true)
            },
            InputKind::KeyRelease if event.state & initial_state == 0 => {
                self.commit(clients);
                InputOutcome::stop(true)
            },
            InputKind::KeyPress | InputKind::KeyRelease => InputOutcome::resume(true),
            _ => InputOutcome::resume(false),
        }
    }

    fn cancel(&self, clients: &dyn ClientProvider) {
        self.revert(clients);
    }

    fn post(&self) {
        *self.state.borrow_mut() = CycleState::default();
    }
}

/// Move keyboard focus to a client.
fn focus(clients: &dyn ClientProvider, target: &Rc<Client>) {
    for client in clients.clients() {
        client.state_mut().focused = Rc::ptr_eq(&client, target);
    }

    target.state_mut().iconic = false;
}

/// Temporarily focus a client, without touching any other state.
fn preview(clients: &[(Weak<Client>, bool)], target: &Rc<Client>) {
    for client in clients.iter().filter_map(|(client, _)| client.upgrade()) {
        client.state_mut().focused = Rc::ptr_eq(&client, target);
    }
}
