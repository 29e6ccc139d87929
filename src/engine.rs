//! Action list execution.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::action::{Action, ActionRegistry, DefaultFilter};
use crate::client_set::ClientSet;
use crate::error::{Error, Result};
use crate::event::{ActionData, InputEvent, ModifierState, Trigger};
use crate::filter::FilterRegistry;
use crate::host::Host;
use crate::list::{ActionList, Conditional, Entry};
use crate::modules;
use crate::parser::{self, ParseError};

/// Action engine state.
#[derive(Default)]
pub struct Engine {
    pub actions: ActionRegistry,
    pub filters: FilterRegistry,

    /// Active interactive action.
    session: Option<Session>,
}

/// Running interactive action.
struct Session {
    action: Action,

    /// Modifiers held when the session was started.
    initial_state: ModifierState,
}

impl Engine {
    /// Create an engine without any registered actions or filters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with all builtin actions and filters.
    pub fn with_builtins() -> Self {
        let mut engine = Self::new();
        modules::register_all(&mut engine.actions, &mut engine.filters);
        engine
    }

    /// Parse action list source text.
    pub fn parse_string(&self, text: &str) -> std::result::Result<ActionList, ParseError> {
        parser::parse(text, &self.actions, &self.filters)
    }

    /// Parse an action list file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<ActionList> {
        let path = path.as_ref();
        let text =
            fs::read_to_string(path).map_err(|source| Error::Io { path: path.into(), source })?;
        Ok(self.parse_string(&text)?)
    }

    /// Run an action list.
    ///
    /// Returns `true` if an interactive action was started, in which case all
    /// remaining actions of the list are skipped.
    pub fn run_list<H: Host>(&mut self, host: &mut H, list: &ActionList, trigger: Trigger) -> bool {
        let (x, y) = trigger.position.unwrap_or_else(|| host.pointer_position());
        let data = ActionData {
            pointer_client: host.client_at(x, y),
            uact: trigger.uact,
            state: trigger.state,
            button: trigger.button,
            context: trigger.context,
            client: trigger.client,
            x,
            y,
        };

        trace!("running action list for {:?}", data.uact);

        self.run_entries(host, list, None, &data)
    }

    /// Forward an input event to the interactive action.
    ///
    /// Returns `true` if the event was consumed.
    pub fn interactive_input_event<H: Host>(&mut self, host: &mut H, event: &InputEvent) -> bool {
        let session = match &self.session {
            Some(session) => session,
            None => return false,
        };

        let outcome = session.action.behavior().input(session.initial_state, event, &*host);
        if !outcome.resume {
            self.end_session(host);
        }

        outcome.consumed
    }

    /// Abort the interactive action.
    ///
    /// This is a noop if no interactive action is running.
    pub fn interactive_cancel<H: Host>(&mut self, host: &mut H) {
        let session = match self.session.take() {
            Some(session) => session,
            None => return,
        };

        debug!("cancelling interactive {:?}", session.action.definition().name());

        session.action.behavior().cancel(&*host);
        host.ungrab_keyboard();
        session.action.behavior().post();
    }

    /// Check if an interactive action is running.
    pub fn interactive_is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Cancel interactive actions and clear all registries.
    ///
    /// Already parsed lists stay valid until they are dropped.
    pub fn shutdown<H: Host>(&mut self, host: &mut H) {
        self.interactive_cancel(host);
        self.actions.shutdown();
        self.filters.shutdown();
    }

    /// Run all entries of a list until an interactive action is started.
    fn run_entries<H: Host>(
        &mut self,
        host: &mut H,
        list: &ActionList,
        incoming: Option<&ClientSet>,
        data: &ActionData,
    ) -> bool {
        for entry in list.iter() {
            let started = match entry {
                Entry::Action(action) => self.run_action(host, action, incoming, data),
                Entry::Conditional(conditional) => {
                    self.run_conditional(host, conditional, incoming, data)
                },
            };

            if started {
                return true;
            }
        }

        false
    }

    /// Evaluate a conditional and run the selected branch.
    ///
    /// The evaluated set is only visible to the branch, siblings continue
    /// with the original incoming set.
    fn run_conditional<H: Host>(
        &mut self,
        host: &mut H,
        conditional: &Conditional,
        incoming: Option<&ClientSet>,
        data: &ActionData,
    ) -> bool {
        let set = match (&conditional.test, incoming) {
            (Some(test), _) => test.evaluate(incoming, &*host),
            (None, Some(incoming)) => incoming.duplicate(),
            (None, None) => match conditional.then.first() {
                Some(Entry::Action(action)) => {
                    default_set(action.definition().default_filter(), data)
                        .unwrap_or_else(ClientSet::empty)
                },
                _ => ClientSet::all(),
            },
        };

        let matched = set.test_boolean();
        trace!("conditional matched: {matched}");

        let branch = if matched { &conditional.then } else { &conditional.otherwise };
        self.run_entries(host, branch, Some(&set), data)
    }

    /// Run a single action.
    fn run_action<H: Host>(
        &mut self,
        host: &mut H,
        action: &Action,
        incoming: Option<&ClientSet>,
        data: &ActionData,
    ) -> bool {
        let definition = action.definition().clone();

        // Sets created here are dropped again once the action is done.
        let materialized;
        let set = match incoming {
            Some(set) => Some(set),
            None => {
                materialized = default_set(definition.default_filter(), data);
                materialized.as_ref()
            },
        };

        if definition.is_interactive() && !self.begin_session(host, action, data) {
            return false;
        }

        trace!("running action {:?}", definition.name());

        let started = action.behavior().run(set, data, &*host);

        if !definition.is_interactive() {
            return false;
        }

        if !started {
            self.end_session(host);
        }

        started
    }

    /// Prepare an interactive session for an action.
    ///
    /// Returns `false` if the session could not be started.
    fn begin_session<H: Host>(&mut self, host: &mut H, action: &Action, data: &ActionData) -> bool {
        // Same action type takes over the running session.
        if let Some(session) = &mut self.session {
            if Rc::ptr_eq(session.action.definition(), action.definition()) {
                session.action = action.clone();
                return true;
            }
        }

        self.interactive_cancel(host);

        let name = action.definition().name();

        if !action.behavior().pre(data.state, data) {
            debug!("interactive {name:?} declined to start");
            return false;
        }

        if !host.grab_keyboard() {
            warn!("not starting interactive {name:?}: unable to grab keyboard");
            return false;
        }

        debug!("starting interactive {name:?}");

        self.session = Some(Session { action: action.clone(), initial_state: data.state });

        true
    }

    /// Complete the interactive session.
    fn end_session<H: Host>(&mut self, host: &mut H) {
        let session = match self.session.take() {
            Some(session) => session,
            None => return,
        };

        debug!("ending interactive {:?}", session.action.definition().name());

        host.ungrab_keyboard();
        session.action.behavior().post();
    }
}

/// Clients affected by an action without an explicit filter.
///
/// Returns `None` for single client actions without a target client.
fn default_set(filter: DefaultFilter, data: &ActionData) -> Option<ClientSet> {
    match filter {
        DefaultFilter::Empty => Some(ClientSet::empty()),
        DefaultFilter::All => Some(ClientSet::all()),
        DefaultFilter::Single => data.client.as_ref().map(ClientSet::single),
    }
}
