//! Action registry and instances.

use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::client_set::ClientSet;
use crate::event::{ActionData, InputEvent, InputOutcome, ModifierState};
use crate::host::ClientProvider;
use crate::value::Options;

/// Clients an action applies to when no filter was specified.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DefaultFilter {
    /// No clients at all.
    Empty,
    /// The client the event was targeted at.
    Single,
    /// Every managed client.
    All,
}

/// Configured behavior of an action.
///
/// Dropping the behavior releases its options.
pub trait ActionBehavior {
    /// Run the action against a set of clients.
    ///
    /// Returns `true` if the action started an interactive session.
    fn run(&self, set: Option<&ClientSet>, data: &ActionData, clients: &dyn ClientProvider)
        -> bool;

    /// Confirm the start of an interactive session.
    fn pre(&self, _initial_state: ModifierState, _data: &ActionData) -> bool {
        true
    }

    /// Handle input while the interactive session is active.
    fn input(
        &self,
        _initial_state: ModifierState,
        _event: &InputEvent,
        _clients: &dyn ClientProvider,
    ) -> InputOutcome {
        InputOutcome::stop(false)
    }

    /// Revert partial effects of an aborted interactive session.
    fn cancel(&self, _clients: &dyn ClientProvider) {}

    /// Interactive session has ended.
    fn post(&self) {}
}

/// Setup function creating an action's behavior from its options.
type ActionSetup = dyn Fn(&Options) -> Option<Box<dyn ActionBehavior>>;

/// Registered action type.
pub struct ActionDefinition {
    name: String,
    default_filter: DefaultFilter,
    interactive: bool,
    setup: Box<ActionSetup>,
}

impl ActionDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_filter(&self) -> DefaultFilter {
        self.default_filter
    }

    /// Check if instances of this action can start interactive sessions.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

impl Debug for ActionDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDefinition")
            .field("name", &self.name)
            .field("default_filter", &self.default_filter)
            .field("interactive", &self.interactive)
            .finish_non_exhaustive()
    }
}

/// All known actions.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    definitions: IndexMap<String, Rc<ActionDefinition>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new action.
    ///
    /// Returns `false` if an action with the same name is already registered.
    pub fn register<F>(&mut self, name: &str, default_filter: DefaultFilter, setup: F) -> bool
    where
        F: Fn(&Options) -> Option<Box<dyn ActionBehavior>> + 'static,
    {
        self.insert(name, default_filter, false, Box::new(setup))
    }

    /// Register a new action capable of interactive sessions.
    ///
    /// Returns `false` if an action with the same name is already registered.
    pub fn register_interactive<F>(
        &mut self,
        name: &str,
        default_filter: DefaultFilter,
        setup: F,
    ) -> bool
    where
        F: Fn(&Options) -> Option<Box<dyn ActionBehavior>> + 'static,
    {
        self.insert(name, default_filter, true, Box::new(setup))
    }

    /// Find an action by its case-insensitive name.
    pub fn find(&self, name: &str) -> Option<&Rc<ActionDefinition>> {
        self.definitions.get(&name.to_ascii_lowercase())
    }

    /// Remove all registered actions.
    ///
    /// Existing action instances keep their definitions alive.
    pub fn shutdown(&mut self) {
        self.definitions.clear();
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    fn insert(
        &mut self,
        name: &str,
        default_filter: DefaultFilter,
        interactive: bool,
        setup: Box<ActionSetup>,
    ) -> bool {
        let key = name.to_ascii_lowercase();
        if self.definitions.contains_key(&key) {
            return false;
        }

        let definition = ActionDefinition { name: name.into(), default_filter, interactive, setup };
        self.definitions.insert(key, Rc::new(definition));

        true
    }
}

/// Configured action.
#[derive(Clone)]
pub struct Action {
    inner: Rc<ActionInner>,
}

struct ActionInner {
    definition: Rc<ActionDefinition>,
    options: Options,
    behavior: Box<dyn ActionBehavior>,
}

impl Action {
    /// Create a new action instance.
    ///
    /// Returns `None` for unknown actions or invalid options.
    pub fn new(registry: &ActionRegistry, name: &str, options: Options) -> Option<Self> {
        let definition = match registry.find(name) {
            Some(definition) => definition.clone(),
            None => {
                warn!("ignoring unknown action {name:?}");
                return None;
            },
        };

        let behavior = match (definition.setup)(&options) {
            Some(behavior) => behavior,
            None => {
                warn!("ignoring action {:?}: invalid options", definition.name);
                return None;
            },
        };

        Some(Self { inner: Rc::new(ActionInner { definition, options, behavior }) })
    }

    pub fn definition(&self) -> &Rc<ActionDefinition> {
        &self.inner.definition
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }

    pub fn behavior(&self) -> &dyn ActionBehavior {
        self.inner.behavior.as_ref()
    }

    /// Check if two handles refer to the same action instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of handles referencing this action instance.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner.definition, &other.inner.definition)
            && self.inner.options == other.inner.options
    }
}

impl Debug for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.inner.definition.name)
            .field("options", &self.inner.options)
            .finish()
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("action", &self.inner.definition.name)?;
        map.serialize_entry("options", &self.inner.options)?;
        map.end()
    }
}
