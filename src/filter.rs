//! Client filter registry and instances.

use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::client::Client;
use crate::client_set::ClientSet;
use crate::host::ClientProvider;
use crate::value::Value;

/// Configured client predicate.
///
/// Dropping the behavior releases its instance data.
pub trait FilterBehavior {
    /// Remove every client from `set` which does not match.
    fn reduce(&self, set: ClientSet, clients: &dyn ClientProvider) -> Option<ClientSet>;

    /// Add every matching client to `set`.
    fn expand(&self, set: Option<ClientSet>, clients: &dyn ClientProvider) -> ClientSet;
}

/// Setup function creating a filter's behavior.
type FilterSetup = dyn Fn(bool, Option<&Value>) -> Option<Box<dyn FilterBehavior>>;

/// Registered filter type.
pub struct FilterDefinition {
    name: String,
    setup: Box<FilterSetup>,
}

impl FilterDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Debug for FilterDefinition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterDefinition").field("name", &self.name).finish_non_exhaustive()
    }
}

/// All known filters.
#[derive(Debug, Default)]
pub struct FilterRegistry {
    definitions: Vec<Rc<FilterDefinition>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new filter.
    ///
    /// The setup function receives the inversion state and the filter's
    /// optional value.
    ///
    /// Returns `false` if a filter with the same name is already registered.
    pub fn register<F>(&mut self, name: &str, setup: F) -> bool
    where
        F: Fn(bool, Option<&Value>) -> Option<Box<dyn FilterBehavior>> + 'static,
    {
        if self.find(name).is_some() {
            return false;
        }

        let definition = FilterDefinition { name: name.into(), setup: Box::new(setup) };
        self.definitions.push(Rc::new(definition));

        true
    }

    /// Find a filter by its case-insensitive name.
    pub fn find(&self, name: &str) -> Option<&Rc<FilterDefinition>> {
        self.definitions.iter().find(|definition| definition.name.eq_ignore_ascii_case(name))
    }

    /// Remove all registered filters.
    ///
    /// Existing filter instances keep their definitions alive.
    pub fn shutdown(&mut self) {
        self.definitions.clear();
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Configured filter.
#[derive(Clone)]
pub struct Filter {
    inner: Rc<FilterInner>,
}

struct FilterInner {
    definition: Rc<FilterDefinition>,
    invert: bool,
    value: Option<Value>,
    behavior: Box<dyn FilterBehavior>,
}

impl Filter {
    /// Create a new filter instance.
    ///
    /// A `no` prefix on an otherwise unknown name inverts the filter. Returns
    /// `None` for unknown filters or invalid values.
    pub fn new(registry: &FilterRegistry, key: &str, value: Option<Value>) -> Option<Self> {
        let (definition, invert) = match registry.find(key) {
            Some(definition) => (definition.clone(), false),
            None => match strip_negation(key).and_then(|name| registry.find(name)) {
                Some(definition) => (definition.clone(), true),
                None => {
                    warn!("ignoring unknown filter {key:?}");
                    return None;
                },
            },
        };

        let behavior = match (definition.setup)(invert, value.as_ref()) {
            Some(behavior) => behavior,
            None => {
                warn!("ignoring filter {:?}: invalid value {value:?}", definition.name);
                return None;
            },
        };

        Some(Self { inner: Rc::new(FilterInner { definition, invert, value, behavior }) })
    }

    pub fn definition(&self) -> &Rc<FilterDefinition> {
        &self.inner.definition
    }

    pub fn inverted(&self) -> bool {
        self.inner.invert
    }

    pub fn value(&self) -> Option<&Value> {
        self.inner.value.as_ref()
    }

    /// Remove every client from `set` which does not match.
    pub fn reduce(&self, set: ClientSet, clients: &dyn ClientProvider) -> Option<ClientSet> {
        self.inner.behavior.reduce(set, clients)
    }

    /// Add every matching client to `set`.
    pub fn expand(&self, set: Option<ClientSet>, clients: &dyn ClientProvider) -> ClientSet {
        self.inner.behavior.expand(set, clients)
    }

    /// Number of handles referencing this filter instance.
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner.definition, &other.inner.definition)
            && self.inner.invert == other.inner.invert
            && self.inner.value == other.inner.value
    }
}

impl Debug for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filter")
            .field("name", &self.inner.definition.name)
            .field("invert", &self.inner.invert)
            .field("value", &self.inner.value)
            .finish()
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("filter", &self.inner.definition.name)?;
        map.serialize_entry("invert", &self.inner.invert)?;
        map.serialize_entry("value", &self.inner.value)?;
        map.end()
    }
}

/// Filter matching clients by a predicate.
pub struct PredicateFilter<F> {
    invert: bool,
    predicate: F,
}

impl<F> PredicateFilter<F>
where
    F: Fn(&Client) -> bool,
{
    pub fn new(invert: bool, predicate: F) -> Self {
        Self { invert, predicate }
    }

    fn matches(&self, client: &Client) -> bool {
        (self.predicate)(client) != self.invert
    }
}

impl<F> FilterBehavior for PredicateFilter<F>
where
    F: Fn(&Client) -> bool,
{
    fn reduce(&self, set: ClientSet, clients: &dyn ClientProvider) -> Option<ClientSet> {
        set.reduce(clients, |client| self.matches(client))
    }

    fn expand(&self, set: Option<ClientSet>, clients: &dyn ClientProvider) -> ClientSet {
        ClientSet::expand(set, clients, |client| self.matches(client))
    }
}

/// Strip the `no` negation prefix from a filter name.
fn strip_negation(key: &str) -> Option<&str> {
    key.strip_prefix("no").or_else(|| key.strip_prefix("No")).filter(|name| !name.is_empty())
}
