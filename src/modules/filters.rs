//! Builtin filters.

use regex::Regex;
use tracing::warn;

use crate::client::{Client, ClientState};
use crate::client_set::ClientSet;
use crate::filter::{FilterBehavior, FilterRegistry, PredicateFilter};
use crate::host::ClientProvider;
use crate::modules::check_registration;
use crate::value::Value;

/// Register all builtin filters.
pub fn register(filters: &mut FilterRegistry) {
    let registered = filters.register("all", |invert, _| Some(Box::new(All { invert })));
    check_registration("filter", "all", registered);

    register_flag(filters, "urgent", |state| state.urgent);
    register_flag(filters, "focused", |state| state.focused);
    register_flag(filters, "iconic", |state| state.iconic);
    register_flag(filters, "closed", |state| state.closed);

    let registered = filters.register("desktop", |invert, value| {
        let desktop = u32::try_from(string_value("desktop", value)?.integer()).ok()?;
        let predicate = move |client: &Client| client.state().desktop == desktop;
        Some(Box::new(PredicateFilter::new(invert, predicate)))
    });
    check_registration("filter", "desktop", registered);

    register_regex(filters, "title", |state| &state.title);
    register_regex(filters, "class", |state| &state.class);
}

/// Register a filter testing a boolean client property.
fn register_flag(filters: &mut FilterRegistry, name: &str, flag: fn(&ClientState) -> bool) {
    let registered = filters.register(name, move |invert, _| {
        let predicate = move |client: &Client| flag(&client.state());
        Some(Box::new(PredicateFilter::new(invert, predicate)))
    });
    check_registration("filter", name, registered);
}

/// Register a filter matching a client property against a regex.
fn register_regex(
    filters: &mut FilterRegistry,
    name: &'static str,
    field: fn(&ClientState) -> &str,
) {
    let registered = filters.register(name, move |invert, value| {
        let pattern = string_value(name, value)?.as_str();
        let regex = match Regex::new(pattern) {
            Ok(regex) => regex,
            Err(err) => {
                warn!("invalid {name} regex {pattern:?}: {err}");
                return None;
            },
        };

        let predicate = move |client: &Client| regex.is_match(field(&client.state()));
        Some(Box::new(PredicateFilter::new(invert, predicate)))
    });
    check_registration("filter", name, registered);
}

/// Get a filter's mandatory string value.
fn string_value<'a>(name: &str, value: Option<&'a Value>) -> Option<&'a Value> {
    match value {
        Some(value) if value.is_string() => Some(value),
        Some(_) => {
            warn!("filter {name:?} expects a text value");
            None
        },
        None => {
            warn!("filter {name:?} requires a value");
            None
        },
    }
}

/// Filter matching every client.
///
/// Expanding this filter yields the universal set, which also covers clients
/// managed after the evaluation.
struct All {
    invert: bool,
}

impl FilterBehavior for All {
    fn reduce(&self, set: ClientSet, _: &dyn ClientProvider) -> Option<ClientSet> {
        (!self.invert).then_some(set)
    }

    fn expand(&self, set: Option<ClientSet>, _: &dyn ClientProvider) -> ClientSet {
        match set {
            Some(set) if self.invert => set,
            _ if self.invert => ClientSet::empty(),
            _ => ClientSet::all(),
        }
    }
}
