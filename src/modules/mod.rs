//! Builtin actions and filters.

use tracing::warn;

use crate::action::ActionRegistry;
use crate::filter::FilterRegistry;

pub mod actions;
pub mod filters;

/// Register all builtin actions and filters.
///
/// Names which are already taken are skipped with a warning.
pub fn register_all(actions: &mut ActionRegistry, filters: &mut FilterRegistry) {
    actions::register(actions);
    filters::register(filters);
}

/// Log rejected registrations.
fn check_registration(kind: &str, name: &str, registered: bool) {
    if !registered {
        warn!("ignoring builtin {kind} {name:?}: name is already registered");
    }
}
