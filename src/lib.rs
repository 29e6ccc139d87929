//! Ossuary window manager action engine.
//!
//! This library parses action lists, resolves the clients they apply to and
//! runs them against a window manager [`Host`].

pub mod action;
pub mod client;
pub mod client_set;
pub mod config;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod event;
pub mod filter;
pub mod host;
pub mod list;
pub mod modules;
pub mod parser;
pub mod value;

#[cfg(test)]
mod testing;

pub use crate::action::{Action, ActionBehavior, ActionRegistry, DefaultFilter};
pub use crate::client::{Client, ClientList, ClientSpec, ClientState, WindowId};
pub use crate::client_set::ClientSet;
pub use crate::engine::Engine;
pub use crate::error::{Error, Result};
pub use crate::event::{ActionData, FrameContext, InputEvent, InputKind, Trigger, UserAction};
pub use crate::filter::{Filter, FilterBehavior, FilterRegistry};
pub use crate::host::{ClientProvider, HeadlessHost, Host};
pub use crate::list::ActionList;
pub use crate::parser::ParseError;
pub use crate::value::{Options, Value};
