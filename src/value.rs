//! Action option values.

use std::fmt::{self, Debug, Formatter};
use std::rc::Rc;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::list::ActionList;

/// Immutable, shared operand of the action language.
#[derive(Clone, PartialEq)]
pub struct Value(Rc<Kind>);

#[derive(PartialEq, Debug)]
enum Kind {
    String(String),
    List(ActionList),
}

impl Value {
    /// Create a value holding a nested action list.
    pub fn list(list: ActionList) -> Self {
        Self(Rc::new(Kind::List(list)))
    }

    pub fn is_string(&self) -> bool {
        matches!(*self.0, Kind::String(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(*self.0, Kind::List(_))
    }

    /// Raw string contents.
    ///
    /// Asking a nested list for its text is a bug in the caller, this will
    /// panic in debug builds and return an empty string otherwise.
    pub fn as_str(&self) -> &str {
        match &*self.0 {
            Kind::String(text) => text,
            Kind::List(_) => {
                debug_assert!(false, "action list value used as string");
                warn!("action list value used as string");
                ""
            },
        }
    }

    /// Nested action list.
    ///
    /// Asking a string for its list is a bug in the caller, this will panic in
    /// debug builds and return an empty list otherwise.
    pub fn as_list(&self) -> ActionList {
        match &*self.0 {
            Kind::List(list) => list.clone(),
            Kind::String(text) => {
                debug_assert!(false, "string value {text:?} used as action list");
                warn!("string value {text:?} used as action list");
                ActionList::empty()
            },
        }
    }

    /// Interpret the value as boolean.
    pub fn boolean(&self) -> bool {
        let text = self.as_str();
        ["true", "yes", "on"].iter().any(|truthy| text.eq_ignore_ascii_case(truthy))
    }

    /// Interpret the value's leading digits as integer.
    ///
    /// Trailing garbage is ignored and values without any digits are `0`.
    pub fn integer(&self) -> i32 {
        leading_integer(self.as_str()).0
    }

    /// Interpret the value as fraction.
    ///
    /// Both `N%` and `N/D` are accepted. A plain integer is reported with a
    /// denominator of `0`, marking it as an absolute amount.
    pub fn fraction(&self) -> Fraction {
        let text = self.as_str().trim();
        let (numer, rest) = leading_integer(text);
        Fraction { numer, denom: denominator(rest) }
    }

    /// Interpret the value as a gravity-relative coordinate.
    pub fn gravity_coord(&self) -> GravityCoord {
        let text = self.as_str().trim();
        if text.eq_ignore_ascii_case("center") {
            return GravityCoord { center: true, ..Default::default() };
        }

        let opposite = text.starts_with('-');
        let unsigned = text.strip_prefix(['-', '+']).unwrap_or(text);
        let (pos, rest) = leading_integer(unsigned);

        GravityCoord { pos, denom: denominator(rest), center: false, opposite }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Self(Rc::new(Kind::String(text.into())))
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Self(Rc::new(Kind::String(text)))
    }
}

impl From<ActionList> for Value {
    fn from(list: ActionList) -> Self {
        Self::list(list)
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            Kind::String(text) => write!(f, "{text:?}"),
            Kind::List(list) => Debug::fmt(list, f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &*self.0 {
            Kind::String(text) => serializer.serialize_str(text),
            Kind::List(list) => list.serialize(serializer),
        }
    }
}

/// Fractional amount.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub struct Fraction {
    pub numer: i32,

    /// Denominator, `0` for absolute amounts.
    pub denom: i32,
}

/// Position relative to an edge or the center of an area.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub struct GravityCoord {
    pub pos: i32,

    /// Denominator for relative positions, `0` for absolute ones.
    pub denom: i32,

    /// Coordinate is centered, ignoring all other fields.
    pub center: bool,

    /// Position is relative to the opposite edge.
    pub opposite: bool,
}

/// Case-insensitive option table of an action.
#[derive(Default, Clone, PartialEq, Debug)]
pub struct Options {
    values: IndexMap<String, Value>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option, replacing any previous value of the same name.
    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_ascii_lowercase(), value);
    }

    /// Get an option by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(&name.to_ascii_lowercase())
    }

    /// Get an option's string contents.
    ///
    /// Nested action lists are ignored.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|value| value.is_string()).map(Value::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Options {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Parse an optionally signed integer prefix.
///
/// Returns the parsed number and all text following it.
fn leading_integer(text: &str) -> (i32, &str) {
    let text = text.trim_start();
    let digits_start = usize::from(text.starts_with(['-', '+']));
    let digits_len = text[digits_start..].bytes().take_while(u8::is_ascii_digit).count();
    let end = digits_start + digits_len;

    // Saturate instead of wrapping on overflow.
    let number = match text[..end].parse::<i64>() {
        Ok(number) => number.clamp(i32::MIN.into(), i32::MAX.into()) as i32,
        Err(_) if digits_len == 0 => 0,
        Err(_) if text.starts_with('-') => i32::MIN,
        Err(_) => i32::MAX,
    };

    (number, &text[end..])
}

/// Parse the denominator suffix of a relative number.
fn denominator(suffix: &str) -> i32 {
    if suffix.starts_with('%') {
        100
    } else if let Some(denom) = suffix.strip_prefix('/') {
        leading_integer(denom).0
    } else {
        0
    }
}
