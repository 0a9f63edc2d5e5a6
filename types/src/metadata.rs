//! Opaque auxiliary values attached to tokens and authorizations.
//!
//! Token metadata, token claims and authorization attributes all share one
//! shape: a sorted string-keyed map of [`MetaValue`]. Maps are edited through
//! pure transforms (`with`, `without`, `merged`) that consume the map and hand
//! back the new one, so a stored map is never changed in place.

use std::collections::BTreeMap;
use std::collections::btree_map;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A value that may be stored in metadata, claims or attributes.
///
/// The set of shapes is closed and has no floating point, so equality and
/// hashing are structural and total.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MetaValue {
    /// The absent value. Never a valid attribute.
    Null,
    Bool(bool),
    Integer(i64),
    String(String),
    Instant(DateTime<Utc>),
    List(Vec<MetaValue>),
    Map(ValueMap),
}

impl MetaValue {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, MetaValue::Null)
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            MetaValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            MetaValue::Instant(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::List(values) => Some(values),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&ValueMap> {
        match self {
            MetaValue::Map(map) => Some(map),
            _ => None,
        }
    }
}

impl From<bool> for MetaValue {
    fn from(value: bool) -> Self {
        MetaValue::Bool(value)
    }
}

impl From<i64> for MetaValue {
    fn from(value: i64) -> Self {
        MetaValue::Integer(value)
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::String(value.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(value: String) -> Self {
        MetaValue::String(value)
    }
}

impl From<DateTime<Utc>> for MetaValue {
    fn from(value: DateTime<Utc>) -> Self {
        MetaValue::Instant(value)
    }
}

impl From<Vec<MetaValue>> for MetaValue {
    fn from(values: Vec<MetaValue>) -> Self {
        MetaValue::List(values)
    }
}

impl From<ValueMap> for MetaValue {
    fn from(map: ValueMap) -> Self {
        MetaValue::Map(map)
    }
}

/// Sorted string-keyed map of [`MetaValue`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMap(BTreeMap<String, MetaValue>);

/// Metadata attached to a single token.
pub type Metadata = ValueMap;

/// Attributes attached to a whole authorization.
pub type Attributes = ValueMap;

/// Claims carried inside token metadata.
pub type Claims = ValueMap;

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MetaValue> {
        self.0.get(name)
    }

    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the map with `name` set to `value`, replacing any previous value.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns the map without `name`.
    #[must_use]
    pub fn without(mut self, name: &str) -> Self {
        self.0.remove(name);
        self
    }

    /// Returns `self` with every entry of `overlay` written on top.
    #[must_use]
    pub fn merged(mut self, overlay: &ValueMap) -> Self {
        for (name, value) in &overlay.0 {
            self.0.insert(name.clone(), value.clone());
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, MetaValue> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<MetaValue>> FromIterator<(K, V)> for ValueMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = (&'a String, &'a MetaValue);
    type IntoIter = btree_map::Iter<'a, String, MetaValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ValueMap {
    type Item = (String, MetaValue);
    type IntoIter = btree_map::IntoIter<String, MetaValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
