//! Field projection for entity list elements
//!
//! An element is decoded into a fixed set of named string slots. Only the
//! properties named by the projection are captured; everything else in the
//! element is skipped by the scanner without being materialized.

use serde::de::{self, Deserialize, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// Captured string values of one list element, aligned with a field list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValues {
    names: &'static [&'static str],
    values: Vec<Option<String>>,
}

impl FieldValues {
    /// Create an empty value set for the given field names
    pub fn new(names: &'static [&'static str]) -> Self {
        Self {
            names,
            values: vec![None; names.len()],
        }
    }

    /// Build a value set from `(field, value)` pairs; unknown fields are ignored
    #[cfg(test)]
    pub(crate) fn from_pairs(names: &'static [&'static str], pairs: &[(&str, &str)]) -> Self {
        let mut values = Self::new(names);
        for (name, value) in pairs {
            if let Some(index) = values.index_of(name) {
                values.set(index, Some((*value).to_string()));
            }
        }
        values
    }

    pub(crate) fn set(&mut self, index: usize, value: Option<String>) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| *candidate == name)
    }

    /// Take the captured value of a field, leaving `None` behind
    pub fn take(&mut self, name: &str) -> Option<String> {
        let index = self.index_of(name)?;
        self.values[index].take()
    }
}

/// A typed projection of one element of a named entity list
pub trait ListRecord: Sized {
    /// Top-level property holding the list
    const LIST: &'static str;

    /// Element properties captured for this record; all others are skipped
    const FIELDS: &'static [&'static str];

    fn from_fields(fields: FieldValues) -> Self;
}

/// A string-or-nothing field value.
///
/// Strings are captured, `null` is `None`, and any other token (number,
/// boolean, object, array) is consumed and also yields `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LenientString(pub Option<String>);

impl<'de> Deserialize<'de> for LenientString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LenientStringVisitor)
    }
}

struct LenientStringVisitor;

impl<'de> Visitor<'de> for LenientStringVisitor {
    type Value = LenientString;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(LenientString(Some(v.to_owned())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(LenientString(Some(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(LenientString(None))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(LenientString(None))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        LenientString::deserialize(deserializer)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(LenientString(None))
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
        Ok(LenientString(None))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
        Ok(LenientString(None))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
        Ok(LenientString(None))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(LenientString(None))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(LenientString(None))
    }
}
