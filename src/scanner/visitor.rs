//! serde visitors driving the token cursor
//!
//! The document object is walked key by key. Unwanted top-level properties
//! and unwanted element properties are consumed as `IgnoredAny`, which lets
//! serde_json skip them without building values.

use super::projection::{FieldValues, LenientString};
use super::{ListOutcome, ListVisitor};
use crate::error::ConverterError;
use serde::de::{self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use std::fmt;

/// Error text used to unwind serde when a list callback failed
pub(super) const CALLBACK_FAILED: &str = "list callback failed";

/// Error text used to unwind serde once the caller has what it needs
pub(super) const SCAN_STOPPED: &str = "list scan stopped";

#[derive(Default)]
pub(super) struct ScanState {
    pub lists: Vec<ListOutcome>,
    pub callback_error: Option<ConverterError>,
    pub stopped: bool,
}

pub(super) struct DocumentVisitor<'a, V: ?Sized> {
    pub visitor: &'a mut V,
    pub state: &'a mut ScanState,
}

impl<'de, V: ListVisitor + ?Sized> Visitor<'de> for DocumentVisitor<'_, V> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON object holding top-level entity lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<(), A::Error> {
        let DocumentVisitor { visitor, state } = self;

        while let Some(property) = map.next_key::<String>()? {
            let Some(fields) = visitor.projection(&property) else {
                map.next_value::<IgnoredAny>()?;
                continue;
            };

            if let Err(e) = visitor.list_started(&property) {
                state.callback_error = Some(e);
                return Err(de::Error::custom(CALLBACK_FAILED));
            }

            let outcome = map.next_value_seed(ListSeed {
                property: &property,
                fields,
                visitor: &mut *visitor,
                callback_error: &mut state.callback_error,
            })?;

            let completed = visitor.list_complete(&outcome);
            state.lists.push(outcome);
            if let Err(e) = completed {
                state.callback_error = Some(e);
                return Err(de::Error::custom(CALLBACK_FAILED));
            }

            if visitor.is_satisfied() {
                state.stopped = true;
                return Err(de::Error::custom(SCAN_STOPPED));
            }
        }

        Ok(())
    }
}

struct ListSeed<'a, V: ?Sized> {
    property: &'a str,
    fields: &'static [&'static str],
    visitor: &'a mut V,
    callback_error: &'a mut Option<ConverterError>,
}

impl<'de, V: ListVisitor + ?Sized> DeserializeSeed<'de> for ListSeed<'_, V> {
    type Value = ListOutcome;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<ListOutcome, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<V: ?Sized> ListSeed<'_, V> {
    fn not_array(&self) -> ListOutcome {
        ListOutcome::not_array(self.property)
    }
}

impl<'de, V: ListVisitor + ?Sized> Visitor<'de> for ListSeed<'_, V> {
    type Value = ListOutcome;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an array of objects for '{}'", self.property)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<ListOutcome, A::Error> {
        let mut outcome = ListOutcome::array(self.property);

        while let Some(element) = seq.next_element_seed(ElementSeed {
            fields: self.fields,
        })? {
            match element {
                Some(values) => {
                    if let Err(e) = self.visitor.element(self.property, values) {
                        *self.callback_error = Some(e);
                        return Err(de::Error::custom(CALLBACK_FAILED));
                    }
                    outcome.elements += 1;
                }
                None => outcome.skipped += 1,
            }
        }

        Ok(outcome)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ListOutcome, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(self.not_array())
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<ListOutcome, E> {
        Ok(self.not_array())
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<ListOutcome, E> {
        Ok(self.not_array())
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<ListOutcome, E> {
        Ok(self.not_array())
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<ListOutcome, E> {
        Ok(self.not_array())
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<ListOutcome, E> {
        Ok(self.not_array())
    }

    fn visit_unit<E: de::Error>(self) -> Result<ListOutcome, E> {
        Ok(self.not_array())
    }
}

/// Decodes one array element; non-object elements yield `None`
struct ElementSeed {
    fields: &'static [&'static str],
}

impl<'de> DeserializeSeed<'de> for ElementSeed {
    type Value = Option<FieldValues>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for ElementSeed {
    type Value = Option<FieldValues>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an entity object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut values = FieldValues::new(self.fields);

        while let Some(slot) = map.next_key_seed(FieldSlot {
            fields: self.fields,
        })? {
            match slot {
                Some(index) => {
                    let LenientString(value) = map.next_value()?;
                    values.set(index, value);
                }
                None => {
                    map.next_value::<IgnoredAny>()?;
                }
            }
        }

        Ok(Some(values))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(None)
    }

    fn visit_str<E: de::Error>(self, _: &str) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_bool<E: de::Error>(self, _: bool) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }
}

/// Resolves an element key to its projection slot without allocating
struct FieldSlot {
    fields: &'static [&'static str],
}

impl<'de> DeserializeSeed<'de> for FieldSlot {
    type Value = Option<usize>;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_str(self)
    }
}

impl<'de> Visitor<'de> for FieldSlot {
    type Value = Option<usize>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a property name")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(self.fields.iter().position(|field| *field == v))
    }
}
