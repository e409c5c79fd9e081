//! Streaming scanner for large registry JSON documents
//!
//! A registry export is a single JSON object whose top-level properties are
//! entity lists holding millions of objects each. The scanner walks that
//! object with a forward-only token cursor and hands each element of a wanted
//! list to the caller as soon as it has been decoded, so memory use does not
//! grow with the size of the document.
//!
//! # Scanning modes
//!
//! - [`ListScanner::scan`] dispatches several lists in one pass, in the order
//!   they appear in the file. The caller decides per property whether it wants
//!   it, and can end the pass early once everything it needs has been read.
//! - [`ListScanner::scan_list`] is the single-list case: find one named list
//!   and stream its elements as typed [`ListRecord`]s.
//!
//! A list that is missing, or whose value is not an array, yields no elements
//! and is reported in the [`ScanSummary`]; only malformed JSON is fatal.

pub mod projection;
pub mod records;
mod visitor;

pub use projection::{FieldValues, ListRecord};

use crate::constants::DEFAULT_READ_BUFFER_SIZE;
use crate::error::{ConverterError, Result};
use serde::Deserializer as _;
use std::io::{BufReader, Read};
use std::marker::PhantomData;
use tracing::{debug, warn};
use visitor::{DocumentVisitor, ScanState};

/// Receives the lists of one scanning pass
pub trait ListVisitor {
    /// Field projection for a top-level property, or `None` to skip it
    fn projection(&mut self, property: &str) -> Option<&'static [&'static str]>;

    /// Called when a wanted property is reached, before any of its elements
    fn list_started(&mut self, _property: &str) -> Result<()> {
        Ok(())
    }

    /// Called once per object element of a wanted list, in array order
    fn element(&mut self, property: &str, fields: FieldValues) -> Result<()>;

    /// Called after a wanted property has been fully consumed
    fn list_complete(&mut self, _outcome: &ListOutcome) -> Result<()> {
        Ok(())
    }

    /// Checked after every wanted list; returning true ends the pass
    fn is_satisfied(&self) -> bool {
        false
    }
}

/// Shape of a wanted top-level property
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListShape {
    Array,
    NotArray,
    Missing,
}

/// What the scanner found for one wanted property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOutcome {
    pub name: String,
    pub shape: ListShape,
    /// Object elements handed to the visitor
    pub elements: u64,
    /// Non-object elements that were skipped
    pub skipped: u64,
}

impl ListOutcome {
    pub(crate) fn array(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shape: ListShape::Array,
            elements: 0,
            skipped: 0,
        }
    }

    pub(crate) fn not_array(name: &str) -> Self {
        Self {
            shape: ListShape::NotArray,
            ..Self::array(name)
        }
    }

    pub(crate) fn missing(name: &str) -> Self {
        Self {
            shape: ListShape::Missing,
            ..Self::array(name)
        }
    }
}

/// Result of one scanning pass
#[derive(Debug, Clone)]
pub struct ScanSummary {
    pub document: String,
    pub lists: Vec<ListOutcome>,
    /// The visitor ended the pass before the end of the document
    pub stopped_early: bool,
}

impl ScanSummary {
    pub fn outcome(&self, list: &str) -> Option<&ListOutcome> {
        self.lists.iter().find(|outcome| outcome.name == list)
    }

    /// Elements seen for a list; zero when it was missing
    pub fn elements(&self, list: &str) -> u64 {
        self.outcome(list).map_or(0, |outcome| outcome.elements)
    }

    /// Log a warning for every expected list that was missing or not an array
    pub fn warn_structural(&self, expected: &[&str]) {
        for list in expected {
            match self.outcome(list) {
                None => warn!("{} not found in {}; treating it as empty", list, self.document),
                Some(outcome) if outcome.shape == ListShape::NotArray => warn!(
                    "{} in {} is not an array; treating it as empty",
                    list, self.document
                ),
                Some(_) => {}
            }
        }
    }
}

/// Forward-only scanner over one JSON document
pub struct ListScanner<R> {
    reader: R,
    document: String,
    buffer_size: usize,
}

impl<R: Read> ListScanner<R> {
    /// Create a scanner; `document` names the source in logs and errors
    pub fn new(reader: R, document: impl Into<String>) -> Self {
        Self {
            reader,
            document: document.into(),
            buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }

    /// Set the read buffer placed in front of the source stream
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Run one pass over the document, dispatching wanted lists to `visitor`
    pub fn scan<V: ListVisitor + ?Sized>(self, visitor: &mut V) -> Result<ScanSummary> {
        let Self {
            reader,
            document,
            buffer_size,
        } = self;

        let reader = BufReader::with_capacity(buffer_size, reader);
        let mut deserializer = serde_json::Deserializer::from_reader(reader);
        let mut state = ScanState::default();

        let result = (&mut deserializer).deserialize_map(DocumentVisitor {
            visitor,
            state: &mut state,
        });

        if let Some(error) = state.callback_error.take() {
            return Err(error);
        }

        match result {
            Ok(()) => deserializer.end().map_err(|e| json_error(&document, e))?,
            Err(_) if state.stopped => {
                debug!("Stopped reading {} once all wanted lists were consumed", document);
            }
            Err(e) => return Err(json_error(&document, e)),
        }

        Ok(ScanSummary {
            document,
            lists: state.lists,
            stopped_early: state.stopped,
        })
    }

    /// Stream the elements of a single named list as typed records
    ///
    /// A missing list, or one that is not an array, is logged as a warning
    /// and produces no records.
    pub fn scan_list<T, F>(self, list: &str, on_record: F) -> Result<ListOutcome>
    where
        T: ListRecord,
        F: FnMut(T) -> Result<()>,
    {
        let mut single = SingleList {
            list,
            on_record,
            done: false,
            _record: PhantomData,
        };

        let summary = self.scan(&mut single)?;
        summary.warn_structural(&[list]);

        Ok(summary
            .outcome(list)
            .cloned()
            .unwrap_or_else(|| ListOutcome::missing(list)))
    }
}

fn json_error(document: &str, error: serde_json::Error) -> ConverterError {
    if error.is_io() {
        ConverterError::Io(error.into())
    } else {
        ConverterError::json(document, error)
    }
}

struct SingleList<'a, T, F> {
    list: &'a str,
    on_record: F,
    done: bool,
    _record: PhantomData<fn(T)>,
}

impl<T, F> ListVisitor for SingleList<'_, T, F>
where
    T: ListRecord,
    F: FnMut(T) -> Result<()>,
{
    fn projection(&mut self, property: &str) -> Option<&'static [&'static str]> {
        (!self.done && property == self.list).then_some(T::FIELDS)
    }

    fn element(&mut self, _property: &str, fields: FieldValues) -> Result<()> {
        (self.on_record)(T::from_fields(fields))
    }

    fn list_complete(&mut self, _outcome: &ListOutcome) -> Result<()> {
        self.done = true;
        Ok(())
    }

    fn is_satisfied(&self) -> bool {
        self.done
    }
}
