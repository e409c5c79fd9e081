//! Scenario tests for the conversion engine
//!
//! Each scenario runs complete conversions over in-memory registry documents.

pub mod fixtures;
pub mod strategies;
