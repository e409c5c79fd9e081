//! Keyed lookup tables joined during enrichment
//!
//! Tables are built once per run from a complete pass over their source list
//! and shared read-only afterwards. Each table names its own duplicate-key
//! policy; keys keep the order in which they were first inserted.

pub mod builders;
pub mod temporal;

use crate::models::{CadastralParcel, PostalCode, RoadSegment};
use indexmap::IndexMap;
use indexmap::map::Entry;

/// What happens when a key is inserted a second time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Keep the value already stored
    FirstWins,
    /// Replace the value, keeping the key's original position
    Overwrite,
}

/// Natural key to value map with an explicit duplicate policy
#[derive(Debug, Clone)]
pub struct LookupTable<V> {
    name: &'static str,
    policy: DuplicatePolicy,
    entries: IndexMap<String, V>,
    duplicates: u64,
}

impl<V> LookupTable<V> {
    pub fn new(name: &'static str, policy: DuplicatePolicy) -> Self {
        Self {
            name,
            policy,
            entries: IndexMap::new(),
            duplicates: 0,
        }
    }

    /// Insert under the table's policy; returns true when the stored value changed
    pub fn insert(&mut self, key: String, value: V) -> bool {
        match self.entries.entry(key) {
            Entry::Vacant(e) => {
                e.insert(value);
                true
            }
            Entry::Occupied(mut e) => {
                self.duplicates += 1;
                match self.policy {
                    DuplicatePolicy::FirstWins => false,
                    DuplicatePolicy::Overwrite => {
                        e.insert(value);
                        true
                    }
                }
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of inserts that hit an existing key
    pub fn duplicates(&self) -> u64 {
        self.duplicates
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Entries in first-insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// Postal codes keyed by `Postnummer.id_lokalId`
pub type PostalCodeTable = LookupTable<PostalCode>;

/// Municipality and road codes keyed by `navngivenVej`
pub type RoadSegmentTable = LookupTable<RoadSegment>;

/// Current parcels keyed by `Jordstykke.id_lokalId`
pub type ParcelTable = LookupTable<CadastralParcel>;

/// Raw `POINT(...)` text keyed by `Adressepunkt.id_lokalId`
pub type PositionTable = LookupTable<String>;

/// Ownership district names keyed by `Ejerlav.id_lokalId`
pub type OwnershipDistrictTable = LookupTable<String>;

pub(crate) fn postal_code_table() -> PostalCodeTable {
    LookupTable::new("postal codes", DuplicatePolicy::Overwrite)
}

pub(crate) fn road_segment_table() -> RoadSegmentTable {
    LookupTable::new("road segments", DuplicatePolicy::FirstWins)
}

pub(crate) fn ownership_district_table() -> OwnershipDistrictTable {
    LookupTable::new("ownership districts", DuplicatePolicy::Overwrite)
}

pub(crate) fn parcel_table() -> ParcelTable {
    LookupTable::new("cadastral parcels", DuplicatePolicy::Overwrite)
}

pub(crate) fn position_table() -> PositionTable {
    LookupTable::new("address point positions", DuplicatePolicy::Overwrite)
}

/// Lookups shared read-only by every exporter
///
/// Tables an exporter selection does not need are left empty.
#[derive(Debug, Clone)]
pub struct SharedLookups {
    pub postal_codes: PostalCodeTable,
    pub road_segments: RoadSegmentTable,
    pub parcels: ParcelTable,
}

impl SharedLookups {
    pub fn new(
        postal_codes: PostalCodeTable,
        road_segments: RoadSegmentTable,
        parcels: ParcelTable,
    ) -> Self {
        Self {
            postal_codes,
            road_segments,
            parcels,
        }
    }
}

impl Default for SharedLookups {
    fn default() -> Self {
        Self::new(postal_code_table(), road_segment_table(), parcel_table())
    }
}
