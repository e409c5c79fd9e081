//! Core data structures for registry conversion.
//!
//! Lookup values joined during enrichment, the output records written to CSV,
//! and the statistics reported for a run.

use crate::exporters::ExporterKind;
use crate::sink::CsvRecord;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

/// Postal code and district name of a `Postnummer`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostalCode {
    pub code: String,
    pub district_name: String,
}

/// Municipality and road code of a named road
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoadSegment {
    pub municipality_code: String,
    pub road_code: String,
}

/// Parcel number joined with its ownership district name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CadastralParcel {
    pub parcel_number: String,
    pub ownership_district: String,
}

/// One access point (`Husnummer`) with its enriched columns
///
/// Built from a single list element, enriched against the shared lookups,
/// written and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressAccessRecord {
    pub access_id: String,
    pub street_building_id: String,
    /// Not present in the registry; kept as an empty column
    pub building_name: String,
    pub municipality_code: String,
    pub street_code: String,
    pub postal_code: String,
    pub district_name: String,
    /// `jordstykke` reference used for the parcel join
    pub parcel_ref: Option<String>,
    pub parcel_number: String,
    pub ownership_district: String,
    pub easting: String,
    pub northing: String,
    /// `postnummer` reference used for the postal join
    pub postal_ref: Option<String>,
    /// `navngivenVej` reference used for the road join
    pub road_ref: Option<String>,
}

/// Row of `RoadName.csv`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadNameRecord {
    pub municipality_code: String,
    pub road_code: String,
    pub name: String,
}

/// Row of `AddressSpecific.csv`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitAddressRecord {
    pub unit_address_id: String,
    pub building_address_id: String,
    pub floor: String,
    pub door: String,
}

impl CsvRecord for PostalCode {
    fn write_row<W: Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()> {
        writer.write_record([self.code.as_str(), "", self.district_name.as_str()])
    }
}

impl CsvRecord for RoadNameRecord {
    fn write_row<W: Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()> {
        writer.write_record([
            self.municipality_code.as_str(),
            self.road_code.as_str(),
            self.name.as_str(),
        ])
    }
}

impl CsvRecord for AddressAccessRecord {
    fn write_row<W: Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()> {
        writer.write_record([
            self.access_id.as_str(),
            self.street_building_id.as_str(),
            self.building_name.as_str(),
            self.municipality_code.as_str(),
            self.street_code.as_str(),
            self.postal_code.as_str(),
            self.ownership_district.as_str(),
            self.parcel_number.as_str(),
            "",
            self.district_name.as_str(),
            self.easting.as_str(),
            self.northing.as_str(),
            "",
            "",
            "",
            "",
            "",
            "",
        ])
    }
}

impl CsvRecord for UnitAddressRecord {
    fn write_row<W: Write>(&self, writer: &mut csv::Writer<W>) -> csv::Result<()> {
        writer.write_record([
            self.unit_address_id.as_str(),
            "",
            self.building_address_id.as_str(),
            "",
            "",
            "",
            self.floor.as_str(),
            self.door.as_str(),
        ])
    }
}

/// Sizes of the lookup tables built for a run
#[derive(Debug, Clone, Default, Serialize)]
pub struct LookupReport {
    pub postal_codes: usize,
    pub road_segments: usize,
    pub ownership_districts: usize,
    pub parcels: usize,
    /// Parcel candidates dropped by the validity window
    pub parcels_not_current: u64,
    /// Current parcels whose ownership district did not resolve
    pub parcels_unresolved: u64,
    pub duplicate_keys: u64,
    pub duration: Duration,
}

/// Outcome of one exporter
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub exporter: ExporterKind,
    pub file: String,
    pub rows: u64,
    pub duration: Duration,
}

/// Statistics for a complete conversion run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub lookups: LookupReport,
    pub exports: Vec<ExportReport>,
    pub total_duration: Duration,
}

impl RunReport {
    /// Rows written across all exporters
    pub fn total_rows(&self) -> u64 {
        self.exports.iter().map(|export| export.rows).sum()
    }

    pub fn export(&self, exporter: ExporterKind) -> Option<&ExportReport> {
        self.exports.iter().find(|export| export.exporter == exporter)
    }
}
