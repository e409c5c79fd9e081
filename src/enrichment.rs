//! Join of access-point records against the shared lookups
//!
//! Every miss degrades to empty columns. Nothing in here fails; a record
//! that enters enrichment is always written.

use crate::lookup::{
    LookupTable, ParcelTable, PositionTable, PostalCodeTable, RoadSegmentTable, SharedLookups,
};
use crate::models::AddressAccessRecord;
use regex::Regex;
use std::sync::LazyLock;

static POINT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^POINT\(([-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?) ([-+]?\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)\)$")
        .expect("point pattern compiles")
});

/// Split `POINT(<easting> <northing>)` into its coordinate strings
///
/// The coordinates are returned as written in the source, without
/// reformatting. Anything else (another geometry type, extra whitespace,
/// a missing parenthesis) yields `None`.
pub fn parse_point(text: &str) -> Option<(&str, &str)> {
    let captures = POINT_REGEX.captures(text)?;
    let easting = captures.get(1)?.as_str();
    let northing = captures.get(2)?.as_str();
    Some((easting, northing))
}

/// Enriches access-point records from read-only lookups
pub struct AddressEnricher<'a> {
    postal_codes: &'a PostalCodeTable,
    road_segments: &'a RoadSegmentTable,
    parcels: &'a ParcelTable,
}

impl<'a> AddressEnricher<'a> {
    pub fn new(lookups: &'a SharedLookups) -> Self {
        Self {
            postal_codes: &lookups.postal_codes,
            road_segments: &lookups.road_segments,
            parcels: &lookups.parcels,
        }
    }

    /// Fill the joined columns of `record` in place
    pub fn enrich(&self, record: &mut AddressAccessRecord, positions: &PositionTable) {
        match lookup(self.postal_codes, &record.postal_ref) {
            Some(postal) => {
                record.postal_code = postal.code.clone();
                record.district_name = postal.district_name.clone();
            }
            None => {
                record.postal_code.clear();
                record.district_name.clear();
            }
        }

        match lookup(self.road_segments, &record.road_ref) {
            Some(road) => {
                record.municipality_code = road.municipality_code.clone();
                record.street_code = road.road_code.clone();
            }
            None => {
                record.municipality_code.clear();
                record.street_code.clear();
            }
        }

        match lookup(self.parcels, &record.parcel_ref) {
            Some(parcel) => {
                record.parcel_number = parcel.parcel_number.clone();
                record.ownership_district = parcel.ownership_district.clone();
            }
            None => {
                record.parcel_number.clear();
                record.ownership_district.clear();
            }
        }

        let point = (!record.access_id.is_empty())
            .then(|| positions.get(&record.access_id))
            .flatten()
            .and_then(|position| parse_point(position));
        match point {
            Some((easting, northing)) => {
                record.easting = easting.to_string();
                record.northing = northing.to_string();
            }
            None => {
                record.easting.clear();
                record.northing.clear();
            }
        }
    }
}

fn lookup<'t, V>(table: &'t LookupTable<V>, key: &Option<String>) -> Option<&'t V> {
    key.as_deref()
        .filter(|key| !key.is_empty())
        .and_then(|key| table.get(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::{parcel_table, position_table, postal_code_table, road_segment_table};
    use crate::models::{CadastralParcel, PostalCode, RoadSegment};

    fn lookups() -> SharedLookups {
        let mut postal_codes = postal_code_table();
        postal_codes.insert(
            "pn-1".to_string(),
            PostalCode {
                code: "1050".to_string(),
                district_name: "København K".to_string(),
            },
        );

        let mut road_segments = road_segment_table();
        road_segments.insert(
            "vej-1".to_string(),
            RoadSegment {
                municipality_code: "0101".to_string(),
                road_code: "0042".to_string(),
            },
        );

        let mut parcels = parcel_table();
        parcels.insert(
            "js-1".to_string(),
            CadastralParcel {
                parcel_number: "7a".to_string(),
                ownership_district: "Østervold".to_string(),
            },
        );

        SharedLookups::new(postal_codes, road_segments, parcels)
    }

    fn record(postal: &str, road: &str, parcel: &str, access: &str) -> AddressAccessRecord {
        AddressAccessRecord {
            access_id: access.to_string(),
            postal_ref: Some(postal.to_string()),
            road_ref: Some(road.to_string()),
            parcel_ref: Some(parcel.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(
            parse_point("POINT(698217.056989288 6200618.321236086)"),
            Some(("698217.056989288", "6200618.321236086"))
        );
        assert_eq!(parse_point("point(-1 2e3)"), Some(("-1", "2e3")));
        assert_eq!(parse_point("MULTIPOINT((1 2))"), None);
        assert_eq!(parse_point("POINT(1  2)"), None);
        assert_eq!(parse_point("POINT(1 2"), None);
        assert_eq!(parse_point("POINT(a b)"), None);
        assert_eq!(parse_point(""), None);
    }

    #[test]
    fn test_full_hit() {
        let lookups = lookups();
        let mut positions = position_table();
        positions.insert("ap-1".to_string(), "POINT(1.5 2.5)".to_string());
        let mut rec = record("pn-1", "vej-1", "js-1", "ap-1");

        AddressEnricher::new(&lookups).enrich(&mut rec, &positions);

        assert_eq!(rec.postal_code, "1050");
        assert_eq!(rec.district_name, "København K");
        assert_eq!(rec.municipality_code, "0101");
        assert_eq!(rec.street_code, "0042");
        assert_eq!(rec.parcel_number, "7a");
        assert_eq!(rec.ownership_district, "Østervold");
        assert_eq!((rec.easting.as_str(), rec.northing.as_str()), ("1.5", "2.5"));
    }

    #[test]
    fn test_misses_reset_to_empty() {
        let lookups = lookups();
        let mut positions = position_table();
        positions.insert("ap-1".to_string(), "MULTIPOINT(1 2)".to_string());
        let mut rec = AddressAccessRecord {
            parcel_number: "stale".to_string(),
            ownership_district: "stale".to_string(),
            easting: "stale".to_string(),
            ..record("pn-x", "vej-x", "js-x", "ap-1")
        };

        AddressEnricher::new(&lookups).enrich(&mut rec, &positions);

        assert_eq!(rec.postal_code, "");
        assert_eq!(rec.district_name, "");
        assert_eq!(rec.municipality_code, "");
        assert_eq!(rec.parcel_number, "");
        assert_eq!(rec.ownership_district, "");
        assert_eq!(rec.easting, "");
        assert_eq!(rec.northing, "");
    }

    #[test]
    fn test_missing_references_do_not_match_empty_keys() {
        let mut lookups = lookups();
        lookups.postal_codes.insert(
            String::new(),
            PostalCode {
                code: "9999".to_string(),
                district_name: "Nowhere".to_string(),
            },
        );
        let mut rec = AddressAccessRecord {
            postal_ref: Some(String::new()),
            ..Default::default()
        };

        AddressEnricher::new(&lookups).enrich(&mut rec, &position_table());

        assert_eq!(rec.postal_code, "");
        assert_eq!(rec.access_id, "");
    }
}
