//! `RoadName.csv`: named roads joined with their municipality and road code

use super::{ExportContext, ExporterKind};
use crate::constants::lists;
use crate::error::Result;
use crate::lookup::RoadSegmentTable;
use crate::models::RoadNameRecord;
use crate::scanner::records::{NavngivenVejElement, non_empty};
use crate::storage::SourceDocument;

/// Row for a named road; roads without a segment are dropped
pub fn road_name_record(element: &NavngivenVejElement, roads: &RoadSegmentTable) -> Option<RoadNameRecord> {
    let id = non_empty(&element.id)?;
    let name = non_empty(&element.vejnavn)?;
    let segment = roads.get(id)?;

    Some(RoadNameRecord {
        municipality_code: segment.municipality_code.clone(),
        road_code: segment.road_code.clone(),
        name: name.to_string(),
    })
}

pub fn export(ctx: &ExportContext) -> Result<u64> {
    let mut sink = ctx.sink(ExporterKind::RoadName)?;
    let mut ticker = ctx.ticker(ExporterKind::RoadName.output_file());
    let roads = &ctx.lookups.road_segments;

    ctx.scanner(SourceDocument::Dar)?
        .scan_list::<NavngivenVejElement, _>(lists::NAVNGIVEN_VEJ, |element| {
            ticker.tick();
            match road_name_record(&element, roads) {
                Some(record) => sink.write(&record),
                None => Ok(()),
            }
        })?;

    ticker.finish();
    sink.finish()
}
