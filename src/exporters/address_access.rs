//! `AddressAccess.csv`: house numbers enriched with postal, road, parcel and
//! coordinate data
//!
//! Positions come from `AdressepunktList` in the same DAR document. With
//! [`PassStrategy::SinglePass`] both lists are read in one pass when the
//! positions come first; when `HusnummerList` is reached before them, the
//! position table is built from a second cursor at that point so every house
//! number is still written as soon as it is read. With
//! [`PassStrategy::Reopen`] the position table is always built from a
//! dedicated cursor first.

use super::{ExportContext, ExporterKind};
use crate::config::PassStrategy;
use crate::constants::lists;
use crate::enrichment::AddressEnricher;
use crate::error::Result;
use crate::lookup::builders::{build_positions, fold_position};
use crate::lookup::{PositionTable, position_table};
use crate::models::AddressAccessRecord;
use crate::progress::ProgressTicker;
use crate::scanner::records::{AdressepunktElement, HusnummerElement};
use crate::scanner::{FieldValues, ListOutcome, ListRecord, ListVisitor};
use crate::sink::CsvSink;
use crate::storage::{SinkWriter, SourceDocument};
use std::io::Write;
use tracing::debug;

impl From<HusnummerElement> for AddressAccessRecord {
    fn from(element: HusnummerElement) -> Self {
        Self {
            access_id: element.adgangspunkt.unwrap_or_default(),
            street_building_id: element.husnummertekst.unwrap_or_default(),
            postal_ref: element.postnummer,
            road_ref: element.navngiven_vej,
            parcel_ref: element.jordstykke,
            ..Default::default()
        }
    }
}

pub fn export(ctx: &ExportContext) -> Result<u64> {
    let sink = ctx.sink(ExporterKind::AddressAccess)?;
    let ticker = ctx.ticker(ExporterKind::AddressAccess.output_file());

    match ctx.options.strategy {
        PassStrategy::SinglePass => export_single_pass(ctx, sink, ticker),
        PassStrategy::Reopen => export_reopened(ctx, sink, ticker),
    }
}

fn export_single_pass(
    ctx: &ExportContext,
    sink: CsvSink<SinkWriter>,
    ticker: ProgressTicker,
) -> Result<u64> {
    let mut pass = AddressAccessPass {
        ctx,
        enricher: AddressEnricher::new(&ctx.lookups),
        sink,
        ticker,
        positions: position_table(),
        positions_complete: false,
        positions_reopened: false,
        remaining: vec![lists::HUSNUMMER, lists::ADRESSEPUNKT],
    };

    let summary = ctx.scanner(SourceDocument::Dar)?.scan(&mut pass)?;
    summary.warn_structural(&pass.expected_lists());

    pass.ticker.finish();
    pass.sink.finish()
}

fn export_reopened(
    ctx: &ExportContext,
    mut sink: CsvSink<SinkWriter>,
    mut ticker: ProgressTicker,
) -> Result<u64> {
    let positions = build_positions(ctx.sources.as_ref(), &ctx.options, ctx.observer.clone())?;
    let enricher = AddressEnricher::new(&ctx.lookups);

    ctx.scanner(SourceDocument::Dar)?
        .scan_list::<HusnummerElement, _>(lists::HUSNUMMER, |element| {
            ticker.tick();
            let mut record = AddressAccessRecord::from(element);
            enricher.enrich(&mut record, &positions);
            sink.write(&record)
        })?;

    ticker.finish();
    sink.finish()
}

/// Single-pass visitor over `HusnummerList` and `AdressepunktList`
struct AddressAccessPass<'a, W: Write> {
    ctx: &'a ExportContext,
    enricher: AddressEnricher<'a>,
    sink: CsvSink<W>,
    ticker: ProgressTicker,
    positions: PositionTable,
    positions_complete: bool,
    positions_reopened: bool,
    remaining: Vec<&'static str>,
}

impl<W: Write> AddressAccessPass<'_, W> {
    /// Lists this cursor is responsible for; a second cursor reports its own
    fn expected_lists(&self) -> Vec<&'static str> {
        if self.positions_reopened {
            vec![lists::HUSNUMMER]
        } else {
            vec![lists::HUSNUMMER, lists::ADRESSEPUNKT]
        }
    }
}

impl<W: Write> ListVisitor for AddressAccessPass<'_, W> {
    fn projection(&mut self, property: &str) -> Option<&'static [&'static str]> {
        if !self.remaining.iter().any(|list| *list == property) {
            return None;
        }
        match property {
            lists::HUSNUMMER => Some(HusnummerElement::FIELDS),
            lists::ADRESSEPUNKT => Some(AdressepunktElement::FIELDS),
            _ => None,
        }
    }

    fn list_started(&mut self, property: &str) -> Result<()> {
        if property == lists::HUSNUMMER && !self.positions_complete {
            debug!(
                "{} precedes {}; reading positions from a second cursor",
                lists::HUSNUMMER,
                lists::ADRESSEPUNKT
            );
            self.positions = build_positions(
                self.ctx.sources.as_ref(),
                &self.ctx.options,
                self.ctx.observer.clone(),
            )?;
            self.positions_complete = true;
            self.positions_reopened = true;
            self.remaining.retain(|list| *list != lists::ADRESSEPUNKT);
        }
        Ok(())
    }

    fn element(&mut self, property: &str, fields: FieldValues) -> Result<()> {
        match property {
            lists::HUSNUMMER => {
                self.ticker.tick();
                let mut record = AddressAccessRecord::from(HusnummerElement::from_fields(fields));
                self.enricher.enrich(&mut record, &self.positions);
                self.sink.write(&record)?;
            }
            lists::ADRESSEPUNKT => {
                fold_position(&mut self.positions, AdressepunktElement::from_fields(fields));
            }
            _ => {}
        }
        Ok(())
    }

    fn list_complete(&mut self, outcome: &ListOutcome) -> Result<()> {
        debug!("{}: {} elements", outcome.name, outcome.elements);
        self.remaining.retain(|list| *list != outcome.name);
        if outcome.name == lists::ADRESSEPUNKT {
            self.positions_complete = true;
        }
        Ok(())
    }

    fn is_satisfied(&self) -> bool {
        self.remaining.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporters::test_support::{context, data_lines};
    use crate::lookup::SharedLookups;
    use crate::models::{CadastralParcel, PostalCode, RoadSegment};
    use crate::storage::test_support::CountingSources;
    use crate::storage::{MemorySinks, SinkProvider};
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Memory sinks that note how far the first DAR cursor had read at every write
    #[derive(Clone)]
    struct ReadPositionSinks {
        sources: CountingSources,
        files: MemorySinks,
        read_at_write: Arc<Mutex<Vec<u64>>>,
    }

    impl SinkProvider for ReadPositionSinks {
        fn create(&self, name: &str) -> Result<SinkWriter> {
            Ok(Box::new(ReadPositionFile {
                sinks: self.clone(),
                inner: self.files.create(name)?,
            }))
        }
    }

    struct ReadPositionFile {
        sinks: ReadPositionSinks,
        inner: SinkWriter,
    }

    impl Write for ReadPositionFile {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let read = self.sinks.sources.bytes_read(0);
            self.sinks.read_at_write.lock().unwrap().push(read);
            self.inner.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.inner.flush()
        }
    }

    fn lookups() -> SharedLookups {
        let mut lookups = SharedLookups::default();
        lookups.postal_codes.insert(
            "pn-1".to_string(),
            PostalCode {
                code: "8000".to_string(),
                district_name: "Aarhus C".to_string(),
            },
        );
        lookups.road_segments.insert(
            "vej-1".to_string(),
            RoadSegment {
                municipality_code: "0751".to_string(),
                road_code: "1234".to_string(),
            },
        );
        lookups.parcels.insert(
            "js-1".to_string(),
            CadastralParcel {
                parcel_number: "12a".to_string(),
                ownership_district: "Aarhus Bygrunde".to_string(),
            },
        );
        lookups
    }

    const HUSNUMRE: &str = r#"[
        {"adgangspunkt": "ap-1", "husnummertekst": "7B", "postnummer": "pn-1", "navngivenVej": "vej-1", "jordstykke": "js-1"},
        {"adgangspunkt": "ap-9", "husnummertekst": "9", "postnummer": "pn-x", "navngivenVej": null}
    ]"#;

    const PUNKTER: &str = r#"[
        {"id_lokalId": "ap-1", "position": "POINT(574123.45 6224567.8)"},
        {"id_lokalId": "ap-2", "position": "POINT(1 2)"}
    ]"#;

    fn expected() -> Vec<String> {
        vec![
            "ap-1;7B;;0751;1234;8000;Aarhus Bygrunde;12a;;Aarhus C;574123.45;6224567.8;;;;;;".to_string(),
            "ap-9;9;;;;;;;;;;;;;;;;".to_string(),
        ]
    }

    fn run(dar: &str, strategy: PassStrategy) -> (u64, Vec<String>) {
        let (ctx, sinks) = context(dar, lookups(), strategy);
        let rows = export(&ctx).unwrap();
        (rows, data_lines(&sinks, ExporterKind::AddressAccess))
    }

    #[test]
    fn test_positions_after_house_numbers_are_applied() {
        let dar = format!(r#"{{"HusnummerList": {HUSNUMRE}, "AdressepunktList": {PUNKTER}}}"#);

        for strategy in [PassStrategy::SinglePass, PassStrategy::Reopen] {
            let (rows, lines) = run(&dar, strategy);
            assert_eq!(rows, 2);
            assert_eq!(lines, expected(), "{strategy:?}");
        }
    }

    #[test]
    fn test_positions_before_house_numbers_are_applied() {
        let dar = format!(r#"{{"AdressepunktList": {PUNKTER}, "HusnummerList": {HUSNUMRE}}}"#);

        for strategy in [PassStrategy::SinglePass, PassStrategy::Reopen] {
            let (rows, lines) = run(&dar, strategy);
            assert_eq!(rows, 2);
            assert_eq!(lines, expected(), "{strategy:?}");
        }
    }

    #[test]
    fn test_missing_positions_leave_coordinates_empty() {
        let dar = format!(r#"{{"HusnummerList": {HUSNUMRE}}}"#);

        let (rows, lines) = run(&dar, PassStrategy::SinglePass);

        assert_eq!(rows, 2);
        assert_eq!(lines[0], "ap-1;7B;;0751;1234;8000;Aarhus Bygrunde;12a;;Aarhus C;;;;;;;;");
    }

    #[test]
    fn test_unparseable_position_leaves_coordinates_empty() {
        let dar = r#"{
            "AdressepunktList": [{"id_lokalId": "ap-1", "position": "POINT(1 2 3)"}],
            "HusnummerList": [{"adgangspunkt": "ap-1", "husnummertekst": "1"}]
        }"#;

        let (_, lines) = run(dar, PassStrategy::SinglePass);

        assert_eq!(lines, vec!["ap-1;1;;;;;;;;;;;;;;;;"]);
    }

    #[test]
    fn test_house_numbers_ahead_of_positions_are_written_while_streaming() {
        let husnumre: Vec<String> = (0..500)
            .map(|i| format!(r#"{{"adgangspunkt": "ap-{i}", "husnummertekst": "{i}"}}"#))
            .collect();
        let dar = format!(
            r#"{{"HusnummerList": [{}], "AdressepunktList": [{{"id_lokalId": "ap-0", "position": "POINT(1 2)"}}]}}"#,
            husnumre.join(",")
        );
        let house_numbers_end = dar.find("\"AdressepunktList\"").unwrap() as u64;

        let sources = CountingSources::new(&dar, "{}");
        let sinks = ReadPositionSinks {
            sources: sources.clone(),
            files: MemorySinks::new(),
            read_at_write: Arc::default(),
        };
        let (mut ctx, _) = context(&dar, SharedLookups::default(), PassStrategy::SinglePass);
        ctx.sources = Arc::new(sources.clone());
        ctx.sinks = Arc::new(sinks.clone());
        ctx.sink_options.flush_interval = 1;

        let rows = export(&ctx).unwrap();

        assert_eq!(rows, 500);
        // The main cursor plus one for the positions
        assert_eq!(sources.opened(), vec![SourceDocument::Dar, SourceDocument::Dar]);

        let read_at_write = sinks.read_at_write.lock().unwrap().clone();
        assert!(read_at_write.len() >= 500);
        assert!(
            read_at_write[0] < house_numbers_end / 4,
            "first row written after {} of {} bytes",
            read_at_write[0],
            house_numbers_end
        );
        assert!(read_at_write.windows(2).all(|pair| pair[0] <= pair[1]));

        let lines = data_lines(&sinks.files, ExporterKind::AddressAccess);
        assert_eq!(lines[0], "ap-0;0;;;;;;;;;1;2;;;;;;");
        assert_eq!(lines[499], "ap-499;499;;;;;;;;;;;;;;;;");
    }

    #[test]
    fn test_positions_first_needs_a_single_cursor() {
        let dar = format!(r#"{{"AdressepunktList": {PUNKTER}, "HusnummerList": {HUSNUMRE}}}"#);
        let sources = CountingSources::new(&dar, "{}");
        let (mut ctx, sinks) = context(&dar, lookups(), PassStrategy::SinglePass);
        ctx.sources = Arc::new(sources.clone());

        export(&ctx).unwrap();

        assert_eq!(sources.opened(), vec![SourceDocument::Dar]);
        assert_eq!(data_lines(&sinks, ExporterKind::AddressAccess), expected());
    }
}
