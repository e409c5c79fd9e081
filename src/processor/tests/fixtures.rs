//! Small registry documents shared by the scenario tests

use crate::config::{ConverterConfig, PassStrategy};
use crate::exporters::ExporterKind;
use crate::processor::ConversionProcessor;
use crate::progress::NoopObserver;
use crate::storage::{MemorySinks, MemorySources};
use chrono::NaiveDate;
use std::sync::Arc;

pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

pub const DAR: &str = r#"{
    "PostnummerList": [
        {"id_lokalId": "pn-1", "postnr": "8000", "navn": "Aarhus C"},
        {"id_lokalId": "pn-2", "postnr": "8200", "navn": "Aarhus N"},
        {"id_lokalId": "pn-1", "postnr": "8001", "navn": "Aarhus C"}
    ],
    "NavngivenVejKommunedelList": [
        {"navngivenVej": "vej-1", "kommune": "0751", "vejkode": "1234"},
        {"navngivenVej": "vej-1", "kommune": "0999", "vejkode": "9999"},
        {"navngivenVej": "vej-2", "kommune": "0751", "vejkode": "5678"}
    ],
    "NavngivenVejList": [
        {"id_lokalId": "vej-1", "vejnavn": "Vestergade", "vejadresseringsnavn": "Vesterg"},
        {"id_lokalId": "vej-2", "vejnavn": "Østergade"}
    ],
    "HusnummerList": [
        {"adgangspunkt": "ap-1", "husnummertekst": "7B", "postnummer": "pn-1", "navngivenVej": "vej-1", "jordstykke": "js-1"},
        {"adgangspunkt": "ap-2", "husnummertekst": "12", "postnummer": "pn-2", "navngivenVej": "vej-2", "jordstykke": "js-2"},
        {"adgangspunkt": "ap-3", "husnummertekst": "1", "postnummer": "pn-9"}
    ],
    "AdressepunktList": [
        {"id_lokalId": "ap-1", "position": "POINT(698217.056989288 6200618.321236086)"},
        {"id_lokalId": "ap-2", "position": "MULTIPOINT(1 2)"}
    ],
    "AdresseList": [
        {"id_lokalId": "adr-1", "husnummer": "hn-1", "etagebetegnelse": "st", "dørbetegnelse": "tv"},
        {"id_lokalId": "adr-2", "husnummer": "hn-1", "etagebetegnelse": "1", "dørbetegnelse": null}
    ]
}"#;

/// Districts listed after the parcels that reference them
pub const MAT: &str = r#"{
    "JordstykkeList": [
        {
            "id_lokalId": "js-1", "matrikelnummer": "12a", "ejerlavLokalId": "ej-1",
            "virkningFra": "2024-06-14T00:00:00.000000+02:00", "virkningTil": null,
            "registreringFra": "2024-06-14T00:00:00.000000+02:00", "registreringTil": null
        },
        {
            "id_lokalId": "js-2", "matrikelnummer": "3b", "ejerlavLokalId": "ej-1",
            "virkningFra": "2024-06-14T00:00:00.000000+02:00", "virkningTil": "2024-06-15T00:00:00.000000+02:00",
            "registreringFra": "2024-06-14T00:00:00.000000+02:00", "registreringTil": null
        }
    ],
    "EjerlavList": [
        {"id_lokalId": "ej-1", "ejerlavsnavn": "Aarhus Bygrunde"}
    ]
}"#;

pub const ROAD_NAME_ROWS: [&str; 2] = ["0751;1234;Vestergade", "0751;5678;Østergade"];

pub const POST_CODE_ROWS: [&str; 2] = ["8001;;Aarhus C", "8200;;Aarhus N"];

pub const ADDRESS_ACCESS_ROWS: [&str; 3] = [
    "ap-1;7B;;0751;1234;8001;Aarhus Bygrunde;12a;;Aarhus C;698217.056989288;6200618.321236086;;;;;;",
    "ap-2;12;;0751;5678;8200;;;;Aarhus N;;;;;;;;",
    "ap-3;1;;;;;;;;;;;;;;;;",
];

pub const ADDRESS_SPECIFIC_ROWS: [&str; 2] = ["adr-1;;hn-1;;;;st;tv", "adr-2;;hn-1;;;;1;"];

pub fn config(strategy: PassStrategy) -> ConverterConfig {
    ConverterConfig::default()
        .with_pass_strategy(strategy)
        .with_reference_date(reference_date())
        .with_read_buffer_size(256)
        .with_flush_interval(1)
        .with_progress_interval(2)
}

pub fn processor(
    config: ConverterConfig,
    dar: &str,
    mat: &str,
) -> (ConversionProcessor, MemorySinks) {
    let sinks = MemorySinks::new();
    let processor = ConversionProcessor::new(
        config,
        Arc::new(MemorySources::new(dar, mat)),
        Arc::new(sinks.clone()),
    )
    .with_observer(Arc::new(NoopObserver));
    (processor, sinks)
}

/// Data lines of an output, header excluded
pub fn rows(sinks: &MemorySinks, kind: ExporterKind) -> Vec<String> {
    sinks
        .text(kind.output_file())
        .unwrap_or_else(|| panic!("{} was not written", kind.output_file()))
        .lines()
        .skip(1)
        .map(str::to_string)
        .collect()
}

pub fn header(sinks: &MemorySinks, kind: ExporterKind) -> String {
    sinks
        .text(kind.output_file())
        .and_then(|text| text.lines().next().map(str::to_string))
        .unwrap_or_default()
}
