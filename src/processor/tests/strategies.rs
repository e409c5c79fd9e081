//! Both pass strategies must agree regardless of list order in the documents

use super::fixtures::*;
use crate::config::PassStrategy;
use crate::exporters::ExporterKind;
use crate::storage::MemorySinks;

/// The same content as `DAR`, positions first and lookup lists last
const DAR_REORDERED: &str = r#"{
    "AdressepunktList": [
        {"id_lokalId": "ap-2", "position": "MULTIPOINT(1 2)"},
        {"id_lokalId": "ap-1", "position": "POINT(698217.056989288 6200618.321236086)"}
    ],
    "AdresseList": [
        {"id_lokalId": "adr-1", "husnummer": "hn-1", "etagebetegnelse": "st", "dørbetegnelse": "tv"},
        {"id_lokalId": "adr-2", "husnummer": "hn-1", "etagebetegnelse": "1"}
    ],
    "HusnummerList": [
        {"jordstykke": "js-1", "navngivenVej": "vej-1", "postnummer": "pn-1", "husnummertekst": "7B", "adgangspunkt": "ap-1"},
        {"adgangspunkt": "ap-2", "husnummertekst": "12", "postnummer": "pn-2", "navngivenVej": "vej-2", "jordstykke": "js-2"},
        {"adgangspunkt": "ap-3", "husnummertekst": "1", "postnummer": "pn-9", "jordstykke": null}
    ],
    "NavngivenVejList": [
        {"id_lokalId": "vej-1", "vejnavn": "Vestergade"},
        {"id_lokalId": "vej-2", "vejnavn": "Østergade"}
    ],
    "NavngivenVejKommunedelList": [
        {"navngivenVej": "vej-1", "kommune": "0751", "vejkode": "1234"},
        {"navngivenVej": "vej-1", "kommune": "0999", "vejkode": "9999"},
        {"navngivenVej": "vej-2", "kommune": "0751", "vejkode": "5678"}
    ],
    "PostnummerList": [
        {"id_lokalId": "pn-1", "postnr": "8000", "navn": "Aarhus C"},
        {"id_lokalId": "pn-2", "postnr": "8200", "navn": "Aarhus N"},
        {"id_lokalId": "pn-1", "postnr": "8001", "navn": "Aarhus C"}
    ]
}"#;

/// Districts before the parcels that reference them
const MAT_DISTRICTS_FIRST: &str = r#"{
    "EjerlavList": [{"id_lokalId": "ej-1", "ejerlavsnavn": "Aarhus Bygrunde"}],
    "JordstykkeList": [
        {
            "id_lokalId": "js-1", "matrikelnummer": "12a", "ejerlavLokalId": "ej-1",
            "virkningFra": "2024-06-14T00:00:00.000000+02:00",
            "registreringFra": "2024-06-14T00:00:00.000000+02:00"
        },
        {
            "id_lokalId": "js-2", "matrikelnummer": "3b", "ejerlavLokalId": "ej-1",
            "virkningFra": "2024-06-14T00:00:00.000000+02:00", "virkningTil": "2024-06-15T00:00:00.000000+02:00",
            "registreringFra": "2024-06-14T00:00:00.000000+02:00"
        }
    ]
}"#;

async fn convert(strategy: PassStrategy, dar: &str, mat: &str) -> MemorySinks {
    let (processor, sinks) = processor(config(strategy), dar, mat);
    processor.run().await.unwrap();
    sinks
}

fn assert_expected_outputs(sinks: &MemorySinks, label: &str) {
    assert_eq!(rows(sinks, ExporterKind::RoadName), ROAD_NAME_ROWS, "{label}");
    assert_eq!(rows(sinks, ExporterKind::PostCode), POST_CODE_ROWS, "{label}");
    assert_eq!(rows(sinks, ExporterKind::AddressAccess), ADDRESS_ACCESS_ROWS, "{label}");
    assert_eq!(rows(sinks, ExporterKind::AddressSpecific), ADDRESS_SPECIFIC_ROWS, "{label}");
}

#[tokio::test]
async fn test_strategies_agree_on_fixture_order() {
    for strategy in [PassStrategy::SinglePass, PassStrategy::Reopen] {
        let sinks = convert(strategy, DAR, MAT).await;
        assert_expected_outputs(&sinks, &format!("{strategy:?}"));
    }
}

#[tokio::test]
async fn test_strategies_agree_on_reordered_lists() {
    for strategy in [PassStrategy::SinglePass, PassStrategy::Reopen] {
        let sinks = convert(strategy, DAR_REORDERED, MAT_DISTRICTS_FIRST).await;
        assert_expected_outputs(&sinks, &format!("{strategy:?} reordered"));
    }
}

#[tokio::test]
async fn test_outputs_are_byte_identical_across_strategies() {
    let single = convert(PassStrategy::SinglePass, DAR, MAT).await;
    let reopen = convert(PassStrategy::Reopen, DAR, MAT).await;

    for kind in ExporterKind::ALL {
        assert_eq!(
            single.contents(kind.output_file()),
            reopen.contents(kind.output_file()),
            "{kind}"
        );
    }
}
