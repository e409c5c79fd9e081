//! Registry list names, element field names, CSV schemas and defaults
//!
//! Field names are the exact JSON keys used by the Datafordeler DAR and MAT
//! total exports.

// =============================================================================
// Source documents
// =============================================================================

/// Default file-name prefix of the DAR (address) export
pub const DEFAULT_DAR_PREFIX: &str = "DAR_";

/// Default file-name prefix of the MAT (cadastral) export
pub const DEFAULT_MAT_PREFIX: &str = "MAT_";

/// Export archives ship a metadata document next to the data document
pub const METADATA_MARKER: &str = "metadata";

// =============================================================================
// Top-level entity lists
// =============================================================================

pub mod lists {
    pub const POSTNUMMER: &str = "PostnummerList";
    pub const NAVNGIVEN_VEJ_KOMMUNEDEL: &str = "NavngivenVejKommunedelList";
    pub const NAVNGIVEN_VEJ: &str = "NavngivenVejList";
    pub const HUSNUMMER: &str = "HusnummerList";
    pub const ADRESSEPUNKT: &str = "AdressepunktList";
    pub const ADRESSE: &str = "AdresseList";
    pub const EJERLAV: &str = "EjerlavList";
    pub const JORDSTYKKE: &str = "JordstykkeList";
}

// =============================================================================
// Element field names
// =============================================================================

pub mod fields {
    pub const ID_LOKAL_ID: &str = "id_lokalId";
    pub const POSTNR: &str = "postnr";
    pub const NAVN: &str = "navn";
    pub const NAVNGIVEN_VEJ: &str = "navngivenVej";
    pub const KOMMUNE: &str = "kommune";
    pub const VEJKODE: &str = "vejkode";
    pub const VEJNAVN: &str = "vejnavn";
    pub const ADGANGSPUNKT: &str = "adgangspunkt";
    pub const HUSNUMMERTEKST: &str = "husnummertekst";
    pub const POSTNUMMER: &str = "postnummer";
    pub const JORDSTYKKE: &str = "jordstykke";
    pub const POSITION: &str = "position";
    pub const MATRIKELNUMMER: &str = "matrikelnummer";
    pub const EJERLAV_LOKAL_ID: &str = "ejerlavLokalId";
    pub const EJERLAVSNAVN: &str = "ejerlavsnavn";
    pub const VIRKNING_FRA: &str = "virkningFra";
    pub const VIRKNING_TIL: &str = "virkningTil";
    pub const REGISTRERING_FRA: &str = "registreringFra";
    pub const REGISTRERING_TIL: &str = "registreringTil";
    pub const HUSNUMMER: &str = "husnummer";
    pub const ETAGEBETEGNELSE: &str = "etagebetegnelse";
    pub const DOERBETEGNELSE: &str = "dørbetegnelse";
}

// =============================================================================
// Output CSV files
// =============================================================================

pub mod outputs {
    pub const ROAD_NAME_FILE: &str = "RoadName.csv";
    pub const POST_CODE_FILE: &str = "PostCode.csv";
    pub const ADDRESS_ACCESS_FILE: &str = "AddressAccess.csv";
    pub const ADDRESS_SPECIFIC_FILE: &str = "AddressSpecific.csv";

    pub const ROAD_NAME_HEADER: &[&str] = &["MunicipalityCode", "StreetId", "Name"];

    pub const POST_CODE_HEADER: &[&str] = &["PostalCode", "", "PostalDistrictName"];

    /// The `?` column and the last six columns are reserved and always empty
    pub const ADDRESS_ACCESS_HEADER: &[&str] = &[
        "AddressAccessIdentifier",
        "StreetBuildingIdentifier",
        "BuildingName",
        "MunicipalityCode",
        "StreetCode",
        "PostCodeIdentifier",
        "CadastralDistrictName",
        "LandParcelIdentifier",
        "?",
        "DistrictName",
        "ETRS89utm32Easting",
        "ETRS89utm32Northing",
        "AddressTextAngleMeasure",
        "WGS84GeographicLatitude",
        "WGS84GeographicLongitude",
        "GeometryDDKNcell100mText",
        "GeometryDDKNcell1kmText",
        "GeometryDDKNcell10kmText",
    ];

    pub const ADDRESS_SPECIFIC_HEADER: &[&str] = &[
        "unitAddressId",
        "",
        "buildingAddressId",
        "",
        "",
        "",
        "floor",
        "door",
    ];

    pub const CSV_DELIMITER: u8 = b';';
}

// =============================================================================
// Defaults
// =============================================================================

/// Read buffer in front of each JSON cursor (1 MiB)
pub const DEFAULT_READ_BUFFER_SIZE: usize = 1024 * 1024;

/// Rows written between explicit sink flushes
pub const DEFAULT_FLUSH_INTERVAL: u64 = 10_000;

/// Records processed between progress notifications
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10_000;

/// Default output directory for the CSV files
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Application directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "datafordeler-converter";

/// Config file name inside the application config dir
pub const CONFIG_FILE_NAME: &str = "config.json";
