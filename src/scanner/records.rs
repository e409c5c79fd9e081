//! Typed projections of the registry entity lists
//!
//! Each record captures only the element properties the converter uses.
//! Every captured value is an optional string: missing properties, `null`
//! and non-string tokens all arrive as `None`.

use super::projection::{FieldValues, ListRecord};
use crate::constants::{fields, lists};
use crate::lookup::temporal::ValidityWindow;

/// `PostnummerList` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostnummerElement {
    pub id: Option<String>,
    pub postnr: Option<String>,
    pub navn: Option<String>,
}

impl ListRecord for PostnummerElement {
    const LIST: &'static str = lists::POSTNUMMER;
    const FIELDS: &'static [&'static str] = &[fields::ID_LOKAL_ID, fields::POSTNR, fields::NAVN];

    fn from_fields(mut f: FieldValues) -> Self {
        Self {
            id: f.take(fields::ID_LOKAL_ID),
            postnr: f.take(fields::POSTNR),
            navn: f.take(fields::NAVN),
        }
    }
}

/// `NavngivenVejKommunedelList` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VejKommunedelElement {
    pub navngiven_vej: Option<String>,
    pub kommune: Option<String>,
    pub vejkode: Option<String>,
}

impl ListRecord for VejKommunedelElement {
    const LIST: &'static str = lists::NAVNGIVEN_VEJ_KOMMUNEDEL;
    const FIELDS: &'static [&'static str] =
        &[fields::NAVNGIVEN_VEJ, fields::KOMMUNE, fields::VEJKODE];

    fn from_fields(mut f: FieldValues) -> Self {
        Self {
            navngiven_vej: f.take(fields::NAVNGIVEN_VEJ),
            kommune: f.take(fields::KOMMUNE),
            vejkode: f.take(fields::VEJKODE),
        }
    }
}

/// `NavngivenVejList` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavngivenVejElement {
    pub id: Option<String>,
    pub vejnavn: Option<String>,
}

impl ListRecord for NavngivenVejElement {
    const LIST: &'static str = lists::NAVNGIVEN_VEJ;
    const FIELDS: &'static [&'static str] = &[fields::ID_LOKAL_ID, fields::VEJNAVN];

    fn from_fields(mut f: FieldValues) -> Self {
        Self {
            id: f.take(fields::ID_LOKAL_ID),
            vejnavn: f.take(fields::VEJNAVN),
        }
    }
}

/// `HusnummerList` element: one access point with its foreign keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HusnummerElement {
    pub adgangspunkt: Option<String>,
    pub husnummertekst: Option<String>,
    pub postnummer: Option<String>,
    pub navngiven_vej: Option<String>,
    pub jordstykke: Option<String>,
}

impl ListRecord for HusnummerElement {
    const LIST: &'static str = lists::HUSNUMMER;
    const FIELDS: &'static [&'static str] = &[
        fields::ADGANGSPUNKT,
        fields::HUSNUMMERTEKST,
        fields::POSTNUMMER,
        fields::NAVNGIVEN_VEJ,
        fields::JORDSTYKKE,
    ];

    fn from_fields(mut f: FieldValues) -> Self {
        Self {
            adgangspunkt: f.take(fields::ADGANGSPUNKT),
            husnummertekst: f.take(fields::HUSNUMMERTEKST),
            postnummer: f.take(fields::POSTNUMMER),
            navngiven_vej: f.take(fields::NAVNGIVEN_VEJ),
            jordstykke: f.take(fields::JORDSTYKKE),
        }
    }
}

/// `AdressepunktList` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdressepunktElement {
    pub id: Option<String>,
    pub position: Option<String>,
}

impl ListRecord for AdressepunktElement {
    const LIST: &'static str = lists::ADRESSEPUNKT;
    const FIELDS: &'static [&'static str] = &[fields::ID_LOKAL_ID, fields::POSITION];

    fn from_fields(mut f: FieldValues) -> Self {
        Self {
            id: f.take(fields::ID_LOKAL_ID),
            position: f.take(fields::POSITION),
        }
    }
}

/// `AdresseList` element: a unit address inside an access point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdresseElement {
    pub id: Option<String>,
    pub husnummer: Option<String>,
    pub etagebetegnelse: Option<String>,
    pub doerbetegnelse: Option<String>,
}

impl ListRecord for AdresseElement {
    const LIST: &'static str = lists::ADRESSE;
    const FIELDS: &'static [&'static str] = &[
        fields::ID_LOKAL_ID,
        fields::HUSNUMMER,
        fields::ETAGEBETEGNELSE,
        fields::DOERBETEGNELSE,
    ];

    fn from_fields(mut f: FieldValues) -> Self {
        Self {
            id: f.take(fields::ID_LOKAL_ID),
            husnummer: f.take(fields::HUSNUMMER),
            etagebetegnelse: f.take(fields::ETAGEBETEGNELSE),
            doerbetegnelse: f.take(fields::DOERBETEGNELSE),
        }
    }
}

/// `EjerlavList` element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EjerlavElement {
    pub id: Option<String>,
    pub ejerlavsnavn: Option<String>,
}

impl ListRecord for EjerlavElement {
    const LIST: &'static str = lists::EJERLAV;
    const FIELDS: &'static [&'static str] = &[fields::ID_LOKAL_ID, fields::EJERLAVSNAVN];

    fn from_fields(mut f: FieldValues) -> Self {
        Self {
            id: f.take(fields::ID_LOKAL_ID),
            ejerlavsnavn: f.take(fields::EJERLAVSNAVN),
        }
    }
}

/// `JordstykkeList` element with its validity window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JordstykkeElement {
    pub id: Option<String>,
    pub matrikelnummer: Option<String>,
    pub ejerlav_lokal_id: Option<String>,
    pub validity: ValidityWindow,
}

impl ListRecord for JordstykkeElement {
    const LIST: &'static str = lists::JORDSTYKKE;
    const FIELDS: &'static [&'static str] = &[
        fields::ID_LOKAL_ID,
        fields::MATRIKELNUMMER,
        fields::EJERLAV_LOKAL_ID,
        fields::VIRKNING_FRA,
        fields::VIRKNING_TIL,
        fields::REGISTRERING_FRA,
        fields::REGISTRERING_TIL,
    ];

    fn from_fields(mut f: FieldValues) -> Self {
        Self {
            id: f.take(fields::ID_LOKAL_ID),
            matrikelnummer: f.take(fields::MATRIKELNUMMER),
            ejerlav_lokal_id: f.take(fields::EJERLAV_LOKAL_ID),
            validity: ValidityWindow {
                virkning_fra: f.take(fields::VIRKNING_FRA),
                virkning_til: f.take(fields::VIRKNING_TIL),
                registrering_fra: f.take(fields::REGISTRERING_FRA),
                registrering_til: f.take(fields::REGISTRERING_TIL),
            },
        }
    }
}

/// Non-empty string value, treating `""` like a missing field
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
