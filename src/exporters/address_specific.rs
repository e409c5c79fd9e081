//! `AddressSpecific.csv`: one row per unit address, fields copied as-is

use super::{ExportContext, ExporterKind};
use crate::constants::lists;
use crate::error::Result;
use crate::models::UnitAddressRecord;
use crate::scanner::records::AdresseElement;
use crate::storage::SourceDocument;

impl From<AdresseElement> for UnitAddressRecord {
    fn from(element: AdresseElement) -> Self {
        Self {
            unit_address_id: element.id.unwrap_or_default(),
            building_address_id: element.husnummer.unwrap_or_default(),
            floor: element.etagebetegnelse.unwrap_or_default(),
            door: element.doerbetegnelse.unwrap_or_default(),
        }
    }
}

pub fn export(ctx: &ExportContext) -> Result<u64> {
    let mut sink = ctx.sink(ExporterKind::AddressSpecific)?;
    let mut ticker = ctx.ticker(ExporterKind::AddressSpecific.output_file());

    ctx.scanner(SourceDocument::Dar)?
        .scan_list::<AdresseElement, _>(lists::ADRESSE, |element| {
            ticker.tick();
            sink.write(&UnitAddressRecord::from(element))
        })?;

    ticker.finish();
    sink.finish()
}
