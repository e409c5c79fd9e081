//! Folding scanned registry lists into lookup tables
//!
//! The DAR pass builds postal codes and road segments; the MAT pass builds
//! ownership districts and joins them into the parcel table. Under
//! [`PassStrategy::SinglePass`] each document is read once and tables are
//! filled as their lists pass by. When `JordstykkeList` is reached before
//! `EjerlavList`, the districts are read from a second cursor at that point so
//! parcels are joined as they stream past. Under [`PassStrategy::Reopen`]
//! every list gets its own cursor, dependencies first.

use super::{
    DuplicatePolicy, LookupTable, OwnershipDistrictTable, ParcelTable, PositionTable,
    PostalCodeTable, RoadSegmentTable, ownership_district_table, parcel_table, position_table,
    postal_code_table, road_segment_table,
};
use crate::config::{ConverterConfig, PassStrategy};
use crate::constants::lists;
use crate::error::Result;
use crate::models::{CadastralParcel, PostalCode, RoadSegment};
use crate::progress::{ProgressObserver, ProgressTicker};
use crate::scanner::records::{
    AdressepunktElement, EjerlavElement, JordstykkeElement, PostnummerElement,
    VejKommunedelElement, non_empty,
};
use crate::scanner::{FieldValues, ListOutcome, ListRecord, ListVisitor};
use crate::storage::{SourceDocument, SourceProvider, open_scanner};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings shared by the lookup passes
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub strategy: PassStrategy,
    pub buffer_size: usize,
    pub progress_interval: u64,
    pub reference_date: NaiveDate,
}

impl BuildOptions {
    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            strategy: config.pass_strategy,
            buffer_size: config.read_buffer_size,
            progress_interval: config.progress_interval,
            reference_date: config.effective_reference_date(),
        }
    }
}

/// Which shared tables the selected exporters need
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LookupNeeds {
    pub postal_codes: bool,
    pub road_segments: bool,
    pub parcels: bool,
}

impl LookupNeeds {
    pub fn needs_dar(&self) -> bool {
        self.postal_codes || self.road_segments
    }

    pub fn needs_mat(&self) -> bool {
        self.parcels
    }
}

/// Output of the DAR lookup pass
#[derive(Debug, Clone)]
pub struct DarLookups {
    pub postal_codes: PostalCodeTable,
    pub road_segments: RoadSegmentTable,
}

/// Output of the MAT lookup pass
#[derive(Debug, Clone)]
pub struct MatLookups {
    pub parcels: ParcelTable,
    /// Size of the intermediate district table, which is dropped after the join
    pub ownership_districts: usize,
    pub not_current: u64,
    pub unresolved: u64,
}

// =============================================================================
// Element folds
// =============================================================================

/// Postal codes are keyed by id; missing code or name become empty strings
pub fn fold_postnummer(table: &mut PostalCodeTable, element: PostnummerElement) {
    let Some(id) = element.id.filter(|id| !id.is_empty()) else {
        return;
    };
    table.insert(
        id,
        PostalCode {
            code: element.postnr.unwrap_or_default(),
            district_name: element.navn.unwrap_or_default(),
        },
    );
}

/// Road segments need a road reference and both codes present
pub fn fold_road_segment(table: &mut RoadSegmentTable, element: VejKommunedelElement) {
    let (Some(road), Some(municipality_code), Some(road_code)) =
        (element.navngiven_vej, element.kommune, element.vejkode)
    else {
        return;
    };
    if road.is_empty() {
        return;
    }
    table.insert(
        road,
        RoadSegment {
            municipality_code,
            road_code,
        },
    );
}

pub fn fold_ownership_district(table: &mut OwnershipDistrictTable, element: EjerlavElement) {
    if let (Some(id), Some(name)) = (non_empty(&element.id), non_empty(&element.ejerlavsnavn)) {
        table.insert(id.to_string(), name.to_string());
    }
}

pub fn fold_position(table: &mut PositionTable, element: AdressepunktElement) {
    if let (Some(id), Some(position)) = (non_empty(&element.id), non_empty(&element.position)) {
        table.insert(id.to_string(), position.to_string());
    }
}

/// A current parcel ready to be joined with its ownership district
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParcelCandidate {
    id: String,
    parcel_number: String,
    district_id: String,
}

#[derive(Debug, Default)]
struct ParcelFold {
    not_current: u64,
    unresolved: u64,
}

impl ParcelFold {
    fn candidate(
        &mut self,
        element: JordstykkeElement,
        reference_date: NaiveDate,
    ) -> Option<ParcelCandidate> {
        let JordstykkeElement {
            id,
            matrikelnummer,
            ejerlav_lokal_id,
            validity,
        } = element;

        if !validity.is_current(reference_date) {
            self.not_current += 1;
            return None;
        }

        Some(ParcelCandidate {
            id: id.filter(|v| !v.is_empty())?,
            parcel_number: matrikelnummer.filter(|v| !v.is_empty())?,
            district_id: ejerlav_lokal_id.filter(|v| !v.is_empty())?,
        })
    }

    fn resolve(
        &mut self,
        candidate: ParcelCandidate,
        districts: &OwnershipDistrictTable,
        parcels: &mut ParcelTable,
    ) {
        match districts.get(&candidate.district_id) {
            Some(name) => {
                parcels.insert(
                    candidate.id,
                    CadastralParcel {
                        parcel_number: candidate.parcel_number,
                        ownership_district: name.clone(),
                    },
                );
            }
            None => self.unresolved += 1,
        }
    }
}

fn log_table<V>(table: &LookupTable<V>) {
    info!("Built {} lookup with {} entries", table.name(), table.len());
    if table.duplicates() > 0 {
        match table.policy() {
            DuplicatePolicy::FirstWins => debug!(
                "{}: kept first value for {} repeated keys",
                table.name(),
                table.duplicates()
            ),
            DuplicatePolicy::Overwrite => warn!(
                "{}: {} repeated keys overwritten by later entries",
                table.name(),
                table.duplicates()
            ),
        }
    }
}

// =============================================================================
// DAR lookups
// =============================================================================

/// Single-pass visitor for the DAR lookup lists
struct DarLookupPass {
    remaining: Vec<&'static str>,
    postal_codes: PostalCodeTable,
    road_segments: RoadSegmentTable,
    ticker: ProgressTicker,
}

impl ListVisitor for DarLookupPass {
    fn projection(&mut self, property: &str) -> Option<&'static [&'static str]> {
        if !self.remaining.iter().any(|list| *list == property) {
            return None;
        }
        match property {
            lists::POSTNUMMER => Some(PostnummerElement::FIELDS),
            lists::NAVNGIVEN_VEJ_KOMMUNEDEL => Some(VejKommunedelElement::FIELDS),
            _ => None,
        }
    }

    fn element(&mut self, property: &str, fields: FieldValues) -> Result<()> {
        match property {
            lists::POSTNUMMER => {
                fold_postnummer(&mut self.postal_codes, PostnummerElement::from_fields(fields))
            }
            lists::NAVNGIVEN_VEJ_KOMMUNEDEL => fold_road_segment(
                &mut self.road_segments,
                VejKommunedelElement::from_fields(fields),
            ),
            _ => {}
        }
        self.ticker.tick();
        Ok(())
    }

    fn list_complete(&mut self, outcome: &ListOutcome) -> Result<()> {
        debug!("{}: {} elements", outcome.name, outcome.elements);
        self.remaining.retain(|list| *list != outcome.name);
        Ok(())
    }

    fn is_satisfied(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Build the postal code and road segment tables the caller needs
pub fn build_dar_lookups(
    sources: &dyn SourceProvider,
    needs: LookupNeeds,
    options: &BuildOptions,
    observer: Arc<dyn ProgressObserver>,
) -> Result<DarLookups> {
    let mut wanted = Vec::new();
    if needs.postal_codes {
        wanted.push(lists::POSTNUMMER);
    }
    if needs.road_segments {
        wanted.push(lists::NAVNGIVEN_VEJ_KOMMUNEDEL);
    }

    let lookups = if wanted.is_empty() {
        DarLookups {
            postal_codes: postal_code_table(),
            road_segments: road_segment_table(),
        }
    } else {
        match options.strategy {
            PassStrategy::SinglePass => {
                let mut pass = DarLookupPass {
                    remaining: wanted.clone(),
                    postal_codes: postal_code_table(),
                    road_segments: road_segment_table(),
                    ticker: ProgressTicker::start(observer, "DAR lookups", options.progress_interval),
                };
                let summary = open_scanner(sources, SourceDocument::Dar, options.buffer_size)?
                    .scan(&mut pass)?;
                summary.warn_structural(&wanted);
                pass.ticker.finish();

                DarLookups {
                    postal_codes: pass.postal_codes,
                    road_segments: pass.road_segments,
                }
            }
            PassStrategy::Reopen => {
                let mut postal_codes = postal_code_table();
                let mut road_segments = road_segment_table();

                if needs.postal_codes {
                    let mut ticker =
                        ProgressTicker::start(observer.clone(), lists::POSTNUMMER, options.progress_interval);
                    open_scanner(sources, SourceDocument::Dar, options.buffer_size)?
                        .scan_list::<PostnummerElement, _>(lists::POSTNUMMER, |element| {
                            fold_postnummer(&mut postal_codes, element);
                            ticker.tick();
                            Ok(())
                        })?;
                    ticker.finish();
                }

                if needs.road_segments {
                    let mut ticker = ProgressTicker::start(
                        observer,
                        lists::NAVNGIVEN_VEJ_KOMMUNEDEL,
                        options.progress_interval,
                    );
                    open_scanner(sources, SourceDocument::Dar, options.buffer_size)?
                        .scan_list::<VejKommunedelElement, _>(lists::NAVNGIVEN_VEJ_KOMMUNEDEL, |element| {
                            fold_road_segment(&mut road_segments, element);
                            ticker.tick();
                            Ok(())
                        })?;
                    ticker.finish();
                }

                DarLookups {
                    postal_codes,
                    road_segments,
                }
            }
        }
    };

    if needs.postal_codes {
        log_table(&lookups.postal_codes);
    }
    if needs.road_segments {
        log_table(&lookups.road_segments);
    }
    Ok(lookups)
}

// =============================================================================
// MAT lookups
// =============================================================================

/// Single-pass visitor for the MAT lookup lists
struct MatLookupPass<'a> {
    sources: &'a dyn SourceProvider,
    options: &'a BuildOptions,
    observer: Arc<dyn ProgressObserver>,
    remaining: Vec<&'static str>,
    districts: OwnershipDistrictTable,
    districts_complete: bool,
    districts_reopened: bool,
    parcels: ParcelTable,
    fold: ParcelFold,
    ticker: ProgressTicker,
}

impl ListVisitor for MatLookupPass<'_> {
    fn projection(&mut self, property: &str) -> Option<&'static [&'static str]> {
        if !self.remaining.iter().any(|list| *list == property) {
            return None;
        }
        match property {
            lists::EJERLAV => Some(EjerlavElement::FIELDS),
            lists::JORDSTYKKE => Some(JordstykkeElement::FIELDS),
            _ => None,
        }
    }

    fn list_started(&mut self, property: &str) -> Result<()> {
        if property == lists::JORDSTYKKE && !self.districts_complete {
            debug!(
                "{} precedes {}; reading districts from a second cursor",
                lists::JORDSTYKKE,
                lists::EJERLAV
            );
            self.districts =
                read_ownership_districts(self.sources, self.options, self.observer.clone())?;
            self.districts_complete = true;
            self.districts_reopened = true;
            self.remaining.retain(|list| *list != lists::EJERLAV);
        }
        Ok(())
    }

    fn element(&mut self, property: &str, fields: FieldValues) -> Result<()> {
        match property {
            lists::EJERLAV => {
                fold_ownership_district(&mut self.districts, EjerlavElement::from_fields(fields))
            }
            lists::JORDSTYKKE => {
                let element = JordstykkeElement::from_fields(fields);
                if let Some(candidate) = self.fold.candidate(element, self.options.reference_date) {
                    self.fold.resolve(candidate, &self.districts, &mut self.parcels);
                }
            }
            _ => {}
        }
        self.ticker.tick();
        Ok(())
    }

    fn list_complete(&mut self, outcome: &ListOutcome) -> Result<()> {
        debug!("{}: {} elements", outcome.name, outcome.elements);
        self.remaining.retain(|list| *list != outcome.name);
        if outcome.name == lists::EJERLAV {
            self.districts_complete = true;
        }
        Ok(())
    }

    fn is_satisfied(&self) -> bool {
        self.remaining.is_empty()
    }
}

/// Read the ownership district table with a dedicated cursor
fn read_ownership_districts(
    sources: &dyn SourceProvider,
    options: &BuildOptions,
    observer: Arc<dyn ProgressObserver>,
) -> Result<OwnershipDistrictTable> {
    let mut districts = ownership_district_table();
    let mut ticker = ProgressTicker::start(observer, lists::EJERLAV, options.progress_interval);
    open_scanner(sources, SourceDocument::Mat, options.buffer_size)?.scan_list::<EjerlavElement, _>(
        lists::EJERLAV,
        |element| {
            fold_ownership_district(&mut districts, element);
            ticker.tick();
            Ok(())
        },
    )?;
    ticker.finish();
    Ok(districts)
}

/// Build the current-parcel table joined with ownership district names
pub fn build_mat_lookups(
    sources: &dyn SourceProvider,
    needs: LookupNeeds,
    options: &BuildOptions,
    observer: Arc<dyn ProgressObserver>,
) -> Result<MatLookups> {
    if !needs.needs_mat() {
        return Ok(MatLookups {
            parcels: parcel_table(),
            ownership_districts: 0,
            not_current: 0,
            unresolved: 0,
        });
    }

    let wanted = [lists::EJERLAV, lists::JORDSTYKKE];
    let (parcels, districts, fold) = match options.strategy {
        PassStrategy::SinglePass => {
            let mut pass = MatLookupPass {
                sources,
                options,
                observer: observer.clone(),
                remaining: wanted.to_vec(),
                districts: ownership_district_table(),
                districts_complete: false,
                districts_reopened: false,
                parcels: parcel_table(),
                fold: ParcelFold::default(),
                ticker: ProgressTicker::start(observer, "MAT lookups", options.progress_interval),
            };
            let summary = open_scanner(sources, SourceDocument::Mat, options.buffer_size)?
                .scan(&mut pass)?;
            if pass.districts_reopened {
                summary.warn_structural(&[lists::JORDSTYKKE]);
            } else {
                summary.warn_structural(&wanted);
            }
            pass.ticker.finish();

            (pass.parcels, pass.districts, pass.fold)
        }
        PassStrategy::Reopen => {
            let districts = read_ownership_districts(sources, options, observer.clone())?;
            let mut parcels = parcel_table();
            let mut fold = ParcelFold::default();

            let reference_date = options.reference_date;
            let mut ticker =
                ProgressTicker::start(observer, lists::JORDSTYKKE, options.progress_interval);
            open_scanner(sources, SourceDocument::Mat, options.buffer_size)?.scan_list::<JordstykkeElement, _>(
                lists::JORDSTYKKE,
                |element| {
                    if let Some(candidate) = fold.candidate(element, reference_date) {
                        fold.resolve(candidate, &districts, &mut parcels);
                    }
                    ticker.tick();
                    Ok(())
                },
            )?;
            ticker.finish();

            (parcels, districts, fold)
        }
    };

    log_table(&districts);
    log_table(&parcels);
    if fold.not_current > 0 {
        info!("Skipped {} parcels that are not currently valid", fold.not_current);
    }
    if fold.unresolved > 0 {
        warn!(
            "{} current parcels reference an unknown ownership district",
            fold.unresolved
        );
    }

    Ok(MatLookups {
        parcels,
        ownership_districts: districts.len(),
        not_current: fold.not_current,
        unresolved: fold.unresolved,
    })
}

/// Build the address point position table with a dedicated cursor
pub fn build_positions(
    sources: &dyn SourceProvider,
    options: &BuildOptions,
    observer: Arc<dyn ProgressObserver>,
) -> Result<PositionTable> {
    let mut positions = position_table();
    let mut ticker = ProgressTicker::start(observer, lists::ADRESSEPUNKT, options.progress_interval);

    open_scanner(sources, SourceDocument::Dar, options.buffer_size)?.scan_list::<AdressepunktElement, _>(
        lists::ADRESSEPUNKT,
        |element| {
            fold_position(&mut positions, element);
            ticker.tick();
            Ok(())
        },
    )?;
    ticker.finish();

    log_table(&positions);
    Ok(positions)
}
