// crates/locref-core/src/resolver.rs
//! # Reference Resolver
//!
//! Key lookups that tie child records to already-imported parents. All of
//! them answer `Ok(None)` for "no such parent"; callers decide whether
//! that skips the record or links nothing.

use crate::error::StoreResult;
use crate::model::EntityKind;
use crate::store::{Filter, FilterField, GeoStore, RecordKey};

/// Region by upstream row id. Used while importing subregions.
pub fn region_by_external_id(
    store: &dyn GeoStore,
    external_id: &str,
) -> StoreResult<Option<RecordKey>> {
    store.lookup(
        EntityKind::Region,
        &Filter::eq(FilterField::ExternalId, external_id),
    )
}

/// Region by its display name. Used for the optional country link.
pub fn region_by_name(store: &dyn GeoStore, name: &str) -> StoreResult<Option<RecordKey>> {
    store.lookup(EntityKind::Region, &Filter::eq(FilterField::Name, name))
}

/// Subregion by its display name. Used for the optional country link.
pub fn subregion_by_name(store: &dyn GeoStore, name: &str) -> StoreResult<Option<RecordKey>> {
    store.lookup(EntityKind::Subregion, &Filter::eq(FilterField::Name, name))
}

/// Country by ISO2 code. Codes are stored lowercase, so the input is
/// normalized before matching; `country_by_code(store, "US")` and
/// `country_by_code(store, "us")` resolve the same record.
pub fn country_by_code(store: &dyn GeoStore, code: &str) -> StoreResult<Option<RecordKey>> {
    let code = code.trim().to_lowercase();
    if code.is_empty() {
        return Ok(None);
    }
    store.lookup(EntityKind::Country, &Filter::eq(FilterField::Code, code))
}

/// State by name, which is also its key.
pub fn state_by_name(store: &dyn GeoStore, name: &str) -> StoreResult<Option<RecordKey>> {
    Ok(store
        .get(EntityKind::State, name)?
        .map(|record| record.key().to_string()))
}

/// The country match chain used by the importer: ISO2 first, then ISO3,
/// then exact name. First hit wins.
pub fn country_for_upsert(
    store: &dyn GeoStore,
    iso2: Option<&str>,
    iso3: Option<&str>,
    name: &str,
) -> StoreResult<Option<RecordKey>> {
    if let Some(code) = iso2.map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(key) = store.lookup(
            EntityKind::Country,
            &Filter::eq(FilterField::Code, code.to_lowercase()),
        )? {
            return Ok(Some(key));
        }
    }
    if let Some(code) = iso3.map(str::trim).filter(|c| !c.is_empty()) {
        if let Some(key) = store.lookup(
            EntityKind::Country,
            &Filter::eq(FilterField::Iso3, code.to_lowercase()),
        )? {
            return Ok(Some(key));
        }
    }
    store.lookup(EntityKind::Country, &Filter::eq(FilterField::Name, name))
}
