// crates/locref-core/src/validate.rs
//! # Save Pipeline
//!
//! Entity validation and parent-derived field maintenance, run by every
//! [`GeoStore::save`](crate::store::GeoStore::save):
//!
//! 1. `before_insert` back-fill for fresh records (codes copied down from
//!    the parent chain when missing),
//! 2. per-entity validation,
//! 3. `last_updated` stamp.
//!
//! The hierarchy rules live here: a state's `country_code` must agree with
//! its parent country and is overwritten from it on every save; a city's
//! `country`, `country_code` and `state_code` are always re-derived from
//! its parent state. Countries are looser: their region/subregion links
//! are not checked against the store.

use chrono::{DateTime, Utc};
use tracing::info;

use crate::error::{StoreResult, ValidationError};
use crate::model::{City, Country, EntityKind, GeoRecord, Region, State, Subregion};
use crate::store::{Filter, FilterField, GeoStore};

/// Runs the full write-side pipeline on `record`.
///
/// `previous` is the stored version under the record's current key, `None`
/// for an insert. Mutates the record in place (back-fills, derived fields,
/// timestamp); on error the record must not be persisted.
pub fn save_pipeline(
    store: &dyn GeoStore,
    record: &mut GeoRecord,
    previous: Option<&GeoRecord>,
    now: DateTime<Utc>,
) -> StoreResult<()> {
    if previous.is_none() {
        before_insert(store, record)?;
    }

    match record {
        GeoRecord::Region(r) => {
            validate_region(store, r, previous.and_then(GeoRecord::as_region))?
        }
        GeoRecord::Subregion(s) => {
            validate_subregion(store, s, previous.and_then(GeoRecord::as_subregion))?
        }
        GeoRecord::Country(c) => validate_country(c)?,
        GeoRecord::State(s) => validate_state(store, s)?,
        GeoRecord::City(c) => validate_city(store, c)?,
    }

    record.set_last_updated(now);
    Ok(())
}

/// Post-insert hook. Regions and subregions announce themselves.
pub(crate) fn after_insert(record: &GeoRecord) {
    match record {
        GeoRecord::Region(r) => info!(region = %r.region_name, "new region created"),
        GeoRecord::Subregion(s) => info!(subregion = %s.subregion_name, "new subregion created"),
        _ => {}
    }
}

/// Copies missing code fields down from the parent chain before a fresh
/// record is validated. A dangling parent link is left for validation to
/// report.
fn before_insert(store: &dyn GeoStore, record: &mut GeoRecord) -> StoreResult<()> {
    match record {
        GeoRecord::State(s) if !s.country.is_empty() && s.country_code.is_empty() => {
            if let Some(parent) = load_country(store, &s.country)? {
                s.country_code = parent.code;
            }
        }
        GeoRecord::City(c) if !c.state.is_empty() && c.state_code.is_empty() => {
            if let Some(parent) = load_state(store, &c.state)? {
                c.state_code = parent.state_code;
                c.country = parent.country;
                c.country_code = parent.country_code;
            }
        }
        _ => {}
    }
    Ok(())
}

fn validate_region(
    store: &dyn GeoStore,
    region: &Region,
    previous: Option<&Region>,
) -> StoreResult<()> {
    if region.region_name.is_empty() {
        return Err(ValidationError::MissingName {
            kind: EntityKind::Region,
        }
        .into());
    }
    let name_changed = previous.map_or(true, |p| p.region_name != region.region_name);
    if name_changed {
        assert_unique_name(store, EntityKind::Region, &region.region_name, &region.key)?;
    }
    Ok(())
}

fn validate_subregion(
    store: &dyn GeoStore,
    subregion: &Subregion,
    previous: Option<&Subregion>,
) -> StoreResult<()> {
    if subregion.subregion_name.is_empty() {
        return Err(ValidationError::MissingName {
            kind: EntityKind::Subregion,
        }
        .into());
    }
    if subregion.region.is_empty() {
        return Err(ValidationError::MissingField {
            kind: EntityKind::Subregion,
            field: "region",
        }
        .into());
    }
    if store.get(EntityKind::Region, &subregion.region)?.is_none() {
        return Err(ValidationError::MissingParent {
            kind: EntityKind::Subregion,
            key: subregion.subregion_name.clone(),
            parent: EntityKind::Region,
            parent_key: subregion.region.clone(),
        }
        .into());
    }
    let name_changed = previous.map_or(true, |p| p.subregion_name != subregion.subregion_name);
    if name_changed {
        assert_unique_name(
            store,
            EntityKind::Subregion,
            &subregion.subregion_name,
            &subregion.key,
        )?;
    }
    Ok(())
}

fn validate_country(country: &Country) -> StoreResult<()> {
    if country.country_name.is_empty() {
        return Err(ValidationError::MissingName {
            kind: EntityKind::Country,
        }
        .into());
    }
    Ok(())
}

fn validate_state(store: &dyn GeoStore, state: &mut State) -> StoreResult<()> {
    if state.state_name.is_empty() {
        return Err(ValidationError::MissingName {
            kind: EntityKind::State,
        }
        .into());
    }
    if state.country.is_empty() {
        return Err(ValidationError::MissingField {
            kind: EntityKind::State,
            field: "country",
        }
        .into());
    }
    let parent = load_country(store, &state.country)?.ok_or_else(|| {
        ValidationError::MissingParent {
            kind: EntityKind::State,
            key: state.state_name.clone(),
            parent: EntityKind::Country,
            parent_key: state.country.clone(),
        }
    })?;

    if !state.country_code.is_empty() && state.country_code != parent.code {
        return Err(ValidationError::CountryCodeMismatch {
            state: state.state_name.clone(),
            expected: parent.code,
            got: state.country_code.clone(),
        }
        .into());
    }
    state.country_code = parent.code;
    Ok(())
}

fn validate_city(store: &dyn GeoStore, city: &mut City) -> StoreResult<()> {
    if city.city_name.is_empty() {
        return Err(ValidationError::MissingName {
            kind: EntityKind::City,
        }
        .into());
    }
    if city.state.is_empty() {
        return Err(ValidationError::MissingField {
            kind: EntityKind::City,
            field: "state",
        }
        .into());
    }
    let parent = load_state(store, &city.state)?.ok_or_else(|| ValidationError::MissingParent {
        kind: EntityKind::City,
        key: city.city_name.clone(),
        parent: EntityKind::State,
        parent_key: city.state.clone(),
    })?;

    if !city.country.is_empty() && city.country != parent.country {
        return Err(ValidationError::CountryMismatch {
            city: city.city_name.clone(),
            state: city.state.clone(),
            expected: parent.country,
            got: city.country.clone(),
        }
        .into());
    }
    city.country = parent.country;
    city.country_code = parent.country_code;
    city.state_code = parent.state_code;
    Ok(())
}

fn assert_unique_name(
    store: &dyn GeoStore,
    kind: EntityKind,
    name: &str,
    self_key: &str,
) -> StoreResult<()> {
    if let Some(found) = store.lookup(kind, &Filter::eq(FilterField::Name, name))? {
        if found != self_key {
            return Err(ValidationError::DuplicateName {
                kind,
                name: name.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn load_country(store: &dyn GeoStore, key: &str) -> StoreResult<Option<Country>> {
    Ok(store
        .get(EntityKind::Country, key)?
        .and_then(GeoRecord::into_country))
}

fn load_state(store: &dyn GeoStore, key: &str) -> StoreResult<Option<State>> {
    Ok(store
        .get(EntityKind::State, key)?
        .and_then(GeoRecord::into_state))
}
