// crates/locref-core/src/model.rs
//! # Location Model
//!
//! The five entity levels of the reference hierarchy, in dependency order:
//! Region -> Subregion -> Country -> State -> City. Countries link upward
//! by name, states link to countries by key, cities link to states by key.
//!
//! Every record carries its store key (`key`). The key is assigned on first
//! save from the record's natural name and follows the name if it changes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::RecordKey;

// -----------------------------------------------------------------------------
// ENTITY KINDS
// -----------------------------------------------------------------------------

/// The five levels of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Region,
    Subregion,
    Country,
    State,
    City,
}

impl EntityKind {
    /// All levels, parents before children. Imports must run in this order.
    pub const IN_DEPENDENCY_ORDER: [EntityKind; 5] = [
        EntityKind::Region,
        EntityKind::Subregion,
        EntityKind::Country,
        EntityKind::State,
        EntityKind::City,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Region => "Region",
            EntityKind::Subregion => "Subregion",
            EntityKind::Country => "Country",
            EntityKind::State => "State",
            EntityKind::City => "City",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -----------------------------------------------------------------------------
// ENTITIES
// -----------------------------------------------------------------------------

/// A continental region ("Americas", "Asia").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Store key; empty until first save.
    pub key: RecordKey,
    pub region_name: String,
    /// Upstream row id, kept as text for stable matching.
    pub external_id: String,
    pub wikidata_id: String,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A subdivision of a region ("Northern America").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subregion {
    pub key: RecordKey,
    pub subregion_name: String,
    /// Key of the parent [`Region`].
    pub region: RecordKey,
    pub external_id: String,
    pub wikidata_id: String,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A country. Codes are stored lowercase; `code` (ISO2) is the primary
/// match column for states.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub key: RecordKey,
    pub country_name: String,
    /// ISO 3166-1 alpha-2, lowercase.
    pub code: String,
    /// ISO 3166-1 alpha-3, lowercase.
    pub iso3: String,
    pub numeric_code: String,
    pub phone_code: String,
    pub capital: String,
    pub currency_name: String,
    pub currency_symbol: String,
    pub tld: String,
    pub native: String,
    pub nationality: String,
    pub emoji: String,
    pub emoji_u: String,
    /// Key of the linked [`Region`], empty when unlinked.
    pub region: RecordKey,
    /// Key of the linked [`Subregion`], empty when unlinked.
    pub subregion: RecordKey,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub external_id: String,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A state or province. `country_code` always mirrors the parent country's
/// `code`; saves enforce that.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub key: RecordKey,
    pub state_name: String,
    /// ISO 3166-2 suffix ("IL", "BY").
    pub state_code: String,
    /// Upstream classification ("state", "province", "district").
    pub state_type: String,
    pub fips_code: String,
    /// Key of the parent [`Country`].
    pub country: RecordKey,
    pub country_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_active: bool,
    pub external_id: String,
    pub last_updated: Option<DateTime<Utc>>,
}

/// A city. Keyed by the composite `"{city_name}-{state_name}"` so that two
/// "Springfield"s in different states stay distinct records. `country`,
/// `country_code` and `state_code` are derived from the parent state on
/// every save.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub key: RecordKey,
    pub city_name: String,
    /// Key of the parent [`State`].
    pub state: RecordKey,
    pub state_code: String,
    pub country: RecordKey,
    pub country_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub wikidata_id: String,
    pub is_active: bool,
    pub external_id: String,
    pub last_updated: Option<DateTime<Utc>>,
}

impl City {
    /// The composite identity of a city within its state.
    #[inline]
    pub fn composite_key(city_name: &str, state_name: &str) -> String {
        format!("{city_name}-{state_name}")
    }
}

// -----------------------------------------------------------------------------
// GEO RECORD
// -----------------------------------------------------------------------------

/// A record of any level, as the store sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GeoRecord {
    Region(Region),
    Subregion(Subregion),
    Country(Country),
    State(State),
    City(City),
}

impl GeoRecord {
    /// Fresh, empty record of the given kind.
    pub fn new(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Region => GeoRecord::Region(Region::default()),
            EntityKind::Subregion => GeoRecord::Subregion(Subregion::default()),
            EntityKind::Country => GeoRecord::Country(Country::default()),
            EntityKind::State => GeoRecord::State(State::default()),
            EntityKind::City => GeoRecord::City(City::default()),
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            GeoRecord::Region(_) => EntityKind::Region,
            GeoRecord::Subregion(_) => EntityKind::Subregion,
            GeoRecord::Country(_) => EntityKind::Country,
            GeoRecord::State(_) => EntityKind::State,
            GeoRecord::City(_) => EntityKind::City,
        }
    }

    /// The assigned store key. Empty for records never saved.
    pub fn key(&self) -> &str {
        match self {
            GeoRecord::Region(r) => &r.key,
            GeoRecord::Subregion(s) => &s.key,
            GeoRecord::Country(c) => &c.key,
            GeoRecord::State(s) => &s.key,
            GeoRecord::City(c) => &c.key,
        }
    }

    pub(crate) fn set_key(&mut self, key: RecordKey) {
        match self {
            GeoRecord::Region(r) => r.key = key,
            GeoRecord::Subregion(s) => s.key = key,
            GeoRecord::Country(c) => c.key = key,
            GeoRecord::State(s) => s.key = key,
            GeoRecord::City(c) => c.key = key,
        }
    }

    /// The key this record wants, derived from its current name fields.
    /// Empty when the naming fields are still blank.
    pub fn natural_key(&self) -> String {
        match self {
            GeoRecord::Region(r) => r.region_name.clone(),
            GeoRecord::Subregion(s) => s.subregion_name.clone(),
            GeoRecord::Country(c) => c.country_name.clone(),
            GeoRecord::State(s) => s.state_name.clone(),
            GeoRecord::City(c) => {
                if c.city_name.is_empty() || c.state.is_empty() {
                    String::new()
                } else {
                    City::composite_key(&c.city_name, &c.state)
                }
            }
        }
    }

    /// Human-readable name for log lines.
    pub fn display_name(&self) -> &str {
        match self {
            GeoRecord::Region(r) => &r.region_name,
            GeoRecord::Subregion(s) => &s.subregion_name,
            GeoRecord::Country(c) => &c.country_name,
            GeoRecord::State(s) => &s.state_name,
            GeoRecord::City(c) => &c.city_name,
        }
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        match self {
            GeoRecord::Region(r) => r.last_updated,
            GeoRecord::Subregion(s) => s.last_updated,
            GeoRecord::Country(c) => c.last_updated,
            GeoRecord::State(s) => s.last_updated,
            GeoRecord::City(c) => c.last_updated,
        }
    }

    pub(crate) fn set_last_updated(&mut self, at: DateTime<Utc>) {
        match self {
            GeoRecord::Region(r) => r.last_updated = Some(at),
            GeoRecord::Subregion(s) => s.last_updated = Some(at),
            GeoRecord::Country(c) => c.last_updated = Some(at),
            GeoRecord::State(s) => s.last_updated = Some(at),
            GeoRecord::City(c) => c.last_updated = Some(at),
        }
    }
}

// Variant accessors. Borrowing and consuming flavors; the consuming ones
// feed the load-mutate-save cycle of the importer.
macro_rules! record_accessors {
    ($as_fn:ident, $into_fn:ident, $variant:ident, $ty:ty) => {
        impl GeoRecord {
            pub fn $as_fn(&self) -> Option<&$ty> {
                match self {
                    GeoRecord::$variant(inner) => Some(inner),
                    _ => None,
                }
            }

            pub fn $into_fn(self) -> Option<$ty> {
                match self {
                    GeoRecord::$variant(inner) => Some(inner),
                    _ => None,
                }
            }
        }
    };
}

record_accessors!(as_region, into_region, Region, Region);
record_accessors!(as_subregion, into_subregion, Subregion, Subregion);
record_accessors!(as_country, into_country, Country, Country);
record_accessors!(as_state, into_state, State, State);
record_accessors!(as_city, into_city, City, City);

impl From<Region> for GeoRecord {
    fn from(value: Region) -> Self {
        GeoRecord::Region(value)
    }
}

impl From<Subregion> for GeoRecord {
    fn from(value: Subregion) -> Self {
        GeoRecord::Subregion(value)
    }
}

impl From<Country> for GeoRecord {
    fn from(value: Country) -> Self {
        GeoRecord::Country(value)
    }
}

impl From<State> for GeoRecord {
    fn from(value: State) -> Self {
        GeoRecord::State(value)
    }
}

impl From<City> for GeoRecord {
    fn from(value: City) -> Self {
        GeoRecord::City(value)
    }
}
