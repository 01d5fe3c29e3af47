// crates/locref-core/src/raw.rs
//! # Upstream Source Rows
//!
//! Serde mirrors of the JSON feeds published by the
//! countries-states-cities dataset. Field names follow the upstream
//! spelling (`wikiDataId`, `emojiU`, `phonecode`); everything that the
//! upstream occasionally omits is defaulted so a sparse row still decodes.
//!
//! Coordinates arrive as strings ("19.50000000") and are parsed into
//! `f64` at mapping time, see [`parse_opt_f64`].

use serde::Deserialize;

/// One dataset file of the upstream feed.
///
/// Note: there is no dedicated regions file. The region level is seeded
/// from `subregions.json` as well, each row contributing its own id/name
/// pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetFile {
    Subregions,
    Countries,
    States,
    Cities,
}

impl DatasetFile {
    pub fn file_name(self) -> &'static str {
        match self {
            DatasetFile::Subregions => "subregions.json",
            DatasetFile::Countries => "countries.json",
            DatasetFile::States => "states.json",
            DatasetFile::Cities => "cities.json",
        }
    }
}

/// A region as read out of `subregions.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionRaw {
    pub id: i64,
    pub name: String,
    #[serde(rename = "wikiDataId", default)]
    pub wikidata_id: Option<String>,
}

/// A subregion row of `subregions.json`. `region_id` points at the parent
/// region's upstream id.
#[derive(Debug, Clone, Deserialize)]
pub struct SubregionRaw {
    pub id: i64,
    pub name: String,
    #[serde(rename = "wikiDataId", default)]
    pub wikidata_id: Option<String>,
    #[serde(default)]
    pub region_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryRaw {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub iso2: Option<String>,
    #[serde(default)]
    pub iso3: Option<String>,
    #[serde(default)]
    pub numeric_code: Option<String>,
    #[serde(default)]
    pub phonecode: Option<String>,
    #[serde(default)]
    pub capital: Option<String>,
    #[serde(default)]
    pub currency_name: Option<String>,
    #[serde(default)]
    pub currency_symbol: Option<String>,
    #[serde(default)]
    pub tld: Option<String>,
    #[serde(default)]
    pub native: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    /// Region name, matched against stored regions.
    #[serde(default)]
    pub region: Option<String>,
    /// Subregion name, matched against stored subregions.
    #[serde(default)]
    pub subregion: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(rename = "emojiU", default)]
    pub emoji_u: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateRaw {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    /// ISO2 of the owning country.
    #[serde(default)]
    pub country_code: Option<String>,
    /// ISO 3166-2 suffix of the state itself.
    #[serde(default)]
    pub iso2: Option<String>,
    #[serde(rename = "type", default)]
    pub state_type: Option<String>,
    #[serde(default)]
    pub fips_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CityRaw {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub state_name: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(rename = "wikiDataId", default)]
    pub wikidata_id: Option<String>,
}

/// Parses an optional upstream coordinate string.
///
/// Returns `None` for missing, empty or unparseable values:
///
/// ```
/// use locref_core::raw::parse_opt_f64;
///
/// assert_eq!(parse_opt_f64(Some(" 19.50000000 ")), Some(19.5));
/// assert_eq!(parse_opt_f64(Some("N/A")), None);
/// assert_eq!(parse_opt_f64(None), None);
/// ```
pub fn parse_opt_f64(value: Option<&str>) -> Option<f64> {
    value.and_then(|v| v.trim().parse::<f64>().ok())
}

/// Borrow an `Option<String>` field as `Option<&str>`.
#[inline]
pub(crate) fn opt_str(value: &Option<String>) -> Option<&str> {
    value.as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_match_upstream_layout() {
        assert_eq!(DatasetFile::Subregions.file_name(), "subregions.json");
        assert_eq!(DatasetFile::Countries.file_name(), "countries.json");
        assert_eq!(DatasetFile::States.file_name(), "states.json");
        assert_eq!(DatasetFile::Cities.file_name(), "cities.json");
    }

    #[test]
    fn country_row_decodes_upstream_spelling() {
        let json = r#"{
            "id": 233,
            "name": "United States",
            "iso2": "US",
            "iso3": "USA",
            "phonecode": "1",
            "emojiU": "U+1F1FA U+1F1F8",
            "latitude": "38.00000000",
            "longitude": "-97.00000000"
        }"#;
        let row: CountryRaw = serde_json::from_str(json).unwrap();
        assert_eq!(row.name, "United States");
        assert_eq!(row.iso2.as_deref(), Some("US"));
        assert_eq!(row.emoji_u.as_deref(), Some("U+1F1FA U+1F1F8"));
        assert_eq!(parse_opt_f64(row.longitude.as_deref()), Some(-97.0));
        // Fields absent from the row default instead of failing the decode.
        assert!(row.capital.is_none());
    }

    #[test]
    fn state_row_renames_type_field() {
        let json = r#"{"id": 1416, "name": "Illinois", "country_code": "US", "iso2": "IL", "type": "state"}"#;
        let row: StateRaw = serde_json::from_str(json).unwrap();
        assert_eq!(row.state_type.as_deref(), Some("state"));
    }

    #[test]
    fn subregion_row_keeps_parent_pointer() {
        let json = r#"{"id": 2, "name": "Northern America", "region_id": 1, "wikiDataId": "Q2017699"}"#;
        let row: SubregionRaw = serde_json::from_str(json).unwrap();
        assert_eq!(row.region_id, Some(1));
        assert_eq!(row.wikidata_id.as_deref(), Some("Q2017699"));
    }

    #[test]
    fn coordinate_parsing_tolerates_garbage() {
        assert_eq!(parse_opt_f64(Some("40.63312850")), Some(40.6331285));
        assert_eq!(parse_opt_f64(Some("")), None);
        assert_eq!(parse_opt_f64(Some("null")), None);
    }
}
