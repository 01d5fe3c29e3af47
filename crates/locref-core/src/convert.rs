// crates/locref-core/src/convert.rs
//! # Source Row Mapping
//!
//! Explicit field-by-field mapping from upstream rows onto stored
//! records. Each `apply_source` overwrites the synchronized columns and
//! leaves identity columns (names, keys) and resolved links to the
//! importer.
//!
//! Country codes are normalized to lowercase here, once, so every later
//! comparison is exact.

use crate::model::{City, Country, Region, State, Subregion};
use crate::raw::{opt_str, parse_opt_f64, CityRaw, CountryRaw, RegionRaw, StateRaw, SubregionRaw};
use crate::store::RecordKey;

fn lower_or_empty(value: &Option<String>) -> String {
    value.as_deref().map(|v| v.trim().to_lowercase()).unwrap_or_default()
}

fn or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

impl Region {
    pub fn apply_source(&mut self, row: &RegionRaw) {
        self.region_name = row.name.clone();
        self.external_id = row.id.to_string();
        self.wikidata_id = or_empty(&row.wikidata_id);
    }
}

impl Subregion {
    pub fn apply_source(&mut self, row: &SubregionRaw, region_key: RecordKey) {
        self.subregion_name = row.name.clone();
        self.region = region_key;
        self.external_id = row.id.to_string();
        self.wikidata_id = or_empty(&row.wikidata_id);
    }
}

impl Country {
    /// Maps everything except `country_name` (set once at creation) and
    /// the region/subregion links (set by the importer when they
    /// resolve). An absent `iso2` leaves the stored code alone.
    pub fn apply_source(&mut self, row: &CountryRaw) {
        if row.iso2.as_deref().is_some_and(|c| !c.trim().is_empty()) {
            self.code = lower_or_empty(&row.iso2);
        }
        self.iso3 = lower_or_empty(&row.iso3);
        self.numeric_code = or_empty(&row.numeric_code);
        self.phone_code = or_empty(&row.phonecode);
        self.capital = or_empty(&row.capital);
        self.currency_name = or_empty(&row.currency_name);
        self.currency_symbol = or_empty(&row.currency_symbol);
        self.tld = or_empty(&row.tld);
        self.native = or_empty(&row.native);
        self.nationality = or_empty(&row.nationality);
        self.emoji = or_empty(&row.emoji);
        self.emoji_u = or_empty(&row.emoji_u);
        self.latitude = parse_opt_f64(opt_str(&row.latitude));
        self.longitude = parse_opt_f64(opt_str(&row.longitude));
        self.external_id = row.id.map(|id| id.to_string()).unwrap_or_default();
    }
}

impl State {
    /// `country_key` and `country_code` come pre-resolved from the
    /// importer; `country_code` is already lowercase.
    pub fn apply_source(&mut self, row: &StateRaw, country_key: RecordKey, country_code: String) {
        self.state_code = or_empty(&row.iso2);
        self.state_type = or_empty(&row.state_type);
        self.fips_code = or_empty(&row.fips_code);
        self.country = country_key;
        self.country_code = country_code;
        self.latitude = parse_opt_f64(opt_str(&row.latitude));
        self.longitude = parse_opt_f64(opt_str(&row.longitude));
        self.external_id = row.id.map(|id| id.to_string()).unwrap_or_default();
        self.is_active = true;
    }
}

impl City {
    /// Identity (`city_name`, `state`) is the importer's job; the
    /// country columns are re-derived from the parent state on save.
    pub fn apply_source(&mut self, row: &CityRaw) {
        self.latitude = parse_opt_f64(opt_str(&row.latitude));
        self.longitude = parse_opt_f64(opt_str(&row.longitude));
        self.wikidata_id = or_empty(&row.wikidata_id);
        self.external_id = row.id.map(|id| id.to_string()).unwrap_or_default();
        self.is_active = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn country_mapping_lowercases_codes() {
        let row: CountryRaw = serde_json::from_str(
            r#"{
                "id": 233,
                "name": "United States",
                "iso2": "US",
                "iso3": "USA",
                "phonecode": "1",
                "capital": "Washington",
                "latitude": "38.00000000",
                "longitude": "-97.00000000",
                "emoji": "🇺🇸"
            }"#,
        )
        .unwrap();

        let mut country = Country::default();
        country.apply_source(&row);

        assert_eq!(country.code, "us");
        assert_eq!(country.iso3, "usa");
        assert_eq!(country.capital, "Washington");
        assert_eq!(country.latitude, Some(38.0));
        assert_eq!(country.external_id, "233");
        assert_eq!(country.country_name, "", "name is not the mapper's job");
    }

    #[test]
    fn absent_iso2_keeps_existing_code() {
        let row: CountryRaw =
            serde_json::from_str(r#"{"id": 1, "name": "Somewhere", "iso3": "SMW"}"#).unwrap();

        let mut country = Country {
            code: "sw".into(),
            ..Country::default()
        };
        country.apply_source(&row);
        assert_eq!(country.code, "sw");
        assert_eq!(country.iso3, "smw");
    }

    #[test]
    fn state_mapping_marks_active_and_parses_coords() {
        let row: StateRaw = serde_json::from_str(
            r#"{"id": 1416, "name": "Illinois", "country_code": "US", "iso2": "IL",
                "type": "state", "latitude": "40.63312850", "longitude": "bogus"}"#,
        )
        .unwrap();

        let mut state = State::default();
        state.apply_source(&row, "United States".into(), "us".into());

        assert!(state.is_active);
        assert_eq!(state.state_code, "IL");
        assert_eq!(state.state_type, "state");
        assert_eq!(state.country, "United States");
        assert_eq!(state.latitude, Some(40.6331285));
        assert_eq!(state.longitude, None);
    }

    #[test]
    fn region_mapping_stringifies_external_id() {
        let row: RegionRaw =
            serde_json::from_str(r#"{"id": 1, "name": "Americas", "wikiDataId": "Q828"}"#).unwrap();
        let mut region = Region::default();
        region.apply_source(&row);
        assert_eq!(region.external_id, "1");
        assert_eq!(region.wikidata_id, "Q828");
    }
}
