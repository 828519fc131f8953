use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use super::roster::{Representative, RoleShape};

/// `(abbreviation, FIPS, full name)` for every jurisdiction the boundary
/// datasets cover.
const STATE_TABLE: &[(&str, &str, &str)] = &[
    ("AL", "01", "Alabama"),
    ("AK", "02", "Alaska"),
    ("AZ", "04", "Arizona"),
    ("AR", "05", "Arkansas"),
    ("CA", "06", "California"),
    ("CO", "08", "Colorado"),
    ("CT", "09", "Connecticut"),
    ("DE", "10", "Delaware"),
    ("DC", "11", "District of Columbia"),
    ("FL", "12", "Florida"),
    ("GA", "13", "Georgia"),
    ("HI", "15", "Hawaii"),
    ("ID", "16", "Idaho"),
    ("IL", "17", "Illinois"),
    ("IN", "18", "Indiana"),
    ("IA", "19", "Iowa"),
    ("KS", "20", "Kansas"),
    ("KY", "21", "Kentucky"),
    ("LA", "22", "Louisiana"),
    ("ME", "23", "Maine"),
    ("MD", "24", "Maryland"),
    ("MA", "25", "Massachusetts"),
    ("MI", "26", "Michigan"),
    ("MN", "27", "Minnesota"),
    ("MS", "28", "Mississippi"),
    ("MO", "29", "Missouri"),
    ("MT", "30", "Montana"),
    ("NE", "31", "Nebraska"),
    ("NV", "32", "Nevada"),
    ("NH", "33", "New Hampshire"),
    ("NJ", "34", "New Jersey"),
    ("NM", "35", "New Mexico"),
    ("NY", "36", "New York"),
    ("NC", "37", "North Carolina"),
    ("ND", "38", "North Dakota"),
    ("OH", "39", "Ohio"),
    ("OK", "40", "Oklahoma"),
    ("OR", "41", "Oregon"),
    ("PA", "42", "Pennsylvania"),
    ("RI", "44", "Rhode Island"),
    ("SC", "45", "South Carolina"),
    ("SD", "46", "South Dakota"),
    ("TN", "47", "Tennessee"),
    ("TX", "48", "Texas"),
    ("UT", "49", "Utah"),
    ("VT", "50", "Vermont"),
    ("VA", "51", "Virginia"),
    ("WA", "53", "Washington"),
    ("WV", "54", "West Virginia"),
    ("WI", "55", "Wisconsin"),
    ("WY", "56", "Wyoming"),
    ("PR", "72", "Puerto Rico"),
];

/// Read-only state code lookup tables, injected into the engine so tests can
/// substitute fixtures.
#[derive(Debug, Clone)]
pub struct StateCodes {
    abbr_to_fips: HashMap<String, String>,
    fips_to_abbr: HashMap<String, String>,
    name_to_abbr: HashMap<String, String>,
}

impl StateCodes {
    /// The standard 50-states-plus-DC-and-PR table.
    pub fn standard() -> Self {
        Self::from_entries(STATE_TABLE.iter().copied())
    }

    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    {
        let mut abbr_to_fips = HashMap::new();
        let mut fips_to_abbr = HashMap::new();
        let mut name_to_abbr = HashMap::new();
        for (abbr, fips, name) in entries {
            abbr_to_fips.insert(abbr.to_string(), fips.to_string());
            fips_to_abbr.insert(fips.to_string(), abbr.to_string());
            name_to_abbr.insert(name.to_ascii_lowercase(), abbr.to_string());
        }
        Self {
            abbr_to_fips,
            fips_to_abbr,
            name_to_abbr,
        }
    }

    pub fn fips_for_abbr(&self, abbr: &str) -> Option<&str> {
        self.abbr_to_fips
            .get(&abbr.trim().to_ascii_uppercase())
            .map(String::as_str)
    }

    pub fn abbr_for_fips(&self, fips: &str) -> Option<&str> {
        self.fips_to_abbr.get(fips.trim()).map(String::as_str)
    }

    pub fn abbr_for_name(&self, name: &str) -> Option<&str> {
        self.name_to_abbr
            .get(&name.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// A state field may hold either an abbreviation or a full name; try the
    /// abbreviation reading first.
    pub fn abbr_for_state_field(&self, value: &str) -> Option<&str> {
        let upper = value.trim().to_ascii_uppercase();
        if let Some(fips) = self.abbr_to_fips.get(&upper) {
            return self.fips_to_abbr.get(fips).map(String::as_str);
        }
        self.abbr_for_name(value)
    }

    pub fn fips_for_state_field(&self, value: &str) -> Option<&str> {
        self.abbr_for_state_field(value)
            .and_then(|abbr| self.fips_for_abbr(abbr))
    }
}

fn division_state_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)state:([a-z]{2})").expect("valid state pattern"))
}

/// Extract the 2-letter jurisdiction token from an OCD division path,
/// e.g. `ocd-division/country:us/state:ne/sldu:5`.
pub fn division_state_token(division_id: &str) -> Option<String> {
    division_state_pattern()
        .captures(division_id)
        .map(|caps| caps[1].to_ascii_uppercase())
}

/// Resolve a representative's canonical 2-letter abbreviation.
///
/// Priority order, first match wins: division path token, role-level state,
/// top-level state, and for federal records the latest term (`stateCode`
/// preferred over `stateName`). `None` means the representative cannot be
/// placed on the map; callers skip it rather than fail the batch.
pub fn state_abbr(rep: &Representative, codes: &StateCodes) -> Option<String> {
    if let Some(token) = rep.division_id().and_then(division_state_token) {
        if codes.fips_for_abbr(&token).is_some() {
            return Some(token);
        }
    }

    if let RoleShape::State(role) = &rep.shape {
        if let Some(found) = role
            .state
            .as_deref()
            .and_then(|value| codes.abbr_for_state_field(value))
        {
            return Some(found.to_string());
        }
    }

    if let Some(found) = rep
        .state
        .as_deref()
        .and_then(|value| codes.abbr_for_state_field(value))
    {
        return Some(found.to_string());
    }

    if let RoleShape::Federal(terms) = &rep.shape {
        let latest = terms.last()?;
        let token = latest
            .state_code
            .as_deref()
            .or(latest.state_name.as_deref())?;
        return codes.abbr_for_state_field(token).map(str::to_string);
    }

    None
}

/// Resolve a representative's canonical 2-digit FIPS code, same priority
/// order as [`state_abbr`].
pub fn state_fips(rep: &Representative, codes: &StateCodes) -> Option<String> {
    state_abbr(rep, codes).and_then(|abbr| codes.fips_for_abbr(&abbr).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::roster::test_support::{federal_rep, state_rep};

    #[test]
    fn table_maps_both_directions() {
        let codes = StateCodes::standard();
        assert_eq!(codes.fips_for_abbr("ne"), Some("31"));
        assert_eq!(codes.abbr_for_fips("56"), Some("WY"));
        assert_eq!(codes.abbr_for_name("new hampshire"), Some("NH"));
        assert_eq!(codes.fips_for_state_field("California"), Some("06"));
        assert_eq!(codes.fips_for_state_field("CA"), Some("06"));
        assert!(codes.fips_for_state_field("Guam").is_none());
    }

    #[test]
    fn division_token_wins_over_state_fields() {
        let codes = StateCodes::standard();
        let mut rep = state_rep("r1", "California", None);
        if let RoleShape::State(role) = &mut rep.shape {
            role.division_id = Some("ocd-division/country:us/state:ne/sldu:5".to_string());
        }
        assert_eq!(state_fips(&rep, &codes).as_deref(), Some("31"));
        assert_eq!(state_abbr(&rep, &codes).as_deref(), Some("NE"));
    }

    #[test]
    fn falls_back_to_full_state_name() {
        let codes = StateCodes::standard();
        let rep = state_rep("r2", "Wyoming", Some("7"));
        assert_eq!(state_fips(&rep, &codes).as_deref(), Some("56"));
    }

    #[test]
    fn federal_shape_uses_latest_term() {
        let codes = StateCodes::standard();
        let rep = federal_rep("B000001", &[("House of Representatives", "MT", None)]);
        assert_eq!(state_abbr(&rep, &codes).as_deref(), Some("MT"));
        assert_eq!(state_fips(&rep, &codes).as_deref(), Some("30"));
    }

    #[test]
    fn unresolvable_state_yields_none() {
        let codes = StateCodes::standard();
        let rep = state_rep("r3", "Atlantis", None);
        assert!(state_abbr(&rep, &codes).is_none());
        assert!(state_fips(&rep, &codes).is_none());
    }
}
