//! Candidate district key derivation.
//!
//! Produces the canonical GEOID-style strings that should match the boundary
//! dataset's district key for one representative. Several boundary datasets
//! disagree on encoding (at-large seats, Nebraska's unicameral districts), so
//! a single representative may yield multiple candidate keys; emitting every
//! plausible spelling is cheaper than a hole in the map.

use std::sync::OnceLock;

use regex::Regex;

use super::roster::{Representative, RoleShape};
use super::states::{state_abbr, state_fips, StateCodes};

/// States with a single House seat; their one district is at-large.
const AT_LARGE_STATES: [&str; 7] = ["AK", "DE", "MT", "ND", "SD", "VT", "WY"];

fn geoid_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d{4,6}$").expect("valid geoid pattern"))
}

fn nebraska_district_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"/state:ne/sldu:(\d+)").expect("valid sldu pattern"))
}

fn at_large_division_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)cd:(at[-_ ]?large|al)\b").expect("valid at-large pattern"))
}

/// Chamber classification used only for key derivation; distinct from the
/// roster predicate, which answers a broader membership question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChamberClass {
    Congressional,
    StateUpper,
    StateLower,
    Unknown,
}

fn classify_chamber(rep: &Representative) -> ChamberClass {
    let label = rep.chamber_label.as_deref().unwrap_or("");
    if matches!(
        label,
        "House of Representatives" | "U.S. House of Representatives"
    ) {
        return ChamberClass::Congressional;
    }

    let boundary_kind = rep
        .boundary
        .as_ref()
        .and_then(|hint| hint.kind.as_deref())
        .unwrap_or("");
    match boundary_kind {
        "congressional" => return ChamberClass::Congressional,
        "state_leg_upper" => return ChamberClass::StateUpper,
        "state_leg_lower" => return ChamberClass::StateLower,
        _ => {}
    }

    let division = rep.division_id().unwrap_or("");
    if division.contains("cd:") {
        return ChamberClass::Congressional;
    }
    if division.contains("sldu:") {
        return ChamberClass::StateUpper;
    }
    if division.contains("sldl:") {
        return ChamberClass::StateLower;
    }

    match rep
        .state_role()
        .and_then(|role| role.org_classification.as_deref())
    {
        Some("upper") => ChamberClass::StateUpper,
        Some("lower") => ChamberClass::StateLower,
        _ => {
            if matches!(rep.shape, RoleShape::Federal(_)) {
                ChamberClass::Congressional
            } else {
                ChamberClass::Unknown
            }
        }
    }
}

/// Derive the ordered candidate district keys for one representative.
///
/// Never fails: a representative that cannot be placed yields an empty list
/// and is simply absent from the map.
pub fn resolve_district_keys(rep: &Representative, codes: &StateCodes) -> Vec<String> {
    // Trust an explicit upstream mapping over any derivation.
    if let Some(hint) = &rep.boundary {
        if let Some(geoid) = hint.geoid.as_deref().filter(|id| geoid_pattern().is_match(id)) {
            return vec![geoid.to_string()];
        }
        if let Some(district) = hint
            .district
            .as_deref()
            .filter(|id| geoid_pattern().is_match(id))
        {
            return vec![district.to_string()];
        }
    }

    if rep.is_nebraska() {
        if let Some(keys) = nebraska_keys(rep) {
            return keys;
        }
    }

    let fips = state_fips(rep, codes);
    let abbr = state_abbr(rep, codes);
    let chamber = classify_chamber(rep);

    let district_raw = rep.district_value();
    let district = district_raw.map(str::trim).unwrap_or("");
    let numeric = district.parse::<u32>().ok();

    if chamber == ChamberClass::Congressional {
        if let (Some(fips), Some(abbr)) = (fips.as_deref(), abbr.as_deref()) {
            if is_at_large(rep, district, numeric, abbr) {
                return at_large_keys(fips, abbr);
            }
        }
    }

    if let (Some(fips), Some(number)) = (fips.as_deref(), numeric) {
        match chamber {
            ChamberClass::Congressional => return vec![format!("{fips}{number:02}")],
            ChamberClass::StateUpper | ChamberClass::StateLower => {
                return vec![format!("{fips}{number:03}")]
            }
            ChamberClass::Unknown => {}
        }
    }

    if let Some(geoidfq) = rep
        .boundary
        .as_ref()
        .and_then(|hint| hint.geoidfq.as_deref())
        .filter(|id| !id.is_empty())
    {
        return vec![geoidfq.to_string()];
    }
    if !district.is_empty() {
        return vec![district.to_string()];
    }
    Vec::new()
}

/// The boundary key format for Nebraska's unicameral districts could not be
/// pinned down, so every observed encoding of the district number is emitted.
fn nebraska_keys(rep: &Representative) -> Option<Vec<String>> {
    let division = rep.division_id()?;
    let captures = nebraska_district_pattern().captures(division)?;
    let number = &captures[1];
    Some(vec![
        number.to_string(),
        format!("31{number:0>3}"),
        format!("3100{number:0>2}"),
        format!("NE-{number}"),
        format!("Nebraska-{number}"),
        format!("31{number}"),
        format!("ne{number}"),
    ])
}

fn is_at_large(rep: &Representative, district: &str, numeric: Option<u32>, abbr: &str) -> bool {
    if AT_LARGE_STATES.contains(&abbr) {
        return true;
    }
    let division = rep.division_id().unwrap_or("");
    if at_large_division_pattern().is_match(division) {
        return true;
    }
    let normalized = district.to_ascii_lowercase();
    matches!(normalized.as_str(), "al" | "at-large" | "atlarge")
        || district.is_empty()
        || numeric == Some(0)
}

/// The six spellings observed across boundary datasets for an at-large seat.
fn at_large_keys(fips: &str, abbr: &str) -> Vec<String> {
    vec![
        format!("{fips}00"),
        format!("{fips}0"),
        fips.to_string(),
        format!("{abbr}00"),
        format!("{abbr}0"),
        format!("{abbr}AL"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heatmap::roster::test_support::{federal_rep, state_rep};
    use crate::heatmap::roster::{BoundaryHint, CurrentRole, RepKey, Representative, RoleShape};

    fn codes() -> StateCodes {
        StateCodes::standard()
    }

    fn congressional(id: &str, state: &str, district: Option<&str>) -> Representative {
        let mut rep = state_rep(id, state, district);
        rep.chamber_label = Some("House of Representatives".to_string());
        rep
    }

    #[test]
    fn boundary_geoid_hint_short_circuits_everything() {
        let mut rep = congressional("r1", "CA", Some("12"));
        rep.boundary = Some(BoundaryHint {
            geoid: Some("06012".to_string()),
            ..BoundaryHint::default()
        });
        assert_eq!(resolve_district_keys(&rep, &codes()), vec!["06012"]);

        // A malformed hint falls through to derivation.
        rep.boundary = Some(BoundaryHint {
            geoid: Some("geo-06012".to_string()),
            ..BoundaryHint::default()
        });
        assert_eq!(resolve_district_keys(&rep, &codes()), vec!["0612"]);
    }

    #[test]
    fn nebraska_division_fans_out_to_seven_keys() {
        let mut rep = state_rep("ne-5", "Nebraska", None);
        if let RoleShape::State(role) = &mut rep.shape {
            role.division_id = Some("ocd-division/country:us/state:ne/sldu:5".to_string());
        }
        let keys = resolve_district_keys(&rep, &codes());
        assert_eq!(keys.len(), 7);
        assert!(keys.contains(&"5".to_string()));
        assert!(keys.contains(&"31005".to_string()));
        assert!(keys.contains(&"310005".to_string()));
        assert!(keys.contains(&"NE-5".to_string()));
        assert!(keys.contains(&"Nebraska-5".to_string()));
        assert!(keys.contains(&"ne5".to_string()));
    }

    #[test]
    fn wyoming_at_large_includes_both_canonical_spellings() {
        let rep = congressional("wy-al", "WY", None);
        let keys = resolve_district_keys(&rep, &codes());
        assert_eq!(keys.len(), 6);
        assert!(keys.contains(&"5600".to_string()));
        assert!(keys.contains(&"WYAL".to_string()));
        assert!(keys.contains(&"56".to_string()));
    }

    #[test]
    fn at_large_detected_from_district_spellings_and_zero() {
        for district in ["AL", "at-large", "AtLarge", "0"] {
            let rep = congressional("oh-x", "OH", Some(district));
            let keys = resolve_district_keys(&rep, &codes());
            assert!(
                keys.contains(&"3900".to_string()),
                "district '{district}' should read as at-large"
            );
        }
    }

    #[test]
    fn at_large_detected_from_division_path() {
        let mut rep = congressional("dc-al", "DC", Some("98"));
        if let RoleShape::State(role) = &mut rep.shape {
            role.division_id = Some("ocd-division/country:us/state:dc/cd:at-large".to_string());
            role.district = None;
        }
        rep.district = None;
        let keys = resolve_district_keys(&rep, &codes());
        assert!(keys.contains(&"1100".to_string()));
        assert!(keys.contains(&"DCAL".to_string()));
    }

    #[test]
    fn congressional_numbers_pad_to_two_digits() {
        let rep = congressional("ca-12", "California", Some("12"));
        assert_eq!(resolve_district_keys(&rep, &codes()), vec!["0612"]);

        let rep = congressional("ca-3", "CA", Some("3"));
        assert_eq!(resolve_district_keys(&rep, &codes()), vec!["0603"]);
    }

    #[test]
    fn state_legislative_numbers_pad_to_three_digits() {
        let mut rep = state_rep("tx-7", "TX", Some("7"));
        if let RoleShape::State(role) = &mut rep.shape {
            role.org_classification = Some("upper".to_string());
        }
        assert_eq!(resolve_district_keys(&rep, &codes()), vec!["48007"]);

        let mut rep = state_rep("tx-101", "TX", Some("101"));
        if let RoleShape::State(role) = &mut rep.shape {
            role.org_classification = Some("lower".to_string());
        }
        assert_eq!(resolve_district_keys(&rep, &codes()), vec!["48101"]);
    }

    #[test]
    fn federal_record_derives_from_latest_term() {
        let rep = federal_rep(
            "B000001",
            &[
                ("House of Representatives", "OH", Some("3")),
                ("House of Representatives", "OH", Some("4")),
            ],
        );
        assert_eq!(resolve_district_keys(&rep, &codes()), vec!["3904"]);
    }

    #[test]
    fn falls_back_to_geoidfq_then_raw_district() {
        let mut rep = state_rep("x1", "Atlantis", Some("9"));
        rep.boundary = Some(BoundaryHint {
            geoidfq: Some("9500000US0609".to_string()),
            ..BoundaryHint::default()
        });
        assert_eq!(resolve_district_keys(&rep, &codes()), vec!["9500000US0609"]);

        let rep = state_rep("x2", "Atlantis", Some("Ward 9"));
        assert_eq!(resolve_district_keys(&rep, &codes()), vec!["Ward 9"]);

        let rep = Representative {
            key: RepKey("x3".to_string()),
            object_id: None,
            person_id: None,
            name: None,
            party: None,
            state: None,
            district: None,
            chamber_label: None,
            boundary: None,
            updated_at: None,
            openstates_slug: None,
            shape: RoleShape::State(CurrentRole::default()),
        };
        assert!(resolve_district_keys(&rep, &codes()).is_empty());
    }
}
