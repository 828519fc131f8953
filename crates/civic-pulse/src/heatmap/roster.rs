//! Ingestion boundary for legislator records.
//!
//! Upstream feeds deliver two shapes: OpenStates-style state records carrying
//! a `current_role`, and Congress.gov-style federal records carrying a `terms`
//! array. The raw shape is discriminated exactly once here; everything
//! downstream consumes the canonical [`Representative`] and never probes
//! optional raw fields again.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::identity::normalize_ids;

/// Chamber classes the boundary datasets are published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistrictType {
    #[serde(rename = "congressional-districts")]
    Congressional,
    #[serde(rename = "state-upper-districts")]
    StateUpper,
    #[serde(rename = "state-lower-districts")]
    StateLower,
}

impl DistrictType {
    pub const ALL: [DistrictType; 3] = [
        DistrictType::Congressional,
        DistrictType::StateUpper,
        DistrictType::StateLower,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            DistrictType::Congressional => "congressional-districts",
            DistrictType::StateUpper => "state-upper-districts",
            DistrictType::StateLower => "state-lower-districts",
        }
    }

    /// Accepts both the canonical `-districts` slug and the bare chamber
    /// form (`congressional`, `state-upper`, `state-lower`).
    pub fn from_slug(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|district_type| {
            let slug = district_type.slug();
            slug == raw || slug.trim_end_matches("-districts") == raw
        })
    }

    /// Roster predicate: does this representative belong to the requested
    /// chamber class? Mirrors the upstream collection queries, including the
    /// Nebraska unicameral quirks (its senators count as state-upper and are
    /// excluded from state-lower).
    pub fn admits(self, rep: &Representative) -> bool {
        let label = rep.chamber_label.as_deref().unwrap_or("");
        let boundary_kind = rep
            .boundary
            .as_ref()
            .and_then(|hint| hint.kind.as_deref())
            .unwrap_or("");
        let role = rep.state_role();
        let role_chamber = role.and_then(|r| r.chamber.as_deref()).unwrap_or("");

        match self {
            DistrictType::Congressional => {
                matches!(
                    label,
                    "House of Representatives" | "U.S. House of Representatives"
                ) || role_chamber.eq_ignore_ascii_case("house")
                    || boundary_kind == "congressional"
                    || rep
                        .latest_term()
                        .and_then(|term| term.chamber.as_deref())
                        .is_some_and(|chamber| chamber.contains("House"))
            }
            DistrictType::StateUpper => {
                let plain = matches!(label, "State Senate" | "Senate")
                    || role_chamber.eq_ignore_ascii_case("upper")
                    || role_chamber.eq_ignore_ascii_case("senate")
                    || boundary_kind == "state_leg_upper";
                plain || (rep.is_nebraska() && nebraska_senator(rep, boundary_kind))
            }
            DistrictType::StateLower => {
                if rep.is_nebraska() {
                    return false;
                }
                matches!(
                    label,
                    "State House" | "House" | "Assembly" | "General Assembly"
                ) || role_chamber.eq_ignore_ascii_case("lower")
                    || role_chamber.eq_ignore_ascii_case("house")
                    || boundary_kind == "state_leg_lower"
            }
        }
    }
}

fn nebraska_senator(rep: &Representative, boundary_kind: &str) -> bool {
    let role = rep.state_role();
    role.and_then(|r| r.title.as_deref()) == Some("Senator")
        || boundary_kind == "state_leg"
        || role.and_then(|r| r.org_classification.as_deref()) == Some("legislature")
}

/// Stable key used for per-representative score maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepKey(pub String);

impl RepKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Precomputed boundary mapping attached upstream; trusted over derivation
/// when its key already looks canonical.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoundaryHint {
    #[serde(default, deserialize_with = "flexible_string")]
    pub geoid: Option<String>,
    #[serde(default, deserialize_with = "flexible_string")]
    pub geoidfq: Option<String>,
    #[serde(default, deserialize_with = "flexible_string")]
    pub district: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// The state-chamber role block from OpenStates-style records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentRole {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub org_classification: Option<String>,
    #[serde(default, deserialize_with = "flexible_string")]
    pub district: Option<String>,
    #[serde(default)]
    pub division_id: Option<String>,
    #[serde(default)]
    pub chamber: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default, rename = "id")]
    pub role_id: Option<String>,
}

/// One per-Congress term from Congress.gov-style records; the last entry is
/// authoritative for current jurisdiction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FederalTerm {
    #[serde(default)]
    pub chamber: Option<String>,
    #[serde(default, rename = "stateCode")]
    pub state_code: Option<String>,
    #[serde(default, rename = "stateName")]
    pub state_name: Option<String>,
    #[serde(default, deserialize_with = "flexible_string")]
    pub district: Option<String>,
    #[serde(default, rename = "startYear")]
    pub start_year: Option<i32>,
    #[serde(default, rename = "endYear")]
    pub end_year: Option<i32>,
    #[serde(default, rename = "partyName")]
    pub party_name: Option<String>,
}

/// Which upstream shape a record arrived in. Exactly one is authoritative:
/// a present `current_role` wins even when a `terms` array coexists, and a
/// record carrying neither is a hand-entered fallback with only top-level
/// fields to go on.
#[derive(Debug, Clone)]
pub enum RoleShape {
    State(CurrentRole),
    Federal(Vec<FederalTerm>),
    Flat,
}

/// Canonical legislator record, produced once at ingestion.
#[derive(Debug, Clone)]
pub struct Representative {
    pub key: RepKey,
    pub object_id: Option<String>,
    pub person_id: Option<String>,
    pub name: Option<String>,
    pub party: Option<String>,
    pub state: Option<String>,
    pub district: Option<String>,
    pub chamber_label: Option<String>,
    pub boundary: Option<BoundaryHint>,
    pub updated_at: Option<DateTime<Utc>>,
    pub openstates_slug: Option<String>,
    pub shape: RoleShape,
}

impl Representative {
    pub fn state_role(&self) -> Option<&CurrentRole> {
        match &self.shape {
            RoleShape::State(role) => Some(role),
            _ => None,
        }
    }

    pub fn latest_term(&self) -> Option<&FederalTerm> {
        match &self.shape {
            RoleShape::Federal(terms) => terms.last(),
            _ => None,
        }
    }

    pub fn division_id(&self) -> Option<&str> {
        self.state_role().and_then(|role| role.division_id.as_deref())
    }

    /// Role-level district wins over the top-level field; federal records
    /// read the latest term instead.
    pub fn district_value(&self) -> Option<&str> {
        self.state_role()
            .and_then(|role| role.district.as_deref())
            .or(self.district.as_deref())
            .or_else(|| self.latest_term().and_then(|term| term.district.as_deref()))
    }

    /// Nebraska's legislature is unicameral and officially nonpartisan; it
    /// needs special handling in both roster selection and key derivation.
    pub fn is_nebraska(&self) -> bool {
        self.division_id()
            .is_some_and(|division| division.contains("/state:ne/"))
            || matches!(self.state.as_deref(), Some("Nebraska") | Some("NE"))
            || self
                .state_role()
                .and_then(|role| role.state.as_deref())
                .is_some_and(|state| state.eq_ignore_ascii_case("NE"))
    }

    /// Every identifier spelling this record might be joined on elsewhere.
    pub fn identifier_variants(&self) -> BTreeSet<String> {
        let role = self.state_role();
        normalize_ids([
            Some(self.key.as_str()),
            self.object_id.as_deref(),
            self.person_id.as_deref(),
            self.name.as_deref(),
            role.and_then(|r| r.person_id.as_deref()),
            role.and_then(|r| r.role_id.as_deref()),
            self.openstates_slug.as_deref(),
        ])
    }
}

/// Raw wire shape accepted from either upstream; parsed leniently, then
/// discriminated into [`Representative`].
#[derive(Debug, Default, Deserialize)]
pub struct RawRepresentative {
    #[serde(default, deserialize_with = "flexible_string")]
    pub id: Option<String>,
    #[serde(default, rename = "_id", deserialize_with = "flexible_string")]
    pub object_id: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub party: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "flexible_string")]
    pub district: Option<String>,
    #[serde(default)]
    pub chamber: Option<String>,
    #[serde(default)]
    pub current_role: Option<CurrentRole>,
    #[serde(default)]
    pub terms: Option<Vec<FederalTerm>>,
    #[serde(default)]
    pub map_boundary: Option<BoundaryHint>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub openstates_url: Option<String>,
}

impl RawRepresentative {
    /// Discriminate the shape and build the canonical record. Returns `None`
    /// only when the record carries no usable identifier; such records are
    /// unresolvable, not errors.
    pub fn into_canonical(self) -> Option<Representative> {
        let shape = match (self.current_role, self.terms) {
            (Some(role), _) => RoleShape::State(role),
            (None, Some(terms)) if !terms.is_empty() => RoleShape::Federal(terms),
            _ => RoleShape::Flat,
        };

        let key = self
            .id
            .clone()
            .or_else(|| self.person_id.clone())
            .or_else(|| self.object_id.clone())
            .or_else(|| self.name.clone())?;

        let openstates_slug = self.openstates_url.as_deref().and_then(openstates_slug);

        Some(Representative {
            key: RepKey(key),
            object_id: self.object_id,
            person_id: self.person_id,
            name: self.name,
            party: self.party,
            state: self.state,
            district: self.district,
            chamber_label: self.chamber,
            boundary: self.map_boundary,
            updated_at: self.updated_at,
            openstates_slug,
            shape,
        })
    }
}

/// OpenStates profile URLs end in a dash-separated person slug; the same
/// slug shows up underscore-separated in other feeds.
fn openstates_slug(url: &str) -> Option<String> {
    let tail = url.trim_end_matches('/').rsplit('/').next()?;
    if tail.is_empty() {
        return None;
    }
    Some(tail.replace('-', "_"))
}

/// Accept JSON strings and integers interchangeably; district fields arrive
/// as both. Blank strings collapse to `None`.
pub(crate) fn flexible_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Option<Representative> {
        serde_json::from_str::<RawRepresentative>(raw)
            .expect("valid json")
            .into_canonical()
    }

    #[test]
    fn current_role_wins_even_when_terms_coexist() {
        let rep = parse(
            r#"{
                "id": "ocd-person/abc",
                "current_role": {"org_classification": "upper", "district": 12},
                "terms": [{"chamber": "House of Representatives", "stateCode": "OH"}]
            }"#,
        )
        .expect("canonical record");
        assert!(matches!(rep.shape, RoleShape::State(_)));
        assert_eq!(rep.district_value(), Some("12"));
    }

    #[test]
    fn terms_without_current_role_is_federal() {
        let rep = parse(
            r#"{
                "id": "B000001",
                "terms": [
                    {"chamber": "House of Representatives", "stateCode": "OH", "district": 3},
                    {"chamber": "House of Representatives", "stateCode": "OH", "district": 4}
                ]
            }"#,
        )
        .expect("canonical record");
        assert!(matches!(rep.shape, RoleShape::Federal(_)));
        assert_eq!(
            rep.latest_term().and_then(|term| term.district.as_deref()),
            Some("4")
        );
    }

    #[test]
    fn record_without_either_discriminator_is_a_flat_fallback() {
        let rep = parse(r#"{"id": "x", "name": "Hand Entered", "state": "WY", "district": "3"}"#)
            .expect("kept as flat record");
        assert!(matches!(rep.shape, RoleShape::Flat));
        assert_eq!(rep.district_value(), Some("3"));

        let rep = parse(r#"{"id": "x", "terms": []}"#).expect("empty terms is flat, not federal");
        assert!(matches!(rep.shape, RoleShape::Flat));
    }

    #[test]
    fn record_without_any_identifier_is_dropped() {
        assert!(parse(r#"{"state": "WY", "current_role": {}}"#).is_none());
    }

    #[test]
    fn identifier_variants_cover_all_spellings() {
        let rep = parse(
            r#"{
                "id": "ocd-person_abc",
                "person_id": "P-9",
                "name": "Jane Doe",
                "openstates_url": "https://openstates.org/person/jane-doe-abc/",
                "current_role": {"person_id": "ocd-person/abc"}
            }"#,
        )
        .expect("canonical record");
        let variants = rep.identifier_variants();
        assert!(variants.contains("ocd-person_abc"));
        assert!(variants.contains("ocd-person/abc"));
        assert!(variants.contains("P-9"));
        assert!(variants.contains("Jane Doe"));
        assert!(variants.contains("jane_doe_abc"));
    }

    #[test]
    fn nebraska_senators_are_state_upper_only() {
        let rep = parse(
            r#"{
                "id": "ne-1",
                "state": "Nebraska",
                "current_role": {
                    "title": "Senator",
                    "division_id": "ocd-division/country:us/state:ne/sldu:5"
                }
            }"#,
        )
        .expect("canonical record");
        assert!(DistrictType::StateUpper.admits(&rep));
        assert!(!DistrictType::StateLower.admits(&rep));
        assert!(!DistrictType::Congressional.admits(&rep));
    }

    #[test]
    fn chamber_labels_route_to_their_district_type() {
        let house = parse(
            r#"{"id": "h1", "chamber": "House of Representatives", "state": "WY",
                "current_role": {}}"#,
        )
        .expect("canonical record");
        assert!(DistrictType::Congressional.admits(&house));
        assert!(!DistrictType::StateLower.admits(&house));

        let assembly = parse(
            r#"{"id": "a1", "chamber": "Assembly", "state": "CA",
                "current_role": {"org_classification": "lower"}}"#,
        )
        .expect("canonical record");
        assert!(DistrictType::StateLower.admits(&assembly));

        let federal = parse(
            r#"{"id": "f1", "terms": [{"chamber": "House of Representatives", "stateCode": "MT"}]}"#,
        )
        .expect("canonical record");
        assert!(DistrictType::Congressional.admits(&federal));
    }

    #[test]
    fn flexible_fields_accept_numbers_and_blank_strings() {
        let rep = parse(
            r#"{"id": 42, "district": "  ", "current_role": {"district": 7}}"#,
        )
        .expect("canonical record");
        assert_eq!(rep.key.as_str(), "42");
        assert!(rep.district.is_none());
        assert_eq!(rep.district_value(), Some("7"));
    }
}
