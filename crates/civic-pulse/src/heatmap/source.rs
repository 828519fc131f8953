//! Input collaborators consumed by the engine.
//!
//! The engine never owns storage; it issues one bounded batch query per
//! backing collection per metric through these traits. Implementations live
//! with the service (file-backed) and in tests (fixtures).

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::BTreeSet;

use super::roster::{DistrictType, Representative};

/// Half-open `[start, end)` window bounding legislation queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The calendar year containing `now`.
    pub fn calendar_year(now: DateTime<Utc>) -> Self {
        use chrono::Datelike;
        let year = now.year();
        let start = Utc
            .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
            .single()
            .expect("valid year start");
        let end = Utc
            .with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0)
            .single()
            .expect("valid year end");
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// One sponsor entry on a legislation record. Which identifier field is
/// populated varies by ingestion source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sponsor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Sponsor {
    /// Preferred join key: person id, then id, then display name.
    pub fn join_key(&self) -> Option<&str> {
        self.person_id
            .as_deref()
            .or(self.id.as_deref())
            .or(self.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopicClassification {
    #[serde(default, rename = "broadTopics")]
    pub broad_topics: Vec<String>,
}

/// A bill as delivered by the legislation corpus. Read-only input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LegislationRecord {
    #[serde(default)]
    pub sponsors: Vec<Sponsor>,
    #[serde(default, rename = "latestActionAt")]
    pub latest_action_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "firstActionAt")]
    pub first_action_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "enactedAt")]
    pub enacted_at: Option<DateTime<Utc>>,
    #[serde(default, rename = "topicClassification")]
    pub topic_classification: Option<TopicClassification>,
}

impl LegislationRecord {
    /// The timestamp a record's activity is dated by: latest action, else
    /// first action, else creation. Enacted-only queries date by enactment.
    pub fn activity_at(&self, enacted_only: bool) -> Option<DateTime<Utc>> {
        if enacted_only {
            return self.enacted_at;
        }
        self.latest_action_at
            .or(self.first_action_at)
            .or(self.created_at)
    }

    pub fn broad_topics(&self) -> &[String] {
        self.topic_classification
            .as_ref()
            .map(|classification| classification.broad_topics.as_slice())
            .unwrap_or(&[])
    }

    /// Predicate mirroring the upstream batch query: sponsored, optionally
    /// enacted, dated inside the window, and sponsored by someone in the
    /// identifier set. Source implementations share this so every backend
    /// answers the same question.
    pub fn matches(
        &self,
        window: Option<TimeWindow>,
        sponsor_ids: &BTreeSet<String>,
        enacted_only: bool,
    ) -> bool {
        if self.sponsors.is_empty() {
            return false;
        }
        if enacted_only && self.enacted_at.is_none() {
            return false;
        }
        if let Some(window) = window {
            match self.activity_at(enacted_only) {
                Some(instant) if window.contains(instant) => {}
                _ => return false,
            }
        }
        self.sponsors.iter().any(|sponsor| {
            sponsor
                .join_key()
                .is_some_and(|key| sponsor_ids.contains(key))
                || sponsor
                    .name
                    .as_deref()
                    .is_some_and(|name| sponsor_ids.contains(name))
        })
    }
}

/// One member's cast on a roll call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemberVote {
    #[serde(default, rename = "bioguideId")]
    pub bioguide_id: Option<String>,
    #[serde(default)]
    pub person_id: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "voteCast")]
    pub vote_cast: Option<String>,
}

impl MemberVote {
    pub fn join_key(&self) -> Option<&str> {
        self.bioguide_id
            .as_deref()
            .or(self.person_id.as_deref())
            .or(self.id.as_deref())
    }
}

/// A recorded roll call with per-member casts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VotingRecord {
    #[serde(default, rename = "memberVotes")]
    pub member_votes: Vec<MemberVote>,
}

impl VotingRecord {
    /// Does any cast on this roll call belong to the identifier set?
    pub fn involves(&self, member_ids: &BTreeSet<String>) -> bool {
        self.member_votes
            .iter()
            .any(|vote| vote.join_key().is_some_and(|key| member_ids.contains(key)))
    }
}

/// Upstream query failure. Caught at the aggregator boundary and degraded to
/// an empty result for the affected metric, never propagated as fatal.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("upstream query failed: {0}")]
    Query(String),
    #[error("could not decode upstream payload: {0}")]
    Decode(String),
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Legislator roster, queryable by chamber class.
pub trait RepresentativeSource: Send + Sync {
    fn by_district_type(
        &self,
        district_type: DistrictType,
    ) -> Result<Vec<Representative>, SourceError>;
}

/// Legislation corpus, queryable by time window and sponsor identifier set.
pub trait LegislationSource: Send + Sync {
    fn by_sponsors(
        &self,
        window: Option<TimeWindow>,
        sponsor_ids: &BTreeSet<String>,
        enacted_only: bool,
    ) -> Result<Vec<LegislationRecord>, SourceError>;
}

/// Roll call corpus, queryable by member identifier set.
pub trait VotingRecordSource: Send + Sync {
    fn by_members(&self, member_ids: &BTreeSet<String>) -> Result<Vec<VotingRecord>, SourceError>;
}
