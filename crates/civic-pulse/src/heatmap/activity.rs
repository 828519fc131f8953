//! Per-representative activity scoring over the legislation and roll call
//! corpora.
//!
//! Every metric runs one bounded batch query against its backing source for
//! the whole representative set; the identifier-normalization machinery
//! exists precisely so this never degenerates into per-representative
//! queries. Upstream failures degrade to empty score maps so sibling metrics
//! and the rest of the response still render.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use super::identity::id_variants;
use super::roster::{RepKey, Representative};
use super::source::{LegislationSource, TimeWindow, VotingRecord, VotingRecordSource};

/// Join index from every known identifier spelling to its owning
/// representative.
pub struct SponsorIndex {
    by_variant: HashMap<String, RepKey>,
    name_tokens: Vec<(String, String, RepKey)>,
}

impl SponsorIndex {
    pub fn build(reps: &[Representative]) -> Self {
        let mut by_variant = HashMap::new();
        let mut name_tokens = Vec::new();
        for rep in reps {
            for variant in rep.identifier_variants() {
                by_variant.insert(variant, rep.key.clone());
            }
            if let Some(name) = rep.name.as_deref() {
                let lowered = name.to_ascii_lowercase();
                let mut tokens = lowered.split_whitespace();
                if let (Some(first), Some(last)) = (tokens.next(), tokens.next_back()) {
                    if first != last {
                        name_tokens.push((first.to_string(), last.to_string(), rep.key.clone()));
                    }
                }
            }
        }
        Self {
            by_variant,
            name_tokens,
        }
    }

    /// Every identifier spelling known to the index, for the batch query.
    pub fn known_ids(&self) -> BTreeSet<String> {
        self.by_variant.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_variant.is_empty()
    }

    /// Resolve a join key: exact hit, then normalized variants, then a
    /// first-plus-last name-token comparison for hand-entered sponsor names.
    pub fn resolve(&self, raw: &str) -> Option<&RepKey> {
        if let Some(key) = self.by_variant.get(raw) {
            return Some(key);
        }
        for variant in id_variants(raw) {
            if let Some(key) = self.by_variant.get(&variant) {
                return Some(key);
            }
        }
        let lowered = raw.to_ascii_lowercase();
        let mut tokens = lowered.split_whitespace();
        if let (Some(first), Some(last)) = (tokens.next(), tokens.next_back()) {
            if first != last {
                return self
                    .name_tokens
                    .iter()
                    .find(|(f, l, _)| f == first && l == last)
                    .map(|(_, _, key)| key);
            }
        }
        None
    }
}

/// Step function over days since the most recent matching action.
fn recency_bucket(now: DateTime<Utc>, latest: DateTime<Utc>) -> f64 {
    let days = (now - latest).num_seconds() as f64 / 86_400.0;
    if days < 7.0 {
        100.0
    } else if days < 30.0 {
        80.0
    } else if days < 90.0 {
        60.0
    } else if days < 180.0 {
        40.0
    } else if days < 365.0 {
        20.0
    } else {
        10.0
    }
}

#[derive(Debug, Default)]
struct RecencyTally {
    latest: Option<DateTime<Utc>>,
    last_30: u32,
    last_90: u32,
    last_180: u32,
}

/// Computes per-representative scores for each supported metric.
pub struct ActivityAggregator<'a> {
    legislation: &'a dyn LegislationSource,
    votes: &'a dyn VotingRecordSource,
}

impl<'a> ActivityAggregator<'a> {
    pub fn new(legislation: &'a dyn LegislationSource, votes: &'a dyn VotingRecordSource) -> Self {
        Self { legislation, votes }
    }

    /// Count of bills each representative sponsored in the current calendar
    /// year (or, with `enacted_only`, bills carrying an enactment date).
    pub fn sponsored_counts(
        &self,
        reps: &[Representative],
        now: DateTime<Utc>,
        enacted_only: bool,
    ) -> HashMap<RepKey, f64> {
        let index = SponsorIndex::build(reps);
        if index.is_empty() {
            return HashMap::new();
        }
        let window = TimeWindow::calendar_year(now);
        let records =
            match self
                .legislation
                .by_sponsors(Some(window), &index.known_ids(), enacted_only)
            {
                Ok(records) => records,
                Err(error) => {
                    warn!(%error, "legislation query failed; sponsorship counts degrade to zero");
                    return HashMap::new();
                }
            };

        let mut counts: HashMap<RepKey, f64> = HashMap::new();
        for record in &records {
            for sponsor in &record.sponsors {
                let Some(raw) = sponsor.join_key() else {
                    continue;
                };
                if let Some(key) = index.resolve(raw) {
                    *counts.entry(key.clone()).or_default() += 1.0;
                }
            }
        }
        counts
    }

    /// Recency-weighted activity: a step score from the most recent matching
    /// legislative action plus a bounded volume boost. Representatives with
    /// no matching legislation fall back to a single-field heuristic over
    /// their own `updated_at` timestamp, without the boost.
    pub fn recent_activity_scores(
        &self,
        reps: &[Representative],
        now: DateTime<Utc>,
        enacted_only: bool,
    ) -> HashMap<RepKey, f64> {
        let index = SponsorIndex::build(reps);
        let mut scores: HashMap<RepKey, f64> = HashMap::new();

        if !index.is_empty() {
            match self
                .legislation
                .by_sponsors(None, &index.known_ids(), enacted_only)
            {
                Ok(records) => {
                    let mut tallies: HashMap<RepKey, RecencyTally> = HashMap::new();
                    for record in &records {
                        let Some(acted_at) = record.activity_at(enacted_only) else {
                            continue;
                        };
                        for sponsor in &record.sponsors {
                            let Some(key) = sponsor.join_key().and_then(|raw| index.resolve(raw))
                            else {
                                continue;
                            };
                            let tally = tallies.entry(key.clone()).or_default();
                            if tally.latest.is_none_or(|seen| acted_at > seen) {
                                tally.latest = Some(acted_at);
                            }
                            if acted_at >= now - Duration::days(30) {
                                tally.last_30 += 1;
                            }
                            if acted_at >= now - Duration::days(90) {
                                tally.last_90 += 1;
                            }
                            if acted_at >= now - Duration::days(180) {
                                tally.last_180 += 1;
                            }
                        }
                    }
                    for (key, tally) in tallies {
                        let Some(latest) = tally.latest else { continue };
                        let base = recency_bucket(now, latest);
                        let boost = f64::from(
                            tally.last_30 * 4 + tally.last_90 * 2 + tally.last_180,
                        )
                        .min(20.0);
                        scores.insert(key, base + boost);
                    }
                }
                Err(error) => {
                    warn!(%error, "legislation query failed; recent activity falls back to profile timestamps");
                }
            }
        }

        for rep in reps {
            scores
                .entry(rep.key.clone())
                .or_insert_with(|| Self::profile_fallback_score(rep, now));
        }
        scores
    }

    fn profile_fallback_score(rep: &Representative, now: DateTime<Utc>) -> f64 {
        rep.updated_at
            .map(|updated| recency_bucket(now, updated))
            .unwrap_or(0.0)
    }

    /// Percentage of each representative's Yea/Nay-equivalent casts that
    /// agree with the roll call's majority position. Ties carry no majority
    /// and are skipped; abstentions and not-voting never enter the
    /// denominator.
    pub fn voting_majority_scores(&self, reps: &[Representative]) -> HashMap<RepKey, f64> {
        let index = SponsorIndex::build(reps);
        if index.is_empty() {
            return HashMap::new();
        }
        let records = match self.votes.by_members(&index.known_ids()) {
            Ok(records) => records,
            Err(error) => {
                warn!(%error, "roll call query failed; majority alignment degrades to zero");
                return HashMap::new();
            }
        };

        let mut agreements: HashMap<RepKey, (u32, u32)> = HashMap::new();
        for record in &records {
            let Some(majority) = majority_position(record) else {
                continue;
            };
            for vote in &record.member_votes {
                let Some(cast) = vote.vote_cast.as_deref().and_then(classify_cast) else {
                    continue;
                };
                let Some(key) = vote.join_key().and_then(|raw| index.resolve(raw)) else {
                    continue;
                };
                let entry = agreements.entry(key.clone()).or_default();
                entry.1 += 1;
                if cast == majority {
                    entry.0 += 1;
                }
            }
        }

        agreements
            .into_iter()
            .filter(|(_, (_, eligible))| *eligible > 0)
            .map(|(key, (agreed, eligible))| {
                (key, f64::from(agreed) / f64::from(eligible) * 100.0)
            })
            .collect()
    }

    /// Topic-tagged sponsorship counts, aggregated straight to district
    /// granularity (topic breakdowns are consumed per-district). The caller
    /// supplies each representative's candidate district keys.
    pub fn topic_counts(
        &self,
        reps: &[Representative],
        candidates: &HashMap<RepKey, Vec<String>>,
        now: DateTime<Utc>,
        enacted_only: bool,
        filter: &TopicFilter,
    ) -> TopicBreakdown {
        let index = SponsorIndex::build(reps);
        if index.is_empty() {
            return TopicBreakdown::default();
        }
        let window = TimeWindow::calendar_year(now);
        let records =
            match self
                .legislation
                .by_sponsors(Some(window), &index.known_ids(), enacted_only)
            {
                Ok(records) => records,
                Err(error) => {
                    warn!(%error, "legislation query failed; topic counts degrade to zero");
                    return TopicBreakdown::default();
                }
            };

        let mut breakdown = TopicBreakdown::default();
        for record in &records {
            let topics = record.broad_topics();
            if topics.is_empty() || !topics.iter().any(|topic| filter.matches(topic)) {
                continue;
            }
            for sponsor in &record.sponsors {
                let Some(key) = sponsor.join_key().and_then(|raw| index.resolve(raw)) else {
                    continue;
                };
                let Some(district_keys) = candidates.get(key).filter(|keys| !keys.is_empty())
                else {
                    continue;
                };
                for topic in topics {
                    breakdown.topics.insert(topic.clone());
                    for district in district_keys {
                        *breakdown
                            .district_topic_counts
                            .entry(district.clone())
                            .or_default()
                            .entry(topic.clone())
                            .or_default() += 1;
                    }
                }
            }
        }
        breakdown
    }
}

/// Case-insensitive topic selection; `All` is the no-filter sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicFilter {
    All,
    Contains(String),
}

impl TopicFilter {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            TopicFilter::All
        } else {
            TopicFilter::Contains(trimmed.to_ascii_lowercase())
        }
    }

    pub fn matches(&self, topic: &str) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Contains(needle) => topic.to_ascii_lowercase().contains(needle),
        }
    }

    pub fn label(&self) -> String {
        match self {
            TopicFilter::All => "all".to_string(),
            TopicFilter::Contains(needle) => needle.clone(),
        }
    }
}

/// District-keyed topic counts plus every topic observed in the batch.
#[derive(Debug, Default)]
pub struct TopicBreakdown {
    pub district_topic_counts: HashMap<String, BTreeMap<String, u64>>,
    pub topics: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VoteCast {
    Yea,
    Nay,
}

fn classify_cast(raw: &str) -> Option<VoteCast> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "yea" | "yes" | "aye" => Some(VoteCast::Yea),
        "nay" | "no" => Some(VoteCast::Nay),
        _ => None,
    }
}

/// The position taken by a strict majority of Yea/Nay-equivalent casts;
/// `None` on a tie or when nobody cast an eligible vote.
fn majority_position(record: &VotingRecord) -> Option<VoteCast> {
    let mut yeas = 0u32;
    let mut nays = 0u32;
    for vote in &record.member_votes {
        match vote.vote_cast.as_deref().and_then(classify_cast) {
            Some(VoteCast::Yea) => yeas += 1,
            Some(VoteCast::Nay) => nays += 1,
            None => {}
        }
    }
    if yeas == nays {
        return None;
    }
    Some(if yeas > nays {
        VoteCast::Yea
    } else {
        VoteCast::Nay
    })
}
