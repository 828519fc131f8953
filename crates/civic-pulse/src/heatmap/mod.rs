//! District heatmap engine: resolves each legislator to candidate boundary
//! keys, scores legislative activity, and folds the results into per-district
//! scores for choropleth rendering.

pub mod activity;
pub mod cache;
pub mod district;
pub mod identity;
pub mod reduce;
pub mod roster;
pub mod source;
pub mod states;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;
use activity::{ActivityAggregator, TopicFilter};
use cache::TtlCache;
use district::resolve_district_keys;
use reduce::{fold_district_scores, normalize_by_max, score_metadata, topic_scores, ScoreMetadata};
use roster::{DistrictType, RepKey, Representative};
use source::{LegislationSource, RepresentativeSource, VotingRecordSource};
use states::StateCodes;

/// Representative-level metrics the engine can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeatmapMetric {
    #[serde(rename = "sponsored_bills")]
    SponsoredBills,
    #[serde(rename = "recent_activity")]
    RecentActivity,
    #[serde(rename = "enacted_bills")]
    EnactedBills,
    #[serde(rename = "enacted_recent_activity")]
    EnactedRecentActivity,
    #[serde(rename = "voted_with_majority")]
    VotedWithMajority,
}

/// The underlying computation once the enacted filter is split off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseMetric {
    Sponsored,
    Recent,
    Majority,
}

impl HeatmapMetric {
    pub const ALL: [HeatmapMetric; 5] = [
        HeatmapMetric::SponsoredBills,
        HeatmapMetric::RecentActivity,
        HeatmapMetric::EnactedBills,
        HeatmapMetric::EnactedRecentActivity,
        HeatmapMetric::VotedWithMajority,
    ];

    pub const fn slug(self) -> &'static str {
        match self {
            HeatmapMetric::SponsoredBills => "sponsored_bills",
            HeatmapMetric::RecentActivity => "recent_activity",
            HeatmapMetric::EnactedBills => "enacted_bills",
            HeatmapMetric::EnactedRecentActivity => "enacted_recent_activity",
            HeatmapMetric::VotedWithMajority => "voted_with_majority",
        }
    }

    pub fn from_slug(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|metric| metric.slug() == raw)
    }

    fn base(self) -> (BaseMetric, bool) {
        match self {
            HeatmapMetric::SponsoredBills => (BaseMetric::Sponsored, false),
            HeatmapMetric::EnactedBills => (BaseMetric::Sponsored, true),
            HeatmapMetric::RecentActivity => (BaseMetric::Recent, false),
            HeatmapMetric::EnactedRecentActivity => (BaseMetric::Recent, true),
            HeatmapMetric::VotedWithMajority => (BaseMetric::Majority, false),
        }
    }
}

/// Invalid request parameters: the one terminal, user-visible failure class.
/// Everything else in the engine degrades to empty or zero scores.
#[derive(Debug, thiserror::Error)]
pub enum HeatmapError {
    #[error("unknown district type '{0}'")]
    InvalidDistrictType(String),
    #[error("unknown metric '{0}'")]
    InvalidMetric(String),
}

impl HeatmapError {
    /// The enumerated valid values for the offending parameter, for error
    /// payloads.
    pub fn valid_values(&self) -> Vec<&'static str> {
        match self {
            HeatmapError::InvalidDistrictType(_) => {
                DistrictType::ALL.iter().map(|dt| dt.slug()).collect()
            }
            HeatmapError::InvalidMetric(_) => {
                HeatmapMetric::ALL.iter().map(|metric| metric.slug()).collect()
            }
        }
    }
}

pub fn parse_district_type(raw: Option<&str>) -> Result<DistrictType, HeatmapError> {
    match raw {
        None => Ok(DistrictType::Congressional),
        Some(value) => DistrictType::from_slug(value)
            .ok_or_else(|| HeatmapError::InvalidDistrictType(value.to_string())),
    }
}

pub fn parse_metric(raw: Option<&str>) -> Result<HeatmapMetric, HeatmapError> {
    match raw {
        None => Ok(HeatmapMetric::SponsoredBills),
        Some(value) => HeatmapMetric::from_slug(value)
            .ok_or_else(|| HeatmapError::InvalidMetric(value.to_string())),
    }
}

/// Scores keyed by representative metric, reduced to district granularity.
#[derive(Debug, Clone, Serialize)]
pub struct RepresentativeHeatmap {
    pub scores: BTreeMap<String, f64>,
    pub metric: HeatmapMetric,
    pub district_type: DistrictType,
    pub enacted_only: bool,
    pub available_metrics: Vec<&'static str>,
    pub metadata: ScoreMetadata,
}

/// Topic-tagged sponsorship volume per district, normalized for display.
#[derive(Debug, Clone, Serialize)]
pub struct TopicHeatmap {
    pub scores: BTreeMap<String, f64>,
    pub available_topics: Vec<String>,
    pub selected_topic: String,
    pub district_type: DistrictType,
    pub enacted_only: bool,
    pub metadata: ScoreMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Representative(DistrictType, HeatmapMetric),
    Topic(DistrictType, String, bool),
}

#[derive(Clone)]
enum CachedResult {
    Representative(RepresentativeHeatmap),
    Topic(TopicHeatmap),
}

/// The engine itself: stateless between invocations aside from the bounded
/// TTL cache at its boundary.
pub struct HeatmapEngine {
    representatives: Arc<dyn RepresentativeSource>,
    legislation: Arc<dyn LegislationSource>,
    votes: Arc<dyn VotingRecordSource>,
    codes: Arc<StateCodes>,
    cache: TtlCache<CacheKey, CachedResult>,
}

impl HeatmapEngine {
    pub fn new(
        representatives: Arc<dyn RepresentativeSource>,
        legislation: Arc<dyn LegislationSource>,
        votes: Arc<dyn VotingRecordSource>,
        codes: StateCodes,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            representatives,
            legislation,
            votes,
            codes: Arc::new(codes),
            cache: TtlCache::new(cache_ttl),
        }
    }

    pub fn representative_heatmap(
        &self,
        district_type: DistrictType,
        metric: HeatmapMetric,
        now: DateTime<Utc>,
    ) -> RepresentativeHeatmap {
        let cache_key = CacheKey::Representative(district_type, metric);
        if let Some(CachedResult::Representative(cached)) = self.cache.get(&cache_key) {
            return cached;
        }

        let reps = self.roster(district_type);
        let candidates = self.candidates(&reps);
        let aggregator = ActivityAggregator::new(&*self.legislation, &*self.votes);
        let (base, enacted_only) = metric.base();
        let rep_scores = match base {
            BaseMetric::Sponsored => aggregator.sponsored_counts(&reps, now, enacted_only),
            BaseMetric::Recent => aggregator.recent_activity_scores(&reps, now, enacted_only),
            BaseMetric::Majority => aggregator.voting_majority_scores(&reps),
        };

        let scores = fold_district_scores(&reps, &candidates, &rep_scores);
        let metadata = score_metadata(&scores, reps.len());
        let response = RepresentativeHeatmap {
            scores,
            metric,
            district_type,
            enacted_only,
            available_metrics: HeatmapMetric::ALL.iter().map(|m| m.slug()).collect(),
            metadata,
        };
        self.cache
            .insert(cache_key, CachedResult::Representative(response.clone()));
        response
    }

    pub fn topic_heatmap(
        &self,
        district_type: DistrictType,
        filter: &TopicFilter,
        enacted_only: bool,
        now: DateTime<Utc>,
    ) -> TopicHeatmap {
        let cache_key = CacheKey::Topic(district_type, filter.label(), enacted_only);
        if let Some(CachedResult::Topic(cached)) = self.cache.get(&cache_key) {
            return cached;
        }

        let reps = self.roster(district_type);
        let candidates = self.candidates(&reps);
        let aggregator = ActivityAggregator::new(&*self.legislation, &*self.votes);
        let breakdown = aggregator.topic_counts(&reps, &candidates, now, enacted_only, filter);

        let mut scores = topic_scores(&breakdown, filter);
        normalize_by_max(&mut scores);
        let metadata = score_metadata(&scores, reps.len());

        let mut available_topics = Vec::with_capacity(breakdown.topics.len() + 1);
        available_topics.push("all".to_string());
        available_topics.extend(breakdown.topics.iter().cloned());

        let response = TopicHeatmap {
            scores,
            available_topics,
            selected_topic: filter.label(),
            district_type,
            enacted_only,
            metadata,
        };
        self.cache.insert(cache_key, CachedResult::Topic(response.clone()));
        response
    }

    fn roster(&self, district_type: DistrictType) -> Vec<Representative> {
        match self.representatives.by_district_type(district_type) {
            Ok(reps) => reps,
            Err(error) => {
                warn!(%error, district_type = district_type.slug(), "roster query failed; rendering zero scores");
                Vec::new()
            }
        }
    }

    fn candidates(&self, reps: &[Representative]) -> HashMap<RepKey, Vec<String>> {
        reps.iter()
            .map(|rep| (rep.key.clone(), resolve_district_keys(rep, &self.codes)))
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RepresentativeHeatmapParams {
    #[serde(default)]
    pub district_type: Option<String>,
    #[serde(default)]
    pub metric: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopicHeatmapParams {
    #[serde(default)]
    pub district_type: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub enacted: bool,
}

/// Routes for both heatmap surfaces; mounted by the service binary.
pub fn heatmap_router(engine: Arc<HeatmapEngine>) -> Router {
    Router::new()
        .route(
            "/api/v1/heatmap/representatives",
            get(representative_heatmap_endpoint),
        )
        .route("/api/v1/heatmap/topics", get(topic_heatmap_endpoint))
        .with_state(engine)
}

async fn representative_heatmap_endpoint(
    State(engine): State<Arc<HeatmapEngine>>,
    Query(params): Query<RepresentativeHeatmapParams>,
) -> Result<Json<RepresentativeHeatmap>, AppError> {
    let district_type = parse_district_type(params.district_type.as_deref())?;
    let metric = parse_metric(params.metric.as_deref())?;
    Ok(Json(
        engine.representative_heatmap(district_type, metric, Utc::now()),
    ))
}

async fn topic_heatmap_endpoint(
    State(engine): State<Arc<HeatmapEngine>>,
    Query(params): Query<TopicHeatmapParams>,
) -> Result<Json<TopicHeatmap>, AppError> {
    let district_type = parse_district_type(params.district_type.as_deref())?;
    let filter = TopicFilter::parse(params.topic.as_deref().unwrap_or("all"));
    Ok(Json(engine.topic_heatmap(
        district_type,
        &filter,
        params.enacted,
        Utc::now(),
    )))
}
