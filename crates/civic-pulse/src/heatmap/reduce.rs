//! Folding per-representative scores into per-district scores.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::activity::{TopicBreakdown, TopicFilter};
use super::roster::{RepKey, Representative};

/// Credit each representative's score to every candidate district key it
/// resolved to, then average any key touched by more than one contributor:
/// a genuine multi-member district should not double-count, and alias
/// candidates for the same officeholder collapse back to the original value.
pub fn fold_district_scores(
    reps: &[Representative],
    candidates: &HashMap<RepKey, Vec<String>>,
    scores: &HashMap<RepKey, f64>,
) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut contributors: BTreeMap<String, u32> = BTreeMap::new();

    for rep in reps {
        let Some(keys) = candidates.get(&rep.key).filter(|keys| !keys.is_empty()) else {
            continue;
        };
        let score = scores.get(&rep.key).copied().unwrap_or(0.0);
        for key in keys {
            *totals.entry(key.clone()).or_default() += score;
            *contributors.entry(key.clone()).or_default() += 1;
        }
    }

    for (key, total) in &mut totals {
        let count = contributors[key];
        if count > 1 {
            *total /= f64::from(count);
        }
    }
    totals
}

/// Sum the topic counts a district accumulated, restricted to the selected
/// topic when one is set.
pub fn topic_scores(breakdown: &TopicBreakdown, filter: &TopicFilter) -> BTreeMap<String, f64> {
    breakdown
        .district_topic_counts
        .iter()
        .map(|(district, counts)| {
            let total: u64 = counts
                .iter()
                .filter(|(topic, _)| filter.matches(topic))
                .map(|(_, count)| *count)
                .sum();
            (district.clone(), total as f64)
        })
        .collect()
}

/// Scale scores into `[0, 1]` by the batch maximum, for direct use as a
/// color-intensity input. No-op on an empty or all-zero batch.
pub fn normalize_by_max(scores: &mut BTreeMap<String, f64>) {
    let max = scores.values().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for value in scores.values_mut() {
            *value /= max;
        }
    }
}

/// Descriptive, non-authoritative batch statistics shipped alongside the
/// score map so callers can make their own scaling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreMetadata {
    pub total_districts: usize,
    pub total_representatives: usize,
    pub avg_score: f64,
    pub min_score: f64,
    pub max_score: f64,
}

pub fn score_metadata(scores: &BTreeMap<String, f64>, total_representatives: usize) -> ScoreMetadata {
    let values: Vec<f64> = scores.values().copied().collect();
    let (min, max, avg) = if values.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        (min, max, avg)
    };
    ScoreMetadata {
        total_districts: scores.len(),
        total_representatives,
        avg_score: round2(avg),
        min_score: round2(min),
        max_score: round2(max),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
