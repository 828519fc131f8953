use crate::infra::{resolve_data_dir, FileSources};
use chrono::Utc;
use civic_pulse::config::AppConfig;
use civic_pulse::error::AppError;
use civic_pulse::heatmap::activity::TopicFilter;
use civic_pulse::heatmap::states::StateCodes;
use civic_pulse::heatmap::{parse_district_type, parse_metric, HeatmapEngine};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug)]
pub(crate) struct RepresentativesReportArgs {
    /// Directory holding the JSON corpus files (defaults to APP_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Boundary dataset to score against
    #[arg(long)]
    district_type: Option<String>,
    /// Metric to compute
    #[arg(long)]
    metric: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct TopicsReportArgs {
    /// Directory holding the JSON corpus files (defaults to APP_DATA_DIR)
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// Boundary dataset to score against
    #[arg(long)]
    district_type: Option<String>,
    /// Case-insensitive topic substring; omit for all topics
    #[arg(long)]
    topic: Option<String>,
    /// Only count legislation carrying an enactment date
    #[arg(long)]
    enacted: bool,
}

fn build_engine(data_dir: Option<PathBuf>) -> Result<HeatmapEngine, AppError> {
    let config = AppConfig::load()?;
    let sources = FileSources::new(resolve_data_dir(data_dir, &config.data.dir));
    Ok(HeatmapEngine::new(
        Arc::new(sources.clone()),
        Arc::new(sources.clone()),
        Arc::new(sources),
        StateCodes::standard(),
        Duration::ZERO,
    ))
}

fn print_json<T: serde::Serialize>(report: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
    println!("{rendered}");
    Ok(())
}

pub(crate) fn run_representatives_report(args: RepresentativesReportArgs) -> Result<(), AppError> {
    let district_type = parse_district_type(args.district_type.as_deref())?;
    let metric = parse_metric(args.metric.as_deref())?;
    let engine = build_engine(args.data_dir)?;
    let report = engine.representative_heatmap(district_type, metric, Utc::now());
    print_json(&report)
}

pub(crate) fn run_topics_report(args: TopicsReportArgs) -> Result<(), AppError> {
    let district_type = parse_district_type(args.district_type.as_deref())?;
    let filter = TopicFilter::parse(args.topic.as_deref().unwrap_or("all"));
    let engine = build_engine(args.data_dir)?;
    let report = engine.topic_heatmap(district_type, &filter, args.enacted, Utc::now());
    print_json(&report)
}
