use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use civic_pulse::heatmap::roster::{DistrictType, RawRepresentative, Representative};
use civic_pulse::heatmap::source::{
    LegislationRecord, LegislationSource, RepresentativeSource, SourceError, TimeWindow,
    VotingRecord, VotingRecordSource,
};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Sources backed by JSON corpus files in a data directory. Files are read
/// per query so a failed or missing file degrades that one metric to zero
/// scores instead of taking the whole service down.
#[derive(Debug, Clone)]
pub(crate) struct FileSources {
    dir: PathBuf,
}

impl FileSources {
    pub(crate) fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn open(&self, file_name: &str) -> Result<File, SourceError> {
        let path = self.dir.join(file_name);
        File::open(&path)
            .map_err(|err| SourceError::Unavailable(format!("{}: {err}", path.display())))
    }
}

impl RepresentativeSource for FileSources {
    fn by_district_type(
        &self,
        district_type: DistrictType,
    ) -> Result<Vec<Representative>, SourceError> {
        let reps = parse_representatives(self.open("representatives.json")?)?;
        Ok(reps
            .into_iter()
            .filter(|rep| district_type.admits(rep))
            .collect())
    }
}

impl LegislationSource for FileSources {
    fn by_sponsors(
        &self,
        window: Option<TimeWindow>,
        sponsor_ids: &BTreeSet<String>,
        enacted_only: bool,
    ) -> Result<Vec<LegislationRecord>, SourceError> {
        let records = parse_legislation(self.open("legislation.json")?)?;
        Ok(records
            .into_iter()
            .filter(|record| record.matches(window, sponsor_ids, enacted_only))
            .collect())
    }
}

impl VotingRecordSource for FileSources {
    fn by_members(&self, member_ids: &BTreeSet<String>) -> Result<Vec<VotingRecord>, SourceError> {
        let records = parse_voting_records(self.open("votes.json")?)?;
        Ok(records
            .into_iter()
            .filter(|record| record.involves(member_ids))
            .collect())
    }
}

/// Parse a raw representative dump, running each record through the
/// ingestion boundary; records without a usable identifier are dropped.
pub(crate) fn parse_representatives<R: Read>(reader: R) -> Result<Vec<Representative>, SourceError> {
    let raw: Vec<RawRepresentative> =
        serde_json::from_reader(reader).map_err(|err| SourceError::Decode(err.to_string()))?;
    Ok(raw
        .into_iter()
        .filter_map(RawRepresentative::into_canonical)
        .collect())
}

pub(crate) fn parse_legislation<R: Read>(reader: R) -> Result<Vec<LegislationRecord>, SourceError> {
    serde_json::from_reader(reader).map_err(|err| SourceError::Decode(err.to_string()))
}

pub(crate) fn parse_voting_records<R: Read>(reader: R) -> Result<Vec<VotingRecord>, SourceError> {
    serde_json::from_reader(reader).map_err(|err| SourceError::Decode(err.to_string()))
}

/// An explicit `--data-dir` argument wins over the configured directory.
pub(crate) fn resolve_data_dir(explicit: Option<PathBuf>, configured: &Path) -> PathBuf {
    explicit.unwrap_or_else(|| configured.to_path_buf())
}
