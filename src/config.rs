use crate::constants::{breakdowns, cache, ingest, insights, trends};
use crate::errors::CockpitError;

/// Tunables for ingestion, windowing, and context digests.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Pipeline rows above this count abort the upload.
    pub max_pipeline_rows: usize,
    /// Unmatched candidate/requisition ids sampled into diagnostics.
    pub missing_id_sample_limit: usize,
    /// Candidate/requisition join coverage below this ratio adds a warning.
    pub join_coverage_warning_ratio: f64,
    /// Rows scanned per sheet when listing its columns.
    pub sheet_column_scan_rows: usize,
    /// Most recent weeks kept by trend computations.
    pub trend_max_weeks: usize,
    /// Maximum bars per dimension breakdown.
    pub max_breakdown_bars: usize,
    /// Maximum breakdowns returned per metric.
    pub max_breakdowns: usize,
    /// Minimum distinct groups required for a breakdown.
    pub min_breakdown_groups: usize,
    /// Source channels kept in the insight-context source mix.
    pub top_source_count: usize,
    /// Stages kept in the insight-context stage-aging digest.
    pub top_stage_aging_count: usize,
    /// Leading funnel stages kept in the insight context.
    pub top_funnel_stage_count: usize,
    /// Memoized metric results kept by the session cache.
    pub cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_pipeline_rows: ingest::MAX_PIPELINE_ROWS,
            missing_id_sample_limit: ingest::MISSING_ID_SAMPLE_LIMIT,
            join_coverage_warning_ratio: ingest::JOIN_COVERAGE_WARNING_RATIO,
            sheet_column_scan_rows: ingest::SHEET_COLUMN_SCAN_ROWS,
            trend_max_weeks: trends::DEFAULT_MAX_WEEKS,
            max_breakdown_bars: breakdowns::MAX_BARS,
            max_breakdowns: breakdowns::MAX_BREAKDOWNS,
            min_breakdown_groups: breakdowns::MIN_DISTINCT,
            top_source_count: insights::TOP_SOURCES,
            top_stage_aging_count: insights::TOP_STAGE_AGING,
            top_funnel_stage_count: insights::TOP_FUNNEL_STAGES,
            cache_capacity: cache::DEFAULT_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Override the pipeline row ceiling.
    pub fn with_max_pipeline_rows(mut self, rows: usize) -> Self {
        self.max_pipeline_rows = rows;
        self
    }

    /// Override the trend window.
    pub fn with_trend_max_weeks(mut self, weeks: usize) -> Self {
        self.trend_max_weeks = weeks;
        self
    }

    /// Override the number of bars kept per breakdown.
    pub fn with_max_breakdown_bars(mut self, bars: usize) -> Self {
        self.max_breakdown_bars = bars;
        self
    }

    /// Override the memoization capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Reject settings that would make breakdowns or trends degenerate.
    pub fn validate(&self) -> Result<(), CockpitError> {
        if self.trend_max_weeks == 0 {
            return Err(CockpitError::Configuration(
                "trend_max_weeks must be at least 1".to_string(),
            ));
        }
        if self.min_breakdown_groups < 2 {
            return Err(CockpitError::Configuration(
                "min_breakdown_groups must be at least 2".to_string(),
            ));
        }
        if self.max_breakdown_bars < self.min_breakdown_groups {
            return Err(CockpitError::Configuration(format!(
                "max_breakdown_bars ({}) must be >= min_breakdown_groups ({})",
                self.max_breakdown_bars, self.min_breakdown_groups
            )));
        }
        if !(0.0..=1.0).contains(&self.join_coverage_warning_ratio) {
            return Err(CockpitError::Configuration(format!(
                "join_coverage_warning_ratio must be within [0, 1], got {}",
                self.join_coverage_warning_ratio
            )));
        }
        Ok(())
    }
}
