#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Funnel, weekly-volume, source-mix, stage-aging, and quarterly aggregates.
pub mod aggregates;
/// Per-dimension metric breakdowns.
pub mod breakdowns;
/// Bounded memoization of evaluated metric tiles.
pub mod cache;
/// Reusable report runners shared by the demo binaries.
pub mod cli_apps;
/// Tolerant cell coercion shared by workbook and CSV ingestion.
pub mod coerce;
/// Engine configuration.
pub mod config;
/// Centralized constants: sheet names, headers, ceilings, defaults, narrative copy.
pub mod constants;
/// Canonical fact records and dataset types.
pub mod data;
/// Catalog exports to CSV and XLSX.
pub mod export;
/// Filter selection, options, and application.
pub mod filters;
mod hash;
/// Aggregate-only digest handed to narrative collaborators.
pub mod insights;
/// Metric definitions, registry, formulas, and catalog tiles.
pub mod metrics;
/// Dataset ownership and last-submitted-wins uploads.
pub mod session;
/// Upload readers and the workbook normalizer/joiner.
pub mod source;
/// ISO-week metric trends.
pub mod trends;
/// Shared type aliases.
pub mod types;

mod errors;

pub use breakdowns::{BreakdownBar, Dimension, DimensionBreakdown, compute_breakdowns};
pub use cache::{CacheKey, CacheStats, MetricCache};
pub use config::EngineConfig;
pub use data::{
    CandidateType, Dataset, DatasetDiagnostics, FactRecord, InputKind, JoinCoverage,
    PipelineStatus, RecruiterInteraction,
};
pub use errors::CockpitError;
pub use export::{
    ExportRow, ExportedMetric, build_export_rows, export_metrics_to_csv, export_metrics_to_xlsx,
    parse_export_csv,
};
pub use filters::{
    FilterOptions, FilterSpec, apply_filters, derive_filter_options, filter_summary,
};
pub use insights::{InsightContext, NarrativeRequest, build_insight_context};
pub use metrics::{
    Cluster, ClusterTiles, ComputedMetric, KeyInsight, MetricDefinition, MetricOutcome,
    MetricRegistry, MetricTile, Rag, UnavailableReason, health_score, summarize_key_insights,
};
pub use session::{CockpitSession, UploadTicket};
pub use source::{load_path, load_upload};
pub use trends::{
    TrendPoint, TrendSeries, compute_all_metric_trends, compute_metric_trend, iso_week_key,
    summarize_trend,
};
pub use types::{
    ColumnName, DimensionValue, FactText, LogMessage, MetricId, QuarterKey, RecordKey, SheetName,
    WeekKey, WeekStart,
};
