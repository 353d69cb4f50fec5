//! Aggregate-only insight context handed to the narrative collaborator.
//!
//! The context carries counts, shares, percentiles, and metric snapshots.
//! It never carries application, candidate, or requisition identifiers.

use std::collections::HashSet;

use serde::Serialize;

use crate::aggregates::{
    ApplicationTypeQuarter, InteractionTypeQuarter, SourceShare, StageAging, StageCount,
    WeeklyVolume, application_type_by_quarter, compute_stage_distribution, compute_weekly_trend,
    interaction_type_by_quarter, pct_change, share_breakdown, stage_aging,
};
use crate::config::EngineConfig;
use crate::constants::insights::{APPLICATION_TYPE_NOTE, INTERACTION_TYPE_NOTE, STAGE_DISTRIBUTION_NOTE};
use crate::data::{FactRecord, PipelineStatus, RecruiterInteraction};
use crate::errors::CockpitError;
use crate::filters::FilterSpec;
use crate::metrics::{MetricTile, Rag};
use crate::types::MetricId;

/// Slice-level volume counts.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceSummary {
    /// Rows in the slice.
    pub total_rows: usize,
    /// Unique applications (positional fallback for missing ids).
    pub unique_applications: usize,
    /// Unique candidate ids.
    pub unique_candidates: usize,
    /// Unique requisition ids.
    pub unique_requisitions: usize,
}

/// Unique applications per status.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusMix {
    /// Active applications.
    pub active: usize,
    /// Hired applications.
    pub hired: usize,
    /// Rejected applications.
    pub rejected: usize,
}

/// Display-level view of one tile.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    /// Metric id.
    pub id: MetricId,
    /// Title.
    pub title: String,
    /// Display value.
    pub value_text: String,
    /// Display threshold.
    pub threshold_text: String,
    /// Classification.
    pub rag: Rag,
}

impl From<&MetricTile> for MetricSnapshot {
    fn from(tile: &MetricTile) -> Self {
        Self {
            id: tile.id.clone(),
            title: tile.title.clone(),
            value_text: tile.value_text.clone(),
            threshold_text: tile.threshold_text.clone(),
            rag: tile.rag,
        }
    }
}

/// Current-stage snapshot with its disclaimer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDistributionContext {
    /// States that this is not a conversion funnel.
    pub note: &'static str,
    /// Stages in funnel order.
    pub points: Vec<StageCount>,
    /// Unique applications, id-less rows counted by position.
    pub total_applications: usize,
    /// Rows without an application id.
    pub missing_application_id_rows: usize,
}

/// Recent weekly volume with week-over-week change.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTrendContext {
    /// Most recent weeks, oldest first.
    pub points: Vec<WeeklyVolume>,
    /// Last vs previous week, applications.
    pub applications_wow_change_pct: Option<f64>,
    /// Last vs previous week, hires.
    pub hires_wow_change_pct: Option<f64>,
    /// Rows without an application date.
    pub missing_dates: usize,
}

/// Quarterly application split with its note.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationTypeContext {
    /// Counting rule.
    pub note: &'static str,
    /// Quarters, oldest first.
    pub quarters: Vec<ApplicationTypeQuarter>,
}

/// Quarterly interaction split with its note.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionTypeContext {
    /// Counting rule.
    pub note: &'static str,
    /// Quarters, oldest first.
    pub quarters: Vec<InteractionTypeQuarter>,
}

/// Statistical digest of the filtered slice.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightContext {
    /// Volume counts.
    pub summary: SliceSummary,
    /// Status mix.
    pub status_mix: StatusMix,
    /// Red tiles.
    pub red_metrics: Vec<MetricSnapshot>,
    /// Amber tiles.
    pub amber_metrics: Vec<MetricSnapshot>,
    /// Leading stages of the distribution.
    pub top_funnel_stages: Vec<StageCount>,
    /// Full stage distribution.
    pub stage_distribution: StageDistributionContext,
    /// Weekly volume.
    pub weekly_trend: WeeklyTrendContext,
    /// Largest source channels.
    pub source_mix_top: Vec<SourceShare>,
    /// Slowest stages.
    pub stage_aging_top: Vec<StageAging>,
    /// Applications per quarter by candidate type.
    pub application_type_by_quarter: ApplicationTypeContext,
    /// Recruiter interactions per quarter by type.
    pub interaction_type_by_quarter: InteractionTypeContext,
}

fn summarize_slice(rows: &[&FactRecord]) -> (SliceSummary, StatusMix) {
    let mut applications = HashSet::new();
    let mut candidates = HashSet::new();
    let mut requisitions = HashSet::new();
    let mut active = HashSet::new();
    let mut hired = HashSet::new();
    let mut rejected = HashSet::new();
    for (idx, row) in rows.iter().enumerate() {
        let key = row.application_key(idx);
        if let Some(candidate) = row.candidate_id.as_deref() {
            candidates.insert(candidate);
        }
        if let Some(requisition) = row.requisition_id.as_deref() {
            requisitions.insert(requisition);
        }
        match row.status {
            Some(PipelineStatus::Active) => active.insert(key.clone()),
            Some(PipelineStatus::Hired) => hired.insert(key.clone()),
            Some(PipelineStatus::Rejected) => rejected.insert(key.clone()),
            None => false,
        };
        applications.insert(key);
    }
    (
        SliceSummary {
            total_rows: rows.len(),
            unique_applications: applications.len(),
            unique_candidates: candidates.len(),
            unique_requisitions: requisitions.len(),
        },
        StatusMix {
            active: active.len(),
            hired: hired.len(),
            rejected: rejected.len(),
        },
    )
}

fn weekly_context(rows: &[&FactRecord], max_weeks: usize) -> WeeklyTrendContext {
    let weekly = compute_weekly_trend(rows);
    let skip = weekly.points.len().saturating_sub(max_weeks);
    let points: Vec<WeeklyVolume> = weekly.points.into_iter().skip(skip).collect();
    let (applications_wow_change_pct, hires_wow_change_pct) = match points.as_slice() {
        [.., previous, last] => (
            pct_change(last.applications as f64, previous.applications as f64),
            pct_change(last.hires as f64, previous.hires as f64),
        ),
        _ => (None, None),
    };
    WeeklyTrendContext {
        points,
        applications_wow_change_pct,
        hires_wow_change_pct,
        missing_dates: weekly.missing_dates,
    }
}

/// Build the digest for `rows`, with `tiles` as the currently displayed catalog.
pub fn build_insight_context<'a>(
    rows: &[&FactRecord],
    interactions: &[RecruiterInteraction],
    tiles: impl IntoIterator<Item = &'a MetricTile>,
    config: &EngineConfig,
) -> InsightContext {
    let (summary, status_mix) = summarize_slice(rows);
    let (red_metrics, amber_metrics) = tiles.into_iter().fold(
        (Vec::new(), Vec::new()),
        |(mut red, mut amber), tile| {
            match tile.rag {
                Rag::Red => red.push(MetricSnapshot::from(tile)),
                Rag::Amber => amber.push(MetricSnapshot::from(tile)),
                Rag::Green => {}
            }
            (red, amber)
        },
    );
    let distribution = compute_stage_distribution(rows);
    InsightContext {
        summary,
        status_mix,
        red_metrics,
        amber_metrics,
        top_funnel_stages: distribution
            .points
            .iter()
            .take(config.top_funnel_stage_count)
            .cloned()
            .collect(),
        stage_distribution: StageDistributionContext {
            note: STAGE_DISTRIBUTION_NOTE,
            points: distribution.points,
            total_applications: distribution.total_applications,
            missing_application_id_rows: distribution.missing_application_id_rows,
        },
        weekly_trend: weekly_context(rows, config.trend_max_weeks),
        source_mix_top: share_breakdown(rows, config.top_source_count),
        stage_aging_top: stage_aging(rows, config.top_stage_aging_count),
        application_type_by_quarter: ApplicationTypeContext {
            note: APPLICATION_TYPE_NOTE,
            quarters: application_type_by_quarter(rows),
        },
        interaction_type_by_quarter: InteractionTypeContext {
            note: INTERACTION_TYPE_NOTE,
            quarters: interaction_type_by_quarter(interactions, rows),
        },
    }
}

/// Payload for the narrative/chat collaborator.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrativeRequest {
    /// Active filters.
    pub filters: FilterSpec,
    /// Displayed tiles, display fields only.
    pub metrics: Vec<MetricSnapshot>,
    /// Slice digest.
    pub context: InsightContext,
}

impl NarrativeRequest {
    /// Assemble the payload from the active filters, displayed tiles, and digest.
    pub fn new<'a>(
        filters: &FilterSpec,
        tiles: impl IntoIterator<Item = &'a MetricTile>,
        context: InsightContext,
    ) -> Self {
        Self {
            filters: filters.clone(),
            metrics: tiles.into_iter().map(MetricSnapshot::from).collect(),
            context,
        }
    }

    /// Pretty JSON body.
    pub fn to_json(&self) -> Result<String, CockpitError> {
        serde_json::to_string_pretty(self).map_err(|err| CockpitError::Export(err.to_string()))
    }
}
