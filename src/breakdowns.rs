//! Per-dimension metric breakdowns.
//!
//! For each metric the registry lists five dimensions in priority order. A
//! dimension is used only when the slice has enough distinct values in it;
//! the metric is recomputed per group and the largest groups are kept.

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::data::FactRecord;
use crate::metrics::{MetricRegistry, Rag};
use crate::types::DimensionValue;

/// Fact-table column a metric can be broken down by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    /// Business unit.
    BusinessUnit,
    /// Location.
    Location,
    /// Role name.
    RoleName,
    /// Sourcing channel.
    Source,
    /// Recruiter.
    RecruiterId,
    /// Internal or external.
    CandidateType,
    /// Current pipeline stage.
    CurrentStage,
    /// Pipeline status.
    Status,
}

impl Dimension {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::BusinessUnit => "Business Unit",
            Dimension::Location => "Location",
            Dimension::RoleName => "Role",
            Dimension::Source => "Source",
            Dimension::RecruiterId => "Recruiter",
            Dimension::CandidateType => "Candidate Type",
            Dimension::CurrentStage => "Pipeline Stage",
            Dimension::Status => "Status",
        }
    }

    /// The record's value for this dimension; blank values count as absent.
    pub fn value_of(self, record: &FactRecord) -> Option<&str> {
        let value = match self {
            Dimension::BusinessUnit => record.business_unit.as_deref(),
            Dimension::Location => record.location.as_deref(),
            Dimension::RoleName => record.role_name.as_deref(),
            Dimension::Source => record.source.as_deref(),
            Dimension::RecruiterId => record.recruiter_id.as_deref(),
            Dimension::CandidateType => record.candidate_type.map(|kind| kind.as_str()),
            Dimension::CurrentStage => record.current_stage.as_deref(),
            Dimension::Status => record.status.map(|status| status.as_str()),
        };
        value.filter(|value| !value.is_empty())
    }
}

/// One group's metric value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BreakdownBar {
    /// Group value.
    pub dimension_value: DimensionValue,
    /// Metric value for the group.
    pub value_num: f64,
    /// Display value for the group.
    pub value_text: String,
    /// Group classification.
    pub rag: Rag,
    /// Rows in the group.
    pub row_count: usize,
}

/// A metric split along one dimension.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DimensionBreakdown {
    /// Dimension.
    pub dimension: Dimension,
    /// Dimension display label.
    pub dimension_label: String,
    /// Bars, largest group first.
    pub bars: Vec<BreakdownBar>,
    /// Metric value on the whole slice.
    pub overall_value_num: f64,
    /// Classification on the whole slice.
    pub overall_rag: Rag,
}

fn has_distinct_values(rows: &[&FactRecord], dimension: Dimension, min: usize) -> bool {
    let mut seen = std::collections::HashSet::new();
    rows.iter()
        .filter_map(|row| dimension.value_of(row))
        .any(|value| seen.insert(value) && seen.len() >= min)
}

fn group_rows<'a>(
    rows: &[&'a FactRecord],
    dimension: Dimension,
) -> IndexMap<&'a str, Vec<&'a FactRecord>> {
    let mut groups: IndexMap<&str, Vec<&FactRecord>> = IndexMap::new();
    for row in rows.iter().copied() {
        if let Some(value) = dimension.value_of(row) {
            groups.entry(value).or_default().push(row);
        }
    }
    groups
}

/// Breakdowns for `metric_id` on `rows`.
///
/// Empty when the metric is unknown or not computable on the whole slice.
pub fn compute_breakdowns(
    registry: &MetricRegistry,
    metric_id: &str,
    rows: &[&FactRecord],
    config: &EngineConfig,
) -> Vec<DimensionBreakdown> {
    let Some(definition) = registry.get(metric_id) else {
        return Vec::new();
    };
    let overall = definition.evaluate(rows);
    let Some(overall) = overall.computed() else {
        return Vec::new();
    };
    let Some(overall_value_num) = overall.value_num else {
        return Vec::new();
    };

    let mut breakdowns = Vec::new();
    for &dimension in definition.breakdown_dimensions {
        if breakdowns.len() >= config.max_breakdowns {
            break;
        }
        if !has_distinct_values(rows, dimension, config.min_breakdown_groups) {
            continue;
        }
        let groups: Vec<(&str, Vec<&FactRecord>)> = group_rows(rows, dimension).into_iter().collect();
        let mut bars: Vec<BreakdownBar> = groups
            .par_iter()
            .filter_map(|(value, group)| {
                let outcome = definition.evaluate(group);
                let metric = outcome.computed()?;
                Some(BreakdownBar {
                    dimension_value: (*value).to_string(),
                    value_num: metric.value_num?,
                    value_text: metric.value_text.clone(),
                    rag: metric.rag,
                    row_count: group.len(),
                })
            })
            .collect();
        if bars.len() < config.min_breakdown_groups {
            continue;
        }
        bars.sort_by(|a, b| b.row_count.cmp(&a.row_count));
        bars.truncate(config.max_breakdown_bars);
        breakdowns.push(DimensionBreakdown {
            dimension,
            dimension_label: dimension.label().to_string(),
            bars,
            overall_value_num,
            overall_rag: overall.rag,
        });
    }
    breakdowns
}
