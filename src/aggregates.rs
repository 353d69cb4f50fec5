//! Pipeline aggregates: stage distribution, weekly volume, source mix,
//! stage aging, and quarterly application/interaction splits.
//!
//! Everything here counts unique applications; rows without an application id
//! fall back to a positional key so they are still counted once.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Datelike, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use serde::Serialize;

use crate::data::{CandidateType, FactRecord, PipelineStatus, RecruiterInteraction};
use crate::metrics::format::round1;
use crate::metrics::formulas::days_between;
use crate::types::{QuarterKey, RecordKey, WeekStart};

/// Label for rows without a stage (or interaction type).
pub const UNKNOWN: &str = "Unknown";

const FUNNEL_ORDER: [&str; 7] = [
    "applied",
    "screen",
    "shortlist",
    "interview",
    "offer",
    "hired",
    "rejected",
];

/// Position of `stage` in the funnel; unrecognized stages sort last.
pub fn stage_sort_key(stage: &str) -> usize {
    let stage = stage.trim().to_lowercase();
    FUNNEL_ORDER
        .iter()
        .position(|step| stage.contains(step))
        .unwrap_or(999)
}

fn stage_label(record: &FactRecord) -> &str {
    record
        .current_stage
        .as_deref()
        .map(str::trim)
        .filter(|stage| !stage.is_empty())
        .unwrap_or(UNKNOWN)
}

/// Unique applications currently in one stage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StageCount {
    /// Stage label.
    pub stage: String,
    /// Unique application ids in the stage.
    pub applications: usize,
}

/// Current-stage snapshot. Not a conversion funnel.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StageDistribution {
    /// Stages in funnel order, then by volume.
    pub points: Vec<StageCount>,
    /// Unique application keys across all stages.
    pub total_applications: usize,
    /// Rows counted under a positional key for lack of an application id.
    pub missing_application_id_rows: usize,
}

/// Unique applications per current stage.
pub fn compute_stage_distribution(rows: &[&FactRecord]) -> StageDistribution {
    let mut by_stage: IndexMap<&str, HashSet<RecordKey>> = IndexMap::new();
    let mut all_keys: HashSet<RecordKey> = HashSet::new();
    let mut missing = 0;
    for (idx, row) in rows.iter().enumerate() {
        if row.application_id.is_none() {
            missing += 1;
        }
        let key = row.application_key(idx);
        all_keys.insert(key.clone());
        by_stage.entry(stage_label(row)).or_default().insert(key);
    }
    let mut points: Vec<StageCount> = by_stage
        .iter()
        .map(|(stage, keys)| StageCount {
            stage: stage.to_string(),
            applications: keys.len(),
        })
        .collect();
    points.sort_by(|a, b| {
        stage_sort_key(&a.stage)
            .cmp(&stage_sort_key(&b.stage))
            .then_with(|| b.applications.cmp(&a.applications))
    });
    StageDistribution {
        points,
        total_applications: all_keys.len(),
        missing_application_id_rows: missing,
    }
}

/// Monday of the ISO week containing `at`, as `YYYY-MM-DD`.
pub fn week_start(at: NaiveDateTime) -> WeekStart {
    let date = at.date();
    let monday = date - TimeDelta::days(i64::from(date.weekday().num_days_from_monday()));
    monday.format("%Y-%m-%d").to_string()
}

/// Applications and hires for one week.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeeklyVolume {
    /// Monday of the week.
    pub week_start: WeekStart,
    /// Unique applications dated in the week.
    pub applications: usize,
    /// Unique hired applications dated in the week.
    pub hires: usize,
}

/// Weekly applications and hires with the undated-row count.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyTrend {
    /// Weeks in chronological order.
    pub points: Vec<WeeklyVolume>,
    /// Rows without an application date.
    pub missing_dates: usize,
}

/// Unique applications and hires per week of application date.
pub fn compute_weekly_trend(rows: &[&FactRecord]) -> WeeklyTrend {
    let mut weeks: BTreeMap<WeekStart, (HashSet<RecordKey>, HashSet<RecordKey>)> = BTreeMap::new();
    let mut missing_dates = 0;
    for (idx, row) in rows.iter().enumerate() {
        let Some(applied) = row.application_date else {
            missing_dates += 1;
            continue;
        };
        let key = row.application_key(idx);
        let (applications, hires) = weeks.entry(week_start(applied)).or_default();
        if row.status == Some(PipelineStatus::Hired) {
            hires.insert(key.clone());
        }
        applications.insert(key);
    }
    let points = weeks
        .into_iter()
        .map(|(week_start, (applications, hires))| WeeklyVolume {
            week_start,
            applications: applications.len(),
            hires: hires.len(),
        })
        .collect();
    WeeklyTrend {
        points,
        missing_dates,
    }
}

/// Linear-interpolated quantile of an ascending sample; 0 when empty.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted {
        [] => 0.0,
        [only] => *only,
        _ => {
            let pos = (sorted.len() - 1) as f64 * q;
            let base = pos.floor() as usize;
            let rest = pos - base as f64;
            let lower = sorted[base.min(sorted.len() - 1)];
            let upper = sorted.get(base + 1).copied().unwrap_or(lower);
            lower + rest * (upper - lower)
        }
    }
}

/// Percentage change from `previous` to `current`; `None` when `previous <= 0`.
pub fn pct_change(current: f64, previous: f64) -> Option<f64> {
    (previous > 0.0).then(|| (current - previous) / previous * 100.0)
}

/// One channel's share of unique applications.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SourceShare {
    /// Source channel.
    pub source: String,
    /// Unique applications from the channel.
    pub applications: usize,
    /// Share of all unique applications, in percent to one decimal.
    pub share_pct: f64,
}

/// Largest `top` sources by unique applications, shares relative to all applications.
pub fn share_breakdown(rows: &[&FactRecord], top: usize) -> Vec<SourceShare> {
    let mut all_applications: HashSet<RecordKey> = HashSet::new();
    let mut by_source: IndexMap<&str, HashSet<RecordKey>> = IndexMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let key = row.application_key(idx);
        if let Some(source) = row.source.as_deref().map(str::trim)
            && !source.is_empty()
        {
            by_source.entry(source).or_default().insert(key.clone());
        }
        all_applications.insert(key);
    }
    let total = all_applications.len();
    let mut shares: Vec<SourceShare> = by_source
        .into_iter()
        .map(|(source, keys)| SourceShare {
            source: source.to_string(),
            applications: keys.len(),
            share_pct: if total == 0 {
                0.0
            } else {
                keys.len() as f64 / total as f64 * 100.0
            },
        })
        .collect();
    shares.sort_by(|a, b| b.applications.cmp(&a.applications));
    shares.truncate(top);
    for share in &mut shares {
        share.share_pct = round1(share.share_pct);
    }
    shares
}

/// Stage-duration percentiles for one stage.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StageAging {
    /// Stage label.
    pub stage: String,
    /// Durations sampled.
    pub sample_size: usize,
    /// Median days in stage, one decimal.
    pub p50_days: f64,
    /// 90th percentile days in stage, one decimal.
    pub p90_days: f64,
}

/// Slowest `top` stages by p90 duration.
pub fn stage_aging(rows: &[&FactRecord], top: usize) -> Vec<StageAging> {
    let mut durations: IndexMap<&str, Vec<f64>> = IndexMap::new();
    for row in rows {
        if let (Some(enter), Some(exit)) = (row.stage_enter_date, row.stage_exit_date) {
            let days = days_between(enter, exit);
            if days >= 0.0 {
                durations.entry(stage_label(row)).or_default().push(days);
            }
        }
    }
    let mut aging: Vec<StageAging> = durations
        .into_iter()
        .map(|(stage, mut values)| {
            values.sort_by(f64::total_cmp);
            StageAging {
                stage: stage.to_string(),
                sample_size: values.len(),
                p50_days: round1(quantile(&values, 0.5)),
                p90_days: round1(quantile(&values, 0.9)),
            }
        })
        .collect();
    aging.sort_by(|a, b| b.p90_days.total_cmp(&a.p90_days));
    aging.truncate(top);
    aging
}

/// Calendar quarter key, `YYYY-Qn`.
pub fn quarter_key(at: NaiveDateTime) -> QuarterKey {
    format!("{}-Q{}", at.year(), (at.month() - 1) / 3 + 1)
}

/// Unique applications in one quarter, split by candidate type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ApplicationTypeQuarter {
    /// Quarter key.
    pub quarter: QuarterKey,
    /// Unique applications.
    pub total: usize,
    /// Internal candidates.
    pub internal: usize,
    /// External candidates.
    pub external: usize,
    /// Candidate type missing.
    pub unknown: usize,
}

/// Unique applications per quarter of application date, by candidate type.
///
/// An application's type comes from its first row.
pub fn application_type_by_quarter(rows: &[&FactRecord]) -> Vec<ApplicationTypeQuarter> {
    let mut seen: HashSet<RecordKey> = HashSet::new();
    let mut quarters: BTreeMap<QuarterKey, ApplicationTypeQuarter> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(applied) = row.application_date else {
            continue;
        };
        if !seen.insert(row.application_key(idx)) {
            continue;
        }
        let quarter = quarter_key(applied);
        let bucket = quarters
            .entry(quarter.clone())
            .or_insert_with(|| ApplicationTypeQuarter {
                quarter,
                ..ApplicationTypeQuarter::default()
            });
        bucket.total += 1;
        match row.candidate_type {
            Some(CandidateType::Internal) => bucket.internal += 1,
            Some(CandidateType::External) => bucket.external += 1,
            None => bucket.unknown += 1,
        }
    }
    quarters.into_values().collect()
}

/// Interactions of one type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractionTypeCount {
    /// Interaction type label.
    #[serde(rename = "type")]
    pub interaction_type: String,
    /// Interactions.
    pub count: usize,
}

/// Recruiter interactions in one quarter, by type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InteractionTypeQuarter {
    /// Quarter key.
    pub quarter: QuarterKey,
    /// Interactions.
    pub total: usize,
    /// Counts per type, most frequent first.
    pub types: Vec<InteractionTypeCount>,
}

/// Interactions per quarter of interaction date, limited to candidates present in `rows`.
pub fn interaction_type_by_quarter(
    interactions: &[RecruiterInteraction],
    rows: &[&FactRecord],
) -> Vec<InteractionTypeQuarter> {
    let in_scope: HashSet<&str> = rows
        .iter()
        .filter_map(|row| row.candidate_id.as_deref())
        .collect();
    let mut quarters: BTreeMap<QuarterKey, HashMap<&str, usize>> = BTreeMap::new();
    for interaction in interactions {
        if !in_scope.contains(interaction.candidate_id.as_str()) {
            continue;
        }
        let Some(at) = interaction.interaction_date else {
            continue;
        };
        let kind = interaction
            .interaction_type
            .as_deref()
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .unwrap_or(UNKNOWN);
        *quarters
            .entry(quarter_key(at))
            .or_default()
            .entry(kind)
            .or_default() += 1;
    }
    quarters
        .into_iter()
        .map(|(quarter, counts)| {
            let mut types: Vec<InteractionTypeCount> = counts
                .into_iter()
                .map(|(kind, count)| InteractionTypeCount {
                    interaction_type: kind.to_string(),
                    count,
                })
                .collect();
            types.sort_by(|a, b| {
                b.count
                    .cmp(&a.count)
                    .then_with(|| a.interaction_type.cmp(&b.interaction_type))
            });
            InteractionTypeQuarter {
                quarter,
                total: types.iter().map(|entry| entry.count).sum(),
                types,
            }
        })
        .collect()
}
