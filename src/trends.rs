//! ISO-week metric trends and their short-form summaries.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::constants::trends::{STABLE_BAND_PCT, SUMMARY_WINDOW};
use crate::data::FactRecord;
use crate::metrics::MetricRegistry;
use crate::metrics::format::round1;
use crate::metrics::formulas::mean;
use crate::types::{MetricId, WeekKey};

/// ISO-8601 week key, `YYYY-Www`, using the ISO week-numbering year.
pub fn iso_week_key(at: NaiveDateTime) -> WeekKey {
    let week = at.date().iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Metric value for one week.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendPoint {
    /// ISO week key.
    pub week: WeekKey,
    /// Metric value computed on that week's rows.
    pub value: f64,
}

/// A metric's trend with its summary and undated-row count.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrendSeries {
    /// Metric id.
    pub metric_id: MetricId,
    /// Points, oldest first.
    pub points: Vec<TrendPoint>,
    /// Rows excluded for lack of any activity date.
    pub missing_dates: usize,
    /// Short-form direction summary.
    pub summary: String,
}

/// Rows bucketed by ISO week of their activity date.
#[derive(Clone, Debug, Default)]
pub struct WeekBuckets<'a> {
    buckets: BTreeMap<WeekKey, Vec<&'a FactRecord>>,
    /// Rows with no application, stage-enter, or interview date.
    pub missing_dates: usize,
}

impl<'a> WeekBuckets<'a> {
    /// Bucket `rows`; iteration is chronological.
    pub fn new(rows: &[&'a FactRecord]) -> Self {
        let mut buckets: BTreeMap<WeekKey, Vec<&'a FactRecord>> = BTreeMap::new();
        let mut missing_dates = 0;
        for row in rows.iter().copied() {
            match row.activity_date() {
                Some(at) => buckets.entry(iso_week_key(at)).or_default().push(row),
                None => missing_dates += 1,
            }
        }
        Self {
            buckets,
            missing_dates,
        }
    }

    /// Number of non-empty weeks.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when no row has an activity date.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The most recent `max_weeks` points for `metric_id`, oldest first.
    ///
    /// Weeks where the metric is not computable are omitted before the window
    /// is applied.
    pub fn trend(&self, registry: &MetricRegistry, metric_id: &str, max_weeks: usize) -> Vec<TrendPoint> {
        let Some(definition) = registry.get(metric_id) else {
            return Vec::new();
        };
        let mut points: Vec<TrendPoint> = self
            .buckets
            .iter()
            .filter_map(|(week, rows)| {
                let value = definition.evaluate(rows).value_num()?;
                Some(TrendPoint {
                    week: week.clone(),
                    value,
                })
            })
            .collect();
        let skip = points.len().saturating_sub(max_weeks);
        points.split_off(skip)
    }

    /// [`WeekBuckets::trend`] packaged with its summary.
    pub fn series(&self, registry: &MetricRegistry, metric_id: &str, max_weeks: usize) -> TrendSeries {
        let points = self.trend(registry, metric_id, max_weeks);
        TrendSeries {
            metric_id: metric_id.to_string(),
            summary: summarize_trend(&points),
            points,
            missing_dates: self.missing_dates,
        }
    }
}

/// Weekly trend for one metric.
pub fn compute_metric_trend(
    registry: &MetricRegistry,
    metric_id: &str,
    rows: &[&FactRecord],
    max_weeks: usize,
) -> Vec<TrendPoint> {
    WeekBuckets::new(rows).trend(registry, metric_id, max_weeks)
}

/// Weekly trends for several metrics, sharing one bucketing pass.
///
/// Each series matches what [`compute_metric_trend`] returns for that id.
pub fn compute_all_metric_trends(
    registry: &MetricRegistry,
    metric_ids: &[&str],
    rows: &[&FactRecord],
    max_weeks: usize,
) -> IndexMap<MetricId, Vec<TrendPoint>> {
    let buckets = WeekBuckets::new(rows);
    let series: Vec<(MetricId, Vec<TrendPoint>)> = metric_ids
        .par_iter()
        .map(|id| (id.to_string(), buckets.trend(registry, id, max_weeks)))
        .collect();
    series.into_iter().collect()
}

/// `up X% (last 3 vs prior 3 weeks)`, `down X% ...`, `stable`,
/// `rising from zero`, `insufficient data`, or `no data`.
pub fn summarize_trend(points: &[TrendPoint]) -> String {
    if points.is_empty() {
        return "no data".to_string();
    }
    if points.len() < SUMMARY_WINDOW * 2 {
        return "insufficient data".to_string();
    }
    let values: Vec<f64> = points.iter().map(|point| point.value).collect();
    let split = values.len() - SUMMARY_WINDOW;
    let recent = mean(&values[split..]).unwrap_or(0.0);
    let prior = mean(&values[split - SUMMARY_WINDOW..split]).unwrap_or(0.0);
    if prior == 0.0 {
        return if recent == 0.0 { "stable" } else { "rising from zero" }.to_string();
    }
    let change = (recent - prior) / prior.abs() * 100.0;
    if change.abs() <= STABLE_BAND_PCT {
        return "stable".to_string();
    }
    let direction = if change > 0.0 { "up" } else { "down" };
    format!(
        "{direction} {}% (last {SUMMARY_WINDOW} vs prior {SUMMARY_WINDOW} weeks)",
        round1(change.abs())
    )
}
