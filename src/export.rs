//! Flat CSV and XLSX exports of the metric catalog.
//!
//! Both formats share one row layout: a header, a context row naming the
//! active filters, then one row per tile in cluster order.

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use indexmap::IndexMap;
use rust_xlsxwriter::Workbook;
use serde::Serialize;
use tracing::info;

use crate::constants::export::{COLUMNS, CONTEXT_PREFIX, FACT_SEPARATOR, SHEET_NAME};
use crate::errors::CockpitError;
use crate::filters::{FilterSpec, filter_summary};
use crate::metrics::{Cluster, ClusterTiles, Rag};
use crate::trends::{TrendPoint, summarize_trend};
use crate::types::MetricId;

/// One exported line.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    /// Cluster id, or the context text on the context row.
    pub cluster: String,
    /// Metric id.
    pub metric_id: String,
    /// Title.
    pub title: String,
    /// Display value.
    pub value: String,
    /// `red`, `amber`, or `green`.
    pub rag: String,
    /// Display threshold.
    pub threshold: String,
    /// Headline narrative.
    pub alarm: String,
    /// Interpretation narrative.
    pub insight: String,
    /// Recommended action.
    pub action: String,
    /// Supporting facts joined with `; `.
    pub supporting_facts: String,
    /// Trend direction summary.
    pub trend_summary: String,
}

impl ExportRow {
    /// Leading row naming the active filters; all other cells empty.
    pub fn context(filters: &FilterSpec) -> Self {
        Self {
            cluster: format!("{CONTEXT_PREFIX}{}", filter_summary(filters)),
            ..Self::default()
        }
    }

    fn cells(&self) -> [&str; 11] {
        [
            &self.cluster,
            &self.metric_id,
            &self.title,
            &self.value,
            &self.rag,
            &self.threshold,
            &self.alarm,
            &self.insight,
            &self.action,
            &self.supporting_facts,
            &self.trend_summary,
        ]
    }
}

/// Metric rows in cluster order; tiles without a trend series read `no data`.
pub fn build_export_rows(
    clusters: &[ClusterTiles],
    trends: &IndexMap<MetricId, Vec<TrendPoint>>,
) -> Vec<ExportRow> {
    Cluster::ALL
        .iter()
        .filter_map(|cluster| clusters.iter().find(|group| group.cluster == *cluster))
        .flat_map(|group| group.tiles.iter())
        .map(|tile| ExportRow {
            cluster: tile.cluster.as_str().to_string(),
            metric_id: tile.id.clone(),
            title: tile.title.clone(),
            value: tile.value_text.clone(),
            rag: tile.rag.as_str().to_string(),
            threshold: tile.threshold_text.clone(),
            alarm: tile.alarm.clone(),
            insight: tile.insight.clone(),
            action: tile.action.clone(),
            supporting_facts: tile.supporting_facts.join(FACT_SEPARATOR),
            trend_summary: summarize_trend(trends.get(&tile.id).map_or(&[], Vec::as_slice)),
        })
        .collect()
}

fn export_rows(
    clusters: &[ClusterTiles],
    trends: &IndexMap<MetricId, Vec<TrendPoint>>,
    filters: &FilterSpec,
) -> Vec<ExportRow> {
    let mut rows = Vec::with_capacity(1 + clusters.iter().map(|group| group.tiles.len()).sum::<usize>());
    rows.push(ExportRow::context(filters));
    rows.extend(build_export_rows(clusters, trends));
    rows
}

/// CSV bytes: header, context row, metric rows.
pub fn export_metrics_to_csv(
    clusters: &[ClusterTiles],
    trends: &IndexMap<MetricId, Vec<TrendPoint>>,
    filters: &FilterSpec,
) -> Result<Vec<u8>, CockpitError> {
    let rows = export_rows(clusters, trends, filters);
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(COLUMNS)?;
    for row in &rows {
        writer.write_record(row.cells())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| CockpitError::Export(err.to_string()))?;
    info!(
        "[cockpit:export] csv rows={} bytes={}",
        rows.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// XLSX bytes with a single `TA Cockpit Metrics` sheet in the CSV layout.
pub fn export_metrics_to_xlsx(
    clusters: &[ClusterTiles],
    trends: &IndexMap<MetricId, Vec<TrendPoint>>,
    filters: &FilterSpec,
) -> Result<Vec<u8>, CockpitError> {
    let rows = export_rows(clusters, trends, filters);
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, header) in COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *header)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        for (col, cell) in row.cells().into_iter().enumerate() {
            if !cell.is_empty() {
                sheet.write_string(idx as u32 + 1, col as u16, cell)?;
            }
        }
    }
    let bytes = workbook.save_to_buffer()?;
    info!(
        "[cockpit:export] xlsx rows={} bytes={}",
        rows.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Status of one metric as read back from an export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportedMetric {
    /// Cluster id.
    pub cluster: String,
    /// Metric id.
    pub metric_id: MetricId,
    /// Classification.
    pub rag: Rag,
}

fn column(headers: &StringRecord, name: &str) -> Result<usize, CockpitError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| CockpitError::CsvParse(format!("missing column '{name}'")))
}

/// Read a CSV export back into `(cluster, metric id, rag)` triples, skipping the context row.
pub fn parse_export_csv(bytes: &[u8]) -> Result<Vec<ExportedMetric>, CockpitError> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let headers = reader.headers()?.clone();
    let cluster_col = column(&headers, "cluster")?;
    let metric_col = column(&headers, "metricId")?;
    let rag_col = column(&headers, "rag")?;

    let mut metrics = Vec::new();
    for record in reader.records() {
        let record = record?;
        let metric_id = record.get(metric_col).unwrap_or_default();
        if metric_id.is_empty() {
            continue;
        }
        let rag_text = record.get(rag_col).unwrap_or_default();
        let rag = Rag::parse(rag_text)
            .ok_or_else(|| CockpitError::CsvParse(format!("unknown rag '{rag_text}' for {metric_id}")))?;
        metrics.push(ExportedMetric {
            cluster: record.get(cluster_col).unwrap_or_default().to_string(),
            metric_id: metric_id.to_string(),
            rag,
        });
    }
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FactRecord;
    use crate::metrics::MetricRegistry;

    fn catalog() -> Vec<ClusterTiles> {
        let rows = vec![
            FactRecord {
                candidate_id: Some("C1".into()),
                skill_match_percentage: Some(80.0),
                ..FactRecord::default()
            },
            FactRecord {
                candidate_id: Some("C2".into()),
                skill_match_percentage: Some(60.0),
                ..FactRecord::default()
            },
        ];
        let refs: Vec<&FactRecord> = rows.iter().collect();
        MetricRegistry::standard().evaluate_catalog(Some(refs.as_slice()))
    }

    #[test]
    fn csv_has_header_context_row_and_every_tile() {
        let clusters = catalog();
        let filters = FilterSpec {
            business_units: Some(vec!["Engineering".into()]),
            ..FilterSpec::default()
        };
        let bytes = export_metrics_to_csv(&clusters, &IndexMap::new(), &filters).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), COLUMNS.join(","));
        assert!(lines.next().unwrap().starts_with("TA Cockpit Export - BU: Engineering"));
        assert_eq!(lines.count(), 23);
    }

    #[test]
    fn rows_join_facts_and_summarize_trends() {
        let clusters = catalog();
        let mut trends = IndexMap::new();
        trends.insert(
            "metric.readiness.skill_readiness".to_string(),
            (0..6)
                .map(|idx| TrendPoint {
                    week: format!("2024-W{:02}", idx + 1),
                    value: if idx < 3 { 50.0 } else { 70.0 },
                })
                .collect(),
        );
        let rows = build_export_rows(&clusters, &trends);
        assert_eq!(rows.len(), 23);
        assert_eq!(rows[0].cluster, "readiness");
        let skill = rows
            .iter()
            .find(|row| row.metric_id == "metric.readiness.skill_readiness")
            .unwrap();
        assert_eq!(skill.value, "70%");
        assert_eq!(skill.rag, "green");
        assert_eq!(skill.supporting_facts, "Candidates with skill match %: 2");
        assert_eq!(skill.trend_summary, "up 40% (last 3 vs prior 3 weeks)");
        let unavailable = rows
            .iter()
            .find(|row| row.metric_id == "metric.readiness.time_to_present")
            .unwrap();
        assert_eq!(unavailable.trend_summary, "no data");
        assert_eq!(unavailable.value, "N/A");
    }

    #[test]
    fn csv_round_trips_statuses() {
        let clusters = catalog();
        let bytes = export_metrics_to_csv(&clusters, &IndexMap::new(), &FilterSpec::default()).unwrap();
        let parsed = parse_export_csv(&bytes).unwrap();
        let expected: Vec<(String, String, Rag)> = clusters
            .iter()
            .flat_map(|group| group.tiles.iter())
            .map(|tile| (tile.cluster.as_str().to_string(), tile.id.clone(), tile.rag))
            .collect();
        let actual: Vec<(String, String, Rag)> = parsed
            .into_iter()
            .map(|metric| (metric.cluster, metric.metric_id, metric.rag))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn xlsx_export_is_a_zip_container() {
        let bytes = export_metrics_to_xlsx(&catalog(), &IndexMap::new(), &FilterSpec::default()).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn parse_rejects_foreign_csv() {
        let err = parse_export_csv(b"a,b\n1,2\n").unwrap_err();
        assert!(err.to_string().contains("metricId") || err.to_string().contains("cluster"));
    }
}
