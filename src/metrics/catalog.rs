//! Cluster-ordered metric tiles, key insights, and the health score.

use rayon::prelude::*;
use serde::Serialize;

use super::explain::gap_to_target_text;
use super::format::round1;
use super::{
    Cluster, ComputedMetric, MetricDefinition, MetricOutcome, MetricRegistry, Rag,
    UnavailableReason,
};
use crate::constants::{narrative, summary};
use crate::data::FactRecord;
use crate::types::{FactText, MetricId};

/// Where a tile's content came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TileState {
    /// Formula produced a result.
    Computed,
    /// Formula exists but the slice lacks data.
    NotEnoughData,
    /// No formula registered.
    NotImplemented,
    /// No dataset loaded.
    NoDataset,
}

/// One KPI tile as displayed and exported.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricTile {
    /// Metric id.
    pub id: MetricId,
    /// Owning cluster.
    pub cluster: Cluster,
    /// Display title.
    pub title: String,
    /// Display value, `N/A` when unavailable, `--` without a dataset.
    pub value_text: String,
    /// Numeric value when computable.
    pub value_num: Option<f64>,
    /// Display threshold.
    pub threshold_text: String,
    /// Classification; amber whenever unavailable.
    pub rag: Rag,
    /// Aggregate-only supporting facts.
    pub supporting_facts: Vec<FactText>,
    /// Headline narrative.
    pub alarm: String,
    /// Interpretation narrative.
    pub insight: String,
    /// Recommended action.
    pub action: String,
    /// Tile provenance.
    pub state: TileState,
}

impl MetricTile {
    fn with_narrative(
        definition: &MetricDefinition,
        metric: ComputedMetric,
        narratives: [&str; 3],
        state: TileState,
    ) -> Self {
        let [alarm, insight, action] = narratives;
        Self {
            id: definition.id.to_string(),
            cluster: definition.cluster,
            title: definition.title.to_string(),
            value_text: metric.value_text,
            value_num: metric.value_num,
            threshold_text: metric.threshold_text,
            rag: metric.rag,
            supporting_facts: metric.supporting_facts,
            alarm: alarm.to_string(),
            insight: insight.to_string(),
            action: action.to_string(),
            state,
        }
    }

    /// Tile for an evaluated metric.
    pub fn from_outcome(definition: &MetricDefinition, outcome: MetricOutcome) -> Self {
        match outcome {
            MetricOutcome::Computed(metric) => Self::with_narrative(
                definition,
                metric,
                [narrative::PENDING; 3],
                TileState::Computed,
            ),
            MetricOutcome::Unavailable(reason) => {
                let unavailable = ComputedMetric {
                    value_text: narrative::NOT_AVAILABLE.to_string(),
                    value_num: None,
                    threshold_text: narrative::NOT_AVAILABLE.to_string(),
                    rag: Rag::Amber,
                    supporting_facts: vec![reason.fact().to_string()],
                };
                let (narratives, state) = match reason {
                    UnavailableReason::NotEnoughData => (
                        [
                            narrative::NOT_ENOUGH_DATA_ALARM,
                            narrative::NOT_ENOUGH_DATA_INSIGHT,
                            narrative::NOT_ENOUGH_DATA_ACTION,
                        ],
                        TileState::NotEnoughData,
                    ),
                    UnavailableReason::NotImplemented => (
                        [
                            narrative::NOT_IMPLEMENTED_ALARM,
                            narrative::NOT_IMPLEMENTED_INSIGHT,
                            narrative::NOT_IMPLEMENTED_ACTION,
                        ],
                        TileState::NotImplemented,
                    ),
                };
                Self::with_narrative(definition, unavailable, narratives, state)
            }
        }
    }

    /// Placeholder tile shown before any upload.
    pub fn placeholder(definition: &MetricDefinition) -> Self {
        let empty = ComputedMetric {
            value_text: narrative::NO_DATASET.to_string(),
            value_num: None,
            threshold_text: definition.threshold_text.to_string(),
            rag: Rag::Amber,
            supporting_facts: Vec::new(),
        };
        Self::with_narrative(
            definition,
            empty,
            [narrative::UPLOAD_PROMPT; 3],
            TileState::NoDataset,
        )
    }

    /// Gap-to-target text for this tile.
    pub fn gap_to_target(&self) -> Option<String> {
        gap_to_target_text(self.value_num, &self.threshold_text)
    }
}

/// Tiles for one cluster, in registry order.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClusterTiles {
    /// Cluster.
    pub cluster: Cluster,
    /// Display title.
    pub title: String,
    /// Tiles.
    pub tiles: Vec<MetricTile>,
}

pub(crate) fn group_by_cluster(tiles: Vec<MetricTile>) -> Vec<ClusterTiles> {
    let mut grouped: Vec<ClusterTiles> = Cluster::ALL
        .into_iter()
        .map(|cluster| ClusterTiles {
            cluster,
            title: cluster.title().to_string(),
            tiles: Vec::new(),
        })
        .collect();
    for tile in tiles {
        if let Some(group) = grouped.iter_mut().find(|group| group.cluster == tile.cluster) {
            group.tiles.push(tile);
        }
    }
    grouped
}

/// Evaluate every registered metric and group tiles by cluster.
///
/// `rows == None` means no dataset is loaded and yields placeholder tiles.
/// Metrics are evaluated in parallel; output order follows the registry.
pub fn evaluate_catalog(
    registry: &MetricRegistry,
    rows: Option<&[&FactRecord]>,
) -> Vec<ClusterTiles> {
    let definitions: Vec<&MetricDefinition> = registry.definitions().collect();
    let tiles: Vec<MetricTile> = match rows {
        Some(rows) => definitions
            .par_iter()
            .map(|definition| MetricTile::from_outcome(definition, definition.evaluate(rows)))
            .collect(),
        None => definitions
            .iter()
            .map(|definition| MetricTile::placeholder(definition))
            .collect(),
    };
    group_by_cluster(tiles)
}

/// Iterate tiles across clusters.
pub fn all_tiles(clusters: &[ClusterTiles]) -> impl Iterator<Item = &MetricTile> {
    clusters.iter().flat_map(|cluster| cluster.tiles.iter())
}

/// Executive headline for one tile.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KeyInsight {
    /// Metric id.
    pub metric_id: MetricId,
    /// Metric title.
    pub title: String,
    /// `"<label>: <value> vs <threshold> (<gap>)"`.
    pub text: String,
    /// Classification.
    pub rag: Rag,
}

/// Up to four headlines, worst status first, ties broken by gap text descending.
pub fn summarize_key_insights<'a>(tiles: impl IntoIterator<Item = &'a MetricTile>) -> Vec<KeyInsight> {
    let mut available: Vec<(&MetricTile, String)> = tiles
        .into_iter()
        .filter(|tile| tile.value_num.is_some())
        .map(|tile| (tile, tile.gap_to_target().unwrap_or_default()))
        .collect();
    available.sort_by(|(a, gap_a), (b, gap_b)| {
        a.rag
            .severity_rank()
            .cmp(&b.rag.severity_rank())
            .then_with(|| gap_b.cmp(gap_a))
    });
    available
        .into_iter()
        .take(summary::MAX_KEY_INSIGHTS)
        .map(|(tile, gap)| {
            let mut text = format!(
                "{}: {} vs {}",
                tile.rag.label(),
                tile.value_text,
                tile.threshold_text
            );
            if !gap.is_empty() {
                text.push_str(&format!(" ({gap})"));
            }
            KeyInsight {
                metric_id: tile.id.clone(),
                title: tile.title.clone(),
                text,
                rag: tile.rag,
            }
        })
        .collect()
}

/// Mean of green=100, amber=70, red=40 over computable tiles, to one decimal; 0 when none.
pub fn health_score<'a>(tiles: impl IntoIterator<Item = &'a MetricTile>) -> f64 {
    let points: Vec<f64> = tiles
        .into_iter()
        .filter(|tile| tile.value_num.is_some())
        .map(|tile| tile.rag.health_points())
        .collect();
    if points.is_empty() {
        return 0.0;
    }
    round1(points.iter().sum::<f64>() / points.len() as f64)
}
