//! Metric catalog: definitions, classification, and the registry.
//!
//! Each metric is a [`MetricDefinition`] pairing a pure formula over a record
//! subset with its threshold, RAG rule, display format, and breakdown
//! dimensions. Formulas report a [`Measurement`]; the definition turns it into
//! a [`ComputedMetric`]. Anything a formula cannot compute surfaces as
//! [`MetricOutcome::Unavailable`] with a reason, never as an error.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::breakdowns::Dimension;
use crate::constants::{narrative, summary};
use crate::data::FactRecord;
use crate::errors::CockpitError;
use crate::types::FactText;

/// Catalog tiles, key insights, and health score.
pub mod catalog;
/// Metric explanations and gap-to-target text.
pub mod explain;
/// Value display formatting.
pub mod format;
/// The metric formulas.
pub mod formulas;

pub use catalog::{ClusterTiles, KeyInsight, MetricTile, health_score, summarize_key_insights};
pub use format::ValueFormat;

/// Red/amber/green status relative to a metric threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rag {
    /// Off target.
    Red,
    /// Near target, or not computable.
    Amber,
    /// On target.
    Green,
}

impl Rag {
    /// Lowercase label used in exports.
    pub fn as_str(self) -> &'static str {
        match self {
            Rag::Red => "red",
            Rag::Amber => "amber",
            Rag::Green => "green",
        }
    }

    /// Parse a lowercase or capitalized label.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Rag::Red),
            "amber" => Some(Rag::Amber),
            "green" => Some(Rag::Green),
            _ => None,
        }
    }

    /// Severity order: red first.
    pub fn severity_rank(self) -> u8 {
        match self {
            Rag::Red => 0,
            Rag::Amber => 1,
            Rag::Green => 2,
        }
    }

    /// Executive label: `Critical`, `Watch`, or `Healthy`.
    pub fn label(self) -> &'static str {
        match self {
            Rag::Red => "Critical",
            Rag::Amber => "Watch",
            Rag::Green => "Healthy",
        }
    }

    /// Contribution to the catalog health score.
    pub fn health_points(self) -> f64 {
        match self {
            Rag::Red => summary::HEALTH_RED,
            Rag::Amber => summary::HEALTH_AMBER,
            Rag::Green => summary::HEALTH_GREEN,
        }
    }
}

/// Classification rule. Both cutoffs are inclusive toward the better tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub enum RagRule {
    /// Green when `value >= green_min`, amber when `value >= amber_min`.
    HigherIsBetter { green_min: f64, amber_min: f64 },
    /// Green when `value <= green_max`, amber when `value <= amber_max`.
    LowerIsBetter { green_max: f64, amber_max: f64 },
}

impl RagRule {
    /// Classify `value`.
    pub fn classify(self, value: f64) -> Rag {
        match self {
            RagRule::HigherIsBetter {
                green_min,
                amber_min,
            } => {
                if value >= green_min {
                    Rag::Green
                } else if value >= amber_min {
                    Rag::Amber
                } else {
                    Rag::Red
                }
            }
            RagRule::LowerIsBetter {
                green_max,
                amber_max,
            } => {
                if value <= green_max {
                    Rag::Green
                } else if value <= amber_max {
                    Rag::Amber
                } else {
                    Rag::Red
                }
            }
        }
    }
}

/// KPI groupings, in catalog order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cluster {
    /// Talent readiness and market strength.
    Readiness,
    /// Candidate responsiveness and momentum.
    Momentum,
    /// Application experience and drop-off risk.
    Experience,
    /// Diversity and talent reach.
    Diversity,
    /// Hiring economics and efficiency.
    Economics,
}

impl Cluster {
    /// All clusters in catalog order.
    pub const ALL: [Cluster; 5] = [
        Cluster::Readiness,
        Cluster::Momentum,
        Cluster::Experience,
        Cluster::Diversity,
        Cluster::Economics,
    ];

    /// Lowercase id, as embedded in metric ids.
    pub fn as_str(self) -> &'static str {
        match self {
            Cluster::Readiness => "readiness",
            Cluster::Momentum => "momentum",
            Cluster::Experience => "experience",
            Cluster::Diversity => "diversity",
            Cluster::Economics => "economics",
        }
    }

    /// Display title.
    pub fn title(self) -> &'static str {
        match self {
            Cluster::Readiness => "Talent Readiness & Market Strength",
            Cluster::Momentum => "Candidate Responsiveness & Momentum",
            Cluster::Experience => "Application Experience & Drop-Off Risk",
            Cluster::Diversity => "Diversity & Talent Reach",
            Cluster::Economics => "Hiring Economics & Efficiency",
        }
    }

    /// Parse the lowercase id.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|cluster| cluster.as_str() == value.trim())
    }
}

/// Classified, formatted KPI value.
///
/// `value_num == None` marks a value that is not computable (shown as `N/A`),
/// which is distinct from a numeric zero.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ComputedMetric {
    /// Display value.
    pub value_text: String,
    /// Numeric value when computable.
    pub value_num: Option<f64>,
    /// Display threshold.
    pub threshold_text: String,
    /// Classification.
    pub rag: Rag,
    /// Aggregate-only supporting facts.
    pub supporting_facts: Vec<FactText>,
}

/// Why a metric has no result for a record subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    /// Formula exists but the subset lacks the required data.
    NotEnoughData,
    /// No formula is registered for the metric.
    NotImplemented,
}

impl UnavailableReason {
    /// Supporting fact shown on the tile.
    pub fn fact(self) -> &'static str {
        match self {
            UnavailableReason::NotEnoughData => narrative::NOT_ENOUGH_DATA_FACT,
            UnavailableReason::NotImplemented => narrative::NOT_IMPLEMENTED_FACT,
        }
    }
}

/// Result of evaluating one metric.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum MetricOutcome {
    /// Formula produced a result (possibly an explicit `N/A`).
    Computed(ComputedMetric),
    /// No result, with reason.
    Unavailable(UnavailableReason),
}

impl MetricOutcome {
    /// The computed metric, if any.
    pub fn computed(&self) -> Option<&ComputedMetric> {
        match self {
            MetricOutcome::Computed(metric) => Some(metric),
            MetricOutcome::Unavailable(_) => None,
        }
    }

    /// Numeric value, if computed and computable.
    pub fn value_num(&self) -> Option<f64> {
        self.computed().and_then(|metric| metric.value_num)
    }
}

/// What a formula measured on a record subset.
#[derive(Clone, Debug, PartialEq)]
pub enum Measurement {
    /// A numeric value with supporting facts.
    Value { value: f64, facts: Vec<FactText> },
    /// The denominator is empty; reported as `N/A` amber with an explanation.
    NotApplicable { facts: Vec<FactText> },
}

/// Formula signature: `None` means not enough data.
pub type Formula = fn(&[&FactRecord]) -> Option<Measurement>;

/// One registered metric.
#[derive(Clone, Debug)]
pub struct MetricDefinition {
    /// Stable id, `metric.<cluster>.<name>`.
    pub id: &'static str,
    /// Owning cluster.
    pub cluster: Cluster,
    /// Display title.
    pub title: &'static str,
    /// Display threshold.
    pub threshold_text: &'static str,
    /// Classification rule.
    pub rule: RagRule,
    /// Display format.
    pub format: ValueFormat,
    /// Breakdown dimensions in priority order.
    pub breakdown_dimensions: &'static [Dimension],
    /// Formula; `None` registers a roadmap tile without computation.
    pub formula: Option<Formula>,
}

impl MetricDefinition {
    /// Run the formula over `rows`.
    pub fn evaluate(&self, rows: &[&FactRecord]) -> MetricOutcome {
        let Some(formula) = self.formula else {
            return MetricOutcome::Unavailable(UnavailableReason::NotImplemented);
        };
        match formula(rows) {
            Some(measurement) => MetricOutcome::Computed(self.finish(measurement)),
            None => MetricOutcome::Unavailable(UnavailableReason::NotEnoughData),
        }
    }

    fn finish(&self, measurement: Measurement) -> ComputedMetric {
        match measurement {
            Measurement::Value { value, facts } => ComputedMetric {
                value_text: self.format.render(value),
                value_num: Some(value),
                threshold_text: self.threshold_text.to_string(),
                rag: self.rule.classify(value),
                supporting_facts: facts,
            },
            Measurement::NotApplicable { facts } => ComputedMetric {
                value_text: narrative::NOT_AVAILABLE.to_string(),
                value_num: None,
                threshold_text: self.threshold_text.to_string(),
                rag: Rag::Amber,
                supporting_facts: facts,
            },
        }
    }
}

/// Id-keyed metric registry, iterated in catalog order.
#[derive(Clone, Debug)]
pub struct MetricRegistry {
    definitions: IndexMap<&'static str, MetricDefinition>,
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl MetricRegistry {
    /// Registry with the 23 standard TA metrics.
    pub fn standard() -> Self {
        let definitions = formulas::standard_definitions()
            .into_iter()
            .map(|definition| (definition.id, definition))
            .collect();
        Self { definitions }
    }

    /// Registry from custom definitions; ids must be unique.
    pub fn new(definitions: Vec<MetricDefinition>) -> Result<Self, CockpitError> {
        let mut by_id = IndexMap::with_capacity(definitions.len());
        for definition in definitions {
            if let Some(previous) = by_id.insert(definition.id, definition) {
                return Err(CockpitError::Configuration(format!(
                    "duplicate metric id '{}'",
                    previous.id
                )));
            }
        }
        Ok(Self {
            definitions: by_id,
        })
    }

    /// Definition by id.
    pub fn get(&self, id: &str) -> Option<&MetricDefinition> {
        self.definitions.get(id)
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// True when no metric is registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Metric ids in catalog order.
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.definitions.keys().copied()
    }

    /// Definitions in catalog order.
    pub fn definitions(&self) -> impl Iterator<Item = &MetricDefinition> {
        self.definitions.values()
    }

    /// Evaluate `id` on `rows`; unknown ids are not implemented.
    pub fn evaluate(&self, id: &str, rows: &[&FactRecord]) -> MetricOutcome {
        match self.get(id) {
            Some(definition) => definition.evaluate(rows),
            None => MetricOutcome::Unavailable(UnavailableReason::NotImplemented),
        }
    }

    /// Evaluate every metric into cluster-grouped tiles; `None` means no dataset is loaded.
    pub fn evaluate_catalog(&self, rows: Option<&[&FactRecord]>) -> Vec<ClusterTiles> {
        catalog::evaluate_catalog(self, rows)
    }

    /// Numeric value of `id` on `rows`, when computable.
    pub fn value_of(&self, id: &str, rows: &[&FactRecord]) -> Option<f64> {
        self.evaluate(id, rows).value_num()
    }
}
