//! Plain-language metric explanations and gap-to-target text.

use serde::Serialize;

use super::format::group_thousands;
use super::{ComputedMetric, MetricDefinition, Rag};

/// Direction of a threshold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Comparator {
    /// `> target`: higher is better.
    Above,
    /// `< target`: lower is better.
    Below,
}

/// Comparator and numeric target extracted from a threshold string.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParsedThreshold {
    /// Direction.
    pub comparator: Comparator,
    /// Target value.
    pub target: f64,
}

/// Parse thresholds such as `> 70%`, `< 7.0 days`, `< $4,000`, or `> USD 1,000`.
///
/// Returns `None` when no comparator is followed by a number (`Target 1 : 4`).
pub fn parse_threshold(text: &str) -> Option<ParsedThreshold> {
    text.char_indices()
        .filter_map(|(idx, ch)| match ch {
            '>' => Some((idx, Comparator::Above)),
            '<' => Some((idx, Comparator::Below)),
            _ => None,
        })
        .find_map(|(idx, comparator)| {
            number_after(&text[idx + 1..]).map(|target| ParsedThreshold { comparator, target })
        })
}

fn number_after(rest: &str) -> Option<f64> {
    let mut rest = rest.trim_start();
    let code_len = rest.chars().take_while(|ch| ch.is_ascii_alphabetic()).count();
    if code_len == 3 {
        rest = rest[3..].trim_start();
    }
    if let Some(stripped) = rest.strip_prefix('$') {
        rest = stripped.trim_start();
    }
    if !rest.starts_with(|ch: char| ch.is_ascii_digit()) {
        return None;
    }
    let integer_len = rest
        .find(|ch: char| !(ch.is_ascii_digit() || ch == ','))
        .unwrap_or(rest.len());
    let mut end = integer_len;
    if let Some(fraction) = rest[integer_len..].strip_prefix('.') {
        let digits = fraction
            .find(|ch: char| !ch.is_ascii_digit())
            .unwrap_or(fraction.len());
        if digits > 0 {
            end += 1 + digits;
        }
    }
    rest[..end].replace(',', "").parse::<f64>().ok()
}

/// Distance from target, phrased by direction. `None` without a numeric value or parsable threshold.
pub fn gap_to_target_text(value_num: Option<f64>, threshold_text: &str) -> Option<String> {
    let value = value_num?;
    let ParsedThreshold { comparator, target } = parse_threshold(threshold_text)?;
    let diff = value - target;
    let pct = |gap: f64| gap.abs() / target.max(1e-9) * 100.0;
    let text = match comparator {
        Comparator::Above if diff >= 0.0 => {
            format!("Above target by {}", group_thousands(diff, 1))
        }
        Comparator::Above => format!(
            "Below target by {} ({}%)",
            group_thousands(diff.abs(), 1),
            group_thousands(pct(diff), 0)
        ),
        Comparator::Below if diff <= 0.0 => {
            format!("Better than target by {}", group_thousands(diff.abs(), 1))
        }
        Comparator::Below => format!(
            "Over target by {} ({}%)",
            group_thousands(diff, 1),
            group_thousands(pct(diff), 0)
        ),
    };
    Some(text)
}

/// Executive label for a status.
pub fn rag_label(rag: Rag) -> &'static str {
    rag.label()
}

/// What a metric means and how it is derived.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetricExplanation {
    /// Metric id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Business meaning.
    pub meaning: String,
    /// Derivation from the fact table.
    pub formula: String,
    /// Target, as shown on the tile.
    pub target: String,
    /// `Critical`, `Watch`, or `Healthy`, when computed.
    pub status: Option<String>,
    /// Gap-to-target text, when computable.
    pub gap: Option<String>,
}

const GENERIC_MEANING: &str =
    "Summarizes one part of the hiring system; read the value against its threshold and supporting facts.";
const GENERIC_FORMULA: &str = "See supporting facts for the inputs used in the current slice.";

fn meaning_and_formula(id: &str) -> (&'static str, &'static str) {
    match id {
        "metric.readiness.qualified_candidates_availability" => (
            "Depth of qualified supply for critical roles; low values make a fast, credible slate unlikely.",
            "Mean count of candidates with skill match >= 80% per critical-skill requisition",
        ),
        "metric.readiness.skill_readiness" => (
            "How well the current pool fits the roles being hired; weak readiness shows up later as interview fallout.",
            "Mean Skill_Match_Percentage across unique candidates",
        ),
        "metric.readiness.external_connections" => (
            "Size of the actively worked external network; a small network makes sourcing reactive.",
            "Unique External candidates with a recruiter or matching hours",
        ),
        "metric.readiness.critical_skill_capability" => (
            "Whether critical-skill requisitions are actually converting into hires.",
            "Critical-skill requisitions with a hire / critical-skill requisitions x 100",
        ),
        "metric.readiness.time_to_present" => (
            "Speed of getting the first candidate in front of a critical-skill requisition.",
            "Mean days from requisition open to first application, critical-skill requisitions",
        ),
        "metric.readiness.pool_variety" => (
            "Breadth of each requisition's pipeline; narrow pools are fragile against declines.",
            "Mean unique candidates per requisition",
        ),
        "metric.momentum.time_to_next_step" => (
            "How long candidates wait in a stage; slow movement drives drop-off.",
            "Mean days between Stage_Enter_Date and Stage_Exit_Date",
        ),
        "metric.momentum.time_to_cv_response" => (
            "Recruiter responsiveness after a CV arrives.",
            "Mean Recruiter_Response_Time in hours",
        ),
        "metric.momentum.time_spent_matching" => (
            "Recruiter effort spent matching candidates to roles; rising values point to poor skill tagging.",
            "Mean matching hours per unique candidate",
        ),
        "metric.momentum.recruiting_experience_rating" => (
            "Candidate sentiment about the process, a leading signal for offer acceptance.",
            "Mean Candidate_NPS / 2 across unique candidates",
        ),
        "metric.experience.incomplete_applications" => (
            "Application abandonment; high abandonment shrinks supply.",
            "Unique candidates with an incomplete application / candidates with a completion flag x 100",
        ),
        "metric.experience.time_to_apply" => (
            "Time a candidate needs to finish an application.",
            "Mean minutes from Application_Start_Time to Application_Submit_Time",
        ),
        "metric.experience.ease_of_applying" => (
            "Self-reported ease of applying.",
            "Mean Application_Ease_Rating across unique candidates",
        ),
        "metric.diversity.diverse_attraction" => (
            "Diversity mix at the top of the funnel.",
            "Diverse candidates / candidates with a diversity flag x 100",
        ),
        "metric.diversity.diverse_pipeline" => (
            "Diversity mix among hires; a drop from attraction suggests conversion bias.",
            "Diverse hires / hires with a diversity flag x 100",
        ),
        "metric.diversity.active_applicants" => (
            "Current inventory of active candidates.",
            "Unique candidates with Status = Active",
        ),
        "metric.economics.cost_per_acquisition" => (
            "Cost efficiency of hiring.",
            "Total hiring cost (once per requisition) / hired applications",
        ),
        "metric.economics.presented_vs_offers" => (
            "Offer yield from interviewed candidates.",
            "Candidates with an offer / interviewed candidates x 100",
        ),
        "metric.economics.job_posting_effectiveness" => (
            "How well postings turn views into applications.",
            "Applications received / job views x 100, one posting per requisition",
        ),
        "metric.economics.hires_from_competitors" => (
            "Pull from competitors among hires; useful but can raise compensation pressure.",
            "Hires from competitors / hires with a competitor flag x 100",
        ),
        "metric.economics.hm_feedback_time" => (
            "Hiring manager feedback latency, a common cause of candidate drop-off.",
            "Mean days from Interview_Date to Feedback_Date",
        ),
        "metric.economics.jd_criteria_match" => (
            "How closely candidate profiles match job description criteria.",
            "Mean Skill_Match_Percentage across unique candidates",
        ),
        "metric.economics.interviewed_vs_offered" => (
            "Interviews needed to produce one offer.",
            "Interviewed candidates / candidates with an offer",
        ),
        _ => (GENERIC_MEANING, GENERIC_FORMULA),
    }
}

/// Explain `definition`, optionally against its computed value.
pub fn explain_metric(
    definition: &MetricDefinition,
    computed: Option<&ComputedMetric>,
) -> MetricExplanation {
    let (meaning, formula) = meaning_and_formula(definition.id);
    MetricExplanation {
        id: definition.id.to_string(),
        title: definition.title.to_string(),
        meaning: meaning.to_string(),
        formula: formula.to_string(),
        target: definition.threshold_text.to_string(),
        status: computed.map(|metric| metric.rag.label().to_string()),
        gap: computed.and_then(|metric| {
            gap_to_target_text(metric.value_num, &metric.threshold_text)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MetricRegistry;

    #[test]
    fn parses_threshold_shapes() {
        let parsed = parse_threshold("> 70%").unwrap();
        assert_eq!(parsed.comparator, Comparator::Above);
        assert_eq!(parsed.target, 70.0);

        let parsed = parse_threshold("< $4,000").unwrap();
        assert_eq!(parsed.comparator, Comparator::Below);
        assert_eq!(parsed.target, 4000.0);

        assert_eq!(parse_threshold("> USD 1,000").unwrap().target, 1000.0);
        assert_eq!(parse_threshold("< 7.0 days").unwrap().target, 7.0);
        assert_eq!(parse_threshold("Target 1 : 4"), None);
        assert_eq!(parse_threshold("N/A"), None);
    }

    #[test]
    fn gap_text_by_direction() {
        assert_eq!(
            gap_to_target_text(Some(72.5), "> 70%").as_deref(),
            Some("Above target by 2.5")
        );
        assert_eq!(
            gap_to_target_text(Some(60.0), "> 80%").as_deref(),
            Some("Below target by 20.0 (25%)")
        );
        assert_eq!(
            gap_to_target_text(Some(6.0), "< 7.0 days").as_deref(),
            Some("Better than target by 1.0")
        );
        assert_eq!(
            gap_to_target_text(Some(5_000.0), "< $4,000").as_deref(),
            Some("Over target by 1,000.0 (25%)")
        );
        assert_eq!(gap_to_target_text(None, "> 70%"), None);
        assert_eq!(gap_to_target_text(Some(4.0), "Target 1 : 4"), None);
    }

    #[test]
    fn every_standard_metric_has_a_specific_explanation() {
        let registry = MetricRegistry::standard();
        for definition in registry.definitions() {
            let explanation = explain_metric(definition, None);
            assert_ne!(explanation.meaning, GENERIC_MEANING, "{}", definition.id);
            assert_eq!(explanation.target, definition.threshold_text);
            assert_eq!(explanation.status, None);
        }
    }
}
