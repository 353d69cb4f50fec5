//! The 23 standard TA metrics.
//!
//! Every formula is a pure function of the record subset it receives. Rows
//! repeat per application, so candidate-level metrics deduplicate on
//! `candidate_id` (first row wins, rows without an id are skipped) and
//! requisition-level metrics keep one value per `requisition_id`.

use std::collections::HashSet;

use chrono::NaiveDateTime;
use indexmap::{IndexMap, IndexSet};

use super::format::{ValueFormat, format_currency, group_thousands};
use super::{Cluster, Measurement, MetricDefinition, RagRule};
use crate::breakdowns::Dimension::{
    self, BusinessUnit as Bu, CandidateType as Ctype, CurrentStage as Stage, Location as Loc,
    RecruiterId as Rec, RoleName as Role, Source as Src,
};
use crate::data::{CandidateType, FactRecord, PipelineStatus};

/// Skill match at or above this percentage counts as qualified.
pub const QUALIFIED_SKILL_MATCH: f64 = 80.0;

const MS_PER_DAY: f64 = 86_400_000.0;
const MS_PER_MINUTE: f64 = 60_000.0;

/// First row per candidate id; rows without a candidate id are dropped.
pub fn unique_by_candidate<'a>(rows: &[&'a FactRecord]) -> Vec<&'a FactRecord> {
    let mut seen: HashSet<&str> = HashSet::new();
    rows.iter()
        .copied()
        .filter(|row| match row.candidate_id.as_deref() {
            Some(id) => seen.insert(id),
            None => false,
        })
        .collect()
}

/// Arithmetic mean, `None` when empty.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let value = values.iter().sum::<f64>() / values.len() as f64;
    value.is_finite().then_some(value)
}

/// Fractional days from `start` to `end`.
pub fn days_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_milliseconds() as f64 / MS_PER_DAY
}

fn minutes_between(start: NaiveDateTime, end: NaiveDateTime) -> f64 {
    (end - start).num_milliseconds() as f64 / MS_PER_MINUTE
}

fn is_hired(row: &FactRecord) -> bool {
    row.status == Some(PipelineStatus::Hired)
}

fn value(value: f64, facts: Vec<String>) -> Option<Measurement> {
    value
        .is_finite()
        .then_some(Measurement::Value { value, facts })
}

/// Share of `true` among present flags, with the number of flagged rows.
fn flag_share(flags: impl Iterator<Item = Option<bool>>) -> Option<(f64, usize)> {
    let (flagged, positive) = flags.flatten().fold((0usize, 0usize), |(n, yes), flag| {
        (n + 1, yes + usize::from(flag))
    });
    (flagged > 0).then(|| (positive as f64 / flagged as f64 * 100.0, flagged))
}

fn critical_requisitions<'a>(rows: &[&'a FactRecord]) -> impl Iterator<Item = (&'a str, &'a FactRecord)> {
    rows.iter().filter_map(|row| match (row.critical_skill_flag, row.requisition_id.as_deref()) {
        (Some(true), Some(req)) => Some((req, *row)),
        _ => None,
    })
}

fn mean_skill_match(rows: &[&FactRecord]) -> Option<(f64, usize)> {
    let values: Vec<f64> = unique_by_candidate(rows)
        .iter()
        .filter_map(|row| row.skill_match_percentage)
        .collect();
    mean(&values).map(|value| (value, values.len()))
}

fn interviewed_and_offers(rows: &[&FactRecord]) -> (usize, usize) {
    let unique = unique_by_candidate(rows);
    let interviewed = unique.iter().filter(|row| row.interview_date.is_some()).count();
    let offers = unique.iter().filter(|row| row.offer_made == Some(true)).count();
    (interviewed, offers)
}

// Readiness

/// Mean count of qualified candidates per critical-skill requisition.
pub fn qualified_candidates_availability(rows: &[&FactRecord]) -> Option<Measurement> {
    let mut qualified: IndexMap<&str, HashSet<&str>> = IndexMap::new();
    for (req, row) in critical_requisitions(rows) {
        let candidates = qualified.entry(req).or_default();
        if let (Some(candidate), Some(skill)) = (row.candidate_id.as_deref(), row.skill_match_percentage)
            && skill >= QUALIFIED_SKILL_MATCH
        {
            candidates.insert(candidate);
        }
    }
    let per_req: Vec<f64> = qualified.values().map(|set| set.len() as f64).collect();
    value(
        mean(&per_req)?,
        vec![
            format!("Critical-skill requisitions: {}", qualified.len()),
            "Qualified threshold: Skill_Match_Percentage >= 80".to_string(),
        ],
    )
}

/// Mean skill match over unique candidates.
pub fn skill_readiness(rows: &[&FactRecord]) -> Option<Measurement> {
    let (mean, count) = mean_skill_match(rows)?;
    value(mean, vec![format!("Candidates with skill match %: {count}")])
}

/// Unique external candidates with any recruiter activity.
pub fn external_connections(rows: &[&FactRecord]) -> Option<Measurement> {
    let connected = unique_by_candidate(rows)
        .into_iter()
        .filter(|row| row.candidate_type == Some(CandidateType::External))
        .filter(|row| {
            row.recruiter_id
                .as_deref()
                .is_some_and(|id| !id.trim().is_empty())
                || row.matching_hours_total.unwrap_or(0.0) > 0.0
        })
        .count();
    if connected == 0 {
        return None;
    }
    value(
        connected as f64,
        vec!["Proxy: unique External candidates with recruiter activity".to_string()],
    )
}

/// Days from requisition open to its earliest application, critical-skill requisitions only.
pub fn time_to_present(rows: &[&FactRecord]) -> Option<Measurement> {
    let mut by_req: IndexMap<&str, (NaiveDateTime, NaiveDateTime)> = IndexMap::new();
    for (req, row) in critical_requisitions(rows) {
        let (Some(open), Some(applied)) = (row.requisition_open_date, row.application_date) else {
            continue;
        };
        by_req
            .entry(req)
            .and_modify(|(_, first)| {
                if applied < *first {
                    *first = applied;
                }
            })
            .or_insert((open, applied));
    }
    let (deltas, dropped): (Vec<f64>, Vec<f64>) = by_req
        .values()
        .map(|(open, first)| days_between(*open, *first))
        .partition(|delta| *delta >= 0.0);
    let negative_note = if dropped.is_empty() {
        "No negative deltas".to_string()
    } else {
        format!(
            "Dropped {} negative deltas (application before open date)",
            dropped.len()
        )
    };
    value(
        mean(&deltas)?,
        vec![
            format!("Critical-skill requisitions: {}", by_req.len()),
            negative_note,
        ],
    )
}

/// Share of critical-skill requisitions with at least one hire.
pub fn critical_skill_capability(rows: &[&FactRecord]) -> Option<Measurement> {
    let mut critical: IndexSet<&str> = IndexSet::new();
    let mut hired: HashSet<&str> = HashSet::new();
    for (req, row) in critical_requisitions(rows) {
        critical.insert(req);
        if is_hired(row) {
            hired.insert(req);
        }
    }
    if critical.is_empty() {
        return None;
    }
    value(
        hired.len() as f64 / critical.len() as f64 * 100.0,
        vec![
            format!("Critical-skill requisitions: {}", critical.len()),
            format!("With at least 1 hire: {}", hired.len()),
        ],
    )
}

/// Mean unique candidates per requisition.
pub fn pool_variety(rows: &[&FactRecord]) -> Option<Measurement> {
    let mut per_req: IndexMap<&str, HashSet<&str>> = IndexMap::new();
    for row in rows {
        if let (Some(req), Some(candidate)) = (row.requisition_id.as_deref(), row.candidate_id.as_deref()) {
            per_req.entry(req).or_default().insert(candidate);
        }
    }
    let sizes: Vec<f64> = per_req.values().map(|set| set.len() as f64).collect();
    value(
        mean(&sizes)?,
        vec![format!("Requisitions: {}", per_req.len())],
    )
}

// Momentum

/// Mean stage duration in days over rows with both stage dates.
pub fn time_to_next_step(rows: &[&FactRecord]) -> Option<Measurement> {
    let deltas: Vec<f64> = rows
        .iter()
        .filter_map(|row| Some(days_between(row.stage_enter_date?, row.stage_exit_date?)))
        .filter(|delta| *delta >= 0.0)
        .collect();
    value(
        mean(&deltas)?,
        vec![format!("Rows with stage enter/exit: {}", deltas.len())],
    )
}

/// Mean recruiter response time in hours over all rows.
pub fn time_to_cv_response(rows: &[&FactRecord]) -> Option<Measurement> {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.recruiter_response_time_hours)
        .collect();
    value(
        mean(&values)?,
        vec![format!("Rows with response time: {}", values.len())],
    )
}

/// Mean matching hours over unique candidates.
pub fn time_spent_matching(rows: &[&FactRecord]) -> Option<Measurement> {
    let values: Vec<f64> = unique_by_candidate(rows)
        .iter()
        .filter_map(|row| row.matching_hours_total)
        .collect();
    value(
        mean(&values)?,
        vec![format!(
            "Unique candidates with matching time: {}",
            values.len()
        )],
    )
}

/// Candidate NPS (5-10) rescaled to a five-point rating.
pub fn recruiting_experience_rating(rows: &[&FactRecord]) -> Option<Measurement> {
    let values: Vec<f64> = unique_by_candidate(rows)
        .iter()
        .filter_map(|row| row.candidate_nps)
        .map(|nps| nps / 2.0)
        .collect();
    value(
        mean(&values)?,
        vec![
            format!("Candidates with NPS: {}", values.len()),
            "Proxy: Candidate_NPS / 2 (5-10 -> 2.5-5)".to_string(),
        ],
    )
}

// Experience

/// Share of unique candidates whose application is not completed.
pub fn incomplete_applications(rows: &[&FactRecord]) -> Option<Measurement> {
    let (share, flagged) = flag_share(
        unique_by_candidate(rows)
            .iter()
            .map(|row| row.application_completed.map(|done| !done)),
    )?;
    value(
        share,
        vec![format!("Candidates with completion flag: {flagged}")],
    )
}

/// Mean minutes from application start to submit.
pub fn time_to_apply(rows: &[&FactRecord]) -> Option<Measurement> {
    let minutes: Vec<f64> = unique_by_candidate(rows)
        .iter()
        .filter_map(|row| {
            Some(minutes_between(
                row.application_start_time?,
                row.application_submit_time?,
            ))
        })
        .filter(|mins| *mins >= 0.0)
        .collect();
    value(
        mean(&minutes)?,
        vec![format!(
            "Candidates with start/submit time: {}",
            minutes.len()
        )],
    )
}

/// Mean ease-of-applying rating.
pub fn ease_of_applying(rows: &[&FactRecord]) -> Option<Measurement> {
    let values: Vec<f64> = unique_by_candidate(rows)
        .iter()
        .filter_map(|row| row.application_ease_rating)
        .collect();
    value(
        mean(&values)?,
        vec![format!("Candidates with ease rating: {}", values.len())],
    )
}

// Diversity

/// Share of diverse candidates among unique candidates with a flag.
pub fn diverse_attraction(rows: &[&FactRecord]) -> Option<Measurement> {
    let (share, flagged) = flag_share(
        unique_by_candidate(rows)
            .iter()
            .map(|row| row.diversity_flag),
    )?;
    value(
        share,
        vec![format!("Candidates with diversity flag: {flagged}")],
    )
}

fn unique_hires<'a>(rows: &[&'a FactRecord]) -> Vec<&'a FactRecord> {
    let hired: Vec<&FactRecord> = rows.iter().copied().filter(|row| is_hired(row)).collect();
    unique_by_candidate(&hired)
}

/// Share of diverse candidates among unique hires with a flag.
pub fn diverse_pipeline(rows: &[&FactRecord]) -> Option<Measurement> {
    let (share, flagged) =
        flag_share(unique_hires(rows).iter().map(|row| row.diversity_flag))?;
    value(share, vec![format!("Hires with diversity flag: {flagged}")])
}

/// Unique candidates among active rows.
pub fn active_applicants(rows: &[&FactRecord]) -> Option<Measurement> {
    let active: Vec<&FactRecord> = rows
        .iter()
        .copied()
        .filter(|row| row.status == Some(PipelineStatus::Active))
        .collect();
    let count = unique_by_candidate(&active).len();
    if count == 0 {
        return None;
    }
    value(
        count as f64,
        vec![format!("Active unique candidates: {count}")],
    )
}

// Economics

/// Total hiring cost (once per requisition) divided by unique hired applications.
pub fn cost_per_acquisition(rows: &[&FactRecord]) -> Option<Measurement> {
    let mut costed: HashSet<&str> = HashSet::new();
    let mut total_cost = 0.0;
    for row in rows {
        if let (Some(req), Some(cost)) = (row.requisition_id.as_deref(), row.total_hiring_cost)
            && costed.insert(req)
        {
            total_cost += cost;
        }
    }
    if costed.is_empty() {
        return Some(Measurement::NotApplicable {
            facts: vec!["No hiring cost data in the current filter slice.".to_string()],
        });
    }
    if !total_cost.is_finite() {
        return None;
    }

    let hires: HashSet<String> = rows
        .iter()
        .enumerate()
        .filter(|(_, row)| is_hired(row))
        .map(|(idx, row)| row.application_key(idx))
        .collect();
    if hires.is_empty() {
        return Some(Measurement::NotApplicable {
            facts: vec![
                format!(
                    "Total hiring cost (reqs with cost): {}",
                    format_currency(total_cost)
                ),
                "No hires in the current filter slice (Status = Hired).".to_string(),
            ],
        });
    }
    value(
        total_cost / hires.len() as f64,
        vec![
            format!("Hires: {}", group_thousands(hires.len() as f64, 0)),
            format!("Requisitions with cost: {}", costed.len()),
        ],
    )
}

/// Offers made as a share of interviewed unique candidates.
pub fn presented_vs_offers(rows: &[&FactRecord]) -> Option<Measurement> {
    let (interviewed, offers) = interviewed_and_offers(rows);
    if interviewed == 0 {
        return Some(Measurement::NotApplicable {
            facts: vec!["No interviewed candidates in the current filter slice.".to_string()],
        });
    }
    value(
        offers as f64 / interviewed as f64 * 100.0,
        vec![
            format!("Interviewed: {interviewed}"),
            format!("Offers made: {offers}"),
        ],
    )
}

/// Applications received per job view, one posting per requisition.
pub fn job_posting_effectiveness(rows: &[&FactRecord]) -> Option<Measurement> {
    let mut postings: IndexMap<&str, (f64, f64)> = IndexMap::new();
    for row in rows {
        if let (Some(req), Some(views), Some(apps)) = (
            row.requisition_id.as_deref(),
            row.job_views,
            row.job_applications_received,
        ) {
            postings.entry(req).or_insert((views, apps));
        }
    }
    let (views, apps) = postings
        .values()
        .fold((0.0, 0.0), |(views, apps), (v, a)| (views + v, apps + a));
    if views <= 0.0 {
        return None;
    }
    value(
        apps / views * 100.0,
        vec![
            format!("Reqs with posting analytics: {}", postings.len()),
            format!("Views: {}", group_thousands(views, 0)),
        ],
    )
}

/// Share of unique hires flagged as coming from a competitor.
pub fn hires_from_competitors(rows: &[&FactRecord]) -> Option<Measurement> {
    let (share, flagged) = flag_share(unique_hires(rows).iter().map(|row| row.is_competitor))?;
    value(
        share,
        vec![format!("Hires with competitor flag: {flagged}")],
    )
}

/// Mean days from interview to hiring-manager feedback.
pub fn hm_feedback_time(rows: &[&FactRecord]) -> Option<Measurement> {
    let deltas: Vec<f64> = unique_by_candidate(rows)
        .iter()
        .filter_map(|row| Some(days_between(row.interview_date?, row.feedback_date?)))
        .filter(|delta| *delta >= 0.0)
        .collect();
    value(
        mean(&deltas)?,
        vec![format!(
            "Candidates with interview+feedback dates: {}",
            deltas.len()
        )],
    )
}

/// Mean skill match as a proxy for job-description fit.
pub fn jd_criteria_match(rows: &[&FactRecord]) -> Option<Measurement> {
    let (mean, count) = mean_skill_match(rows)?;
    value(mean, vec![format!("Candidates with skill match %: {count}")])
}

/// Interviewed unique candidates per offer made.
pub fn interviewed_vs_offered(rows: &[&FactRecord]) -> Option<Measurement> {
    let (interviewed, offers) = interviewed_and_offers(rows);
    if interviewed == 0 || offers == 0 {
        return None;
    }
    value(
        interviewed as f64 / offers as f64,
        vec![
            format!("Interviewed: {interviewed}"),
            format!("Offers made: {offers}"),
        ],
    )
}

const fn higher(green_min: f64, amber_min: f64) -> RagRule {
    RagRule::HigherIsBetter {
        green_min,
        amber_min,
    }
}

const fn lower(green_max: f64, amber_max: f64) -> RagRule {
    RagRule::LowerIsBetter {
        green_max,
        amber_max,
    }
}

#[allow(clippy::too_many_arguments)]
fn define(
    id: &'static str,
    cluster: Cluster,
    title: &'static str,
    threshold_text: &'static str,
    rule: RagRule,
    format: ValueFormat,
    breakdown_dimensions: &'static [Dimension],
    formula: super::Formula,
) -> MetricDefinition {
    MetricDefinition {
        id,
        cluster,
        title,
        threshold_text,
        rule,
        format,
        breakdown_dimensions,
        formula: Some(formula),
    }
}

/// Definitions for the standard catalog, in display order.
pub fn standard_definitions() -> Vec<MetricDefinition> {
    use Cluster::{Diversity, Economics, Experience, Momentum, Readiness};
    use ValueFormat::{Currency, Days, Hours, Minutes, Number, Percent, Ratio, RatingOutOfFive};

    vec![
        define(
            "metric.readiness.qualified_candidates_availability",
            Readiness,
            "Qualified Candidates Availability",
            "> 5.0",
            higher(5.0, 3.5),
            Number { digits: 1 },
            &[Bu, Loc, Role, Src, Rec],
            qualified_candidates_availability,
        ),
        define(
            "metric.readiness.skill_readiness",
            Readiness,
            "Talent Pool Skill Readiness",
            "> 70%",
            higher(70.0, 66.0),
            Percent { digits: 0 },
            &[Bu, Role, Loc, Src, Ctype],
            skill_readiness,
        ),
        define(
            "metric.readiness.external_connections",
            Readiness,
            "Active External Connections",
            "> 1,000",
            higher(1000.0, 800.0),
            Number { digits: 0 },
            &[Src, Loc, Bu, Rec, Role],
            external_connections,
        ),
        define(
            "metric.readiness.critical_skill_capability",
            Readiness,
            "Critical Skill Hiring Capability",
            "> 90%",
            higher(90.0, 84.0),
            Percent { digits: 1 },
            &[Bu, Loc, Role, Rec, Src],
            critical_skill_capability,
        ),
        define(
            "metric.readiness.time_to_present",
            Readiness,
            "Time to Present Critical Skills",
            "< 7.0 days",
            lower(7.0, 9.0),
            Days,
            &[Bu, Loc, Role, Rec, Src],
            time_to_present,
        ),
        define(
            "metric.readiness.pool_variety",
            Readiness,
            "Talent Pool Size & Variety",
            "> 10",
            higher(10.0, 7.0),
            Number { digits: 1 },
            &[Bu, Loc, Src, Role, Ctype],
            pool_variety,
        ),
        define(
            "metric.momentum.time_to_next_step",
            Momentum,
            "Time to Next Step Decision",
            "< 5.0 days",
            lower(5.0, 6.0),
            Days,
            &[Stage, Bu, Rec, Loc, Role],
            time_to_next_step,
        ),
        define(
            "metric.momentum.time_spent_matching",
            Momentum,
            "Time Spent Matching",
            "< 6.0 hrs",
            lower(6.0, 7.0),
            Hours,
            &[Rec, Bu, Role, Loc, Src],
            time_spent_matching,
        ),
        define(
            "metric.momentum.time_to_cv_response",
            Momentum,
            "Time to CV Response",
            "< 24 hrs",
            lower(24.0, 30.0),
            Hours,
            &[Rec, Bu, Loc, Role, Src],
            time_to_cv_response,
        ),
        define(
            "metric.momentum.recruiting_experience_rating",
            Momentum,
            "Recruiting Experience Rating",
            "> 4.2",
            higher(4.2, 4.0),
            RatingOutOfFive,
            &[Src, Bu, Loc, Ctype, Rec],
            recruiting_experience_rating,
        ),
        define(
            "metric.experience.incomplete_applications",
            Experience,
            "Incomplete Applications",
            "< 20%",
            lower(20.0, 25.0),
            Percent { digits: 1 },
            &[Src, Loc, Bu, Role, Ctype],
            incomplete_applications,
        ),
        define(
            "metric.experience.time_to_apply",
            Experience,
            "Time to Apply",
            "< 10 mins",
            lower(10.0, 12.0),
            Minutes,
            &[Src, Role, Loc, Bu, Ctype],
            time_to_apply,
        ),
        define(
            "metric.experience.ease_of_applying",
            Experience,
            "Ease of Applying Rating",
            "> 4.0",
            higher(4.0, 3.8),
            RatingOutOfFive,
            &[Src, Bu, Loc, Role, Ctype],
            ease_of_applying,
        ),
        define(
            "metric.diversity.diverse_attraction",
            Diversity,
            "Gender Diversity in Attraction",
            "> 40%",
            higher(40.0, 35.0),
            Percent { digits: 1 },
            &[Bu, Loc, Src, Role, Stage],
            diverse_attraction,
        ),
        define(
            "metric.diversity.diverse_pipeline",
            Diversity,
            "Gender Diversity in Pipeline",
            "> 40%",
            higher(40.0, 32.0),
            Percent { digits: 1 },
            &[Bu, Loc, Role, Src, Rec],
            diverse_pipeline,
        ),
        define(
            "metric.diversity.active_applicants",
            Diversity,
            "Active Applicants",
            "> 8,000",
            higher(8000.0, 6000.0),
            Number { digits: 0 },
            &[Bu, Loc, Src, Role, Ctype],
            active_applicants,
        ),
        define(
            "metric.economics.cost_per_acquisition",
            Economics,
            "Cost per Acquisition",
            "< $4,000",
            lower(4000.0, 4500.0),
            Currency,
            &[Bu, Loc, Src, Role, Rec],
            cost_per_acquisition,
        ),
        define(
            "metric.economics.presented_vs_offers",
            Economics,
            "Candidates Presented vs Offers Made",
            "> 25%",
            higher(25.0, 20.0),
            Percent { digits: 1 },
            &[Bu, Rec, Loc, Role, Src],
            presented_vs_offers,
        ),
        define(
            "metric.economics.job_posting_effectiveness",
            Economics,
            "Job Posting Effectiveness",
            "> 8%",
            higher(8.0, 6.0),
            Percent { digits: 1 },
            &[Bu, Loc, Role, Src, Rec],
            job_posting_effectiveness,
        ),
        define(
            "metric.economics.hires_from_competitors",
            Economics,
            "Hires from Competitors",
            "> 15%",
            higher(15.0, 12.0),
            Percent { digits: 1 },
            &[Bu, Loc, Role, Src, Rec],
            hires_from_competitors,
        ),
        define(
            "metric.economics.hm_feedback_time",
            Economics,
            "Hiring Manager Feedback Time",
            "< 2.0 days",
            lower(2.0, 2.5),
            Days,
            &[Rec, Bu, Loc, Role, Stage],
            hm_feedback_time,
        ),
        define(
            "metric.economics.jd_criteria_match",
            Economics,
            "JD Criteria Match",
            "> 75%",
            higher(75.0, 72.0),
            Percent { digits: 0 },
            &[Bu, Role, Loc, Src, Rec],
            jd_criteria_match,
        ),
        define(
            "metric.economics.interviewed_vs_offered",
            Economics,
            "Interviewed vs Offered Ratio",
            "Target 1 : 4",
            higher(4.0, 3.0),
            Ratio,
            &[Bu, Rec, Loc, Role, Src],
            interviewed_vs_offered,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{MetricOutcome, MetricRegistry, Rag, UnavailableReason};
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn candidate(id: &str) -> FactRecord {
        FactRecord {
            candidate_id: Some(id.into()),
            ..FactRecord::default()
        }
    }

    fn computed(id: &str, rows: &[FactRecord]) -> MetricOutcome {
        let refs: Vec<&FactRecord> = rows.iter().collect();
        MetricRegistry::standard().evaluate(id, &refs)
    }

    #[test]
    fn skill_readiness_averages_unique_candidates() {
        let rows = vec![
            FactRecord {
                skill_match_percentage: Some(80.0),
                ..candidate("C1")
            },
            FactRecord {
                skill_match_percentage: Some(60.0),
                ..candidate("C2")
            },
            // Duplicate application row for C1 does not double count.
            FactRecord {
                skill_match_percentage: Some(10.0),
                ..candidate("C1")
            },
        ];
        let outcome = computed("metric.readiness.skill_readiness", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_num, Some(70.0));
        assert_eq!(metric.value_text, "70%");
        assert_eq!(metric.rag, Rag::Green);
        assert_eq!(metric.threshold_text, "> 70%");
        assert_eq!(metric.supporting_facts, vec!["Candidates with skill match %: 2"]);
    }

    #[test]
    fn skill_readiness_just_below_threshold_is_amber() {
        let rows = vec![FactRecord {
            skill_match_percentage: Some(69.999),
            ..candidate("C1")
        }];
        let outcome = computed("metric.readiness.skill_readiness", &rows);
        assert_eq!(outcome.computed().unwrap().rag, Rag::Amber);
    }

    #[test]
    fn cost_without_hires_is_not_applicable() {
        let rows = vec![
            FactRecord {
                requisition_id: Some("R1".into()),
                total_hiring_cost: Some(36_700.0),
                status: Some(PipelineStatus::Active),
                ..candidate("C1")
            },
            FactRecord {
                requisition_id: Some("R1".into()),
                total_hiring_cost: Some(36_700.0),
                status: Some(PipelineStatus::Rejected),
                ..candidate("C2")
            },
        ];
        let outcome = computed("metric.economics.cost_per_acquisition", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_text, "N/A");
        assert_eq!(metric.value_num, None);
        assert_eq!(metric.rag, Rag::Amber);
        assert_eq!(
            metric.supporting_facts,
            vec![
                "Total hiring cost (reqs with cost): $36,700",
                "No hires in the current filter slice (Status = Hired).",
            ]
        );
    }

    #[test]
    fn cost_is_summed_once_per_requisition() {
        let rows = vec![
            FactRecord {
                application_id: Some("A1".into()),
                requisition_id: Some("R1".into()),
                total_hiring_cost: Some(6_000.0),
                status: Some(PipelineStatus::Hired),
                ..candidate("C1")
            },
            FactRecord {
                application_id: Some("A2".into()),
                requisition_id: Some("R1".into()),
                total_hiring_cost: Some(6_000.0),
                status: Some(PipelineStatus::Hired),
                ..candidate("C2")
            },
        ];
        let outcome = computed("metric.economics.cost_per_acquisition", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_num, Some(3_000.0));
        assert_eq!(metric.value_text, "$3,000");
        assert_eq!(metric.rag, Rag::Green);
        assert_eq!(metric.supporting_facts, vec!["Hires: 2", "Requisitions with cost: 1"]);
    }

    #[test]
    fn cost_without_cost_data_is_not_applicable() {
        let rows = vec![candidate("C1")];
        let outcome = computed("metric.economics.cost_per_acquisition", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_num, None);
        assert_eq!(
            metric.supporting_facts,
            vec!["No hiring cost data in the current filter slice."]
        );
    }

    #[test]
    fn stage_duration_mean_and_negative_exclusion() {
        let rows = vec![
            FactRecord {
                stage_enter_date: Some(at(1, 0)),
                stage_exit_date: Some(at(4, 0)),
                ..FactRecord::default()
            },
            FactRecord {
                stage_enter_date: Some(at(1, 0)),
                stage_exit_date: Some(at(8, 0)),
                ..FactRecord::default()
            },
            FactRecord {
                stage_enter_date: Some(at(9, 0)),
                stage_exit_date: Some(at(2, 0)),
                ..FactRecord::default()
            },
        ];
        let outcome = computed("metric.momentum.time_to_next_step", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_num, Some(5.0));
        assert_eq!(metric.rag, Rag::Green);
        assert_eq!(metric.value_text, "5.0 days");
        assert_eq!(metric.supporting_facts, vec!["Rows with stage enter/exit: 2"]);
    }

    #[test]
    fn empty_subset_is_not_enough_data() {
        let outcome = computed("metric.readiness.skill_readiness", &[]);
        assert_eq!(
            outcome,
            MetricOutcome::Unavailable(UnavailableReason::NotEnoughData)
        );
    }

    #[test]
    fn deduplicating_twice_is_a_no_op() {
        let rows = [candidate("C1"), candidate("C1"), candidate("C2"), FactRecord::default()];
        let refs: Vec<&FactRecord> = rows.iter().collect();
        let once = unique_by_candidate(&refs);
        assert_eq!(once.len(), 2);
        assert_eq!(unique_by_candidate(&once), once);
    }

    #[test]
    fn qualified_candidates_count_per_critical_requisition() {
        let critical = |req: &str, cand: &str, skill: f64| FactRecord {
            requisition_id: Some(req.into()),
            critical_skill_flag: Some(true),
            skill_match_percentage: Some(skill),
            ..candidate(cand)
        };
        let rows = vec![
            critical("R1", "C1", 90.0),
            critical("R1", "C2", 85.0),
            critical("R1", "C2", 85.0),
            critical("R2", "C3", 40.0),
        ];
        let outcome = computed("metric.readiness.qualified_candidates_availability", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_num, Some(1.0));
        assert_eq!(metric.rag, Rag::Red);
        assert_eq!(metric.supporting_facts[0], "Critical-skill requisitions: 2");
    }

    #[test]
    fn time_to_present_drops_negative_deltas() {
        let row = |req: &str, open: u32, applied: u32| FactRecord {
            requisition_id: Some(req.into()),
            critical_skill_flag: Some(true),
            requisition_open_date: Some(at(open, 0)),
            application_date: Some(at(applied, 0)),
            ..FactRecord::default()
        };
        let rows = vec![row("R1", 1, 10), row("R1", 1, 7), row("R2", 5, 2)];
        let outcome = computed("metric.readiness.time_to_present", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_num, Some(6.0));
        assert_eq!(
            metric.supporting_facts,
            vec![
                "Critical-skill requisitions: 2",
                "Dropped 1 negative deltas (application before open date)",
            ]
        );
    }

    #[test]
    fn offer_ratio_and_yield_share_denominators() {
        let row = |id: &str, interviewed: bool, offer: bool| FactRecord {
            interview_date: interviewed.then(|| at(3, 9)),
            offer_made: Some(offer),
            ..candidate(id)
        };
        let rows = vec![
            row("C1", true, true),
            row("C2", true, false),
            row("C3", true, false),
            row("C4", true, false),
            row("C5", true, false),
        ];
        let ratio = computed("metric.economics.interviewed_vs_offered", &rows);
        let ratio = ratio.computed().unwrap();
        assert_eq!(ratio.value_text, "1 : 5.0");
        assert_eq!(ratio.rag, Rag::Green);

        let yield_pct = computed("metric.economics.presented_vs_offers", &rows);
        let yield_pct = yield_pct.computed().unwrap();
        assert_eq!(yield_pct.value_num, Some(20.0));
        assert_eq!(yield_pct.rag, Rag::Amber);
    }

    #[test]
    fn presented_vs_offers_without_interviews_is_not_applicable() {
        let outcome = computed("metric.economics.presented_vs_offers", &[candidate("C1")]);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_text, "N/A");
        assert_eq!(metric.rag, Rag::Amber);
    }

    #[test]
    fn posting_effectiveness_keeps_first_row_per_requisition() {
        let row = |req: &str, views: f64, apps: f64| FactRecord {
            requisition_id: Some(req.into()),
            job_views: Some(views),
            job_applications_received: Some(apps),
            ..FactRecord::default()
        };
        let rows = vec![row("R1", 1000.0, 50.0), row("R1", 1000.0, 50.0), row("R2", 1000.0, 150.0)];
        let outcome = computed("metric.economics.job_posting_effectiveness", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_num, Some(10.0));
        assert_eq!(
            metric.supporting_facts,
            vec!["Reqs with posting analytics: 2", "Views: 2,000"]
        );
    }

    #[test]
    fn rating_is_rescaled_from_nps() {
        let rows = vec![
            FactRecord {
                candidate_nps: Some(9.0),
                ..candidate("C1")
            },
            FactRecord {
                candidate_nps: Some(8.0),
                ..candidate("C2")
            },
        ];
        let outcome = computed("metric.momentum.recruiting_experience_rating", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_num, Some(4.25));
        assert_eq!(metric.rag, Rag::Green);
    }

    #[test]
    fn external_connections_require_activity() {
        let rows = vec![
            FactRecord {
                candidate_type: Some(CandidateType::External),
                recruiter_id: Some("  ".into()),
                ..candidate("C1")
            },
            FactRecord {
                candidate_type: Some(CandidateType::External),
                matching_hours_total: Some(1.5),
                ..candidate("C2")
            },
            FactRecord {
                candidate_type: Some(CandidateType::Internal),
                recruiter_id: Some("REC1".into()),
                ..candidate("C3")
            },
        ];
        let outcome = computed("metric.readiness.external_connections", &rows);
        assert_eq!(outcome.value_num(), Some(1.0));
        assert_eq!(outcome.computed().unwrap().rag, Rag::Red);
    }

    #[test]
    fn competitor_share_counts_unique_hires_only() {
        let hire = |id: &str, competitor: Option<bool>| FactRecord {
            status: Some(PipelineStatus::Hired),
            is_competitor: competitor,
            ..candidate(id)
        };
        let rows = vec![
            hire("C1", Some(true)),
            hire("C1", Some(false)),
            hire("C2", Some(false)),
            hire("C3", None),
            FactRecord {
                is_competitor: Some(true),
                ..candidate("C4")
            },
        ];
        let outcome = computed("metric.economics.hires_from_competitors", &rows);
        let metric = outcome.computed().unwrap();
        assert_eq!(metric.value_num, Some(50.0));
        assert_eq!(metric.supporting_facts, vec!["Hires with competitor flag: 2"]);
    }

    #[test]
    fn definitions_start_breakdowns_at_business_unit() {
        let definitions = standard_definitions();
        assert_eq!(definitions.len(), 23);
        let qualified = &definitions[0];
        assert_eq!(qualified.breakdown_dimensions, &[Bu, Loc, Role, Src, Rec]);
        assert!(
            definitions
                .iter()
                .all(|definition| !definition.breakdown_dimensions.is_empty())
        );
    }
}
