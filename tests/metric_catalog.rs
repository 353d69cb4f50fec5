use ta_cockpit::metrics::catalog::{TileState, all_tiles};
use ta_cockpit::{
    Cluster, EngineConfig, FactRecord, MetricRegistry, MetricTile, Rag, health_score, load_upload,
    summarize_key_insights,
};

fn records(csv: &str) -> Vec<FactRecord> {
    load_upload("slice.csv", csv.as_bytes(), &EngineConfig::default())
        .unwrap()
        .records
}

fn tile<'a>(tiles: &'a [ta_cockpit::ClusterTiles], id: &str) -> &'a MetricTile {
    all_tiles(tiles).find(|tile| tile.id == id).unwrap()
}

#[test]
fn skill_readiness_scenario_is_green_at_seventy() {
    let rows = records("Candidate_ID,Skill_Match_Percentage\nC1,80\nC2,60\n");
    let refs: Vec<&FactRecord> = rows.iter().collect();
    let catalog = MetricRegistry::standard().evaluate_catalog(Some(refs.as_slice()));
    let skill = tile(&catalog, "metric.readiness.skill_readiness");
    assert_eq!(skill.value_num, Some(70.0));
    assert_eq!(skill.rag, Rag::Green);
    assert_eq!(skill.state, TileState::Computed);
}

#[test]
fn skill_readiness_just_under_the_cutoff_is_amber() {
    let rows = records("Candidate_ID,Skill_Match_Percentage\nC1,69.999\n");
    let refs: Vec<&FactRecord> = rows.iter().collect();
    let outcome = MetricRegistry::standard().evaluate("metric.readiness.skill_readiness", &refs);
    assert_eq!(outcome.computed().unwrap().rag, Rag::Amber);
}

#[test]
fn cost_without_hires_and_stage_durations_scenarios() {
    let rows = records(
        "Application_ID,Candidate_ID,Requisition_ID,Status,Stage_Enter_Date,Stage_Exit_Date,Total_Hiring_Cost\n\
         A1,C1,R1,Active,2024-03-01,2024-03-04,36700\n\
         A2,C2,R1,Rejected,2024-03-01,2024-03-08,36700\n",
    );
    let refs: Vec<&FactRecord> = rows.iter().collect();
    let catalog = MetricRegistry::standard().evaluate_catalog(Some(refs.as_slice()));

    let cost = tile(&catalog, "metric.economics.cost_per_acquisition");
    assert_eq!(cost.value_text, "N/A");
    assert_eq!(cost.rag, Rag::Amber);
    assert_eq!(cost.value_num, None);

    let next_step = tile(&catalog, "metric.momentum.time_to_next_step");
    assert!((next_step.value_num.unwrap() - 5.0).abs() < 1e-9);
    assert_eq!(next_step.rag, Rag::Green);
}

#[test]
fn duplicate_candidate_rows_never_change_unique_metrics() {
    let once = records("Candidate_ID,Skill_Match_Percentage,Candidate_NPS\nC1,80,9\nC2,60,7\n");
    let twice = records(
        "Candidate_ID,Skill_Match_Percentage,Candidate_NPS\nC1,80,9\nC2,60,7\nC1,80,9\nC2,60,7\n",
    );
    let registry = MetricRegistry::standard();
    let once_refs: Vec<&FactRecord> = once.iter().collect();
    let twice_refs: Vec<&FactRecord> = twice.iter().collect();
    for id in [
        "metric.readiness.skill_readiness",
        "metric.momentum.recruiting_experience_rating",
        "metric.economics.jd_criteria_match",
    ] {
        let first = registry.evaluate(id, &twice_refs);
        assert_eq!(first, registry.evaluate(id, &twice_refs), "{id}");
        assert_eq!(first, registry.evaluate(id, &once_refs), "{id}");
    }
}

#[test]
fn catalog_covers_all_clusters_in_order() {
    let registry = MetricRegistry::standard();
    let catalog = registry.evaluate_catalog(None);
    let clusters: Vec<Cluster> = catalog.iter().map(|group| group.cluster).collect();
    assert_eq!(clusters, Cluster::ALL.to_vec());
    assert_eq!(all_tiles(&catalog).count(), 23);
    assert!(all_tiles(&catalog).all(|tile| tile.value_text == "--"));
    assert_eq!(health_score(all_tiles(&catalog)), 0.0);
    assert!(summarize_key_insights(all_tiles(&catalog)).is_empty());
}

#[test]
fn key_insights_put_red_first() {
    let rows = records(
        "Application_ID,Candidate_ID,Requisition_ID,Status,Skill_Match_Percentage,Total_Hiring_Cost\n\
         A1,C1,R1,Hired,90,9000\n\
         A2,C2,R1,Active,80,9000\n",
    );
    let refs: Vec<&FactRecord> = rows.iter().collect();
    let catalog = MetricRegistry::standard().evaluate_catalog(Some(refs.as_slice()));
    let insights = summarize_key_insights(all_tiles(&catalog));
    assert!(!insights.is_empty() && insights.len() <= 4);
    assert_eq!(insights[0].rag, Rag::Red);
    assert!(insights.windows(2).all(|w| w[0].rag.severity_rank() <= w[1].rag.severity_rank()));
    let score = health_score(all_tiles(&catalog));
    assert!(score > 0.0 && score <= 100.0);
}
