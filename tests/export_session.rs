use std::sync::Arc;
use std::thread;

use ta_cockpit::metrics::catalog::all_tiles;
use ta_cockpit::{
    CockpitError, CockpitSession, EngineConfig, FilterSpec, Rag, load_upload, parse_export_csv,
};

const PIPELINE: &str = "\
Application_ID,Candidate_ID,Requisition_ID,Business_Unit,Status,Skill_Match_Percentage,Total_Hiring_Cost,Application_Date
A1,C1,R1,Technology,Hired,85,3000,2024-01-02
A2,C2,R1,Technology,Active,72,3000,2024-01-09
A3,C3,R2,Finance,Rejected,55,,2024-01-16
A4,C4,R2,Finance,Active,40,,2024-01-23
";

fn session() -> CockpitSession {
    let session = CockpitSession::new(EngineConfig::default());
    session
        .upload("pipeline.csv", PIPELINE.as_bytes().to_vec())
        .unwrap();
    session
}

#[test]
fn csv_export_round_trips_cluster_metric_and_status() {
    let session = session();
    let filters = FilterSpec {
        business_units: Some(vec!["Technology".into()]),
        ..FilterSpec::default()
    };
    let catalog = session.catalog(&filters).unwrap();
    let bytes = session.export_csv(&filters).unwrap();
    let parsed = parse_export_csv(&bytes).unwrap();

    let expected: Vec<(String, String, Rag)> = all_tiles(&catalog)
        .map(|tile| (tile.cluster.as_str().to_string(), tile.id.clone(), tile.rag))
        .collect();
    let actual: Vec<(String, String, Rag)> = parsed
        .into_iter()
        .map(|metric| (metric.cluster, metric.metric_id, metric.rag))
        .collect();
    assert_eq!(actual, expected);

    let text = String::from_utf8(bytes).unwrap();
    assert!(text.lines().nth(1).unwrap().contains("BU: Technology"));
}

#[test]
fn narrative_request_carries_no_record_identifiers() {
    let session = session();
    let json = session
        .narrative_request(&FilterSpec::default())
        .unwrap()
        .to_json()
        .unwrap();
    for id in ["A1", "C1", "R1", "A4", "C4"] {
        assert!(!json.contains(&format!("\"{id}\"")), "{id} leaked");
    }
    assert!(json.contains("stageDistribution"));
}

#[test]
fn stale_upload_results_are_discarded() {
    let session = CockpitSession::new(EngineConfig::default());
    let config = session.config().clone();
    let slow = session.begin_upload();
    let fast = session.begin_upload();

    let fast_result = load_upload("fast.csv", PIPELINE.as_bytes(), &config);
    session.finish_upload(fast, fast_result).unwrap();

    let slow_result = load_upload("slow.csv", PIPELINE.as_bytes(), &config);
    assert!(matches!(
        session.finish_upload(slow, slow_result),
        Err(CockpitError::StaleUpload { .. })
    ));
    assert_eq!(session.dataset().unwrap().name, "fast.csv");
}

#[test]
fn concurrent_uploads_install_exactly_one_dataset() {
    let session = Arc::new(CockpitSession::new(EngineConfig::default()));
    let handles: Vec<_> = (0..4)
        .map(|idx| {
            let session = Arc::clone(&session);
            thread::spawn(move || {
                session
                    .upload(&format!("upload{idx}.csv"), PIPELINE.as_bytes().to_vec())
                    .is_ok()
            })
        })
        .collect();
    let installed = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert!(installed >= 1);
    let dataset = session.dataset().unwrap();
    assert!(dataset.name.starts_with("upload"));
    assert_eq!(dataset.len(), 4);
}

#[test]
fn queries_before_upload() {
    let session = CockpitSession::new(EngineConfig::default());
    assert!(matches!(
        session.export_csv(&FilterSpec::default()),
        Err(CockpitError::NoDataset)
    ));
    let catalog = session.catalog(&FilterSpec::default()).unwrap();
    assert!(all_tiles(&catalog).all(|tile| tile.value_text == "--"));
}
