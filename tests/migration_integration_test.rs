use fairway_etl::{CliConfig, CsvImportPipeline, LocalStorage, MigrationEngine};
use httpmock::prelude::*;
use tempfile::TempDir;

const SUB_COURSES_CSV: &str = "\
id,course_id,name,start_hole,end_hole,sequence
front,c1,Front 9,1,9,1
back,c1,Back 9,10,18,2
";

const HOLES_CSV: &str = "\
course_id,hole_number,par,yardage
c1,1,4,390
c1,10,5,520
";

const SCORES_CSV: &str = "\
course_id,hole_number,player,strokes
c1,1,alice,3
c1,10,bob,5
";

fn write_exports(dir: &TempDir) {
    std::fs::write(dir.path().join("sub_courses.csv"), SUB_COURSES_CSV).unwrap();
    std::fs::write(dir.path().join("holes.csv"), HOLES_CSV).unwrap();
    std::fs::write(dir.path().join("scores.csv"), SCORES_CSV).unwrap();
}

fn config_for(server_url: String, dir: &TempDir) -> CliConfig {
    CliConfig {
        input_path: dir.path().to_str().unwrap().to_string(),
        input_files: vec![
            "sub_courses.csv".to_string(),
            "holes.csv".to_string(),
            "scores.csv".to_string(),
        ],
        target_endpoint: server_url,
        api_key: Some("test-key".to_string()),
        output_path: dir.path().to_str().unwrap().to_string(),
        batch_size: 50,
        max_retries: 0,
        dry_run: false,
        verbose: false,
    }
}

#[tokio::test]
async fn end_to_end_migration_posts_all_tables() {
    let temp_dir = TempDir::new().unwrap();
    write_exports(&temp_dir);

    let server = MockServer::start();
    let sub_courses_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/sub_courses")
            .header("apikey", "test-key");
        then.status(201);
    });
    let holes_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/holes")
            // Holes are annotated with display numbers before insert.
            .body_contains("display_hole");
        then.status(201);
    });
    let scores_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/rest/v1/scores")
            .body_contains("birdie");
        then.status(201);
    });

    let config = config_for(server.base_url(), &temp_dir);
    let storage = LocalStorage::new(config.input_path.clone(), config.output_path.clone());
    let pipeline = CsvImportPipeline::new(storage, config);
    let summary = MigrationEngine::new(pipeline).run().await.unwrap();

    sub_courses_mock.assert();
    holes_mock.assert();
    scores_mock.assert();
    assert!(summary.contains("inserted 6 rows across 3 tables"));

    // The report lands next to the output.
    let report_path = temp_dir.path().join("migration_report.json");
    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(report_path).unwrap()).unwrap();
    assert_eq!(report["dry_run"], serde_json::json!(false));
    assert_eq!(report["inserted"]["holes"], serde_json::json!(2));
    assert!(report["rejected"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn failed_insert_surfaces_status_error() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join("sub_courses.csv"), SUB_COURSES_CSV).unwrap();

    let server = MockServer::start();
    let failing_mock = server.mock(|when, then| {
        when.method(POST).path("/rest/v1/sub_courses");
        then.status(500).body("boom");
    });

    let mut config = config_for(server.base_url(), &temp_dir);
    config.input_files = vec!["sub_courses.csv".to_string()];

    let storage = LocalStorage::new(config.input_path.clone(), config.output_path.clone());
    let pipeline = CsvImportPipeline::new(storage, config);
    let result = MigrationEngine::new(pipeline).run().await;

    failing_mock.assert();
    match result {
        Err(fairway_etl::MigrationError::ApiStatusError { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected ApiStatusError, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn dry_run_touches_no_endpoint() {
    let temp_dir = TempDir::new().unwrap();
    write_exports(&temp_dir);

    let server = MockServer::start();
    let any_mock = server.mock(|when, then| {
        when.method(POST);
        then.status(201);
    });

    let mut config = config_for(server.base_url(), &temp_dir);
    config.dry_run = true;

    let storage = LocalStorage::new(config.input_path.clone(), config.output_path.clone());
    let pipeline = CsvImportPipeline::new(storage, config);
    let summary = MigrationEngine::new(pipeline).run().await.unwrap();

    assert_eq!(any_mock.hits(), 0);
    assert!(summary.contains("would insert"));
    assert!(temp_dir.path().join("migration_report.json").exists());
}

#[tokio::test]
async fn overlapping_segments_are_reported_not_loaded() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(
        temp_dir.path().join("sub_courses.csv"),
        "\
id,course_id,name,start_hole,end_hole,sequence
a,c1,Course A,1,9,1
b,c1,Course B,5,13,2
",
    )
    .unwrap();

    let server = MockServer::start();
    let any_mock = server.mock(|when, then| {
        when.method(POST);
        then.status(201);
    });

    let mut config = config_for(server.base_url(), &temp_dir);
    config.input_files = vec!["sub_courses.csv".to_string()];

    let storage = LocalStorage::new(config.input_path.clone(), config.output_path.clone());
    let pipeline = CsvImportPipeline::new(storage, config);
    let summary = MigrationEngine::new(pipeline).run().await.unwrap();

    // Nothing survives the transform, so nothing is posted.
    assert_eq!(any_mock.hits(), 0);
    assert!(summary.contains("0 rows"));

    let report: serde_json::Value = serde_json::from_slice(
        &std::fs::read(temp_dir.path().join("migration_report.json")).unwrap(),
    )
    .unwrap();
    let rejected = report["rejected"].as_array().unwrap();
    assert_eq!(rejected.len(), 2);
    assert!(rejected[0]["reason"]
        .as_str()
        .unwrap()
        .contains("overlapping sub-course ranges"));
}
