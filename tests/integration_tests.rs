use anyhow::Result;
use dataset_importer::core::time_domain::TimeDomain;
use dataset_importer::{
    CsvImportPipeline, Dispatcher, ImportConfig, ImportEngine, ImportError, LocalStorage,
    ProgressReporter,
};
use httpmock::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

const GDP_CSV: &str = "Country,1990,2000\nFrance,1.2,1.4\nGermany,1.9,\n";

fn write_input(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

fn config_for(base_url: String, input_path: String) -> ImportConfig {
    let mut config = ImportConfig::default();
    config.server.base_url = base_url;
    config.input.path = input_path;
    config.input.variable_name = Some("GDP".to_string());
    config.dataset.name = "GDP dataset".to_string();
    config.datasource.name = "World Bank".to_string();
    config.variable.unit = "USD".to_string();
    config
}

fn mock_envelope<'a>(server: &'a MockServer, path: &str, key: &str, id: i64) -> httpmock::Mock<'a> {
    server.mock(|when, then| {
        when.method(POST).path(path);
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({ "success": true, "data": { key: id } }));
    })
}

fn mock_entity_check<'a>(server: &'a MockServer, unmatched: &[&str]) -> httpmock::Mock<'a> {
    let unmatched: Vec<String> = unmatched.iter().map(|s| s.to_string()).collect();
    server.mock(|when, then| {
        when.method(POST).path("/entityIsoNames/validateData");
        then.status(200)
            .json_body(serde_json::json!({ "success": true, "data": { "unmatched": unmatched } }));
    })
}

#[tokio::test]
async fn test_end_to_end_import_with_real_http() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_input(&temp_dir, "gdp.csv", GDP_CSV);
    let server = MockServer::start();

    let entity_check = mock_entity_check(&server, &[]);
    let input_file = mock_envelope(&server, "/inputfile/import", "inputFileId", 11);
    let datasource = server.mock(|when, then| {
        when.method(POST)
            .path("/datasource/import")
            .json_body_partial(r#"{"name": "World Bank", "inputFileId": 11}"#);
        then.status(200)
            .json_body(serde_json::json!({ "success": true, "data": { "datasourceId": 22 } }));
    });
    let dataset = server.mock(|when, then| {
        when.method(POST)
            .path("/dataset/import")
            .json_body_partial(r#"{"name": "GDP dataset", "datasourceId": 22}"#);
        then.status(200)
            .json_body(serde_json::json!({ "success": true, "data": { "datasetId": 33 } }));
    });
    let variable = server.mock(|when, then| {
        when.method(POST)
            .path("/variable/import")
            .json_body_partial(r#"{"name": "GDP", "unit": "USD", "datasetId": 33}"#);
        then.status(200)
            .json_body(serde_json::json!({ "success": true, "data": { "variableId": 44 } }));
    });
    let france = server.mock(|when, then| {
        when.method(POST)
            .path("/entity/import")
            .json_body_partial(r#"{"variableId": 44, "name": "France"}"#);
        then.status(200)
            .json_body(serde_json::json!({ "success": true, "data": { "entityId": 55 } }));
    });
    let germany = server.mock(|when, then| {
        when.method(POST)
            .path("/entity/import")
            .json_body_partial(
                r#"{"name": "Germany", "values": [{"value": 1.9, "time": {"d": "1990-01-01", "l": "1990", "sd": "1990-01-01", "ed": "1990-12-31", "td": "year"}}]}"#,
            );
        then.status(200)
            .json_body(serde_json::json!({ "success": true, "data": { "entityId": 56 } }));
    });

    let dispatcher = Arc::new(Dispatcher::new());
    let reporter = ProgressReporter::new();
    reporter.attach(&dispatcher);

    let config = config_for(server.base_url(), input);
    let pipeline = CsvImportPipeline::with_http(LocalStorage::new(String::new()), config, dispatcher)?;
    let outcome = ImportEngine::new(pipeline).run().await?;

    assert!(outcome.contains("dataset 33"));
    entity_check.assert();
    input_file.assert();
    datasource.assert();
    dataset.assert();
    variable.assert();
    france.assert();
    germany.assert();

    let events = reporter.events();
    assert!(!reporter.failed());
    // 3 + 1 個變數 + 2 個實體，再加上完成事件
    assert_eq!(events.len(), 7);
    assert_eq!(events[0].total, 6);
    assert!(events.last().unwrap().is_complete());
    Ok(())
}

#[tokio::test]
async fn test_import_halts_after_failed_step() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_input(&temp_dir, "gdp.csv", GDP_CSV);
    let server = MockServer::start();

    mock_entity_check(&server, &[]);
    mock_envelope(&server, "/inputfile/import", "inputFileId", 1);
    mock_envelope(&server, "/datasource/import", "datasourceId", 2);
    let dataset = server.mock(|when, then| {
        when.method(POST).path("/dataset/import");
        then.status(200).json_body(
            serde_json::json!({ "success": false, "data": { "message": "Dataset name already exists" } }),
        );
    });
    let variable = mock_envelope(&server, "/variable/import", "variableId", 4);
    let entity = mock_envelope(&server, "/entity/import", "entityId", 5);

    let dispatcher = Arc::new(Dispatcher::new());
    let reporter = ProgressReporter::new();
    reporter.attach(&dispatcher);

    let config = config_for(server.base_url(), input);
    let pipeline = CsvImportPipeline::with_http(LocalStorage::new(String::new()), config, dispatcher)?;
    let result = ImportEngine::new(pipeline).run().await;

    match result {
        Err(ImportError::ApiError { step, message }) => {
            assert_eq!(step, "createDataset");
            assert!(message.contains("already exists"));
        }
        other => panic!("expected ApiError, got {:?}", other),
    }

    dataset.assert();
    variable.assert_hits(0);
    entity.assert_hits(0);

    let last = reporter.last().unwrap();
    assert!(!last.success);
    assert_eq!(last.step, 2);
    Ok(())
}

#[tokio::test]
async fn test_server_error_status_stops_import() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_input(&temp_dir, "gdp.csv", GDP_CSV);
    let server = MockServer::start();

    mock_entity_check(&server, &[]);
    let input_file = server.mock(|when, then| {
        when.method(POST).path("/inputfile/import");
        then.status(502);
    });
    let datasource = mock_envelope(&server, "/datasource/import", "datasourceId", 2);

    let mut config = config_for(server.base_url(), input);
    config.server.timeout_seconds = Some(5);
    let pipeline = CsvImportPipeline::with_http(
        LocalStorage::new(String::new()),
        config,
        Arc::new(Dispatcher::new()),
    )?;

    let err = ImportEngine::new(pipeline).run().await.unwrap_err();
    assert!(matches!(err, ImportError::ApiError { ref step, .. } if step == "createInputFile"));
    assert!(err.to_string().contains("502"));
    input_file.assert();
    datasource.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_strict_entities_rejects_unknown_names() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_input(&temp_dir, "gdp.csv", "Country,1990\nFrance,1\nAtlantis,2\n");
    let server = MockServer::start();

    let check = mock_entity_check(&server, &["Atlantis"]);
    let input_file = mock_envelope(&server, "/inputfile/import", "inputFileId", 1);

    let mut config = config_for(server.base_url(), input);
    config.validation.strict_entities = true;
    let pipeline = CsvImportPipeline::with_http(
        LocalStorage::new(String::new()),
        config,
        Arc::new(Dispatcher::new()),
    )?;

    let result = ImportEngine::new(pipeline).run().await;
    let err = tokio_test::assert_err!(result);
    assert!(matches!(err, ImportError::ValidationError { .. }));
    assert!(err.to_string().contains("Atlantis"));
    check.assert();
    input_file.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_entity_check_failure_stops_before_import() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_input(&temp_dir, "gdp.csv", GDP_CSV);
    let server = MockServer::start();

    let check = server.mock(|when, then| {
        when.method(POST).path("/entityIsoNames/validateData");
        then.status(503).body("maintenance");
    });
    let input_file = mock_envelope(&server, "/inputfile/import", "inputFileId", 1);

    let pipeline = CsvImportPipeline::with_http(
        LocalStorage::new(String::new()),
        config_for(server.base_url(), input),
        Arc::new(Dispatcher::new()),
    )?;

    let result = ImportEngine::new(pipeline).run().await;
    let err = tokio_test::assert_err!(result);
    match err {
        ImportError::ApiError { step, .. } => assert_eq!(step, "validateEntities"),
        other => panic!("unexpected error: {:?}", other),
    }
    check.assert();
    input_file.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_invalid_time_labels_fail_before_any_request() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_input(&temp_dir, "gdp.csv", "Country,1990s,2000s\nFrance,1,2\n");
    let server = MockServer::start();
    let check = mock_entity_check(&server, &[]);

    // decade 標籤以 year 驗證應失敗
    let config = config_for(server.base_url(), input);
    let pipeline = CsvImportPipeline::with_http(
        LocalStorage::new(String::new()),
        config,
        Arc::new(Dispatcher::new()),
    )?;

    let err = ImportEngine::new(pipeline).run().await.unwrap_err();
    assert!(matches!(err, ImportError::ValidationError { .. }));
    assert!(err.to_string().contains("1990s"));
    check.assert_hits(0);
    Ok(())
}

#[tokio::test]
async fn test_dry_run_transposed_file_writes_mapped_json() -> Result<()> {
    let temp_dir = TempDir::new()?;
    // 時間在第一欄，需轉置
    let input = write_input(
        &temp_dir,
        "population.tsv",
        "Decade\tFrance\tGermany\n1990s\t56.7\t79.4\n2000s\t60.9\t\n",
    );
    let output_dir = temp_dir.path().join("out").to_string_lossy().to_string();

    let mut config = config_for("http://127.0.0.1:9".to_string(), input);
    config.input.time_domain = TimeDomain::Decade;
    config.input.variable_name = Some("Population".to_string());
    config.validation.skip_entity_check = true;
    config.output.dry_run = true;
    config.output.path = output_dir.clone();

    let pipeline = CsvImportPipeline::with_http(
        LocalStorage::new(String::new()),
        config,
        Arc::new(Dispatcher::new()),
    )?;
    let written = tokio_test::assert_ok!(ImportEngine::new(pipeline).run().await);
    assert!(written.ends_with("population_mapped.json"));

    let content: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&written)?)?;
    let variable = &content["variables"][0];
    assert_eq!(variable["name"], "Population");
    assert_eq!(variable["values"][0]["key"], "France");
    assert_eq!(variable["values"][0]["values"][1], serde_json::json!({ "x": "2000s", "y": 60.9 }));
    assert_eq!(variable["values"][1]["key"], "Germany");
    assert_eq!(variable["values"][1]["values"].as_array().unwrap().len(), 1);
    assert_eq!(content["times"]["1990s"]["ed"], "1999-12-31");
    assert_eq!(content["times"]["2000s"]["td"], "decade");
    Ok(())
}

#[tokio::test]
async fn test_long_layout_creates_one_variable_per_column() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = write_input(
        &temp_dir,
        "indicators.csv",
        "Entity,Year,GDP,Population\nFrance,1990,1.2,56.7\nFrance,2000,1.4,60.9\nGermany,1990,,79.4\n",
    );
    let server = MockServer::start();

    mock_entity_check(&server, &["Germany"]);
    mock_envelope(&server, "/inputfile/import", "inputFileId", 1);
    mock_envelope(&server, "/datasource/import", "datasourceId", 2);
    mock_envelope(&server, "/dataset/import", "datasetId", 3);
    let variables = mock_envelope(&server, "/variable/import", "variableId", 4);
    let entities = mock_envelope(&server, "/entity/import", "entityId", 5);

    let mut config = config_for(server.base_url(), input);
    config.input.layout = dataset_importer::core::mapping::Layout::Long;
    config.input.variable_name = None;

    let dispatcher = Arc::new(Dispatcher::new());
    let reporter = ProgressReporter::new();
    reporter.attach(&dispatcher);

    let pipeline = CsvImportPipeline::with_http(LocalStorage::new(String::new()), config, dispatcher)?;
    ImportEngine::new(pipeline).run().await?;

    // GDP: France；Population: France, Germany
    variables.assert_hits(2);
    entities.assert_hits(3);
    assert_eq!(reporter.events().last().unwrap().total, 3 + 2 + 3);
    Ok(())
}
