use httpmock::prelude::*;
use program_eval::utils::error::ErrorSeverity;
use program_eval::{
    CliConfig, EtlEngine, EvalError, EvaluationPipeline, Evaluator, FieldResolver, Flag,
    LocalStorage, ModelConfig, OpenAiClient,
};
use std::io::Read;
use tempfile::TempDir;

fn cli_config(input: &str, output_path: &str) -> CliConfig {
    CliConfig {
        input: input.to_string(),
        website_url: "https://springfield.gov".to_string(),
        cost_threshold: 10_000.0,
        output_path: output_path.to_string(),
        output_formats: vec!["csv".to_string(), "tsv".to_string(), "json".to_string()],
        config: None,
        model: None,
        api_base: None,
        verbose: false,
    }
}

fn model_client(server: &MockServer) -> OpenAiClient {
    let config = ModelConfig {
        api_base: server.base_url(),
        ..ModelConfig::default()
    };
    OpenAiClient::new(config, "test-key".to_string()).unwrap()
}

fn reply(content: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}

fn read_entry(archive: &mut zip::ZipArchive<std::io::Cursor<Vec<u8>>>, name: &str) -> String {
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

#[tokio::test]
async fn test_end_to_end_evaluation_writes_bundle() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let base = temp_dir.path().to_str().unwrap().to_string();
    std::fs::write(
        temp_dir.path().join("programs.csv"),
        "Department,Program Name,Description, Total Cost \n\
         Parks,Trails,Maintains trails,\"$50,000\"\n\
         Clerk,Records,Keeps minutes,4000\n",
    )?;

    let server = MockServer::start();
    let trails_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer test-key")
            .body_contains("Program Name: Trails");
        then.status(200)
            .json_body(reply(r#"{"Impact": "H", "Mandate": "L", "Reliance": "H"}"#));
    });
    let records_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("Program Name: Records");
        then.status(200)
            .json_body(reply("Impact: L\nMandate: H\nReliance: maybe"));
    });

    let evaluator = Evaluator::new(model_client(&server), FieldResolver::default());
    let storage = LocalStorage::new(base.clone());
    let pipeline = EvaluationPipeline::new(storage, cli_config("programs.csv", "out"), evaluator);
    let report = EtlEngine::new(pipeline).run().await?;

    trails_mock.assert();
    records_mock.assert();

    assert_eq!(report.records.len(), 2);
    let trails = &report.records[0];
    assert_eq!(trails.program, "Trails");
    assert_eq!(trails.total_cost, 50_000.0);
    assert_eq!(
        (trails.cost, trails.impact, trails.mandate, trails.reliance),
        (Flag::High, Flag::High, Flag::Low, Flag::High)
    );
    let clerk = &report.records[1];
    assert_eq!(
        (clerk.cost, clerk.impact, clerk.mandate, clerk.reliance),
        (Flag::Low, Flag::Low, Flag::High, Flag::Low)
    );

    let bundle_path = temp_dir.path().join("out").join("analysis_result.zip");
    assert!(bundle_path.exists());
    assert_eq!(std::fs::read(&bundle_path)?, report.bundle);

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(report.bundle.clone()))?;
    let csv = read_entry(&mut archive, "analysis_result.csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("department,program,description,totalCost,cost,impact,mandate,reliance")
    );
    assert_eq!(lines.next(), Some("Parks,Trails,Maintains trails,50000.0,H,H,L,H"));

    let tsv = read_entry(&mut archive, "analysis_result.tsv");
    assert!(tsv.contains("Clerk\tRecords\tKeeps minutes\t4000.0\tL\tL\tH\tL"));

    let json: serde_json::Value =
        serde_json::from_str(&read_entry(&mut archive, "analysis_result.json"))?;
    assert_eq!(json[0]["totalCost"], 50000.0);
    assert_eq!(json[1]["mandate"], "H");

    let manifest: serde_json::Value =
        serde_json::from_str(&read_entry(&mut archive, "manifest.json"))?;
    assert_eq!(manifest["records"], 2);
    assert_eq!(manifest["reference_url"], "https://springfield.gov");

    Ok(())
}

#[tokio::test]
async fn test_json_input_with_existing_flags_is_rescored() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let base = temp_dir.path().to_str().unwrap().to_string();
    std::fs::write(
        temp_dir.path().join("programs.json"),
        serde_json::to_vec(&serde_json::json!([
            {
                "department": "Water",
                "program": "Treatment Plant",
                "totalCost": 250000,
                "cost": "L",
                "impact": "L"
            }
        ]))?,
    )?;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200)
            .json_body(reply(r#"{"impact":"h","mandate":"h","reliance":"x"}"#));
    });

    let evaluator = Evaluator::new(model_client(&server), FieldResolver::default());
    let mut config = cli_config("programs.json", "out");
    config.output_formats = vec!["json".to_string()];
    let pipeline = EvaluationPipeline::new(LocalStorage::new(base), config, evaluator);
    let report = EtlEngine::new(pipeline).run().await?;

    let record = &report.records[0];
    assert_eq!(record.description, "");
    assert_eq!(
        (record.cost, record.impact, record.mandate, record.reliance),
        (Flag::High, Flag::High, Flag::High, Flag::Low)
    );

    let archive = zip::ZipArchive::new(std::io::Cursor::new(report.bundle))?;
    let mut names: Vec<&str> = archive.file_names().collect();
    names.sort();
    assert_eq!(names, vec!["analysis_result.json", "manifest.json"]);

    Ok(())
}

#[tokio::test]
async fn test_model_failure_leaves_no_bundle() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let base = temp_dir.path().to_str().unwrap().to_string();
    std::fs::write(
        temp_dir.path().join("programs.csv"),
        "Department,Program,Description,Total Cost\n\
         Parks,Trails,Maintains trails,50000\n\
         Clerk,Records,Keeps minutes,4000\n",
    )?;

    let server = MockServer::start();
    let ok_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("Program Name: Trails");
        then.status(200)
            .json_body(reply(r#"{"Impact":"H","Mandate":"H","Reliance":"H"}"#));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("Program Name: Records");
        then.status(500).body("upstream unavailable");
    });

    let evaluator = Evaluator::new(model_client(&server), FieldResolver::default());
    let pipeline = EvaluationPipeline::new(
        LocalStorage::new(base),
        cli_config("programs.csv", "out"),
        evaluator,
    );
    let result = EtlEngine::new(pipeline).run().await;

    ok_mock.assert();
    match result {
        Err(e @ EvalError::ModelError { status: 500, .. }) => {
            assert_eq!(e.severity(), ErrorSeverity::Medium);
        }
        other => panic!("expected model error, got {:?}", other.map(|r| r.records)),
    }
    assert!(!temp_dir.path().join("out").join("analysis_result.zip").exists());

    Ok(())
}

#[tokio::test]
async fn test_missing_input_fails_before_any_model_call() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let base = temp_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let model_mock = server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200)
            .json_body(reply(r#"{"Impact":"H","Mandate":"H","Reliance":"H"}"#));
    });

    let evaluator = Evaluator::new(model_client(&server), FieldResolver::default());
    let pipeline = EvaluationPipeline::new(
        LocalStorage::new(base),
        cli_config("missing.csv", "out"),
        evaluator,
    );
    let result = EtlEngine::new(pipeline).run().await;

    assert!(matches!(result, Err(EvalError::IoError(_))));
    model_mock.assert_hits(0);

    Ok(())
}
