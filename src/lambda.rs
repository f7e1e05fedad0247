use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use program_eval::config::lambda::{LambdaConfig, LambdaJob, S3Storage};
use program_eval::utils::{logger, validation::Validate};
use program_eval::{
    CanonicalRecord, EtlEngine, EvaluationPipeline, Evaluator, FieldResolver, OpenAiClient,
};
use serde::Serialize;

#[derive(Serialize)]
pub struct Response {
    pub message: String,
    pub results: Vec<CanonicalRecord>,
    pub output_path: String,
    pub records_processed: usize,
}

fn boxed(e: program_eval::EvalError) -> Error {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    Box::new(e)
}

async fn function_handler(event: LambdaEvent<LambdaJob>) -> Result<Response, Error> {
    tracing::info!("Starting program evaluation Lambda function");

    let deployment = LambdaConfig::from_env().map_err(boxed)?;
    deployment.validate().map_err(boxed)?;

    // 請求驗證：在任何模型呼叫之前
    let job = event.payload.prepare(&deployment).map_err(boxed)?;

    let client = OpenAiClient::from_config(deployment.model.clone()).map_err(boxed)?;
    let evaluator = Evaluator::new(client, FieldResolver::default());

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let region = Region::new(deployment.s3_region.clone());
    let config = aws_sdk_s3::config::Builder::from(&config)
        .region(region)
        .force_path_style(true)
        .build();
    let s3_client = S3Client::from_conf(config);

    let storage = S3Storage::new(s3_client, deployment.s3_bucket.clone());
    let pipeline = EvaluationPipeline::new(storage, job, evaluator);

    let engine = EtlEngine::new(pipeline);
    let report = engine.run().await.map_err(boxed)?;

    let response = Response {
        message: "Evaluation completed successfully".to_string(),
        records_processed: report.records.len(),
        results: report.records,
        output_path: report.output_path,
    };

    tracing::info!(
        "Program evaluation Lambda function completed ({} records)",
        response.records_processed
    );
    Ok(response)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}
