use crate::core::evaluator::Evaluator;
use crate::core::tabular::{self, TableFormat};
use crate::core::{
    ConfigProvider, EvaluationContext, LoadOutcome, ModelClient, Pipeline, RawRecord, Storage,
    TransformResult,
};
use crate::utils::error::{EvalError, Result};
use crate::utils::validation::{validate_file_extension, INPUT_EXTENSIONS};
use serde::Serialize;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const BUNDLE_NAME: &str = "analysis_result.zip";
const TABLE_STEM: &str = "analysis_result";

pub struct EvaluationPipeline<S: Storage, C: ConfigProvider, M: ModelClient> {
    storage: S,
    config: C,
    evaluator: Evaluator<M>,
}

#[derive(Serialize)]
struct Manifest<'a> {
    generated_at: String,
    records: usize,
    reference_url: &'a str,
    cost_threshold: f64,
    files: Vec<String>,
}

impl<S: Storage, C: ConfigProvider, M: ModelClient> EvaluationPipeline<S, C, M> {
    pub fn new(storage: S, config: C, evaluator: Evaluator<M>) -> Self {
        Self {
            storage,
            config,
            evaluator,
        }
    }

    fn context(&self) -> Result<EvaluationContext> {
        EvaluationContext::new(self.config.reference_url(), self.config.cost_threshold())
    }

    fn output_key(&self) -> String {
        let prefix = self.config.output_path().trim_end_matches('/');
        if prefix.is_empty() {
            BUNDLE_NAME.to_string()
        } else {
            format!("{}/{}", prefix, BUNDLE_NAME)
        }
    }

    fn requested_formats(&self) -> Result<Vec<TableFormat>> {
        self.config
            .output_formats()
            .iter()
            .map(|name| {
                TableFormat::from_extension(name).ok_or_else(|| EvalError::InvalidConfigValueError {
                    field: "output_formats".to_string(),
                    value: name.clone(),
                    reason: "Valid formats: csv, tsv, json".to_string(),
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, M: ModelClient> Pipeline for EvaluationPipeline<S, C, M> {
    async fn extract(&self) -> Result<Vec<RawRecord>> {
        let input = self.config.input_path();
        let extension = validate_file_extension("input", input, INPUT_EXTENSIONS)?;
        let format = TableFormat::from_extension(&extension).ok_or_else(|| {
            EvalError::ValidationError {
                message: format!("Unsupported input format: {}", extension),
            }
        })?;

        tracing::debug!("Reading {} input from: {}", format.extension(), input);
        let data = self.storage.read_file(input).await?;
        let records = tabular::decode_records(&data, format)?;
        tracing::debug!("Decoded {} rows from {} bytes", records.len(), data.len());

        Ok(records)
    }

    async fn transform(&self, data: Vec<RawRecord>) -> Result<TransformResult> {
        let context = self.context()?;
        let records = self.evaluator.run(data, &context).await?;

        Ok(TransformResult {
            csv_output: tabular::encode_csv(&records)?,
            tsv_output: tabular::encode_tsv(&records)?,
            json_output: tabular::encode_json(&records)?,
            records,
        })
    }

    async fn load(&self, result: &TransformResult) -> Result<LoadOutcome> {
        let formats = self.requested_formats()?;
        let output_key = self.output_key();

        let bundle = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            let mut files = Vec::new();

            for format in &formats {
                let body = match format {
                    TableFormat::Csv => &result.csv_output,
                    TableFormat::Tsv => &result.tsv_output,
                    TableFormat::Json => &result.json_output,
                };
                let name = format!("{}.{}", TABLE_STEM, format.extension());
                zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
                zip.write_all(body.as_bytes())?;
                files.push(name);
            }

            let manifest = Manifest {
                generated_at: chrono::Utc::now().to_rfc3339(),
                records: result.records.len(),
                reference_url: self.config.reference_url(),
                cost_threshold: self.config.cost_threshold(),
                files,
            };
            zip.start_file::<_, ()>("manifest.json", FileOptions::default())?;
            zip.write_all(serde_json::to_string_pretty(&manifest)?.as_bytes())?;

            zip.finish()?.into_inner()
        };

        tracing::debug!("Writing result bundle ({} bytes) to {}", bundle.len(), output_key);
        self.storage.write_file(&output_key, &bundle).await?;

        Ok(LoadOutcome {
            output_path: output_key,
            bundle,
        })
    }
}
