use crate::config::toml_config::ModelConfig;
use crate::core::{ConfigProvider, Storage};
use crate::utils::error::{EvalError, Result};
use crate::utils::validation::{
    parse_cost_threshold, validate_file_extension, validate_non_empty_string,
    validate_required_field, validate_url, Validate, INPUT_EXTENSIONS,
};
use aws_sdk_s3::Client as S3Client;
use serde::Deserialize;
use std::env;

/// 部署層級設定，冷啟動時讀取一次
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub s3_bucket: String,
    pub s3_prefix: String,
    pub s3_region: String,
    pub model: ModelConfig,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        let mut model = ModelConfig::default();
        if let Ok(name) = env::var("MODEL_NAME") {
            model.model = name;
        }
        if let Ok(api_base) = env::var("MODEL_API_BASE") {
            model.api_base = api_base;
        }
        if let Ok(timeout) = env::var("MODEL_TIMEOUT_SECONDS") {
            model.timeout_seconds = Some(timeout.parse().map_err(|_| {
                EvalError::InvalidConfigValueError {
                    field: "MODEL_TIMEOUT_SECONDS".to_string(),
                    value: timeout.clone(),
                    reason: "Expected a whole number of seconds".to_string(),
                }
            })?);
        }

        Ok(Self {
            s3_bucket: env::var("S3_BUCKET").map_err(|_| EvalError::ConfigError {
                message: "S3_BUCKET environment variable is required".to_string(),
            })?,
            s3_prefix: env::var("S3_PREFIX").unwrap_or_else(|_| "program-eval".to_string()),
            s3_region: env::var("S3_REGION").unwrap_or_else(|_| "ap-southeast-2".to_string()),
            model,
        })
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        validate_s3_bucket_name("s3_bucket", &self.s3_bucket)?;
        validate_non_empty_string("s3_prefix", &self.s3_prefix)?;
        validate_aws_region("s3_region", &self.s3_region)?;
        self.model.validate()?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

/// Lambda 事件中的單次評估請求
#[derive(Debug, Clone, Deserialize)]
pub struct LambdaJob {
    pub input_key: Option<String>,
    #[serde(default)]
    pub website_url: String,
    /// 數字或數字字串
    #[serde(default)]
    pub cost_threshold: serde_json::Value,
    pub output_prefix: Option<String>,
    #[serde(default = "default_output_formats")]
    pub output_formats: Vec<String>,
    #[serde(skip)]
    threshold: f64,
    #[serde(skip)]
    resolved_prefix: String,
}

fn default_output_formats() -> Vec<String> {
    vec!["csv".to_string(), "tsv".to_string(), "json".to_string()]
}

impl LambdaJob {
    /// 驗證事件並確定門檻與輸出前綴
    pub fn prepare(mut self, deployment: &LambdaConfig) -> Result<Self> {
        let input_key = validate_required_field("input_key", &self.input_key)?;
        validate_file_extension("input_key", input_key, INPUT_EXTENSIONS)?;
        validate_url("website_url", &self.website_url)?;

        self.threshold = match &self.cost_threshold {
            serde_json::Value::Number(n) => {
                parse_cost_threshold("cost_threshold", &n.to_string())?
            }
            serde_json::Value::String(s) => parse_cost_threshold("cost_threshold", s)?,
            other => {
                return Err(EvalError::InvalidConfigValueError {
                    field: "cost_threshold".to_string(),
                    value: other.to_string(),
                    reason: "Valid cost threshold is required".to_string(),
                })
            }
        };

        self.resolved_prefix = self
            .output_prefix
            .clone()
            .unwrap_or_else(|| deployment.s3_prefix.clone());

        for format in &self.output_formats {
            validate_file_extension(
                "output_formats",
                &format!("analysis_result.{}", format),
                INPUT_EXTENSIONS,
            )?;
        }

        Ok(self)
    }
}

impl ConfigProvider for LambdaJob {
    fn input_path(&self) -> &str {
        self.input_key.as_deref().unwrap_or_default()
    }

    fn output_path(&self) -> &str {
        &self.resolved_prefix
    }

    fn reference_url(&self) -> &str {
        &self.website_url
    }

    fn cost_threshold(&self) -> f64 {
        self.threshold
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }
}

fn validate_s3_bucket_name(field_name: &str, bucket_name: &str) -> Result<()> {
    if bucket_name.len() < 3 || bucket_name.len() > 63 {
        return Err(EvalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name must be between 3 and 63 characters".to_string(),
        });
    }

    if !bucket_name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(EvalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name can only contain lowercase letters, numbers, hyphens, and dots"
                .to_string(),
        });
    }

    if bucket_name.starts_with('-') || bucket_name.ends_with('-') {
        return Err(EvalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: bucket_name.to_string(),
            reason: "S3 bucket name cannot start or end with a hyphen".to_string(),
        });
    }

    Ok(())
}

fn validate_aws_region(field_name: &str, region: &str) -> Result<()> {
    validate_non_empty_string(field_name, region)?;

    if !region
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(EvalError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "AWS region can only contain lowercase letters, numbers, and hyphens"
                .to_string(),
        });
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: S3Client,
    bucket: String,
}

impl S3Storage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

impl Storage for S3Storage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                EvalError::IoError(std::io::Error::other(format!(
                    "Failed to read s3://{}/{}: {}",
                    self.bucket, path, e
                )))
            })?;

        let data = resp.body.collect().await.map_err(|e| {
            EvalError::IoError(std::io::Error::other(format!(
                "Failed to collect S3 data: {}",
                e
            )))
        })?;

        Ok(data.into_bytes().to_vec())
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(data.to_vec().into())
            .send()
            .await
            .map_err(|e| {
                EvalError::IoError(std::io::Error::other(format!(
                    "Failed to write s3://{}/{}: {}",
                    self.bucket, path, e
                )))
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployment() -> LambdaConfig {
        LambdaConfig {
            s3_bucket: "program-eval-data".to_string(),
            s3_prefix: "results".to_string(),
            s3_region: "ap-southeast-2".to_string(),
            model: ModelConfig::default(),
        }
    }

    #[test]
    fn test_job_accepts_string_threshold() {
        let job: LambdaJob = serde_json::from_value(serde_json::json!({
            "input_key": "uploads/programs.csv",
            "website_url": "https://springfield.gov",
            "cost_threshold": "25000"
        }))
        .unwrap();

        let job = job.prepare(&deployment()).unwrap();

        assert_eq!(job.cost_threshold(), 25000.0);
        assert_eq!(job.output_path(), "results");
        assert_eq!(job.input_path(), "uploads/programs.csv");
    }

    #[test]
    fn test_job_rejects_bad_events() {
        let missing_file: LambdaJob = serde_json::from_value(serde_json::json!({
            "website_url": "https://springfield.gov",
            "cost_threshold": 100
        }))
        .unwrap();
        assert!(matches!(
            missing_file.prepare(&deployment()),
            Err(EvalError::MissingConfigError { .. })
        ));

        let bad_threshold: LambdaJob = serde_json::from_value(serde_json::json!({
            "input_key": "programs.csv",
            "website_url": "https://springfield.gov",
            "cost_threshold": "cheap"
        }))
        .unwrap();
        assert!(bad_threshold.prepare(&deployment()).is_err());

        let no_url: LambdaJob = serde_json::from_value(serde_json::json!({
            "input_key": "programs.csv",
            "cost_threshold": 100
        }))
        .unwrap();
        assert!(no_url.prepare(&deployment()).is_err());
    }

    #[test]
    fn test_deployment_validation() {
        assert!(deployment().validate().is_ok());

        let bad_bucket = LambdaConfig {
            s3_bucket: "Bad_Bucket".to_string(),
            ..deployment()
        };
        assert!(bad_bucket.validate().is_err());
    }
}
