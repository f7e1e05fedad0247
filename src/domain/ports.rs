use crate::domain::model::{EvaluationRequest, LoadOutcome, RawRecord, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn reference_url(&self) -> &str;
    fn cost_threshold(&self) -> f64;
    fn output_formats(&self) -> &[String];
}

/// 語言模型的唯一介面
///
/// 一次只發出一個呼叫，完成後才處理下一筆記錄
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn evaluate(&self, request: &EvaluationRequest) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawRecord>>;
    async fn transform(&self, data: Vec<RawRecord>) -> Result<TransformResult>;
    async fn load(&self, result: &TransformResult) -> Result<LoadOutcome>;
}

