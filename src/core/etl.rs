use crate::core::{Pipeline, RunReport};
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// 全有或全無：任何失敗都不會留下報告或輸出檔
    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("🚀 Starting program evaluation");

        let raw_records = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} program records", raw_records.len());

        let transformed = self.pipeline.transform(raw_records).await?;
        tracing::info!("🧮 Evaluated {} program records", transformed.records.len());

        let outcome = self.pipeline.load(&transformed).await?;
        tracing::info!("📁 Results saved to: {}", outcome.output_path);

        Ok(RunReport {
            records: transformed.records,
            output_path: outcome.output_path,
            bundle: outcome.bundle,
        })
    }
}
