pub mod etl;
pub mod evaluator;
pub mod fields;
pub mod pipeline;
pub mod prompt;
pub mod response;
pub mod scoring;
pub mod tabular;

pub use crate::domain::model::{
    CanonicalRecord, Criterion, EvaluationContext, EvaluationRequest, EvaluationResponse, Flag,
    LoadOutcome, ParseStage, RawRecord, RunReport, TransformResult,
};
pub use crate::domain::ports::{ConfigProvider, ModelClient, Pipeline, Storage};
pub use crate::utils::error::Result;
