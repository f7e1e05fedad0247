pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::openai::OpenAiClient;
pub use config::cli::LocalStorage;
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::{ModelConfig, TomlConfig};

#[cfg(feature = "lambda")]
pub use config::lambda::{LambdaConfig, S3Storage};

pub use core::{
    etl::EtlEngine, evaluator::Evaluator, fields::FieldResolver, pipeline::EvaluationPipeline,
};
pub use domain::model::{CanonicalRecord, EvaluationContext, Flag, RawRecord, RunReport};
pub use utils::error::{EvalError, Result};
