pub mod cli;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_cost_threshold, validate_file_extension, validate_path, validate_url, Validate,
    INPUT_EXTENSIONS,
};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "program-eval")]
#[command(about = "Score government programs on cost, impact, mandate and reliance")]
pub struct CliConfig {
    #[arg(short, long, help = "Program table to evaluate (.csv, .tsv or .json)")]
    pub input: String,

    #[arg(long, help = "Government website passed to the model as context")]
    pub website_url: String,

    #[arg(long, help = "Programs costing more than this are flagged High")]
    pub cost_threshold: f64,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = "csv,tsv,json")]
    pub output_formats: Vec<String>,

    #[arg(short, long, help = "Optional TOML file with [model] and [fields] settings")]
    pub config: Option<String>,

    #[arg(long, help = "Override the model name from the config file")]
    pub model: Option<String>,

    #[arg(long, help = "Override the OpenAI-compatible API base URL")]
    pub api_base: Option<String>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn reference_url(&self) -> &str {
        &self.website_url
    }

    fn cost_threshold(&self) -> f64 {
        self.cost_threshold
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extension("input", &self.input, INPUT_EXTENSIONS)?;
        validate_url("website_url", &self.website_url)?;
        validate_cost_threshold("cost_threshold", self.cost_threshold)?;
        validate_path("output_path", &self.output_path)?;

        for format in &self.output_formats {
            validate_file_extension("output_formats", &format!("table.{}", format), INPUT_EXTENSIONS)?;
        }
        if let Some(api_base) = &self.api_base {
            validate_url("api_base", api_base)?;
        }
        Ok(())
    }
}
