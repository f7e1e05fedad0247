use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Model request rejected ({status}): {message}")]
    ModelError { status: u16, message: String },

    #[error("Model returned an empty response")]
    EmptyModelResponse,

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Input,
    Model,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EvalError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EvalError::ApiError(_) | EvalError::ModelError { .. } | EvalError::EmptyModelResponse => {
                ErrorCategory::Model
            }
            EvalError::ConfigError { .. }
            | EvalError::MissingConfigError { .. }
            | EvalError::InvalidConfigValueError { .. }
            | EvalError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EvalError::CsvError(_) | EvalError::ValidationError { .. } => ErrorCategory::Input,
            EvalError::ZipError(_)
            | EvalError::IoError(_)
            | EvalError::SerializationError(_)
            | EvalError::ProcessingError { .. } => ErrorCategory::Output,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // 模型暫時性失敗：重新提交整批即可
            ErrorCategory::Model => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Input => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            EvalError::ApiError(_) => "Check network connectivity and the model API base URL, then re-run",
            EvalError::ModelError { status: 401, .. } | EvalError::ModelError { status: 403, .. } => {
                "Check that OPENAI_API_KEY is set and valid"
            }
            EvalError::ModelError { status: 429, .. } => "The model provider is rate limiting; wait and re-run",
            EvalError::ModelError { .. } | EvalError::EmptyModelResponse => {
                "Re-run the evaluation; no partial results were kept"
            }
            EvalError::CsvError(_) => "Make sure the input file has a header row and consistent columns",
            EvalError::ValidationError { .. } => "Fix the input file and submit it again",
            EvalError::MissingConfigError { .. }
            | EvalError::InvalidConfigValueError { .. }
            | EvalError::ConfigValidationError { .. }
            | EvalError::ConfigError { .. } => "Review the command line arguments and configuration file",
            EvalError::IoError(_) => "Check that the input file exists and the output path is writable",
            EvalError::ZipError(_)
            | EvalError::SerializationError(_)
            | EvalError::ProcessingError { .. } => {
                "Check free disk space and the output path, then re-run"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid request: {}", self),
            ErrorCategory::Input => format!("Could not read the program list: {}", self),
            ErrorCategory::Model => format!("Program evaluation failed: {}", self),
            ErrorCategory::Output => format!("Could not write the evaluation results: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EvalError>;
