use crate::core::fields::FieldAliases;
use crate::utils::error::{EvalError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_range, validate_url, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// 選用的設定檔，每個區段皆可省略
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub model: ModelConfig,
    /// 標準欄位名稱 → 依序比對的標題別名
    #[serde(default)]
    pub fields: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub api_base: String,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: u32,
    /// 單次呼叫逾時秒數；未設定則不限時
    pub timeout_seconds: Option<u64>,
    pub api_key: Option<String>,
    pub api_key_env: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.3,
            max_tokens: 200,
            timeout_seconds: None,
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EvalError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EvalError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// 內建別名表，套用 `[fields]` 覆寫
    pub fn field_aliases(&self) -> Result<FieldAliases> {
        FieldAliases::default().with_overrides(&self.fields)
    }
}

impl Validate for ModelConfig {
    fn validate(&self) -> Result<()> {
        validate_url("model.api_base", &self.api_base)?;
        validate_non_empty_string("model.model", &self.model)?;
        validate_range("model.temperature", self.temperature, 0.0, 2.0)?;
        validate_range("model.max_tokens", self.max_tokens, 1, 16_384)?;
        if let Some(timeout) = self.timeout_seconds {
            validate_range("model.timeout_seconds", timeout, 1, 3_600)?;
        }
        Ok(())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.model.validate()?;
        self.field_aliases()?;
        Ok(())
    }
}
