use crate::utils::error::Result;
use crate::utils::validation::{validate_cost_threshold, validate_non_empty_string};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// 上傳表格的一列，以原始標題文字為鍵
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub data: HashMap<String, serde_json::Value>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

/// 高/低評估結果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flag {
    #[serde(rename = "H")]
    High,
    #[default]
    #[serde(rename = "L")]
    Low,
}

impl Flag {
    /// 只接受單一 `H` 或 `L`（不分大小寫，忽略前後空白）
    pub fn from_letter(value: &str) -> Option<Flag> {
        match value.trim().to_ascii_uppercase().as_str() {
            "H" => Some(Flag::High),
            "L" => Some(Flag::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::High => "H",
            Flag::Low => "L",
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 管線輸出的標準化計畫記錄
///
/// 欄位順序即所有輸出表格的欄位順序
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    pub department: String,
    pub program: String,
    pub description: String,
    pub total_cost: f64,
    pub cost: Flag,
    pub impact: Flag,
    pub mandate: Flag,
    pub reliance: Flag,
}

impl CanonicalRecord {
    /// 輸出前整理：去除文字前後空白，成本為有限的非負數
    /// 對已整理過的記錄重複套用不會改變結果
    pub fn sanitized(self) -> Self {
        let total_cost = if self.total_cost.is_finite() && self.total_cost > 0.0 {
            self.total_cost
        } else {
            0.0
        };

        Self {
            department: self.department.trim().to_string(),
            program: self.program.trim().to_string(),
            description: self.description.trim().to_string(),
            total_cost,
            ..self
        }
    }

    /// 以標準欄位名稱重新表示記錄
    pub fn to_raw(&self) -> RawRecord {
        let cost = serde_json::Number::from_f64(self.total_cost)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null);

        RawRecord::new()
            .with("department", self.department.as_str())
            .with("program", self.program.as_str())
            .with("description", self.description.as_str())
            .with("totalCost", cost)
            .with("cost", self.cost.as_str())
            .with("impact", self.impact.as_str())
            .with("mandate", self.mandate.as_str())
            .with("reliance", self.reliance.as_str())
    }
}

/// 單次執行中所有記錄共用的參數
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationContext {
    reference_url: String,
    cost_threshold: f64,
}

impl EvaluationContext {
    pub fn new(reference_url: impl Into<String>, cost_threshold: f64) -> Result<Self> {
        let reference_url = reference_url.into();
        validate_non_empty_string("website_url", &reference_url)?;
        validate_cost_threshold("cost_threshold", cost_threshold)?;

        Ok(Self {
            reference_url: reference_url.trim().to_string(),
            cost_threshold,
        })
    }

    pub fn reference_url(&self) -> &str {
        &self.reference_url
    }

    pub fn cost_threshold(&self) -> f64 {
        self.cost_threshold
    }
}

/// 交由模型判斷的三項質性準則
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Criterion {
    Impact,
    Mandate,
    Reliance,
}

impl Criterion {
    pub const ALL: [Criterion; 3] = [Criterion::Impact, Criterion::Mandate, Criterion::Reliance];

    /// 模型 JSON 回覆中使用的鍵
    pub fn name(&self) -> &'static str {
        match self {
            Criterion::Impact => "Impact",
            Criterion::Mandate => "Mandate",
            Criterion::Reliance => "Reliance",
        }
    }
}

/// 每筆記錄各自建立的模型請求
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    pub department: String,
    pub program: String,
    pub description: String,
    pub reference_url: String,
    pub criteria: [Criterion; 3],
}

/// 產生 [`EvaluationResponse`] 的解析階段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Strict,
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationResponse {
    pub impact: Flag,
    pub mandate: Flag,
    pub reliance: Flag,
    pub stage: ParseStage,
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub records: Vec<CanonicalRecord>,
    pub csv_output: String,
    pub tsv_output: String,
    pub json_output: String,
}

#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub output_path: String,
    pub bundle: Vec<u8>,
}

/// 執行完成後回傳給呼叫端的結果
#[derive(Debug, Clone)]
pub struct RunReport {
    pub records: Vec<CanonicalRecord>,
    pub output_path: String,
    pub bundle: Vec<u8>,
}
