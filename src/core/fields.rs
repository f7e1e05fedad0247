use crate::core::{CanonicalRecord, Flag, RawRecord};
use crate::utils::error::{EvalError, Result};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Department,
    Program,
    Description,
    TotalCost,
    Cost,
    Impact,
    Mandate,
    Reliance,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::Department,
        CanonicalField::Program,
        CanonicalField::Description,
        CanonicalField::TotalCost,
        CanonicalField::Cost,
        CanonicalField::Impact,
        CanonicalField::Mandate,
        CanonicalField::Reliance,
    ];

    /// 標準欄位鍵，即輸出表格的欄位名稱
    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::Department => "department",
            CanonicalField::Program => "program",
            CanonicalField::Description => "description",
            CanonicalField::TotalCost => "totalCost",
            CanonicalField::Cost => "cost",
            CanonicalField::Impact => "impact",
            CanonicalField::Mandate => "mandate",
            CanonicalField::Reliance => "reliance",
        }
    }

    pub fn from_key(key: &str) -> Option<CanonicalField> {
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(key.trim()))
    }

    fn default_aliases(&self) -> &'static [&'static str] {
        match self {
            CanonicalField::Department => &[
                "department",
                "Department",
                "DEPARTMENT",
                " Department ",
                "Department ",
                " Department",
                "Department Name",
                "Department_Name",
                "department_name",
            ],
            CanonicalField::Program => &[
                "program",
                "Program",
                "PROGRAM",
                " Program ",
                "Program ",
                " Program",
                "Program Name",
                "Program_Name",
                "program_name",
                "programName",
            ],
            CanonicalField::Description => &[
                "description",
                "Description",
                "DESCRIPTION",
                " Description ",
                "Description ",
                " Description",
                "Program Description",
                "Program_Description",
                "program_description",
            ],
            CanonicalField::TotalCost => &[
                "totalCost",
                "TotalCost",
                "Total Cost",
                "total cost",
                "TOTAL COST",
                " Total Cost ",
                "Total Cost ",
                " Total Cost",
                "Total_Cost",
                "total_Cost",
                "total_cost",
            ],
            CanonicalField::Cost => &["cost", "Cost", "COST", " Cost ", "Cost ", " Cost"],
            CanonicalField::Impact => &["impact", "Impact", "IMPACT", " Impact ", "Impact ", " Impact"],
            CanonicalField::Mandate => {
                &["mandate", "Mandate", "MANDATE", " Mandate ", "Mandate ", " Mandate"]
            }
            CanonicalField::Reliance => {
                &["reliance", "Reliance", "RELIANCE", " Reliance ", "Reliance ", " Reliance"]
            }
        }
    }
}

/// 各標準欄位的標題別名，排在前面者優先
#[derive(Debug, Clone, PartialEq)]
pub struct FieldAliases {
    table: HashMap<CanonicalField, Vec<String>>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        let table = CanonicalField::ALL
            .into_iter()
            .map(|field| {
                let aliases = field
                    .default_aliases()
                    .iter()
                    .map(|alias| alias.to_string())
                    .collect();
                (field, aliases)
            })
            .collect();
        Self { table }
    }
}

impl FieldAliases {
    /// 覆寫指定欄位的別名清單，未指定的欄位沿用內建清單
    pub fn with_overrides(mut self, overrides: &HashMap<String, Vec<String>>) -> Result<Self> {
        for (key, aliases) in overrides {
            let field = CanonicalField::from_key(key).ok_or_else(|| {
                EvalError::ConfigValidationError {
                    field: format!("fields.{}", key),
                    message: format!(
                        "Unknown canonical field. Valid fields: {}",
                        CanonicalField::ALL.map(|f| f.key()).join(", ")
                    ),
                }
            })?;

            if aliases.is_empty() {
                return Err(EvalError::ConfigValidationError {
                    field: format!("fields.{}", key),
                    message: "Alias list cannot be empty".to_string(),
                });
            }

            self.table.insert(field, aliases.clone());
        }
        Ok(self)
    }

    pub fn aliases(&self, field: CanonicalField) -> &[String] {
        self.table.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default)]
pub struct FieldResolver {
    aliases: FieldAliases,
}

impl FieldResolver {
    pub fn new(aliases: FieldAliases) -> Self {
        Self { aliases }
    }

    /// 回傳第一個非 null 的別名值；標準欄位鍵一律最先比對，
    /// 因此標準化後的記錄會解析回自身
    pub fn resolve<'a>(&self, record: &'a RawRecord, field: CanonicalField) -> Option<&'a Value> {
        std::iter::once(field.key())
            .chain(self.aliases.aliases(field).iter().map(String::as_str))
            .find_map(|alias| record.data.get(alias).filter(|value| !value.is_null()))
    }

    pub fn text(&self, record: &RawRecord, field: CanonicalField) -> String {
        match self.resolve(record, field) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    pub fn total_cost(&self, record: &RawRecord) -> f64 {
        match self.resolve(record, CanonicalField::TotalCost) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => parse_cost(s),
            _ => 0.0,
        }
    }

    pub fn flag(&self, record: &RawRecord, field: CanonicalField) -> Flag {
        match self.resolve(record, field) {
            Some(Value::String(s)) => Flag::from_letter(s).unwrap_or_default(),
            _ => Flag::Low,
        }
    }

    /// 任意列皆轉為完整的標準記錄，缺值以預設值補齊
    pub fn canonicalize(&self, record: &RawRecord) -> CanonicalRecord {
        CanonicalRecord {
            department: self.text(record, CanonicalField::Department),
            program: self.text(record, CanonicalField::Program),
            description: self.text(record, CanonicalField::Description),
            total_cost: self.total_cost(record),
            cost: self.flag(record, CanonicalField::Cost),
            impact: self.flag(record, CanonicalField::Impact),
            mandate: self.flag(record, CanonicalField::Mandate),
            reliance: self.flag(record, CanonicalField::Reliance),
        }
        .sanitized()
    }
}

/// 試算表的成本文字，例如 `"$1,250,000"`；無法解析者為 0
fn parse_cost(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}
