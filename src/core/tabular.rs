use crate::core::{CanonicalRecord, RawRecord};
use crate::utils::error::{EvalError, Result};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    Json,
}

impl TableFormat {
    pub fn from_extension(extension: &str) -> Option<TableFormat> {
        match extension.to_ascii_lowercase().as_str() {
            "csv" => Some(TableFormat::Csv),
            "tsv" => Some(TableFormat::Tsv),
            "json" => Some(TableFormat::Json),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Tsv => "tsv",
            TableFormat::Json => "json",
        }
    }
}

/// 將上傳表格讀為以標題文字為鍵的記錄
pub fn decode_records(data: &[u8], format: TableFormat) -> Result<Vec<RawRecord>> {
    match format {
        TableFormat::Csv => decode_delimited(data, b','),
        TableFormat::Tsv => decode_delimited(data, b'\t'),
        TableFormat::Json => decode_json(data),
    }
}

fn decode_delimited(data: &[u8], delimiter: u8) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(data);

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let mut data = HashMap::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            // 空白儲存格視為缺值
            if cell.trim().is_empty() {
                continue;
            }
            data.insert(header.to_string(), cell_value(cell));
        }
        if !data.is_empty() {
            records.push(RawRecord { data });
        }
    }

    Ok(records)
}

/// 儲存格一律保留為文字；成本欄位由 `FieldResolver::total_cost` 解析
fn cell_value(cell: &str) -> Value {
    Value::String(cell.trim().to_string())
}

fn decode_json(data: &[u8]) -> Result<Vec<RawRecord>> {
    let rows: Vec<serde_json::Map<String, Value>> =
        serde_json::from_slice(data).map_err(|e| EvalError::ValidationError {
            message: format!("JSON input must be an array of objects: {}", e),
        })?;

    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            if let Some((key, _)) = row
                .iter()
                .find(|(_, value)| value.is_array() || value.is_object())
            {
                return Err(EvalError::ValidationError {
                    message: format!(
                        "Row {} field '{}' is not a scalar value",
                        index + 1,
                        key
                    ),
                });
            }
            Ok(RawRecord {
                data: row.into_iter().collect(),
            })
        })
        .collect()
}

pub fn encode_delimited(records: &[CanonicalRecord], delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_writer(Vec::new());

    if records.is_empty() {
        writer.write_record(CANONICAL_HEADERS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| EvalError::IoError(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| EvalError::ProcessingError {
        message: format!("Encoded table is not valid UTF-8: {}", e),
    })
}

pub fn encode_csv(records: &[CanonicalRecord]) -> Result<String> {
    encode_delimited(records, b',')
}

pub fn encode_tsv(records: &[CanonicalRecord]) -> Result<String> {
    encode_delimited(records, b'\t')
}

pub fn encode_json(records: &[CanonicalRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

const CANONICAL_HEADERS: [&str; 8] = [
    "department",
    "program",
    "description",
    "totalCost",
    "cost",
    "impact",
    "mandate",
    "reliance",
];
