//! 將模型回覆轉為三個旗標
//!
//! 先以 JSON 物件解析；完全失敗時才掃描文字，尋找準則名稱之後獨立的 `H` 或 `L`。
//! 無法判讀者一律為 `L`，解析本身不會失敗。

use crate::core::{Criterion, EvaluationResponse, Flag, ParseStage};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub fn parse_response(raw: &str) -> EvaluationResponse {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(object)) => parse_strict(&object),
        _ => parse_lenient(raw),
    }
}

fn parse_strict(object: &Map<String, Value>) -> EvaluationResponse {
    let flag = |criterion: Criterion| {
        object
            .iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(criterion.name()))
            .and_then(|(_, value)| value.as_str())
            .and_then(Flag::from_letter)
            .unwrap_or_default()
    };

    EvaluationResponse {
        impact: flag(Criterion::Impact),
        mandate: flag(Criterion::Mandate),
        reliance: flag(Criterion::Reliance),
        stage: ParseStage::Strict,
    }
}

fn parse_lenient(raw: &str) -> EvaluationResponse {
    let flag = |criterion: Criterion| {
        lenient_pattern(criterion)
            .captures(raw)
            .and_then(|caps| caps.get(1))
            .and_then(|m| Flag::from_letter(m.as_str()))
            .unwrap_or_default()
    };

    EvaluationResponse {
        impact: flag(Criterion::Impact),
        mandate: flag(Criterion::Mandate),
        reliance: flag(Criterion::Reliance),
        stage: ParseStage::Lenient,
    }
}

fn lenient_pattern(criterion: Criterion) -> &'static Regex {
    static IMPACT: OnceLock<Regex> = OnceLock::new();
    static MANDATE: OnceLock<Regex> = OnceLock::new();
    static RELIANCE: OnceLock<Regex> = OnceLock::new();

    let cell = match criterion {
        Criterion::Impact => &IMPACT,
        Criterion::Mandate => &MANDATE,
        Criterion::Reliance => &RELIANCE,
    };

    cell.get_or_init(|| {
        // 名稱之後第一個獨立的 H / L，不限距離
        Regex::new(&format!(r"(?is){}.*?\b([hl])\b", regex::escape(criterion.name())))
            .expect("criterion pattern is a valid regex")
    })
}
