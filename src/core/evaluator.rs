use crate::core::fields::FieldResolver;
use crate::core::prompt::RequestBuilder;
use crate::core::response::parse_response;
use crate::core::scoring::cost_flag;
use crate::core::{CanonicalRecord, EvaluationContext, ModelClient, ParseStage, RawRecord};
use crate::utils::error::Result;

/// 逐筆執行成本評分、模型評估與標準化
pub struct Evaluator<M: ModelClient> {
    model: M,
    resolver: FieldResolver,
}

impl<M: ModelClient> Evaluator<M> {
    pub fn new(model: M, resolver: FieldResolver) -> Self {
        Self { model, resolver }
    }

    /// 輸出第 `i` 筆對應輸入第 `i` 筆；模型首次失敗即中止，
    /// 已評估的結果一律不回傳
    pub async fn run(
        &self,
        records: Vec<RawRecord>,
        context: &EvaluationContext,
    ) -> Result<Vec<CanonicalRecord>> {
        let total = records.len();
        let builder = RequestBuilder::new(&self.resolver);
        let mut evaluated = Vec::with_capacity(total);

        for (index, record) in records.into_iter().enumerate() {
            let total_cost = self.resolver.total_cost(&record);
            let cost = cost_flag(total_cost, context.cost_threshold());

            let request = builder.build(&record, context);
            tracing::debug!(
                "🧠 Evaluating {}/{}: {} ({})",
                index + 1,
                total,
                request.program,
                request.department
            );

            let reply = self.model.evaluate(&request).await.map_err(|e| {
                tracing::error!("❌ Model call failed on record {}/{}: {}", index + 1, total, e);
                e
            })?;

            let response = parse_response(&reply);
            if response.stage == ParseStage::Lenient {
                tracing::warn!(
                    "⚠️ Record {}/{}: reply was not a JSON object, used keyword fallback",
                    index + 1,
                    total
                );
            }

            let canonical = CanonicalRecord {
                department: request.department,
                program: request.program,
                description: request.description,
                total_cost,
                cost,
                impact: response.impact,
                mandate: response.mandate,
                reliance: response.reliance,
            }
            .sanitized();

            tracing::info!("Processed program {}/{}: {}", index + 1, total, canonical.program);
            evaluated.push(canonical);
        }

        Ok(evaluated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{EvaluationRequest, Flag};
    use crate::utils::error::EvalError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// 回覆固定答案並記錄被詢問的計畫名稱
    struct ScriptedModel {
        reply: String,
        fail_on_call: Option<usize>,
        calls: AtomicUsize,
        seen: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                fail_on_call: None,
                calls: AtomicUsize::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(mut self, call: usize) -> Self {
            self.fail_on_call = Some(call);
            self
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn evaluate(&self, request: &EvaluationRequest) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push(request.program.clone());
            if Some(call) == self.fail_on_call {
                return Err(EvalError::ModelError {
                    status: 503,
                    message: "model unavailable".to_string(),
                });
            }
            Ok(self.reply.clone())
        }
    }

    fn context() -> EvaluationContext {
        EvaluationContext::new("https://springfield.gov", 10_000.0).unwrap()
    }

    fn program(name: &str, cost: f64) -> RawRecord {
        RawRecord::new()
            .with("Department", "Public Works")
            .with("Program", name)
            .with(" Total Cost ", cost)
    }

    #[tokio::test]
    async fn test_end_to_end_single_record() {
        let model = ScriptedModel::replying(r#"{"Impact":"H","Mandate":"L","Reliance":"L"}"#);
        let evaluator = Evaluator::new(model, FieldResolver::default());
        let records = vec![RawRecord::new()
            .with("Department", "Parks")
            .with("Program", "Trails")
            .with("Description", "Maintains trails")
            .with(" Total Cost ", 50000)];

        let output = evaluator.run(records, &context()).await.unwrap();

        assert_eq!(
            output,
            vec![CanonicalRecord {
                department: "Parks".to_string(),
                program: "Trails".to_string(),
                description: "Maintains trails".to_string(),
                total_cost: 50000.0,
                cost: Flag::High,
                impact: Flag::High,
                mandate: Flag::Low,
                reliance: Flag::Low,
            }]
        );
    }

    #[tokio::test]
    async fn test_order_is_preserved() {
        let model = ScriptedModel::replying(r#"{"Impact":"L","Mandate":"H","Reliance":"H"}"#);
        let evaluator = Evaluator::new(model, FieldResolver::default());
        let names = ["Snow Removal", "Libraries", "Animal Control", "Transit"];
        let records = names
            .iter()
            .enumerate()
            .map(|(i, name)| program(name, (i as f64) * 6_000.0))
            .collect();

        let output = evaluator.run(records, &context()).await.unwrap();

        let programs: Vec<&str> = output.iter().map(|r| r.program.as_str()).collect();
        assert_eq!(programs, names);
        let costs: Vec<Flag> = output.iter().map(|r| r.cost).collect();
        assert_eq!(costs, vec![Flag::Low, Flag::Low, Flag::High, Flag::High]);
        assert_eq!(*evaluator.model.seen.lock().unwrap(), names);
    }

    #[tokio::test]
    async fn test_model_failure_aborts_without_partial_output() {
        let model = ScriptedModel::replying(r#"{"Impact":"H","Mandate":"H","Reliance":"H"}"#)
            .failing_on(1);
        let evaluator = Evaluator::new(model, FieldResolver::default());
        let records = vec![program("A", 1.0), program("B", 2.0), program("C", 3.0)];

        let result = evaluator.run(records, &context()).await;

        assert!(matches!(result, Err(EvalError::ModelError { status: 503, .. })));
        // 失敗後不再呼叫模型
        assert_eq!(evaluator.model.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unreadable_reply_defaults_to_low() {
        let model = ScriptedModel::replying("I cannot evaluate this program.");
        let evaluator = Evaluator::new(model, FieldResolver::default());

        let output = evaluator
            .run(vec![RawRecord::new()], &context())
            .await
            .unwrap();

        assert_eq!(output, vec![CanonicalRecord::default()]);
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_calls() {
        let model = ScriptedModel::replying("{}");
        let evaluator = Evaluator::new(model, FieldResolver::default());

        let output = evaluator.run(Vec::new(), &context()).await.unwrap();

        assert!(output.is_empty());
        assert_eq!(evaluator.model.calls.load(Ordering::SeqCst), 0);
    }
}
