use crate::core::fields::{CanonicalField, FieldResolver};
use crate::core::{Criterion, EvaluationContext, EvaluationRequest, RawRecord};

pub const SYSTEM_INSTRUCTION: &str = "You are an expert in government program evaluation. \
Provide concise H/L evaluations based on the criteria.";

const NOT_PROVIDED: &str = "Not provided";

impl Criterion {
    /// 此準則的 H/L 問題
    pub fn question(&self) -> &'static str {
        match self {
            Criterion::Impact => {
                "Does this program have a very high impact on societal goals like making the \
community safer, improving the economy, improving transportation, safe water, etc.? (H/L)"
            }
            Criterion::Mandate => {
                "Is this program likely required of the local government by either the Federal \
Government or State Government? (H/L)"
            }
            Criterion::Reliance => {
                "Could this program be provided readily by or together with another partner in the \
public or non-profit or private sector? If yes, respond \"L\" for low reliance on government. \
If no, respond \"H\" for high reliance on government."
            }
        }
    }
}

pub struct RequestBuilder<'a> {
    resolver: &'a FieldResolver,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(resolver: &'a FieldResolver) -> Self {
        Self { resolver }
    }

    pub fn build(&self, record: &RawRecord, context: &EvaluationContext) -> EvaluationRequest {
        EvaluationRequest {
            department: self.resolver.text(record, CanonicalField::Department),
            program: self.resolver.text(record, CanonicalField::Program),
            description: self.resolver.text(record, CanonicalField::Description),
            reference_url: context.reference_url().to_string(),
            criteria: Criterion::ALL,
        }
    }
}

impl EvaluationRequest {
    pub fn system_instruction(&self) -> &'static str {
        SYSTEM_INSTRUCTION
    }

    /// 產生使用者提示；相同請求必得相同文字
    pub fn render(&self) -> String {
        let mut prompt = String::from(
            "I need to evaluate a government program based on three criteria: Impact, Mandate, and Reliance.\n\n",
        );

        prompt.push_str("Program Details:\n");
        prompt.push_str(&format!("- Department: {}\n", or_not_provided(&self.department)));
        prompt.push_str(&format!("- Program Name: {}\n", or_not_provided(&self.program)));
        prompt.push_str(&format!("- Description: {}\n", or_not_provided(&self.description)));
        prompt.push_str(&format!("- Government Website: {}\n\n", self.reference_url));

        prompt.push_str(
            "For each of the following criteria, respond with ONLY a single letter - \"H\" for High or \"L\" for Low:\n\n",
        );
        for (index, criterion) in self.criteria.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. {}: {}\n\n",
                index + 1,
                criterion.name(),
                criterion.question()
            ));
        }

        let keys: Vec<String> = self
            .criteria
            .iter()
            .map(|criterion| format!("\"{}\"", criterion.name()))
            .collect();
        prompt.push_str(&format!(
            "Format your response as a JSON object with exactly three keys: {}, with values of only \"H\" or \"L\" for each.",
            keys.join(", ")
        ));

        prompt
    }
}

fn or_not_provided(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_PROVIDED
    } else {
        value
    }
}
