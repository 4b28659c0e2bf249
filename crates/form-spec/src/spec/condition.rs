use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerMap, FieldValue};

/// Left-hand side of a condition: a field and the value it must equal.
///
/// `equals` is a string or a boolean; numeric values fail to parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Trigger {
    pub field: String,
    pub equals: FieldValue,
}

/// "If `field` equals `value`, reveal `show`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionRule {
    #[serde(rename = "if")]
    pub when: Trigger,
    pub show: Vec<String>,
}

impl ConditionRule {
    /// Strict equality against the current answers; `"true"` never equals `true`.
    pub fn matches(&self, answers: &AnswerMap) -> bool {
        answers.get(&self.when.field) == Some(&self.when.equals)
    }

    pub fn is_triggered_by(&self, name: &str, value: &FieldValue) -> bool {
        self.when.field == name && &self.when.equals == value
    }

    pub fn reveals(&self, name: &str) -> bool {
        self.show.iter().any(|target| target == name)
    }
}
