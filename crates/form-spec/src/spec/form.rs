use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::condition::ConditionRule;
use crate::spec::field::FieldSpec;

/// How the step counter reacts to repeated triggers of the same rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepCounting {
    /// Every change event matching a rule advances the step, including
    /// re-selecting a trigger value after switching away from it.
    #[default]
    EveryTrigger,
    /// Each rule advances the step at most once per form session.
    OncePerRule,
}

/// Engine policies carried alongside the descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FormPolicy {
    /// Reject descriptors whose rules name unknown fields. When off, such
    /// references are logged and behave as no-ops.
    #[serde(default = "default_true")]
    pub strict_references: bool,
    #[serde(default)]
    pub step_counting: StepCounting,
    /// Check required flags, value types, select options and constraints
    /// before accepting a submission.
    #[serde(default = "default_true")]
    pub validate_on_submit: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FormPolicy {
    fn default() -> Self {
        Self {
            strict_references: true,
            step_counting: StepCounting::EveryTrigger,
            validate_on_submit: true,
        }
    }
}

/// Top-level conditional form descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: Vec<FieldSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<ConditionRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<FormPolicy>,
}

impl FormSpec {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// JSON schema of the descriptor format itself.
pub fn descriptor_schema() -> serde_json::Value {
    schemars::schema_for!(FormSpec).to_value()
}
