use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::FieldValue;

/// One entry of a select field's option list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Input kind of a field, tagged by `type` in descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    Select { options: Vec<SelectOption> },
    #[serde(alias = "boolean")]
    Checkbox,
}

impl FieldKind {
    /// Value a fresh answer map holds for this kind.
    pub fn default_value(&self) -> FieldValue {
        match self {
            FieldKind::Checkbox => FieldValue::Bool(false),
            _ => FieldValue::empty(),
        }
    }

    /// Whether `value` has the shape this kind stores.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self {
            FieldKind::Checkbox => value.as_bool().is_some(),
            _ => value.as_str().is_some(),
        }
    }

    pub fn options(&self) -> &[SelectOption] {
        match self {
            FieldKind::Select { options } => options,
            _ => &[],
        }
    }

    pub fn has_option(&self, value: &str) -> bool {
        self.options().iter().any(|option| option.value == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select { .. } => "select",
            FieldKind::Checkbox => "checkbox",
        }
    }
}

/// Extra checks applied to text answers at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
}

/// Declarative description of a single form input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
}

impl FieldSpec {
    /// A field without a step hint is reached from the start.
    pub fn is_reached(&self, step: u32) -> bool {
        self.step.is_none_or(|hint| hint <= step)
    }
}
