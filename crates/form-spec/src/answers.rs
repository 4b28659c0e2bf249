use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value currently held by a single field.
///
/// Text-like fields (text, textarea, select) hold a string where `""` means
/// "empty"; checkbox fields hold a boolean. Numbers, nulls and other JSON
/// values do not deserialize, so a numeric answer or trigger value such as
/// `"equals": 1` rejects the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Text(String),
}

impl FieldValue {
    pub fn empty() -> Self {
        FieldValue::Text(String::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            FieldValue::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(flag) => Some(*flag),
            FieldValue::Text(_) => None,
        }
    }

    /// `""` and `false` both count as "nothing entered".
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(text) => text.is_empty(),
            FieldValue::Bool(flag) => !flag,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Text(text) => Value::String(text.clone()),
            FieldValue::Bool(flag) => Value::Bool(*flag),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Bool(flag) => write!(f, "{}", flag),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

/// Current user-entered values keyed by field name.
pub type AnswerMap = BTreeMap<String, FieldValue>;

/// Discriminator carried by every submission envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    #[default]
    ConditionalFormResponse,
}

/// Envelope handed to the owning caller once a form is submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FormResponse {
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    pub form_data: AnswerMap,
}

impl FormResponse {
    pub fn new(form_data: AnswerMap) -> Self {
        Self {
            kind: ResponseKind::ConditionalFormResponse,
            form_data,
        }
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, serde_cbor::Error> {
        serde_cbor::to_vec(self)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self, serde_cbor::Error> {
        serde_cbor::from_slice(bytes)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Single problem found while validating answers for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Outcome of validating an answer map against the reached fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<ValidationError>,
    #[serde(default)]
    pub missing_required: Vec<String>,
    #[serde(default)]
    pub unknown_fields: Vec<String>,
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.errors.is_empty() {
            let errors = self
                .errors
                .iter()
                .map(|error| match &error.field {
                    Some(field) => format!("{}: {}", field, error.message),
                    None => error.message.clone(),
                })
                .collect::<Vec<_>>();
            parts.push(errors.join("; "));
        }
        if !self.missing_required.is_empty() {
            parts.push(format!(
                "missing required: {}",
                self.missing_required.join(", ")
            ));
        }
        if !self.unknown_fields.is_empty() {
            parts.push(format!("unknown fields: {}", self.unknown_fields.join(", ")));
        }
        if parts.is_empty() {
            f.write_str("valid")
        } else {
            f.write_str(&parts.join("; "))
        }
    }
}
