use std::collections::BTreeSet;

use regex::Regex;
use thiserror::Error;

use crate::answers::FieldValue;
use crate::spec::{FieldKind, FormSpec};

/// Problem found in a form descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecIssue {
    #[error("form declares no fields")]
    NoFields,
    #[error("field '{name}' is declared more than once")]
    DuplicateField { name: String },
    #[error("select field '{name}' has no options")]
    EmptyOptions { name: String },
    #[error("field '{name}' has an invalid pattern: {message}")]
    InvalidPattern { name: String, message: String },
    #[error("field '{name}' has min_len greater than max_len")]
    InvalidLength { name: String },
    #[error("condition #{rule} triggers on unknown field '{field}'")]
    UnknownTrigger { rule: usize, field: String },
    #[error("condition #{rule} reveals unknown field '{field}'")]
    UnknownShowTarget { rule: usize, field: String },
    #[error("condition #{rule} compares '{field}' with {value}, which that field never holds")]
    UnreachableTrigger {
        rule: usize,
        field: String,
        value: String,
    },
}

impl SpecIssue {
    pub fn code(&self) -> &'static str {
        match self {
            SpecIssue::NoFields => "no_fields",
            SpecIssue::DuplicateField { .. } => "duplicate_field",
            SpecIssue::EmptyOptions { .. } => "empty_options",
            SpecIssue::InvalidPattern { .. } => "invalid_pattern",
            SpecIssue::InvalidLength { .. } => "invalid_length",
            SpecIssue::UnknownTrigger { .. } => "unknown_trigger",
            SpecIssue::UnknownShowTarget { .. } => "unknown_show_target",
            SpecIssue::UnreachableTrigger { .. } => "unreachable_trigger",
        }
    }

    /// Rule-reference issues; lenient descriptors tolerate these as no-ops.
    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            SpecIssue::UnknownTrigger { .. }
                | SpecIssue::UnknownShowTarget { .. }
                | SpecIssue::UnreachableTrigger { .. }
        )
    }
}

/// Collects every issue in `spec`, in declaration order.
pub fn lint(spec: &FormSpec) -> Vec<SpecIssue> {
    let mut issues = Vec::new();

    if spec.fields.is_empty() {
        issues.push(SpecIssue::NoFields);
    }

    let mut seen = BTreeSet::new();
    for field in &spec.fields {
        if !seen.insert(field.name.as_str()) {
            issues.push(SpecIssue::DuplicateField {
                name: field.name.clone(),
            });
        }
        if let FieldKind::Select { options } = &field.kind
            && options.is_empty()
        {
            issues.push(SpecIssue::EmptyOptions {
                name: field.name.clone(),
            });
        }
        if let Some(constraint) = &field.constraint {
            if let Some(pattern) = &constraint.pattern
                && let Err(err) = Regex::new(pattern)
            {
                issues.push(SpecIssue::InvalidPattern {
                    name: field.name.clone(),
                    message: err.to_string(),
                });
            }
            if let (Some(min), Some(max)) = (constraint.min_len, constraint.max_len)
                && min > max
            {
                issues.push(SpecIssue::InvalidLength {
                    name: field.name.clone(),
                });
            }
        }
    }

    for (index, rule) in spec.conditions.iter().enumerate() {
        match spec.field(&rule.when.field) {
            None => issues.push(SpecIssue::UnknownTrigger {
                rule: index,
                field: rule.when.field.clone(),
            }),
            Some(field) if !can_hold(&field.kind, &rule.when.equals) => {
                issues.push(SpecIssue::UnreachableTrigger {
                    rule: index,
                    field: field.name.clone(),
                    value: describe_value(&rule.when.equals),
                })
            }
            Some(_) => {}
        }
        for target in &rule.show {
            if spec.field(target).is_none() {
                issues.push(SpecIssue::UnknownShowTarget {
                    rule: index,
                    field: target.clone(),
                });
            }
        }
    }

    issues
}

fn can_hold(kind: &FieldKind, value: &FieldValue) -> bool {
    if !kind.accepts(value) {
        return false;
    }
    match (kind, value) {
        (FieldKind::Select { .. }, FieldValue::Text(text)) => {
            text.is_empty() || kind.has_option(text)
        }
        _ => true,
    }
}

fn describe_value(value: &FieldValue) -> String {
    match value {
        FieldValue::Text(text) => format!("\"{}\"", text),
        FieldValue::Bool(flag) => flag.to_string(),
    }
}
