use regex::Regex;

use crate::answers::{FieldValue, ValidationError, ValidationResult};
use crate::engine::{ConditionalForm, FormState};
use crate::spec::{Constraint, FieldKind, FieldSpec};

/// Validates the answers of every reached field in `state`.
///
/// Fields that are hidden, or whose step has not been reached yet, are not
/// checked; their values still travel with the submission.
pub fn validate(form: &ConditionalForm, state: &FormState) -> ValidationResult {
    let reached = form.reached_fields(state);
    let answers = state.answers();

    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for field in form.fields() {
        if !reached.contains(&field.name) {
            continue;
        }

        let default = field.kind.default_value();
        let value = answers.get(&field.name).unwrap_or(&default);

        if !field.kind.accepts(value) {
            errors.push(base_error(field, "type mismatch", "type_mismatch"));
            continue;
        }

        if value.is_empty() {
            if field.required {
                missing_required.push(field.name.clone());
            }
            continue;
        }

        if let Some(error) = validate_value(field, value) {
            errors.push(error);
        }
    }

    let unknown_fields: Vec<String> = answers
        .keys()
        .filter(|key| form.field(key).is_none())
        .cloned()
        .collect();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

fn validate_value(field: &FieldSpec, value: &FieldValue) -> Option<ValidationError> {
    if let FieldKind::Select { .. } = &field.kind
        && let Some(text) = value.as_str()
        && !field.kind.has_option(text)
    {
        return Some(base_error(field, "invalid select option", "invalid_option"));
    }

    if let Some(constraint) = &field.constraint
        && let Some(text) = value.as_str()
    {
        return enforce_constraint(field, text, constraint);
    }

    None
}

fn enforce_constraint(
    field: &FieldSpec,
    text: &str,
    constraint: &Constraint,
) -> Option<ValidationError> {
    if let Some(pattern) = &constraint.pattern
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(text)
    {
        return Some(base_error(
            field,
            "value does not match pattern",
            "pattern_mismatch",
        ));
    }

    let length = text.chars().count();

    if let Some(min_len) = constraint.min_len
        && length < min_len
    {
        return Some(base_error(
            field,
            "string shorter than min length",
            "min_length",
        ));
    }

    if let Some(max_len) = constraint.max_len
        && length > max_len
    {
        return Some(base_error(
            field,
            "string longer than max length",
            "max_length",
        ));
    }

    None
}

fn base_error(field: &FieldSpec, message: &str, code: &str) -> ValidationError {
    ValidationError {
        field: Some(field.name.clone()),
        path: Some(format!("/{}", field.name)),
        message: message.into(),
        code: Some(code.into()),
    }
}
