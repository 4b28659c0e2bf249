use thiserror::Error;

use crate::answers::ValidationResult;
use crate::lint::SpecIssue;

/// Errors raised while loading a form descriptor.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to parse form descriptor: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("form descriptor is invalid: {}", join_issues(.0))]
    Invalid(Vec<SpecIssue>),
}

fn join_issues(issues: &[SpecIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors raised by the reducer for a single event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),
    #[error("form has already been submitted")]
    AlreadySubmitted,
    #[error("form is not ready to submit: {reached} of {visible} visible fields reached")]
    NotReady { reached: usize, visible: usize },
    #[error("submission rejected: {0}")]
    Rejected(ValidationResult),
}
