use std::collections::BTreeSet;

use crate::answers::{AnswerMap, FormResponse};
use crate::spec::FieldSpec;
use crate::visibility::VisibleSet;

/// Visible fields whose step hint is unset or at most `step`.
pub fn reached_fields(visible: &VisibleSet, fields: &[FieldSpec], step: u32) -> BTreeSet<String> {
    fields
        .iter()
        .filter(|field| visible.contains(&field.name) && field.is_reached(step))
        .map(|field| field.name.clone())
        .collect()
}

/// Open once every visible field has been reached.
pub fn can_submit(visible: &VisibleSet, reached: &BTreeSet<String>) -> bool {
    !visible.is_empty() && reached.len() == visible.len()
}

/// Wraps the whole answer map, hidden fields included, for hand-off.
pub fn package(answers: &AnswerMap) -> FormResponse {
    FormResponse::new(answers.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn closed_until_reached_covers_visible() {
        let visible = set(&["a", "b", "c"]);
        assert!(!can_submit(&visible, &set(&["a"])));
        assert!(can_submit(&visible, &set(&["a", "b", "c"])));
    }

    #[test]
    fn closed_for_empty_form() {
        assert!(!can_submit(&set(&[]), &set(&[])));
    }
}
