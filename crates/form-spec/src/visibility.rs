use std::collections::BTreeSet;

use crate::answers::AnswerMap;
use crate::spec::{ConditionRule, FieldSpec};

pub type VisibleSet = BTreeSet<String>;

/// Fields that no rule reveals are visible from the start.
pub fn initial_visible(fields: &[FieldSpec], conditions: &[ConditionRule]) -> VisibleSet {
    fields
        .iter()
        .filter(|field| !conditions.iter().any(|rule| rule.reveals(&field.name)))
        .map(|field| field.name.clone())
        .collect()
}

/// Grow `previous` with every rule whose trigger currently holds.
///
/// Entries are never removed. The trigger field's own visibility is not
/// consulted, only its value. Names missing from `fields` are skipped.
pub fn resolve(
    answers: &AnswerMap,
    fields: &[FieldSpec],
    conditions: &[ConditionRule],
    previous: &VisibleSet,
) -> VisibleSet {
    let mut visible = previous.clone();
    for rule in conditions.iter().filter(|rule| rule.matches(answers)) {
        for target in &rule.show {
            if fields.iter().any(|field| &field.name == target) {
                visible.insert(target.clone());
            }
        }
    }
    visible
}

/// Renderer rule: visible, and the field's step hint has been reached.
pub fn is_rendered(field: &FieldSpec, visible: &VisibleSet, step: u32) -> bool {
    visible.contains(&field.name) && field.is_reached(step)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::{FieldKind, Trigger};

    fn text(name: &str) -> FieldSpec {
        FieldSpec {
            name: name.into(),
            kind: FieldKind::Text,
            label: name.to_uppercase(),
            required: false,
            placeholder: None,
            step: None,
            constraint: None,
        }
    }

    fn rule(field: &str, equals: &str, show: &[&str]) -> ConditionRule {
        ConditionRule {
            when: Trigger {
                field: field.into(),
                equals: equals.into(),
            },
            show: show.iter().map(|name| name.to_string()).collect(),
        }
    }

    #[test]
    fn show_targets_start_hidden() {
        let fields = vec![text("a"), text("b"), text("c")];
        let conditions = vec![rule("a", "yes", &["b"])];
        let visible = initial_visible(&fields, &conditions);
        assert_eq!(
            visible,
            VisibleSet::from(["a".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn resolve_is_idempotent_and_ignores_unknown_targets() {
        let fields = vec![text("a"), text("b")];
        let conditions = vec![rule("a", "yes", &["b", "ghost"])];
        let answers = AnswerMap::from([("a".to_string(), "yes".into())]);
        let start = initial_visible(&fields, &conditions);
        let once = resolve(&answers, &fields, &conditions, &start);
        let twice = resolve(&answers, &fields, &conditions, &once);
        assert_eq!(once, twice);
        assert!(once.contains("b"));
        assert!(!once.contains("ghost"));
    }

    #[test]
    fn hidden_trigger_still_fires() {
        let fields = vec![text("a"), text("b"), text("c")];
        let conditions = vec![rule("a", "yes", &["b"]), rule("b", "go", &["c"])];
        let answers = AnswerMap::from([("b".to_string(), "go".into())]);
        let start = initial_visible(&fields, &conditions);
        assert!(!start.contains("b"));
        let visible = resolve(&answers, &fields, &conditions, &start);
        assert!(visible.contains("c"));
        assert!(!visible.contains("b"));
    }
}
