use std::collections::BTreeSet;

use crate::answers::FieldValue;
use crate::spec::{ConditionRule, StepCounting};

/// Derives step movement from field changes and back navigation.
#[derive(Debug, Clone, Copy)]
pub struct StepTracker<'a> {
    conditions: &'a [ConditionRule],
    counting: StepCounting,
}

impl<'a> StepTracker<'a> {
    pub fn new(conditions: &'a [ConditionRule], counting: StepCounting) -> Self {
        Self {
            conditions,
            counting,
        }
    }

    /// Returns the step delta (0 or 1) for `name` changing to `value`.
    ///
    /// Only one matching rule is consumed per change. Its index is added to
    /// `fired`; under [`StepCounting::OncePerRule`] rules already in `fired`
    /// are skipped.
    pub fn on_field_change(
        &self,
        name: &str,
        value: &FieldValue,
        fired: &mut BTreeSet<usize>,
    ) -> u32 {
        let matched = self
            .conditions
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.is_triggered_by(name, value))
            .map(|(index, _)| index)
            .find(|index| match self.counting {
                StepCounting::EveryTrigger => true,
                StepCounting::OncePerRule => !fired.contains(index),
            });

        match matched {
            Some(index) => {
                fired.insert(index);
                1
            }
            None => 0,
        }
    }

    pub fn on_back(step: u32) -> u32 {
        step.saturating_sub(1)
    }
}
