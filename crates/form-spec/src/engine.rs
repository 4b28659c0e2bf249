use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::answers::{AnswerMap, FieldValue, FormResponse};
use crate::error::{FormError, SpecError};
use crate::gate;
use crate::lint::{SpecIssue, lint};
use crate::spec::{ConditionRule, FieldSpec, FormPolicy, FormSpec};
use crate::step::StepTracker;
use crate::validate::validate;
use crate::visibility::{self, VisibleSet};

/// A validated descriptor ready to drive form states.
#[derive(Debug, Clone)]
pub struct ConditionalForm {
    spec: FormSpec,
    policy: FormPolicy,
    index: BTreeMap<String, usize>,
}

/// Discrete input event applied through [`ConditionalForm::reduce`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormEvent {
    Change { name: String, value: FieldValue },
    Back,
    Submit,
}

/// Everything one form instance owns between events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    answers: AnswerMap,
    visible: VisibleSet,
    step: u32,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    fired: BTreeSet<usize>,
    #[serde(default)]
    submitted: bool,
}

impl FormState {
    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.answers.get(name)
    }

    pub fn visible(&self) -> &VisibleSet {
        &self.visible
    }

    pub fn is_visible(&self, name: &str) -> bool {
        self.visible.contains(name)
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    /// Indices of rules that have advanced the step so far.
    pub fn fired_rules(&self) -> &BTreeSet<usize> {
        &self.fired
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }
}

/// Result of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: FormState,
    /// Set only by a successful submit.
    pub response: Option<FormResponse>,
}

impl Transition {
    fn idle(state: FormState) -> Self {
        Self {
            state,
            response: None,
        }
    }
}

impl ConditionalForm {
    /// Validates `spec` under the policy it carries (or the default one).
    pub fn new(spec: FormSpec) -> Result<Self, SpecError> {
        let policy = spec.policy.unwrap_or_default();
        Self::with_policy(spec, policy)
    }

    pub fn with_policy(spec: FormSpec, policy: FormPolicy) -> Result<Self, SpecError> {
        let (references, structural): (Vec<SpecIssue>, Vec<SpecIssue>) =
            lint(&spec).into_iter().partition(SpecIssue::is_reference);

        let mut rejected = structural;
        if policy.strict_references {
            rejected.extend(references);
        } else {
            for issue in &references {
                warn!(code = issue.code(), "ignoring condition reference: {}", issue);
            }
        }
        if !rejected.is_empty() {
            return Err(SpecError::Invalid(rejected));
        }

        let index = spec
            .fields
            .iter()
            .enumerate()
            .map(|(position, field)| (field.name.clone(), position))
            .collect();

        Ok(Self {
            spec,
            policy,
            index,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SpecError> {
        let spec: FormSpec = serde_json::from_str(json)?;
        Self::new(spec)
    }

    pub fn spec(&self) -> &FormSpec {
        &self.spec
    }

    pub fn policy(&self) -> FormPolicy {
        self.policy
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.spec.fields
    }

    pub fn conditions(&self) -> &[ConditionRule] {
        &self.spec.conditions
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.index.get(name).map(|position| &self.spec.fields[*position])
    }

    /// Fresh state: type defaults, unconditional fields visible, step 0.
    pub fn start(&self) -> FormState {
        let answers = self
            .fields()
            .iter()
            .map(|field| (field.name.clone(), field.kind.default_value()))
            .collect();
        FormState {
            answers,
            visible: visibility::initial_visible(self.fields(), self.conditions()),
            step: 0,
            fired: BTreeSet::new(),
            submitted: false,
        }
    }

    /// Starts a state and replays `answers` as change events in registry order.
    pub fn start_with(&self, answers: &AnswerMap) -> Result<FormState, FormError> {
        if let Some(unknown) = answers.keys().find(|name| !self.index.contains_key(*name)) {
            return Err(FormError::UnknownField(unknown.clone()));
        }

        let mut state = self.start();
        for field in self.fields() {
            if let Some(value) = answers.get(&field.name) {
                let event = FormEvent::Change {
                    name: field.name.clone(),
                    value: value.clone(),
                };
                state = self.reduce(&state, event)?.state;
            }
        }
        Ok(state)
    }

    /// Applies `event` to `state`, leaving `state` untouched on error.
    pub fn reduce(&self, state: &FormState, event: FormEvent) -> Result<Transition, FormError> {
        if state.submitted {
            return Err(FormError::AlreadySubmitted);
        }

        let mut next = state.clone();
        match event {
            FormEvent::Change { name, value } => {
                if !self.index.contains_key(&name) {
                    return Err(FormError::UnknownField(name));
                }
                if next.answers.get(&name) == Some(&value) {
                    return Ok(Transition::idle(next));
                }

                next.answers.insert(name.clone(), value.clone());
                next.visible = visibility::resolve(
                    &next.answers,
                    self.fields(),
                    self.conditions(),
                    &next.visible,
                );
                let tracker = StepTracker::new(self.conditions(), self.policy.step_counting);
                next.step += tracker.on_field_change(&name, &value, &mut next.fired);

                debug!(
                    field = %name,
                    step = next.step,
                    visible = next.visible.len(),
                    "field changed"
                );
                Ok(Transition::idle(next))
            }
            FormEvent::Back => {
                next.step = StepTracker::on_back(next.step);
                debug!(step = next.step, "stepped back");
                Ok(Transition::idle(next))
            }
            FormEvent::Submit => {
                let response = self.submit(&next)?;
                next.submitted = true;
                Ok(Transition {
                    state: next,
                    response: Some(response),
                })
            }
        }
    }

    pub fn reached_fields(&self, state: &FormState) -> BTreeSet<String> {
        gate::reached_fields(&state.visible, self.fields(), state.step)
    }

    pub fn can_submit(&self, state: &FormState) -> bool {
        !state.submitted && gate::can_submit(&state.visible, &self.reached_fields(state))
    }

    /// Fields the renderer shows for `state`, in registry order.
    pub fn rendered_fields(&self, state: &FormState) -> Vec<&FieldSpec> {
        self.fields()
            .iter()
            .filter(|field| visibility::is_rendered(field, &state.visible, state.step))
            .collect()
    }

    fn submit(&self, state: &FormState) -> Result<FormResponse, FormError> {
        let reached = self.reached_fields(state);
        if !gate::can_submit(&state.visible, &reached) {
            return Err(FormError::NotReady {
                reached: reached.len(),
                visible: state.visible.len(),
            });
        }

        if self.policy.validate_on_submit {
            let result = validate(self, state);
            if !result.valid {
                debug!(%result, "submission rejected");
                return Err(FormError::Rejected(result));
            }
        }

        info!(
            form = self.spec.id.as_deref().unwrap_or(&self.spec.title),
            fields = state.answers.len(),
            "form submitted"
        );
        Ok(gate::package(&state.answers))
    }
}

/// Owns one form state and reports each successful submission to
/// `on_response`.
pub struct FormSession<'a, F>
where
    F: FnMut(&FormResponse),
{
    form: &'a ConditionalForm,
    state: FormState,
    on_response: F,
}

impl<'a, F> FormSession<'a, F>
where
    F: FnMut(&FormResponse),
{
    pub fn new(form: &'a ConditionalForm, on_response: F) -> Self {
        Self {
            form,
            state: form.start(),
            on_response,
        }
    }

    pub fn with_state(form: &'a ConditionalForm, state: FormState, on_response: F) -> Self {
        Self {
            form,
            state,
            on_response,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn form(&self) -> &ConditionalForm {
        self.form
    }

    pub fn dispatch(&mut self, event: FormEvent) -> Result<(), FormError> {
        let transition = self.form.reduce(&self.state, event)?;
        self.state = transition.state;
        if let Some(response) = &transition.response {
            (self.on_response)(response);
        }
        Ok(())
    }

    pub fn change(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<(), FormError> {
        self.dispatch(FormEvent::Change {
            name: name.to_string(),
            value: value.into(),
        })
    }

    pub fn back(&mut self) -> Result<(), FormError> {
        self.dispatch(FormEvent::Back)
    }

    pub fn submit(&mut self) -> Result<(), FormError> {
        self.dispatch(FormEvent::Submit)
    }

    pub fn into_state(self) -> FormState {
        self.state
    }
}
