#![allow(missing_docs)]

pub mod answers;
pub mod answers_schema;
pub mod engine;
pub mod error;
pub mod gate;
pub mod lint;
pub mod render;
pub mod spec;
pub mod step;
pub mod validate;
pub mod visibility;

pub use answers::{
    AnswerMap, FieldValue, FormResponse, ResponseKind, ValidationError, ValidationResult,
};
pub use answers_schema::generate as answers_schema;
pub use engine::{ConditionalForm, FormEvent, FormSession, FormState, Transition};
pub use error::{FormError, SpecError};
pub use lint::{SpecIssue, lint};
pub use render::{
    RenderField, RenderPayload, RenderProgress, RenderStatus, build_render_payload, render_card,
    render_json_ui, render_text,
};
pub use spec::{
    ConditionRule, Constraint, FieldKind, FieldSpec, FormPolicy, FormSpec, SelectOption,
    StepCounting, Trigger, descriptor_schema,
};
pub use step::StepTracker;
pub use validate::validate;
pub use visibility::{VisibleSet, initial_visible, is_rendered, resolve};
