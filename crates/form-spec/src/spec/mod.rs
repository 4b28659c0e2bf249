pub mod condition;
pub mod field;
pub mod form;

pub use condition::{ConditionRule, Trigger};
pub use field::{Constraint, FieldKind, FieldSpec, SelectOption};
pub use form::{FormPolicy, FormSpec, StepCounting, descriptor_schema};
