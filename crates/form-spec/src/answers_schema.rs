use serde_json::{Map, Value, json};

use crate::spec::{FieldKind, FieldSpec, FormSpec};
use crate::visibility::VisibleSet;

/// JSON schema describing the `form_data` a submission would carry.
///
/// Every field is a property; only visible required fields are listed
/// under `required`.
pub fn generate(spec: &FormSpec, visible: &VisibleSet) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in &spec.fields {
        properties.insert(field.name.clone(), field_schema(field));
        if field.required && visible.contains(&field.name) {
            required.push(Value::String(field.name.clone()));
        }
    }

    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": spec.title,
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn field_schema(field: &FieldSpec) -> Value {
    let mut schema = Map::new();
    schema.insert("title".into(), Value::String(field.label.clone()));
    match &field.kind {
        FieldKind::Checkbox => {
            schema.insert("type".into(), Value::String("boolean".into()));
        }
        FieldKind::Select { options } => {
            schema.insert("type".into(), Value::String("string".into()));
            let mut values = options
                .iter()
                .map(|option| Value::String(option.value.clone()))
                .collect::<Vec<_>>();
            values.push(Value::String(String::new()));
            schema.insert("enum".into(), Value::Array(values));
        }
        FieldKind::Text | FieldKind::Textarea => {
            schema.insert("type".into(), Value::String("string".into()));
            if let Some(constraint) = &field.constraint {
                if let Some(pattern) = &constraint.pattern {
                    schema.insert("pattern".into(), Value::String(pattern.clone()));
                }
                if let Some(min_len) = constraint.min_len {
                    schema.insert("minLength".into(), json!(min_len));
                }
                if let Some(max_len) = constraint.max_len {
                    schema.insert("maxLength".into(), json!(max_len));
                }
            }
        }
    }
    Value::Object(schema)
}
