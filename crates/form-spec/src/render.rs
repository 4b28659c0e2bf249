use serde_json::{Map, Value, json};

use crate::{
    answers::FieldValue,
    answers_schema,
    engine::{ConditionalForm, FormState},
    spec::{FieldKind, SelectOption},
    visibility,
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Some visible field is still behind the current step.
    NeedInput,
    /// Every visible field is reached; submission is open.
    Ready,
    /// The form was submitted and accepts no more events.
    Submitted,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::NeedInput => "need_input",
            RenderStatus::Ready => "ready",
            RenderStatus::Submitted => "submitted",
        }
    }
}

/// Reached versus visible field counts.
#[derive(Debug, Clone)]
pub struct RenderProgress {
    pub reached: usize,
    pub visible: usize,
}

/// Describes a single field for render outputs.
#[derive(Debug, Clone)]
pub struct RenderField {
    pub name: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub placeholder: Option<String>,
    pub step: Option<u32>,
    pub visible: bool,
    /// Visible and reached by the current step.
    pub rendered: bool,
    pub value: FieldValue,
}

/// Collected payload used by the text, JSON and card renderers.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub form_id: Option<String>,
    pub form_title: String,
    pub help: Option<String>,
    pub status: RenderStatus,
    pub step: u32,
    pub can_submit: bool,
    pub can_go_back: bool,
    pub progress: RenderProgress,
    pub fields: Vec<RenderField>,
    pub schema: Value,
}

impl RenderPayload {
    pub fn rendered(&self) -> impl Iterator<Item = &RenderField> {
        self.fields.iter().filter(|field| field.rendered)
    }
}

/// Build the renderer payload from the form and its current state.
pub fn build_render_payload(form: &ConditionalForm, state: &FormState) -> RenderPayload {
    let reached = form.reached_fields(state);
    let can_submit = form.can_submit(state);

    let fields = form
        .fields()
        .iter()
        .map(|field| RenderField {
            name: field.name.clone(),
            label: field.label.clone(),
            kind: field.kind.clone(),
            required: field.required,
            placeholder: field.placeholder.clone(),
            step: field.step,
            visible: state.is_visible(&field.name),
            rendered: visibility::is_rendered(field, state.visible(), state.step()),
            value: state
                .value(&field.name)
                .cloned()
                .unwrap_or_else(|| field.kind.default_value()),
        })
        .collect::<Vec<_>>();

    let status = if state.is_submitted() {
        RenderStatus::Submitted
    } else if can_submit {
        RenderStatus::Ready
    } else {
        RenderStatus::NeedInput
    };

    RenderPayload {
        form_id: form.spec().id.clone(),
        form_title: form.spec().title.clone(),
        help: form.spec().description.clone(),
        status,
        step: state.step(),
        can_submit,
        can_go_back: !state.is_submitted() && state.step() > 0,
        progress: RenderProgress {
            reached: reached.len(),
            visible: state.visible().len(),
        },
        fields,
        schema: answers_schema::generate(form.spec(), state.visible()),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let fields = payload
        .fields
        .iter()
        .map(|field| {
            let mut map = Map::new();
            map.insert("name".into(), Value::String(field.name.clone()));
            map.insert("label".into(), Value::String(field.label.clone()));
            map.insert("type".into(), Value::String(field.kind.label().into()));
            map.insert("required".into(), Value::Bool(field.required));
            if let Some(placeholder) = &field.placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
            if let Some(step) = field.step {
                map.insert("step".into(), json!(step));
            }
            let options = field.kind.options();
            if !options.is_empty() {
                map.insert("options".into(), options_json(options));
            }
            map.insert("value".into(), field.value.to_json());
            map.insert("visible".into(), Value::Bool(field.visible));
            map.insert("rendered".into(), Value::Bool(field.rendered));
            Value::Object(map)
        })
        .collect::<Vec<_>>();

    json!({
        "form_id": payload.form_id,
        "form_title": payload.form_title,
        "help": payload.help,
        "status": payload.status.as_str(),
        "step": payload.step,
        "can_submit": payload.can_submit,
        "can_go_back": payload.can_go_back,
        "progress": {
            "reached": payload.progress.reached,
            "visible": payload.progress.visible,
        },
        "fields": fields,
        "schema": payload.schema,
    })
}

/// Render the payload as human-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    lines.push(format!("Form: {}", payload.form_title));
    lines.push(format!(
        "Status: {} (step {}, {}/{} fields reached)",
        payload.status.as_str(),
        payload.step,
        payload.progress.reached,
        payload.progress.visible
    ));
    if let Some(help) = &payload.help {
        lines.push(format!("Help: {}", help));
    }

    lines.push("Fields:".to_string());
    for field in payload.rendered() {
        let mut entry = match field.kind {
            FieldKind::Checkbox => format!(" [{}] {}", checkbox_mark(&field.value), field.label),
            _ => format!(" - {} ({})", field.label, field.name),
        };
        if field.required {
            entry.push_str(" *");
        }
        if !matches!(field.kind, FieldKind::Checkbox) && !field.value.is_empty() {
            entry.push_str(&format!(" = {}", field.value));
        }
        lines.push(entry);
    }

    match payload.status {
        RenderStatus::Ready => lines.push("Ready to submit.".to_string()),
        RenderStatus::Submitted => lines.push("Form submitted.".to_string()),
        RenderStatus::NeedInput => {}
    }

    lines.join("\n")
}

/// Render the payload as an Adaptive Card v1.3 transport.
pub fn render_card(payload: &RenderPayload) -> Value {
    let mut body = Vec::new();

    body.push(json!({
        "type": "TextBlock",
        "text": payload.form_title,
        "weight": "Bolder",
        "size": "Large",
        "wrap": true,
    }));

    if let Some(help) = &payload.help {
        body.push(json!({
            "type": "TextBlock",
            "text": help,
            "wrap": true,
        }));
    }

    if payload.status == RenderStatus::Submitted {
        body.push(json!({
            "type": "TextBlock",
            "text": "Form submitted.",
            "wrap": true,
        }));
        return card(body, Vec::new());
    }

    body.push(json!({
        "type": "FactSet",
        "facts": [
            { "title": "Step", "value": payload.step.to_string() },
            {
                "title": "Reached",
                "value": format!("{}/{}", payload.progress.reached, payload.progress.visible)
            }
        ]
    }));

    let mut items = Vec::new();
    for field in payload.rendered() {
        if !matches!(field.kind, FieldKind::Checkbox) {
            let mut label = field.label.clone();
            if field.required {
                label.push_str(" *");
            }
            items.push(json!({
                "type": "TextBlock",
                "text": label,
                "weight": "Bolder",
                "wrap": true,
            }));
        }
        items.push(field_input(field));
    }
    body.push(json!({
        "type": "Container",
        "items": items,
    }));

    let mut actions = Vec::new();
    if payload.can_go_back {
        actions.push(action("Back", "back", &payload.form_id));
    }
    if payload.can_submit {
        actions.push(action("Submit", "submit", &payload.form_id));
    } else {
        actions.push(action("Update", "change", &payload.form_id));
    }

    card(body, actions)
}

fn card(body: Vec<Value>, actions: Vec<Value>) -> Value {
    json!({
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "type": "AdaptiveCard",
        "version": "1.3",
        "body": body,
        "actions": actions,
    })
}

fn action(title: &str, event: &str, form_id: &Option<String>) -> Value {
    json!({
        "type": "Action.Submit",
        "title": title,
        "data": {
            "form": {
                "formId": form_id,
                "event": event,
            }
        }
    })
}

fn field_input(field: &RenderField) -> Value {
    let mut map = Map::new();
    map.insert("id".into(), Value::String(field.name.clone()));
    map.insert("isRequired".into(), Value::Bool(field.required));
    match &field.kind {
        FieldKind::Text | FieldKind::Textarea => {
            map.insert("type".into(), Value::String("Input.Text".into()));
            if matches!(field.kind, FieldKind::Textarea) {
                map.insert("isMultiline".into(), Value::Bool(true));
            }
            if let Some(placeholder) = &field.placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
            map.insert("value".into(), Value::String(field.value.to_string()));
        }
        FieldKind::Select { options } => {
            map.insert("type".into(), Value::String("Input.ChoiceSet".into()));
            map.insert("style".into(), Value::String("compact".into()));
            let choices = options
                .iter()
                .map(|option| {
                    json!({
                        "title": option.label,
                        "value": option.value,
                    })
                })
                .collect::<Vec<_>>();
            map.insert("choices".into(), Value::Array(choices));
            if let Some(placeholder) = &field.placeholder {
                map.insert("placeholder".into(), Value::String(placeholder.clone()));
            }
            map.insert("value".into(), Value::String(field.value.to_string()));
        }
        FieldKind::Checkbox => {
            map.insert("type".into(), Value::String("Input.Toggle".into()));
            map.insert("title".into(), Value::String(field.label.clone()));
            map.insert("valueOn".into(), Value::String("true".into()));
            map.insert("valueOff".into(), Value::String("false".into()));
            map.insert(
                "value".into(),
                Value::String(checkbox_value(&field.value).into()),
            );
        }
    }
    Value::Object(map)
}

fn options_json(options: &[SelectOption]) -> Value {
    Value::Array(
        options
            .iter()
            .map(|option| json!({ "value": option.value, "label": option.label }))
            .collect(),
    )
}

fn checkbox_value(value: &FieldValue) -> &'static str {
    if value.as_bool() == Some(true) {
        "true"
    } else {
        "false"
    }
}

fn checkbox_mark(value: &FieldValue) -> &'static str {
    if value.as_bool() == Some(true) {
        "x"
    } else {
        " "
    }
}
