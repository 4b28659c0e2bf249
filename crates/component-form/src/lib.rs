use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::debug;

use form_spec::{
    AnswerMap, ConditionalForm, FormError, FormEvent, FormSpec, FormState, RenderPayload,
    SpecError, ValidationResult, answers_schema, build_render_payload, lint as lint_spec,
    render_card as form_render_card, render_json_ui as form_render_json_ui,
    render_text as form_render_text,
};

const DEFAULT_SPEC: &str = include_str!("../../form-spec/tests/fixtures/onboarding_form.json");

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config: {0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("failed to parse form state: {0}")]
    StateParse(#[source] serde_json::Error),
    #[error("failed to parse event: {0}")]
    EventParse(#[source] serde_json::Error),
    #[error("failed to parse answers: {0}")]
    AnswersParse(#[source] serde_json::Error),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
}

#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    form_spec_json: Option<String>,
}

fn load_spec(config_json: &str) -> Result<FormSpec, ComponentError> {
    let config = if config_json.trim().is_empty() {
        ComponentConfig::default()
    } else {
        serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)?
    };

    let spec_json = config.form_spec_json.as_deref().unwrap_or(DEFAULT_SPEC);

    serde_json::from_str(spec_json).map_err(ComponentError::ConfigParse)
}

fn load_form(config_json: &str) -> Result<ConditionalForm, ComponentError> {
    Ok(ConditionalForm::new(load_spec(config_json)?)?)
}

fn is_blank_object(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || serde_json::from_str::<Map<String, Value>>(trimmed)
            .map(|map| map.is_empty())
            .unwrap_or(false)
}

/// An empty string or `{}` stands for a fresh form state.
fn parse_state(form: &ConditionalForm, state_json: &str) -> Result<FormState, ComponentError> {
    if is_blank_object(state_json) {
        return Ok(form.start());
    }
    serde_json::from_str(state_json).map_err(ComponentError::StateParse)
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn describe(config_json: &str) -> String {
    respond(load_spec(config_json).and_then(|spec| encode(&spec)))
}

/// Lists descriptor issues without rejecting the descriptor.
pub fn lint(config_json: &str) -> String {
    respond(load_spec(config_json).map(|spec| {
        let issues = lint_spec(&spec)
            .iter()
            .map(|issue| {
                json!({
                    "code": issue.code(),
                    "message": issue.to_string(),
                    "reference": issue.is_reference(),
                })
            })
            .collect::<Vec<_>>();
        let valid = ConditionalForm::new(spec).is_ok();
        json!({ "valid": valid, "issues": issues })
    }))
}

/// Fresh state, prefilled from `answers_json` when it holds any answers.
pub fn start(config_json: &str, answers_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let state = if is_blank_object(answers_json) {
            form.start()
        } else {
            let answers: AnswerMap =
                serde_json::from_str(answers_json).map_err(ComponentError::AnswersParse)?;
            form.start_with(&answers)?
        };
        encode(&state)
    }))
}

fn rejection_response(
    state: &FormState,
    validation: &ValidationResult,
) -> Result<Value, ComponentError> {
    Ok(json!({
        "status": "error",
        "state": encode(state)?,
        "validation": encode(validation)?,
    }))
}

fn apply_event(
    form: &ConditionalForm,
    state: &FormState,
    event: FormEvent,
) -> Result<Value, ComponentError> {
    match form.reduce(state, event) {
        Ok(transition) => {
            let payload = build_render_payload(form, &transition.state);
            Ok(json!({
                "status": payload.status.as_str(),
                "step": payload.step,
                "can_submit": payload.can_submit,
                "state": encode(&transition.state)?,
                "response": transition.response.as_ref().map(encode).transpose()?,
            }))
        }
        Err(FormError::Rejected(validation)) => rejection_response(state, &validation),
        Err(err) => Err(err.into()),
    }
}

/// Applies one `{"type": "change" | "back" | "submit", ...}` event.
pub fn dispatch(config_json: &str, state_json: &str, event_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let state = parse_state(&form, state_json)?;
        let event: FormEvent =
            serde_json::from_str(event_json).map_err(ComponentError::EventParse)?;
        debug!(?event, "dispatching form event");
        apply_event(&form, &state, event)
    }))
}

pub fn submit(config_json: &str, state_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let state = parse_state(&form, state_json)?;
        apply_event(&form, &state, FormEvent::Submit)
    }))
}

pub fn get_answer_schema(config_json: &str, state_json: &str) -> String {
    respond(load_form(config_json).and_then(|form| {
        let state = parse_state(&form, state_json)?;
        Ok(answers_schema(form.spec(), state.visible()))
    }))
}

fn render_payload(config_json: &str, state_json: &str) -> Result<RenderPayload, ComponentError> {
    let form = load_form(config_json)?;
    let state = parse_state(&form, state_json)?;
    Ok(build_render_payload(&form, &state))
}

pub fn render_text(config_json: &str, state_json: &str) -> String {
    respond_string(
        render_payload(config_json, state_json).map(|payload| form_render_text(&payload)),
    )
}

pub fn render_json_ui(config_json: &str, state_json: &str) -> String {
    respond(render_payload(config_json, state_json).map(|payload| form_render_json_ui(&payload)))
}

pub fn render_card(config_json: &str, state_json: &str) -> String {
    respond(render_payload(config_json, state_json).map(|payload| form_render_card(&payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(raw: &str) -> Value {
        serde_json::from_str(raw).expect("json")
    }

    fn staged_config() -> String {
        let spec = json!({
            "id": "staged",
            "title": "Staged",
            "fields": [
                { "name": "a", "type": "text", "label": "A" },
                { "name": "b", "type": "text", "label": "B", "step": 1 }
            ],
            "conditions": [
                { "if": { "field": "a", "equals": "yes" }, "show": ["b"] }
            ]
        });
        json!({ "form_spec_json": spec.to_string() }).to_string()
    }

    #[test]
    fn describe_returns_default_spec() {
        let spec = parse(&describe(""));
        assert_eq!(spec["id"], "merchant-onboarding");
        assert_eq!(spec["fields"][2]["type"], "checkbox");
    }

    #[test]
    fn lint_reports_issues_for_broken_spec() {
        let spec = json!({
            "title": "Broken",
            "fields": [{ "name": "a", "type": "text", "label": "A" }],
            "conditions": [{ "if": { "field": "a", "equals": "x" }, "show": ["ghost"] }]
        });
        let config = json!({ "form_spec_json": spec.to_string() }).to_string();
        let report = parse(&lint(&config));
        assert_eq!(report["valid"], false);
        assert_eq!(report["issues"][0]["code"], "unknown_show_target");
        assert_eq!(report["issues"][0]["reference"], true);
    }

    #[test]
    fn start_prefills_answers() {
        let state = parse(&start(&staged_config(), r#"{"a":"yes"}"#));
        assert_eq!(state["step"], 1);
        assert_eq!(state["answers"]["a"], "yes");
        assert!(
            state["visible"]
                .as_array()
                .expect("visible")
                .contains(&json!("b"))
        );
    }

    #[test]
    fn dispatch_change_then_submit() {
        let config = staged_config();
        let changed = parse(&dispatch(
            &config,
            "{}",
            r#"{"type":"change","name":"a","value":"yes"}"#,
        ));
        assert_eq!(changed["status"], "ready");
        assert_eq!(changed["step"], 1);
        assert!(changed["response"].is_null());

        let submitted = parse(&submit(&config, &changed["state"].to_string()));
        assert_eq!(submitted["status"], "submitted");
        assert_eq!(submitted["response"]["type"], "conditional_form_response");
        assert_eq!(submitted["response"]["form_data"]["a"], "yes");
        assert_eq!(submitted["state"]["submitted"], true);

        let again = parse(&submit(&config, &submitted["state"].to_string()));
        assert_eq!(again["error"], "form has already been submitted");
    }

    #[test]
    fn dispatch_back_lowers_step() {
        let config = staged_config();
        let state = start(&config, r#"{"a":"yes"}"#);
        let back = parse(&dispatch(&config, &state, r#"{"type":"back"}"#));
        assert_eq!(back["step"], 0);
        assert_eq!(back["status"], "need_input");
    }

    #[test]
    fn submit_reports_missing_required() {
        let response = parse(&submit("", "{}"));
        assert_eq!(response["status"], "error");
        assert_eq!(
            response["validation"]["missing_required"],
            json!(["business_name", "business_type"])
        );
        assert_eq!(response["state"]["submitted"], false);
    }

    #[test]
    fn submit_rejects_mistyped_checkbox_value() {
        let changed = parse(&dispatch(
            "",
            "{}",
            r#"{"type":"change","name":"tracks_inventory","value":"true"}"#,
        ));
        assert_eq!(changed["step"], 0);
        assert_eq!(changed["state"]["answers"]["tracks_inventory"], "true");

        let response = parse(&submit("", &changed["state"].to_string()));
        assert_eq!(response["status"], "error");
        assert_eq!(response["validation"]["valid"], false);
        assert_eq!(
            response["validation"]["errors"][0]["field"],
            "tracks_inventory"
        );
        assert_eq!(
            response["validation"]["errors"][0]["code"],
            "type_mismatch"
        );
        assert_eq!(response["state"]["submitted"], false);
    }

    #[test]
    fn submit_before_gate_opens_is_an_error() {
        let config = staged_config();
        let state = start(&config, r#"{"a":"yes"}"#);
        let back = parse(&dispatch(&config, &state, r#"{"type":"back"}"#));
        let response = parse(&submit(&config, &back["state"].to_string()));
        assert!(
            response["error"]
                .as_str()
                .expect("error")
                .contains("1 of 2 visible fields reached")
        );
    }

    #[test]
    fn unknown_field_event_is_an_error() {
        let response = parse(&dispatch(
            "",
            "",
            r#"{"type":"change","name":"nope","value":"x"}"#,
        ));
        assert_eq!(response["error"], "unknown field 'nope'");
    }

    #[test]
    fn schema_follows_visible_required_fields() {
        let schema = parse(&get_answer_schema("", ""));
        assert_eq!(schema["required"], json!(["business_name", "business_type"]));
        assert_eq!(schema["properties"]["tracks_inventory"]["type"], "boolean");
    }

    #[test]
    fn renderers_share_the_payload() {
        let text = render_text("", "{}");
        assert!(text.contains("Form: Merchant onboarding"));
        let ui = parse(&render_json_ui("", "{}"));
        assert_eq!(ui["status"], "ready");
        let card = parse(&render_card("", "{}"));
        assert_eq!(card["type"], "AdaptiveCard");
    }
}
