use serde_json::json;

use form_spec::{
    ConditionalForm, FieldValue, FormEvent,
    render::{RenderStatus, build_render_payload, render_card, render_json_ui, render_text},
};

fn onboarding() -> ConditionalForm {
    ConditionalForm::from_json(include_str!("../tests/fixtures/onboarding_form.json"))
        .expect("valid form")
}

#[test]
fn render_text_lists_rendered_fields() {
    let form = onboarding();
    let payload = build_render_payload(&form, &form.start());

    assert_eq!(payload.status, RenderStatus::Ready);
    let text = render_text(&payload);
    assert!(text.contains("Form: Merchant onboarding"));
    assert!(text.contains("Business name (business_name) *"));
    assert!(text.contains("[ ] We track physical inventory"));
    assert!(!text.contains("warehouse_count"));
}

#[test]
fn render_json_ui_exposes_structure() {
    let form = onboarding();
    let state = form
        .reduce(
            &form.start(),
            FormEvent::Change {
                name: "tracks_inventory".into(),
                value: FieldValue::Bool(true),
            },
        )
        .expect("change")
        .state;
    let ui = render_json_ui(&build_render_payload(&form, &state));

    assert_eq!(ui["form_id"], "merchant-onboarding");
    assert_eq!(ui["step"], 1);
    assert_eq!(ui["progress"]["visible"], 6);
    let fields = ui["fields"].as_array().expect("fields array");
    let warehouse = fields
        .iter()
        .find(|field| field["name"] == "warehouse_count")
        .expect("warehouse field");
    assert_eq!(warehouse["rendered"], true);
    let menu = fields
        .iter()
        .find(|field| field["name"] == "menu_notes")
        .expect("menu field");
    assert_eq!(menu["visible"], false);
    assert_eq!(
        ui["schema"]["required"],
        json!(["business_name", "business_type", "warehouse_count"])
    );
}

#[test]
fn render_card_uses_inline_toggle_for_checkbox() {
    let form = onboarding();
    let card = render_card(&build_render_payload(&form, &form.start()));
    assert_eq!(card["version"], "1.3");

    let body = card["body"].as_array().expect("body");
    let container = body
        .iter()
        .find(|item| item["type"] == "Container")
        .expect("field container");
    let items = container["items"].as_array().expect("items");
    let toggle = items
        .iter()
        .find(|item| item["type"] == "Input.Toggle")
        .expect("toggle");
    assert_eq!(toggle["title"], "We track physical inventory");
    assert!(
        items
            .iter()
            .any(|item| item["type"] == "Input.ChoiceSet" && item["id"] == "business_type")
    );
    assert!(
        !items
            .iter()
            .any(|item| item["text"] == "We track physical inventory")
    );

    let actions = card["actions"].as_array().expect("actions");
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0]["data"]["form"]["event"], "submit");
}

#[test]
fn render_card_offers_back_after_a_trigger() {
    let form = ConditionalForm::from_json(include_str!("../tests/fixtures/staged_form.json"))
        .expect("valid form");
    let state = form
        .reduce(
            &form.start(),
            FormEvent::Change {
                name: "a".into(),
                value: "yes".into(),
            },
        )
        .expect("change")
        .state;
    let payload = build_render_payload(&form, &state);
    assert_eq!(payload.status, RenderStatus::NeedInput);

    let card = render_card(&payload);
    let events = card["actions"]
        .as_array()
        .expect("actions")
        .iter()
        .map(|action| action["data"]["form"]["event"].clone())
        .collect::<Vec<_>>();
    assert_eq!(events, vec![json!("back"), json!("change")]);
}
