use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use serde_json::{Value, json};

const ONBOARDING: &str = include_str!("../../form-spec/tests/fixtures/onboarding_form.json");

fn condform() -> Command {
    let mut cmd = Command::cargo_bin("condform").expect("binary");
    cmd.env_remove("CONDFORM_LOG");
    cmd
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_onboarding(dir: &TempDir) -> assert_fs::fixture::ChildPath {
    let spec = dir.child("onboarding.json");
    spec.write_str(ONBOARDING).expect("write spec");
    spec
}

#[test]
fn lint_rejects_unknown_reference_unless_lenient() {
    let dir = TempDir::new().expect("tempdir");
    let spec = dir.child("broken.json");
    spec.write_str(
        &json!({
            "title": "Broken",
            "fields": [{ "name": "a", "type": "text", "label": "A" }],
            "conditions": [{ "if": { "field": "a", "equals": "x" }, "show": ["ghost"] }]
        })
        .to_string(),
    )
    .expect("write spec");

    let output = condform()
        .args(["lint", "--spec"])
        .arg(spec.path())
        .output()
        .expect("run");
    assert!(!output.status.success());
    assert!(stdout_of(&output).contains("[unknown_show_target]"));

    let output = condform()
        .args(["lint", "--lenient", "--spec"])
        .arg(spec.path())
        .output()
        .expect("run");
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Descriptor is valid."));
}

#[test]
fn validate_reports_missing_required() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_onboarding(&dir);
    let answers = dir.child("answers.json");
    answers
        .write_str(r#"{"business_name": "Acme"}"#)
        .expect("write answers");

    let output = condform()
        .args(["validate", "--spec"])
        .arg(spec.path())
        .arg("--answers")
        .arg(answers.path())
        .output()
        .expect("run");
    assert!(!output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Validation result: invalid"));
    assert!(stdout.contains("Missing required answers: business_type"));
}

#[test]
fn validate_accepts_complete_answers() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_onboarding(&dir);
    let answers = dir.child("answers.json");
    answers
        .write_str(
            &json!({
                "business_name": "Acme",
                "business_type": "retail",
                "tracks_inventory": true,
                "warehouse_count": "2"
            })
            .to_string(),
        )
        .expect("write answers");

    let output = condform()
        .args(["validate", "--spec"])
        .arg(spec.path())
        .arg("--answers")
        .arg(answers.path())
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Step 1: 6/6 visible fields reached"));
    assert!(stdout.contains("Validation result: valid"));
}

#[test]
fn render_json_prints_payload() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_onboarding(&dir);

    let output = condform()
        .args(["render", "--format", "json", "--spec"])
        .arg(spec.path())
        .output()
        .expect("run");
    assert!(output.status.success());
    let ui: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(ui["form_id"], "merchant-onboarding");
    assert_eq!(ui["progress"]["visible"], 4);
}

#[test]
fn fill_submits_prefilled_form() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_onboarding(&dir);
    let answers = dir.child("answers.json");
    answers
        .write_str(r#"{"business_name": "Acme", "business_type": "retail"}"#)
        .expect("write answers");

    let output = condform()
        .args(["fill", "--answers-json", "--spec"])
        .arg(spec.path())
        .arg("--answers")
        .arg(answers.path())
        .write_stdin("no\n\n")
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Done"));
    assert!(stdout.contains("\"type\": \"conditional_form_response\""));
    assert!(stdout.contains("\"business_name\": \"Acme\""));
}

#[test]
fn fill_reveals_conditional_fields() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_onboarding(&dir);
    let answers = dir.child("answers.json");
    answers
        .write_str(r#"{"business_name": "Acme", "business_type": "retail"}"#)
        .expect("write answers");

    let output = condform()
        .args(["fill", "--answers-json", "--spec"])
        .arg(spec.path())
        .arg("--answers")
        .arg(answers.path())
        .write_stdin("yes\n3\nACME\n\n")
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Number of warehouses *"));
    assert!(stdout.contains("\"warehouse_count\": \"3\""));
    assert!(stdout.contains("\"tracks_inventory\": true"));
}

#[test]
fn fill_fails_when_input_closes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let spec = dir.path().join("onboarding.json");
    std::fs::write(&spec, ONBOARDING).expect("write spec");

    let output = condform()
        .args(["fill", "--spec"])
        .arg(&spec)
        .write_stdin("")
        .output()
        .expect("run");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("input closed"));
}

#[test]
fn schema_describes_descriptor_format() {
    let output = condform().arg("schema").output().expect("run");
    assert!(output.status.success());
    let schema: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert!(schema["properties"]["conditions"].is_object());
    assert!(schema["properties"]["fields"].is_object());
}
