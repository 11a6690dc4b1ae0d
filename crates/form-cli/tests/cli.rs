use assert_cmd::Command;
use assert_fs::TempDir;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn tableform() -> Command {
    let mut cmd = Command::cargo_bin("tableform").expect("binary built");
    cmd.env_remove("TABLEFORM_CONFIG");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("utf8 stdout")
}

#[test]
fn check_accepts_valid_form() {
    let stdout = stdout_of(
        tableform()
            .arg("check")
            .arg("--form")
            .arg(fixture("contact_form.json")),
    );
    assert!(stdout.contains("Form OK: 3 questions, 1 conditional"));
}

#[test]
fn check_rejects_self_reference() {
    let output = tableform()
        .arg("check")
        .arg("--form")
        .arg(fixture("self_reference_form.json"))
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    let stderr = String::from_utf8(output).unwrap();
    assert!(stderr.contains("field Nickname cannot reference itself"));
}

#[test]
fn preview_hides_state_outside_usa() {
    let stdout = stdout_of(
        tableform()
            .arg("preview")
            .arg("--form")
            .arg(fixture("contact_form.json"))
            .arg("--answers")
            .arg(fixture("answers_other.json")),
    );
    assert!(stdout.contains("Status: complete"));
    assert!(stdout.contains("Hidden questions: state"));
}

#[test]
fn preview_json_reports_next_required_question() {
    let stdout = stdout_of(
        tableform()
            .args(["preview", "--format", "json", "--form"])
            .arg(fixture("contact_form.json"))
            .arg("--answers")
            .arg(fixture("answers_usa.json")),
    );
    let payload: Value = serde_json::from_str(&stdout).expect("json output");
    assert_eq!(payload["status"], "need_input");
    assert_eq!(payload["nextQuestionKey"], "state");
    assert_eq!(payload["questions"][1]["visible"], true);
}

#[test]
fn validate_rejects_missing_visible_answer() {
    let assert = tableform()
        .arg("validate")
        .arg("--form")
        .arg(fixture("contact_form.json"))
        .arg("--answers")
        .arg(fixture("answers_usa.json"))
        .assert()
        .failure();
    let output = assert.get_output();
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let stderr = String::from_utf8(output.stderr.clone()).unwrap();
    assert!(stdout.contains("Validation result: invalid"));
    assert!(stdout.contains("Missing required answers: state"));
    assert!(stderr.contains("State is required"));
}

#[test]
fn validate_prints_record_fields_without_attachments() {
    let stdout = stdout_of(
        tableform()
            .arg("validate")
            .arg("--form")
            .arg(fixture("contact_form.json"))
            .arg("--answers")
            .arg(fixture("answers_other.json")),
    );
    assert!(stdout.contains("Validation result: valid"));
    assert!(stdout.contains("\"fldCountry\": \"Other\""));
    assert!(!stdout.contains("fldResume"));
    assert!(!stdout.contains("fldState"));
}

#[test]
fn config_can_forward_attachments() {
    let stdout = stdout_of(
        tableform()
            .arg("--config")
            .arg(fixture("config.json"))
            .arg("validate")
            .arg("--form")
            .arg(fixture("contact_form.json"))
            .arg("--answers")
            .arg(fixture("answers_other.json")),
    );
    assert!(stdout.contains("fldResume"));
}

#[test]
fn config_is_read_from_environment() {
    let stdout = stdout_of(
        tableform()
            .env("TABLEFORM_CONFIG", fixture("config.json"))
            .arg("validate")
            .arg("--form")
            .arg(fixture("contact_form.json"))
            .arg("--answers")
            .arg(fixture("answers_other.json")),
    );
    assert!(stdout.contains("fldResume"));
}

#[test]
fn schema_describes_form_definitions() {
    let stdout = stdout_of(tableform().arg("schema"));
    let schema: Value = serde_json::from_str(&stdout).expect("json schema");
    assert!(schema["properties"]["questions"].is_object());
    assert!(schema["properties"]["airtableTableId"].is_object());
}

#[test]
fn answers_schema_follows_visibility() {
    let hidden = stdout_of(
        tableform()
            .arg("answers-schema")
            .arg("--form")
            .arg(fixture("contact_form.json")),
    );
    let hidden: Value = serde_json::from_str(&hidden).unwrap();
    assert_eq!(hidden["required"], serde_json::json!(["country"]));

    let shown = stdout_of(
        tableform()
            .arg("answers-schema")
            .arg("--form")
            .arg(fixture("contact_form.json"))
            .arg("--answers")
            .arg(fixture("answers_usa.json")),
    );
    let shown: Value = serde_json::from_str(&shown).unwrap();
    assert_eq!(shown["required"], serde_json::json!(["country", "state"]));
}

#[test]
fn sync_applies_updates_and_deletes() {
    let workspace = TempDir::new().unwrap();
    let responses = workspace.path().join("responses.json");
    fs::copy(fixture("responses.json"), &responses).unwrap();

    let stdout = stdout_of(
        tableform()
            .arg("sync")
            .arg("--form")
            .arg(fixture("contact_form.json"))
            .arg("--responses")
            .arg(&responses)
            .arg("--webhook")
            .arg(fixture("webhook.json")),
    );
    let report: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["updated"], 1);
    assert_eq!(report["deleted"], 1);
    assert_eq!(report["skipped"], 1);

    let stored: Value = serde_json::from_str(&fs::read_to_string(&responses).unwrap()).unwrap();
    assert_eq!(stored[0]["answers"]["country"], "USA");
    assert_eq!(stored[0]["answers"]["state"], "OR");
    assert_eq!(stored[1]["deletedInAirtable"], true);
}

#[test]
fn sync_can_write_elsewhere() {
    let workspace = TempDir::new().unwrap();
    let out = workspace.path().join("synced.json");

    tableform()
        .arg("sync")
        .arg("--form")
        .arg(fixture("contact_form.json"))
        .arg("--responses")
        .arg(fixture("responses.json"))
        .arg("--webhook")
        .arg(fixture("webhook.json"))
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let stored: Vec<Value> = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(stored.len(), 2);
    let original = fs::read_to_string(fixture("responses.json")).unwrap();
    assert!(original.contains("\"deletedInAirtable\": false"));
    assert!(!original.contains("\"deletedInAirtable\": true"));
}
