use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

fn cli(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pdf-outline").unwrap();
    // Keep a user config file from leaking into the run.
    cmd.env("XDG_CONFIG_HOME", home).env("HOME", home).env_remove("RUST_LOG");
    cmd
}

fn line(text: &str, size: f64, y: f64, bold: bool) -> Value {
    let (font, flags) = if bold { ("Arial-BoldMT", 16) } else { ("ArialMT", 0) };
    let x1 = 72.0 + text.chars().count() as f64 * size * 0.5;
    let bbox = json!([72.0, y, x1, y + size]);
    json!({
        "bbox": bbox,
        "spans": [{"text": text, "size": size, "font": font, "flags": flags, "bbox": bbox}]
    })
}

fn block(lines: Vec<Value>) -> Value {
    json!({"type": 0, "lines": lines})
}

fn paragraph(y: f64) -> Value {
    block(vec![
        line("Running text that fills the body of the page with", 11.0, y, false),
        line("ordinary sentences set at the dominant size so it", 11.0, y + 14.0, false),
        line("is recognised as body text by the statistics.", 11.0, y + 28.0, false),
    ])
}

fn report_dump() -> String {
    json!({"pages": [
        {"height": 1000, "width": 600, "blocks": [
            block(vec![line("Field Survey Results", 24.0, 150.0, true)]),
            paragraph(200.0),
            block(vec![line("Study Methods", 16.0, 300.0, true)]),
            paragraph(340.0),
            block(vec![line("Page 1", 9.0, 950.0, false)]),
        ]},
        {"height": 1000, "width": 600, "blocks": [
            block(vec![line("Findings", 16.0, 200.0, true)]),
            paragraph(240.0),
        ]}
    ]})
    .to_string()
}

fn stdout_json(output: &[u8]) -> Value {
    serde_json::from_slice(output).unwrap()
}

#[test]
fn help_lists_options() {
    let home = TempDir::new().unwrap();
    cli(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-dir"))
        .stdout(predicate::str::contains("--budget-secs"));
}

#[test]
fn inputs_are_required() {
    let home = TempDir::new().unwrap();
    cli(home.path()).assert().failure();
}

#[test]
fn prints_outline_for_layout_dump() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("report.json");
    fs::write(&input, report_dump()).unwrap();

    let assert = cli(dir.path()).arg(&input).arg("--sequential").assert().success();
    let value = stdout_json(&assert.get_output().stdout);

    let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 2);
    assert_eq!(value["title"], "Field Survey Results");
    assert_eq!(
        value["outline"],
        json!([
            {"level": "H1", "text": "Study Methods", "page": 0},
            {"level": "H1", "text": "Findings", "page": 1}
        ])
    );
}

#[test]
fn directory_batch_survives_bad_documents() {
    let dir = TempDir::new().unwrap();
    let inputs = dir.path().join("in");
    let outputs = dir.path().join("out");
    fs::create_dir(&inputs).unwrap();
    fs::write(inputs.join("a-broken.json"), "[{\"blocks\": ").unwrap();
    fs::write(inputs.join("b-report.json"), report_dump()).unwrap();
    fs::write(inputs.join("readme.txt"), "not an input").unwrap();

    cli(dir.path())
        .arg(&inputs)
        .arg("-o")
        .arg(&outputs)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("a-broken.json"));

    let written = fs::read_to_string(outputs.join("b-report.json")).unwrap();
    assert_eq!(serde_json::from_str::<Value>(&written).unwrap()["title"], "Field Survey Results");
    assert!(!outputs.join("a-broken.json").exists());
    assert!(!outputs.join("readme.json").exists());
}

#[test]
fn pretty_output_is_indented() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("report.json");
    fs::write(&input, report_dump()).unwrap();

    cli(dir.path())
        .arg(&input)
        .arg("--pretty")
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"title\": \"Field Survey Results\""));
}

#[test]
fn debug_layout_prints_blocks() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("report.json");
    fs::write(&input, report_dump()).unwrap();

    cli(dir.path())
        .arg(&input)
        .arg("--debug-layout")
        .assert()
        .success()
        .stdout(predicate::str::contains("p0.0"))
        .stdout(predicate::str::contains("footer"))
        .stdout(predicate::str::contains("| Study Methods"))
        .stdout(predicate::str::contains("\"outline\"").not());
}

#[test]
fn invalid_config_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("report.json");
    let config = dir.path().join("config.toml");
    fs::write(&input, report_dump()).unwrap();
    fs::write(&config, "parallel = \"sometimes\"").unwrap();

    cli(dir.path())
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn missing_input_is_skipped() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .arg(dir.path().join("nowhere.pdf"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
