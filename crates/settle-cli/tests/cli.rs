//! Runs the `settle` binary. None of these reach a database: they fail (or
//! finish) before connecting, or point at a port nothing listens on.

use std::path::PathBuf;
use std::process::{Command, Output};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn settle(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_settle"))
        .args(args)
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn test_help() {
    let output = settle(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--no-ledger"), "{stdout}");
}

#[test]
fn test_missing_schema_document() {
    let output = settle(&["--schema", "does-not-exist.json"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("does-not-exist.json"), "{stderr}");
}

#[test]
fn test_wrong_document_shape() {
    let path = fixture("bad-shape.json");
    let output = settle(&["--schema", path.to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("bad-shape.json"), "{stderr}");
}

#[test]
fn test_unreachable_server_is_fatal() {
    let path = fixture("skipped.json");
    let output = settle(&[
        "--schema",
        path.to_str().unwrap(),
        "--host",
        "127.0.0.1",
        "--port",
        "1",
    ]);
    assert_eq!(output.status.code(), Some(1));

    // the malformed database is reported before connecting
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Skipping a nameless database"), "{stdout}");
}

#[test]
fn test_wrong_shaped_table_is_only_a_diagnostic() {
    let path = fixture("mixed-shape.json");
    let output = settle(&[
        "--schema",
        path.to_str().unwrap(),
        "--host",
        "127.0.0.1",
        "--port",
        "1",
    ]);

    // gets as far as connecting, so the document itself loaded
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("shop/bad: table entry has the wrong shape"), "{stdout}");
    assert!(!stdout.contains("shop/good"), "{stdout}");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("failed to parse"), "{stderr}");
}
