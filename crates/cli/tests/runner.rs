#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn fixtures_dir() -> PathBuf {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    // crates/cli -> ../../tests/fixtures
    PathBuf::from(manifest_dir).join("../../tests/fixtures")
}

fn pyfront(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pyfront"))
        .args(args)
        .output()
        .expect("Failed to execute pyfront")
}

fn pyfront_path(command: &str, path: &Path, extra: &[&str]) -> Output {
    let path = path.to_string_lossy();
    let mut args = vec![command, path.as_ref()];
    args.extend_from_slice(extra);
    pyfront(&args)
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn temp_source(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".py")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("Failed to write temp file");
    file
}

#[test]
fn run_fixture_dumps() {
    let mut failed = Vec::new();
    let mut seen = 0;
    let entries = fs::read_dir(fixtures_dir()).expect("Failed to read fixtures dir");

    for entry in entries {
        let path = entry.unwrap().path();
        if path.extension().unwrap_or_default() != "py" {
            continue;
        }
        seen += 1;
        let test_name = path.file_name().unwrap().to_string_lossy().into_owned();
        println!("Running fixture: {}", test_name);

        let expected_path = path.with_extension("expected");
        let expected = fs::read_to_string(&expected_path)
            .unwrap_or_else(|_| panic!("Missing {}", expected_path.display()));

        let output = pyfront_path("dump", &path, &[]);
        let actual = stdout_of(&output);
        if output.status.success() && actual == expected {
            println!("PASSED: {}", test_name);
        } else {
            println!("FAILED: {}\n{}", test_name, stderr_of(&output));
            println!("--- expected\n{}--- actual\n{}", expected, actual);
            failed.push(test_name);
        }
    }

    assert!(seen > 0, "No fixtures found");
    assert!(failed.is_empty(), "Fixtures failed: {:?}", failed);
}

#[test]
fn unparsed_fixtures_dump_identically() {
    for name in ["assignments.py", "statements.py", "tuples_and_stars.py"] {
        let path = fixtures_dir().join(name);
        let original = pyfront_path("dump", &path, &[]);
        let unparsed = pyfront_path("unparse", &path, &[]);
        assert!(unparsed.status.success(), "{}", stderr_of(&unparsed));

        let file = temp_source(&stdout_of(&unparsed));
        let reparsed = pyfront_path("dump", file.path(), &[]);
        assert!(reparsed.status.success(), "{}", stderr_of(&reparsed));
        assert_eq!(stdout_of(&original), stdout_of(&reparsed), "fixture {}", name);
    }
}

#[test]
fn json_dump_is_valid_json() {
    let path = fixtures_dir().join("assignments.py");
    let output = pyfront_path("dump", &path, &["--format", "json"]);
    assert!(output.status.success(), "{}", stderr_of(&output));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let body = value["body"].as_array().unwrap();
    assert_eq!(body[0]["node"], "AnnAssign");
    assert_eq!(body[0]["simple"], true);
    assert_eq!(body[3]["node"], "Assign");
    assert_eq!(body[3]["targets"].as_array().unwrap().len(), 3);
}

#[test]
fn syntax_error_exits_with_diagnostic() {
    let file = temp_source("x = 1\ny = )\n");
    let output = pyfront_path("dump", file.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_of(&output).is_empty());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("error: failed to parse"), "{}", stderr);
    assert!(stderr.contains("  2 | y = )"), "{}", stderr);
}

#[test]
fn missing_else_is_reported() {
    let file = temp_source("a if b\n");
    let output = pyfront_path("dump", file.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("expected 'else'"));
}

#[test]
fn max_depth_flag_limits_nesting() {
    let file = temp_source("x = ((((((((1))))))))\n");
    assert!(pyfront_path("dump", file.path(), &[]).status.success());

    let output = pyfront_path("dump", file.path(), &["--max-depth", "4"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("nesting deeper than 4 levels"));
}

#[test]
fn tokens_are_listed_one_per_line() {
    let file = temp_source("a = b\n");
    let output = pyfront_path("tokens", file.path(), &[]);
    assert!(output.status.success());

    let stdout = stdout_of(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    // a = b NEWLINE ENDMARKER
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("1:1 "));
    assert!(lines[0].contains("\"a\""));
}

#[test]
fn while_command_parses_only_the_loop() {
    let path = fixtures_dir().join("while_expressions.py");
    let output = pyfront_path("while", &path, &[]);
    assert!(output.status.success(), "{}", stderr_of(&output));
    assert!(stdout_of(&output).starts_with("While("));

    let file = temp_source("x = 1\n");
    let output = pyfront_path("while", file.path(), &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("does not start with a while statement"));
}

#[test]
fn reads_source_from_stdin() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_pyfront"))
        .args(["unparse", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .expect("Failed to spawn pyfront");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"a - b - c\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_of(&output), "(a - b) - c\n");
}

#[test]
fn missing_file_is_an_io_error() {
    let output = pyfront(&["dump", "/nonexistent/input.py"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("cannot read"));
}
