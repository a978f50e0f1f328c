use assert_cmd::Command;
use predicates::prelude::*;

fn launcher() -> Command {
    Command::cargo_bin("sandbox-launcher").unwrap()
}

#[test]
fn missing_executable_exits_one_with_usage_message() {
    launcher()
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Usage").or(predicate::str::contains("required")));
}

#[test]
fn unknown_profile_warns_and_defaults_to_strict() {
    let dir = tempfile::tempdir().unwrap();
    launcher()
        .args(["--profile", "paranoid", "--logs-dir"])
        .arg(dir.path())
        .arg("/bin/true")
        .env("RUST_LOG", "warn")
        .assert()
        .stderr(predicate::str::contains("unknown profile").or(predicate::str::contains("STRICT")));
}

#[test]
fn successful_run_writes_a_telemetry_log() {
    let dir = tempfile::tempdir().unwrap();
    launcher()
        .args(["--logs-dir"])
        .arg(dir.path())
        .arg("/bin/true")
        .assert()
        .success()
        .stdout(predicate::str::contains("telemetry log written to"));

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1, "expected exactly one telemetry log file");
}
