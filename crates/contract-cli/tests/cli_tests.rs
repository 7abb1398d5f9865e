use std::path::Path;

use assert_cmd::Command;
use tempfile::TempDir;

fn contractflow(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("contractflow").expect("binary");
    cmd.current_dir(dir)
       .env("CONTRACTS_LOG_FILE", dir.join("app_log.txt"))
       .env_remove("CONTRACTS_USER")
       .env_remove("CONTRACTS_PASSWORD")
       .arg("--db")
       .arg(dir.join("contracts.db"));
    cmd
}

fn initialized() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    contractflow(dir.path()).arg("init").assert().success();
    dir
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    String::from_utf8(output.stdout).expect("utf8")
}

#[test]
fn init_seeds_once() {
    let dir = tempfile::tempdir().unwrap();
    let first = stdout_of(contractflow(dir.path()).arg("init"));
    assert!(first.contains("50 contracts"), "{first}");
    let second = stdout_of(contractflow(dir.path()).arg("init"));
    assert!(second.contains("0 contracts"), "{second}");
}

#[test]
fn missing_command_or_credentials_is_a_usage_error() {
    let dir = initialized();
    contractflow(dir.path()).assert().code(2);
    contractflow(dir.path()).arg("stats").assert().code(2);
}

#[test]
fn wrong_password_and_forbidden_actions_are_refused() {
    let dir = initialized();
    contractflow(dir.path()).args(["--user", "admin", "--password", "nope", "stats"]).assert().code(4);
    contractflow(dir.path()).args(["--user", "lawyer", "--password", "123", "user", "list"]).assert().code(4);
}

#[test]
fn invalid_inn_is_a_validation_error() {
    let dir = initialized();
    contractflow(dir.path()).args(["--user", "admin", "--password", "admin", "org", "add", "--name", "ООО 'Ромашка'", "--inn",
                                   "1234567890"])
                            .assert()
                            .code(3);
}

#[test]
fn stats_as_json() {
    let dir = initialized();
    let out = stdout_of(contractflow(dir.path()).args(["--user", "admin", "--password", "admin", "--json", "stats"]));
    let stats: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(stats["total_contracts"], 50);
    assert_eq!(stats["active_users"], 9);
}

#[test]
fn submit_then_lawyer_approves_from_the_inbox() {
    let dir = initialized();
    let out = stdout_of(contractflow(dir.path()).args(["--user", "purchase", "--password", "123", "submit", "1"]));
    assert!(out.contains("step 1 with 4 task(s)"), "{out}");

    let inbox = stdout_of(contractflow(dir.path()).args(["--user", "lawyer", "--password", "123", "--json", "tasks"]));
    let inbox: serde_json::Value = serde_json::from_str(&inbox).unwrap();
    let task_id = inbox[0]["task_id"].as_i64().unwrap().to_string();
    assert_eq!(inbox[0]["contract_number"], "Д-2025-001");

    let out = stdout_of(contractflow(dir.path()).args(["--user", "lawyer", "--password", "123", "approve", &task_id]));
    assert!(out.contains("3 task(s) still pending"), "{out}");
    contractflow(dir.path()).args(["--user", "lawyer", "--password", "123", "approve", &task_id]).assert().code(4);

    let status = stdout_of(contractflow(dir.path()).args(["--user", "purchase", "--password", "123", "status", "1"]));
    assert!(status.contains("Закупки [running]"), "{status}");
    assert!(status.contains("Согласовано"), "{status}");
}

#[test]
fn reset_requires_confirmation() {
    let dir = initialized();
    contractflow(dir.path()).args(["--user", "admin", "--password", "admin", "reset"]).assert().code(2);
    let out = stdout_of(contractflow(dir.path()).args(["--user", "admin", "--password", "admin", "reset", "--yes"]));
    assert!(out.contains("50 contracts seeded"), "{out}");
}

#[test]
fn actions_are_appended_to_the_flat_log() {
    let dir = initialized();
    contractflow(dir.path()).args(["--user", "admin", "--password", "admin", "stats"]).assert().success();
    contractflow(dir.path()).args(["--user", "admin", "--password", "nope", "stats"]).assert().code(4);

    let log = std::fs::read_to_string(dir.path().join("app_log.txt")).expect("log file");
    let login = log.lines().find(|l| l.ends_with("] User admin logged in")).expect("login line");
    assert!(login.starts_with('['));
    assert!(log.lines().any(|l| l.ends_with("] Failed login attempt for 'admin'")), "{log}");
}
