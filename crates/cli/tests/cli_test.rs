//! End-to-end tests for the agentflow binary, using offline capabilities

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const REQUEST: &str =
    "Research X, calculate profit for $1,000,000 revenue / $700,000 cost, then summarize.";

fn agentflow() -> Command {
    let mut cmd = Command::cargo_bin("agentflow").unwrap();
    for var in [
        "WORKFLOW_PLAN",
        "WORKFLOW_ROUTING_SCOPE",
        "WORKFLOW_MAX_STEPS",
        "CAPABILITY_TIMEOUT_SECS",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn test_offline_run_prints_each_step() {
    agentflow()
        .args(["--memory", "--offline", "run", "-s", "demo", REQUEST])
        .assert()
        .success()
        .stdout(predicate::str::contains("--- Step 1: research ---"))
        .stdout(predicate::str::contains("--- Step 2: calculate ---"))
        .stdout(predicate::str::contains("Profit $300,000"))
        .stdout(predicate::str::contains("--- Step 3: summarize ---"))
        .stdout(predicate::str::contains("finished after 3 steps"));
}

#[test]
fn test_custom_plan_from_flag() {
    agentflow()
        .args(["--memory", "--offline", "run", "-s", "calc", "--plan", "calculate", REQUEST])
        .assert()
        .success()
        .stdout(predicate::str::contains("Plan: calculate"))
        .stdout(predicate::str::contains("--- Step 1: calculate ---"))
        .stdout(predicate::str::contains("research ---").not());
}

#[test]
fn test_invalid_plan_is_rejected() {
    agentflow()
        .args(["--memory", "--offline", "run", "--plan", "research,dance", REQUEST])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid plan"));
}

#[test]
fn test_run_without_request_on_new_session_fails() {
    agentflow()
        .args(["--memory", "--offline", "run", "-s", "nothing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no messages"));
}

#[test]
fn test_sessions_persist_between_invocations() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("data");
    let db = db_path.to_str().unwrap();

    agentflow()
        .args(["--db-path", db, "--offline", "run", "-s", "persisted", REQUEST])
        .assert()
        .success();

    // A second run finds the work already done
    agentflow()
        .args(["--db-path", db, "--offline", "run", "-s", "persisted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already complete (4 messages)"));

    agentflow()
        .args(["--db-path", db, "show", "-s", "persisted"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[calculate ✓] Calculated profit"))
        .stdout(predicate::str::contains("[summarize ✓] Final summary:"));

    agentflow()
        .args(["--db-path", db, "sessions"])
        .assert()
        .success()
        .stdout(predicate::str::contains("persisted - 4 messages"));

    agentflow()
        .args(["--db-path", db, "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sessions: 1"))
        .stdout(predicate::str::contains("Messages: 4"));

    agentflow()
        .args(["--db-path", db, "delete", "persisted"])
        .assert()
        .success();

    agentflow()
        .args(["--db-path", db, "show", "-s", "persisted"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_reset_db() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("data");
    let db = db_path.to_str().unwrap();

    agentflow()
        .args(["reset-db", "--db-path", db])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to remove"));

    agentflow()
        .args(["--db-path", db, "stats"])
        .assert()
        .success();

    agentflow()
        .args(["reset-db", "--db-path", db])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed database"));
    assert!(!db_path.exists());
}

#[test]
fn test_interactive_session() {
    agentflow()
        .args(["--memory", "--offline", "interactive", "-s", "repl"])
        .write_stdin(format!("run {}\nshow\nstats\nquit\n", REQUEST))
        .assert()
        .success()
        .stdout(predicate::str::contains("--- Step 3: summarize ---"))
        .stdout(predicate::str::contains("Sessions: 1, Messages: 4"))
        .stdout(predicate::str::contains("Goodbye!"));
}

#[test]
fn test_follow_up_on_finished_session_is_recorded() {
    agentflow()
        .args(["--memory", "--offline", "interactive", "-s", "follow"])
        .write_stdin(format!("run {}\nrun thanks!\nquit\n", REQUEST))
        .assert()
        .success()
        .stdout(predicate::str::contains("finished after 3 steps"))
        .stdout(predicate::str::contains(
            "Recorded 1 new message(s) in session 'follow'; nothing was pending (5 messages).",
        ))
        .stdout(predicate::str::contains("already complete").not());
}
