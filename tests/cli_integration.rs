use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("chatrelay")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("delete-response"));
}

#[test]
fn test_delete_response_without_key_fails() {
    Command::cargo_bin("chatrelay")
        .unwrap()
        .env_remove("OPENAI_API_KEY")
        .args(["--config", "does/not/exist.yaml", "delete-response", "resp_123"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing credentials"));
}

#[test]
fn test_serve_rejects_invalid_mode() {
    Command::cargo_bin("chatrelay")
        .unwrap()
        .args(["serve", "--mode", "sometimes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sometimes"));
}

#[test]
fn test_serve_rejects_zero_port() {
    Command::cargo_bin("chatrelay")
        .unwrap()
        .env_remove("CHATRELAY_PORT")
        .args(["--config", "does/not/exist.yaml", "serve", "--port", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("port must be greater than 0"));
}
