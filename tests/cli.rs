use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("energy-chat").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: energy-chat"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("ask"))
        .stdout(predicate::str::contains("--chatbot-url <CHATBOT_URL>"))
        .stdout(predicate::str::contains("--timeout-secs <TIMEOUT_SECS>"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("energy-chat").unwrap();
    cmd.arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: energy-chat serve"))
        .stdout(predicate::str::contains("--port <PORT>"))
        .stdout(predicate::str::contains("--templates <TEMPLATES>"))
        .stdout(predicate::str::contains("--static <STATIC_DIR>"));
}

#[test]
fn test_cli_ask_help() {
    let mut cmd = Command::cargo_bin("energy-chat").unwrap();
    cmd.arg("ask")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<QUERY>"));
}

#[test]
fn test_cli_no_command() {
    let mut cmd = Command::cargo_bin("energy-chat").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: energy-chat"));
}

#[test]
fn test_ask_unreachable_chatbot_prints_error_text() {
    let mut cmd = Command::cargo_bin("energy-chat").unwrap();
    cmd.args(["ask", "anything", "--chatbot-url", "http://127.0.0.1:9/chatbot"])
        .assert()
        .success()
        .stdout("Error fetching data. Please try again later.\n");
}

#[test]
fn test_ask_blank_query_prints_nothing() {
    let mut cmd = Command::cargo_bin("energy-chat").unwrap();
    cmd.args(["ask", "   ", "--chatbot-url", "http://127.0.0.1:9/chatbot"])
        .assert()
        .success()
        .stdout("");
}

#[test]
fn test_chat_reads_until_eof() {
    let mut cmd = Command::cargo_bin("energy-chat").unwrap();
    cmd.args(["chat", "--chatbot-url", "http://127.0.0.1:9/chatbot"])
        .write_stdin("solar\n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "bot> Error fetching data. Please try again later.",
        ));
}

#[test]
fn test_chatbot_url_from_environment() {
    let mut cmd = Command::cargo_bin("energy-chat").unwrap();
    cmd.env("ENERGY_CHAT_URL", "http://127.0.0.1:9/chatbot")
        .args(["ask", "anything"])
        .assert()
        .success()
        .stdout("Error fetching data. Please try again later.\n");
}

#[test]
fn test_chatbot_url_help_names_env_var() {
    let mut cmd = Command::cargo_bin("energy-chat").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[env: ENERGY_CHAT_URL"))
        .stdout(predicate::str::contains("localhost:5000").not());
}
