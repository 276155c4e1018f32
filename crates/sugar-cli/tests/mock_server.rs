//! CLI tests against a mock SugarCRM server.

use std::process::{Command, Output};

use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Run the CLI binary against `url` with test credentials.
async fn run_cli(args: &[&str], url: Option<String>) -> Output {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    tokio::task::spawn_blocking(move || {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_sugar"));
        cmd.args(&args);
        cmd.env_remove("SUGAR_URL");
        cmd.env_remove("SUGAR_PLATFORM");
        cmd.env_remove("RUST_LOG");
        cmd.env("SUGAR_USERNAME", "admin");
        cmd.env("SUGAR_PASSWORD", "secret");
        if let Some(url) = url {
            cmd.env("SUGAR_URL", url);
        }
        cmd.output().expect("Failed to execute CLI")
    })
    .await
    .unwrap()
}

fn api_url(server: &MockServer) -> Option<String> {
    Some(format!("{}/rest/v10", server.uri()))
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/rest/v10/oauth2/token"))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("username=admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "T",
            "refresh_token": "R",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let output = run_cli(&["login", "--show-tokens"], api_url(&server)).await;

    assert!(output.status.success(), "login failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("admin"));
    assert!(out.contains("Access token"));
    assert!(out.lines().any(|line| line.ends_with(": T")));
    assert!(out.lines().any(|line| line.ends_with(": R")));
}

#[tokio::test]
async fn test_login_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v10/oauth2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "need_login",
            "error_message": "You must specify a valid username and password."
        })))
        .mount(&server)
        .await;

    let output = run_cli(&["login"], api_url(&server)).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to login"));
}

#[tokio::test]
async fn test_missing_url() {
    let output = run_cli(&["login"], None).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("SUGAR_URL"));
}

#[tokio::test]
async fn test_record_get() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v10/Accounts/123"))
        .and(header("OAuth-Token", "T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "123",
            "name": "Acme"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_cli(&["record", "get", "Accounts", "123"], api_url(&server)).await;

    assert!(output.status.success(), "get failed: {}", stderr(&output));
    let record: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(record["name"], "Acme");
}

#[tokio::test]
async fn test_record_get_not_found() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v10/Accounts/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "not_found",
            "error_message": "Could not find record"
        })))
        .mount(&server)
        .await;

    let output = run_cli(&["record", "get", "Accounts", "missing"], api_url(&server)).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Failed to get record"));
}

#[tokio::test]
async fn test_record_create_from_file() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/rest/v10/Accounts"))
        .and(body_string_contains("name=Acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let fields = dir.path().join("account.json");
    std::fs::write(&fields, r#"{"name": "Acme"}"#).unwrap();

    let output = run_cli(
        &[
            "record",
            "create",
            "Accounts",
            "--json",
            fields.to_str().unwrap(),
        ],
        api_url(&server),
    )
    .await;

    assert!(output.status.success(), "create failed: {}", stderr(&output));
    assert!(stdout(&output).contains("abc"));
    assert!(stderr(&output).contains("Created record: abc"));
}

#[tokio::test]
async fn test_record_search_prints_one_record_per_line() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v10/Accounts"))
        .and(query_param("q", "Acme"))
        .and(query_param("max_num", "2"))
        .and(query_param("fields", "name"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "next_offset": 2,
            "records": [{"id": "a", "name": "Acme"}, {"id": "b", "name": "Acme East"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let output = run_cli(
        &[
            "record", "search", "Accounts", "-q", "Acme", "--max-num", "2", "-p", "fields=name",
        ],
        api_url(&server),
    )
    .await;

    assert!(output.status.success(), "search failed: {}", stderr(&output));
    let lines: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["id"], "b");
    assert!(stderr(&output).contains("Next offset"));
}

#[tokio::test]
async fn test_file_download() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/rest/v10/Notes/n1/file/filename"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let destination = dir.path().join("hello.txt");

    let output = run_cli(
        &[
            "file",
            "download",
            "Notes",
            "n1",
            "filename",
            destination.to_str().unwrap(),
        ],
        api_url(&server),
    )
    .await;

    assert!(output.status.success(), "download failed: {}", stderr(&output));
    assert_eq!(std::fs::read(&destination).unwrap(), b"hello");
}

#[tokio::test]
async fn test_call_with_unknown_verb() {
    let output = run_cli(
        &["call", "patch", "Accounts/1"],
        Some("https://crm.example.com/rest/v10".to_string()),
    )
    .await;

    assert!(!output.status.success());
}
