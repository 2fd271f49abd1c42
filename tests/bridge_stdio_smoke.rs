use std::time::Duration;

use kcc_bridge::config::ServerConfig;
use kcc_bridge::mcp::{format_tool_list, McpServer};
use serde_json::json;
use tempfile::TempDir;

/// Write a fake MCP server (a `sh` script answering canned JSON-RPC lines)
/// and return a launch config pointing at it.
fn fake_server(dir: &TempDir, script: &str) -> ServerConfig {
    let path = dir.path().join("fake-server.sh");
    std::fs::write(&path, script).expect("write fake server script");

    ServerConfig {
        command: "sh".to_string(),
        args: vec![path.to_string_lossy().into_owned()],
        working_dir: dir.path().to_path_buf(),
        repo_path: "/tmp/kcc-test-repo".to_string(),
        author_name: "Test Author".to_string(),
        author_email: "test@example.com".to_string(),
    }
}

const INIT_REPLY: &str = r#"printf '%s\n' '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"fake-kcc","version":"0.0.1"}}}'"#;

#[test]
fn handshake_then_tool_call_round_trip() {
    let dir = TempDir::new().unwrap();
    // The second reply interpolates the injected environment so the test
    // also proves the KCC_* overlay reached the child.
    let script = format!(
        "IFS= read -r _init\n{INIT_REPLY}\nIFS= read -r _call\nprintf '%s\\n' \"{{\\\"jsonrpc\\\":\\\"2.0\\\",\\\"id\\\":2,\\\"result\\\":{{\\\"content\\\":[{{\\\"type\\\":\\\"text\\\",\\\"text\\\":\\\"repo=$KCC_REPO_PATH author=$KCC_AUTHOR_NAME\\\"}}]}}}}\"\n"
    );
    let config = fake_server(&dir, &script);

    let mut server = McpServer::spawn(&config, Some(Duration::from_secs(10))).expect("spawn");
    server.initialize().expect("initialize handshake");

    let result = server
        .call_tool("kcc_git_status", &json!({}))
        .expect("tools/call");
    assert_eq!(result, "repo=/tmp/kcc-test-repo author=Test Author");

    server.shutdown();
}

#[test]
fn error_payload_is_rendered_with_prefix() {
    let dir = TempDir::new().unwrap();
    let script = format!(
        "IFS= read -r _init\n{INIT_REPLY}\nIFS= read -r _call\nprintf '%s\\n' '{{\"jsonrpc\":\"2.0\",\"id\":2,\"error\":{{\"code\":-32602,\"message\":\"unknown tool\"}}}}'\n"
    );
    let config = fake_server(&dir, &script);

    let mut server = McpServer::spawn(&config, Some(Duration::from_secs(10))).expect("spawn");
    server.initialize().expect("initialize handshake");

    let result = server
        .call_tool("kcc_no_such_tool", &json!({"resource": "ComputeURLMap"}))
        .expect("tools/call");
    assert_eq!(result, "Error: unknown tool");
}

#[test]
fn notifications_before_the_response_are_skipped() {
    let dir = TempDir::new().unwrap();
    let script = format!(
        "IFS= read -r _init\n{INIT_REPLY}\nIFS= read -r _call\nprintf '%s\\n' '{{\"jsonrpc\":\"2.0\",\"method\":\"notifications/progress\",\"params\":{{}}}}'\nprintf '%s\\n' '{{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{{\"content\":[{{\"type\":\"text\",\"text\":\"done\"}}]}}}}'\n"
    );
    let config = fake_server(&dir, &script);

    let mut server = McpServer::spawn(&config, Some(Duration::from_secs(10))).expect("spawn");
    server.initialize().expect("initialize handshake");

    let result = server.call_tool("kcc_git_status", &json!({})).expect("tools/call");
    assert_eq!(result, "done");
}

#[test]
fn tools_list_renders_name_and_description_lines() {
    let dir = TempDir::new().unwrap();
    let script = format!(
        "IFS= read -r _init\n{INIT_REPLY}\nIFS= read -r _list\nprintf '%s\\n' '{{\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{{\"tools\":[{{\"name\":\"kcc_git_status\",\"description\":\"Show git status\"}},{{\"name\":\"kcc_find_resource\",\"description\":\"Locate files for a KCC resource\"}}]}}}}'\n"
    );
    let config = fake_server(&dir, &script);

    let mut server = McpServer::spawn(&config, Some(Duration::from_secs(10))).expect("spawn");
    server.initialize().expect("initialize handshake");

    let tools = server.list_tools().expect("tools/list");
    let rendered = format_tool_list(&tools);
    assert_eq!(
        rendered,
        "kcc_git_status - Show git status\nkcc_find_resource - Locate files for a KCC resource\n"
    );
}

#[test]
fn unresponsive_server_times_out_when_configured() {
    let dir = TempDir::new().unwrap();
    let script = format!("IFS= read -r _init\n{INIT_REPLY}\nIFS= read -r _call\nsleep 30\n");
    let config = fake_server(&dir, &script);

    let mut server = McpServer::spawn(&config, Some(Duration::from_secs(1))).expect("spawn");
    server.initialize().expect("initialize handshake");

    let err = server
        .call_tool("kcc_git_status", &json!({}))
        .expect_err("call should time out");
    assert!(err.to_string().contains("did not respond within 1s"), "{err}");
}

#[test]
fn server_exit_surfaces_as_closed_stream() {
    let dir = TempDir::new().unwrap();
    // Consume the request, then exit without answering it.
    let script = format!("IFS= read -r _init\n{INIT_REPLY}\nIFS= read -r _call\nexit 0\n");
    let config = fake_server(&dir, &script);

    let mut server = McpServer::spawn(&config, Some(Duration::from_secs(10))).expect("spawn");
    server.initialize().expect("initialize handshake");

    let err = server
        .call_tool("kcc_git_status", &json!({}))
        .expect_err("server is gone");
    assert!(err.to_string().contains("closed its output stream"), "{err}");
}
