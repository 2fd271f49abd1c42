use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::debug_log;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const CLIENT_NAME: &str = "gemini-bridge";
pub const CLIENT_VERSION: &str = "1.0.0";

/// Handle to the KCC MCP server subprocess.
///
/// Owns the child for the lifetime of the bridge: stdin for requests, a
/// reader thread feeding stdout lines through a channel (so reads can honor
/// an optional timeout), and a monotone request-id counter. The child is
/// killed on drop, so every exit path tears the server down.
pub struct McpServer {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<std::io::Result<String>>,
    timeout: Option<Duration>,
    next_id: u64,
}

impl McpServer {
    /// Launch the server with the inherited environment plus the three KCC
    /// overrides, stdio piped. stderr is piped and never read, which keeps
    /// the server's own startup log lines off the bridge console.
    pub fn spawn(config: &ServerConfig, timeout: Option<Duration>) -> Result<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .current_dir(&config.working_dir)
            .env("KCC_REPO_PATH", &config.repo_path)
            .env("KCC_AUTHOR_NAME", &config.author_name)
            .env("KCC_AUTHOR_EMAIL", &config.author_email)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to launch MCP server: {}", config.command))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("failed to capture MCP server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("failed to capture MCP server stdout"))?;

        let (tx, lines) = mpsc::channel();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            child,
            stdin,
            lines,
            timeout,
            next_id: 1,
        })
    }

    /// The one-time `initialize` handshake. The response is discarded
    /// unvalidated; the server is trusted to be protocol-conformant.
    pub fn initialize(&mut self) -> Result<()> {
        self.request(
            "initialize",
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": { "name": CLIENT_NAME, "version": CLIENT_VERSION }
            }),
        )?;
        Ok(())
    }

    /// Relay one `tools/call` and render the response to display text.
    pub fn call_tool(&mut self, name: &str, arguments: &Value) -> Result<String> {
        let response = self.request(
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        )?;
        Ok(interpret_tool_response(&response))
    }

    /// Ask the server for its tool inventory (`tools/list`).
    pub fn list_tools(&mut self) -> Result<Value> {
        self.request("tools/list", json!({}))
    }

    fn request(&mut self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let request = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        writeln!(self.stdin, "{request}")
            .with_context(|| format!("failed to write {method} request to MCP server"))?;
        self.stdin.flush().context("failed to flush MCP server stdin")?;

        // One request in flight at a time; anything on stdout that doesn't
        // carry our id (a notification, say) is skipped.
        loop {
            let line = self.read_line()?;
            if line.trim().is_empty() {
                continue;
            }
            let response: Value = serde_json::from_str(&line)
                .with_context(|| format!("MCP server sent a non-JSON line: {line}"))?;
            if response.get("id").and_then(Value::as_u64) == Some(id) {
                return Ok(response);
            }
            debug_log!("skipping unmatched MCP message: {response}");
        }
    }

    fn read_line(&mut self) -> Result<String> {
        let received = match self.timeout {
            Some(timeout) => match self.lines.recv_timeout(timeout) {
                Ok(line) => line,
                Err(RecvTimeoutError::Timeout) => {
                    bail!("MCP server did not respond within {}s", timeout.as_secs())
                }
                Err(RecvTimeoutError::Disconnected) => {
                    bail!("MCP server closed its output stream")
                }
            },
            // No timeout configured: block until the server answers, however
            // long that takes.
            None => self
                .lines
                .recv()
                .map_err(|_| anyhow!("MCP server closed its output stream"))?,
        };
        received.context("failed to read from MCP server stdout")
    }

    /// Kill the subprocess. Also runs from `Drop`; calling it twice is fine.
    pub fn shutdown(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for McpServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Render a `tools/call` response for display.
///
/// The text of the first content element wins; an error payload renders as
/// `Error: <message>`; anything else falls back to the raw response.
pub fn interpret_tool_response(response: &Value) -> String {
    if let Some(text) = response
        .get("result")
        .and_then(|r| r.get("content"))
        .and_then(Value::as_array)
        .and_then(|c| c.first())
        .and_then(|e| e.get("text"))
        .and_then(Value::as_str)
    {
        return text.to_string();
    }
    if let Some(message) = response
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
    {
        return format!("Error: {message}");
    }
    response.to_string()
}

/// Render a `tools/list` response as one `name - description` line per
/// tool, falling back to pretty JSON when the shape is unexpected.
pub fn format_tool_list(response: &Value) -> String {
    let tools = response
        .get("result")
        .and_then(|r| r.get("tools"))
        .and_then(Value::as_array);

    let Some(tools) = tools else {
        return serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_string());
    };

    let mut out = String::new();
    for tool in tools {
        let name = tool.get("name").and_then(Value::as_str).unwrap_or("?");
        match tool.get("description").and_then(Value::as_str) {
            Some(desc) => out.push_str(&format!("{name} - {desc}\n")),
            None => out.push_str(&format!("{name}\n")),
        }
    }
    out
}
