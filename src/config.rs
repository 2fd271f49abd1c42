use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for the Gemini round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Model identifier passed to generateContent.
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-exp".to_string(),
        }
    }
}

/// Launch contract for the KCC MCP server subprocess.
///
/// The three `kcc_*` fields are injected into the child's environment as
/// `KCC_REPO_PATH`, `KCC_AUTHOR_NAME` and `KCC_AUTHOR_EMAIL` on top of the
/// inherited environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub command: String,
    pub args: Vec<String>,
    /// Working directory the server is started in.
    pub working_dir: PathBuf,
    pub repo_path: String,
    pub author_name: String,
    pub author_email: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: vec!["dist/index.js".to_string()],
            working_dir: PathBuf::from("/home/fcurrie/Projects/kcc-mcp-server"),
            repo_path: "/home/fcurrie/Projects/kcc-resource-add/k8s-config-connector".to_string(),
            author_name: "Frank Currie".to_string(),
            author_email: "fcurrie@google.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    pub gemini: GeminiConfig,
    pub server: ServerConfig,
    /// Seconds to wait for one server response line. `None` waits forever,
    /// even on a server that never answers.
    pub timeout_secs: Option<u64>,
}

impl BridgeConfig {
    /// Reject configurations that cannot possibly launch a server.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.command.trim().is_empty() {
            return Err("server.command must not be empty".to_string());
        }
        if self.gemini.model.trim().is_empty() {
            return Err("gemini.model must not be empty".to_string());
        }
        Ok(())
    }
}

pub fn load_config(root: &Path) -> BridgeConfig {
    let primary = root.join(".kcc-bridge.json");

    let text = std::fs::read_to_string(&primary);
    let Ok(text) = text else { return BridgeConfig::default() };

    serde_json::from_str::<BridgeConfig>(&text).unwrap_or_else(|_| BridgeConfig::default())
}
