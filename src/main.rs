use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use kcc_bridge::config::{load_config, BridgeConfig};
use kcc_bridge::gemini::GeminiClient;
use kcc_bridge::mcp::{format_tool_list, McpServer};
use kcc_bridge::{shell, signal};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "kcc-bridge")]
#[command(version)]
#[command(about = "Interactive Gemini shell for the KCC MCP server")]
struct Cli {
    /// Gemini model identifier
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Command used to launch the MCP server
    #[arg(long, value_name = "CMD")]
    server_command: Option<String>,

    /// Argument for the server command (repeatable, in order)
    #[arg(long, value_name = "ARG")]
    server_arg: Vec<String>,

    /// Working directory the server is started in
    #[arg(long, value_name = "DIR")]
    server_dir: Option<PathBuf>,

    /// Config Connector checkout injected as KCC_REPO_PATH
    #[arg(long, value_name = "PATH")]
    repo_path: Option<String>,

    /// Git author name injected as KCC_AUTHOR_NAME
    #[arg(long, value_name = "NAME")]
    author_name: Option<String>,

    /// Git author email injected as KCC_AUTHOR_EMAIL
    #[arg(long, value_name = "EMAIL")]
    author_email: Option<String>,

    /// Seconds to wait for each server response (default: wait forever)
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    cmd: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the tools exported by the MCP server and exit
    Tools,
}

fn effective_config(cli: &Cli) -> Result<BridgeConfig> {
    let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut cfg = load_config(&root);

    if let Some(model) = &cli.model {
        cfg.gemini.model = model.clone();
    }
    if let Some(command) = &cli.server_command {
        cfg.server.command = command.clone();
        cfg.server.args = cli.server_arg.clone();
    } else if !cli.server_arg.is_empty() {
        cfg.server.args = cli.server_arg.clone();
    }
    if let Some(dir) = &cli.server_dir {
        cfg.server.working_dir = dir.clone();
    }
    if let Some(path) = &cli.repo_path {
        cfg.server.repo_path = path.clone();
    }
    if let Some(name) = &cli.author_name {
        cfg.server.author_name = name.clone();
    }
    if let Some(email) = &cli.author_email {
        cfg.server.author_email = email.clone();
    }
    if cli.timeout_secs.is_some() {
        cfg.timeout_secs = cli.timeout_secs;
    }

    if let Err(reason) = cfg.validate() {
        bail!("invalid configuration: {reason}");
    }
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = effective_config(&cli)?;
    let timeout = cfg.timeout_secs.map(Duration::from_secs);

    if matches!(cli.cmd, Some(Command::Tools)) {
        let mut server = McpServer::spawn(&cfg.server, timeout)?;
        server.initialize()?;
        let tools = server.list_tools()?;
        print!("{}", format_tool_list(&tools));
        server.shutdown();
        return Ok(());
    }

    let api_key = match std::env::var("GOOGLE_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            println!("❌ Error: GOOGLE_API_KEY not set");
            println!("Get your key from: https://makersuite.google.com/app/apikey");
            println!("Then run: export GOOGLE_API_KEY='your-api-key'");
            std::process::exit(1);
        }
    };

    let gemini = GeminiClient::new(api_key, cfg.gemini.model.clone());

    signal::install();
    shell::print_banner();

    let mut server = McpServer::spawn(&cfg.server, timeout)?;
    server.initialize()?;
    println!("✅ MCP Server connected");
    println!();

    let outcome = shell::run(&gemini, &mut server);

    server.shutdown();
    println!("Goodbye!");
    outcome
}
