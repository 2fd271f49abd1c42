use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Read, Write};
use std::time::Duration;

use crate::directive::{scan_reply, DirectiveScan};
use crate::gemini::GeminiClient;
use crate::mcp::McpServer;
use crate::prompt::{compose_prompt, TOOL_CATALOG};
use crate::signal;

/// One line of operator input, or the reason there isn't one.
enum Input {
    Line(String),
    Eof,
    Interrupted,
}

pub fn print_banner() {
    println!("╔════════════════════════════════════════════════════════════════╗");
    println!("║         Gemini + KCC MCP Server Interactive Shell             ║");
    println!("╚════════════════════════════════════════════════════════════════╝");
    println!();
    println!("Available commands:");
    println!("  - Natural language: 'Check if ComputeURLMap needs migration'");
    println!("  - Direct tool calls: 'kcc_find_resource EdgeCacheService'");
    println!("  - Type 'quit' or 'exit' to exit");
    println!();
}

/// The dispatch loop: read → Gemini → (optional) tool call → print, until
/// quit/exit, end of input, or Ctrl-C. Every per-turn failure is reported
/// and contained; only the explicit exits leave this function.
pub fn run(gemini: &GeminiClient, server: &mut McpServer) -> Result<()> {
    loop {
        if signal::interrupted() {
            println!("\n\nInterrupted. Shutting down...");
            return Ok(());
        }

        print!("You: ");
        io::stdout().flush()?;

        let utterance = match read_input()? {
            Input::Line(line) => line,
            Input::Eof => {
                println!("\nShutting down...");
                return Ok(());
            }
            Input::Interrupted => {
                println!("\n\nInterrupted. Shutting down...");
                return Ok(());
            }
        };

        let utterance = utterance.trim();
        if utterance.is_empty() {
            continue;
        }
        if utterance.eq_ignore_ascii_case("quit") || utterance.eq_ignore_ascii_case("exit") {
            println!("\nShutting down...");
            return Ok(());
        }

        let prompt = compose_prompt(TOOL_CATALOG, utterance);
        let reply = match ask_gemini(gemini, &prompt) {
            Ok(reply) => reply,
            Err(err) => {
                println!("❌ Error: {err:#}");
                continue;
            }
        };
        println!("\nGemini: {reply}\n");

        match scan_reply(&reply) {
            DirectiveScan::NoDirective => {}
            DirectiveScan::Malformed(reason) => {
                println!("❌ Error calling tool: {reason}\n");
            }
            DirectiveScan::Directive(directive) => {
                println!("📞 Calling {}...", directive.name);
                match server.call_tool(&directive.name, &directive.params) {
                    Ok(result) => {
                        println!("\n📊 Result:\n{}", format_tool_result(&result));
                        println!();
                    }
                    Err(err) => {
                        println!("❌ Error: {err:#}");
                    }
                }
            }
        }
    }
}

fn ask_gemini(gemini: &GeminiClient, prompt: &str) -> Result<String> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} asking Gemini...")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    let reply = gemini.generate(prompt);
    spinner.finish_and_clear();
    reply
}

/// Tool results that are themselves JSON are re-rendered indented; anything
/// else passes through untouched.
pub fn format_tool_result(text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}

/// Read one line of operator input byte by byte.
///
/// `BufRead::read_line` transparently retries interrupted reads and would
/// swallow the Ctrl-C EINTR this shell depends on, so the loop sits
/// directly on `Read::read`, where `Interrupted` surfaces.
fn read_input() -> io::Result<Input> {
    let mut stdin = io::stdin().lock();
    let mut line = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match stdin.read(&mut byte) {
            Ok(0) => {
                if line.is_empty() {
                    return Ok(Input::Eof);
                }
                break;
            }
            Ok(_) => {
                if byte[0] == b'\n' {
                    break;
                }
                line.push(byte[0]);
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {
                return Ok(Input::Interrupted);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(Input::Line(String::from_utf8_lossy(&line).into_owned()))
}
