//! Command-line surface for the `warbot` binary.

use std::io::{self, Write};

use clap::Parser;
use tokio::io::{AsyncBufRead, Lines};

use crate::agent::DisplaySink;
use crate::config::WarbotConfig;
use crate::types::ToolCallRequest;

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Conflict awareness and emergency preparedness assistant
#[derive(Parser, Debug)]
#[command(name = "warbot", version, about = "Warbot: streaming preparedness assistant")]
pub struct Cli {
    /// Model to use (overrides OPENAI_MODEL)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Chat-completions base URL (overrides OPENAI_BASE_URL)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Verbose diagnostics on stderr
    #[arg(short, long)]
    pub debug: bool,

    /// Ask a single question and exit
    #[arg(short, long)]
    pub question: Option<String>,

    /// Maximum model rounds per question
    #[arg(long)]
    pub max_rounds: Option<usize>,
}

impl Cli {
    /// Apply flag overrides on top of a loaded config.
    pub fn apply(&self, mut config: WarbotConfig) -> WarbotConfig {
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(rounds) = self.max_rounds {
            config = config.with_max_rounds(rounds);
        }
        config.with_debug(self.debug || config.debug)
    }
}

/// Whether a line of interactive input ends the session.
pub fn is_exit_command(line: &str) -> bool {
    matches!(line.trim().to_lowercase().as_str(), "exit" | "quit")
}

/// Next non-blank input line, or `None` at end of input or on `exit`/`quit`.
pub async fn next_input<R>(lines: &mut Lines<R>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        if is_exit_command(&line) {
            return Ok(None);
        }
        let input = line.trim();
        if !input.is_empty() {
            return Ok(Some(input.to_string()));
        }
    }
    Ok(None)
}

/// Terminal renderer: reasoning dimmed, answer plain, tool activity on stderr.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    in_reasoning: bool,
    wrote_answer: bool,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Close any open styling and end the current line.
    pub fn finish(&mut self) {
        let mut out = io::stdout();
        if self.in_reasoning {
            let _ = write!(out, "{RESET}");
            self.in_reasoning = false;
        }
        let _ = writeln!(out);
        let _ = out.flush();
        self.wrote_answer = false;
    }

    fn leave_reasoning(&mut self, out: &mut impl Write) {
        if self.in_reasoning {
            let _ = writeln!(out, "{RESET}");
            self.in_reasoning = false;
        }
    }
}

impl DisplaySink for ConsoleSink {
    fn on_reasoning(&mut self, text: &str) {
        let mut out = io::stdout();
        if !self.in_reasoning {
            let _ = write!(out, "{DIM}💭 ");
            self.in_reasoning = true;
        }
        let _ = write!(out, "{text}");
        let _ = out.flush();
    }

    fn on_answer(&mut self, text: &str) {
        let mut out = io::stdout();
        self.leave_reasoning(&mut out);
        let _ = write!(out, "{text}");
        let _ = out.flush();
        self.wrote_answer = true;
    }

    fn on_tool_call(&mut self, call: &ToolCallRequest) {
        let mut out = io::stdout();
        self.leave_reasoning(&mut out);
        if self.wrote_answer {
            let _ = writeln!(out);
            self.wrote_answer = false;
        }
        let _ = out.flush();
        eprintln!("[tool] {}", call.name);
    }

    fn on_tool_result(&mut self, call: &ToolCallRequest, _result: &serde_json::Value, is_error: bool) {
        if is_error {
            eprintln!("[tool] {} failed", call.name);
        }
    }
}
