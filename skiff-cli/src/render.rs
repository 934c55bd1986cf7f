//! Console Rendering
//!
//! Turns run events into terminal output. Final answers go to stdout;
//! progress notices and previews go to stderr, matching the logger.

use std::sync::Arc;

use skiff_core::{EventSink, RunEvent};

const PREVIEW_LIMIT: usize = 200;

/// Sink that renders run events as they happen.
pub fn event_sink() -> EventSink {
    Arc::new(|event: RunEvent| match event {
        RunEvent::AssistantText(text) => {
            println!("{text}");
        }
        RunEvent::ToolCallStarted { name } => {
            eprintln!("🔧 calling function: {name}");
        }
        RunEvent::ToolCallFinished {
            content, is_error, ..
        } => {
            let marker = if is_error { "✗" } else { "↳" };
            eprintln!("   {marker} {}", preview(&content));
        }
        RunEvent::WritePreview { path, diff } => {
            eprintln!("📝 proposed changes to {path}:");
            for line in diff.lines() {
                eprintln!("   {line}");
            }
        }
    })
}

/// First line of `text`, truncated to [`PREVIEW_LIMIT`] on a char boundary.
fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let truncated = match first_line.char_indices().nth(PREVIEW_LIMIT) {
        Some((idx, _)) => &first_line[..idx],
        None => first_line,
    };
    if truncated.len() < text.len() {
        format!("{truncated}…")
    } else {
        truncated.to_string()
    }
}

pub fn print_banner() {
    eprintln!("⛵ skiff v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Local AI coding agent");
}

pub fn print_info() {
    eprintln!();
    eprintln!("skiff turns a natural-language instruction into sandboxed file");
    eprintln!("operations and script runs, driven by the Gemini API.");
    eprintln!();
    eprintln!("Quick start:");
    eprintln!("  skiff --info             # Show this information");
    eprintln!("  skiff \"your prompt\"      # Run a single instruction");
    eprintln!("  skiff                    # Enter interactive mode");
}
