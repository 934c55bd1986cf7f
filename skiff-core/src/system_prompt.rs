//! System Prompt
//!
//! The fixed instruction block sent as the system turn of every run.

use crate::types::{Message, MessageContent, Role};

/// Instruction block advertising the available operations and the
/// relative-path convention. Sent identically on every round-trip.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful AI coding agent.

When a user asks a question or makes a request, plan a sequence of function calls. You can perform the following operations:

- List files and directories
- Read file contents
- Write or modify files
- Execute scripts and programs

All paths you provide must be relative to the working directory. Do not include the working directory itself in your function calls; it is injected automatically for security reasons.

Follow these guidelines:
1. Gather information with function calls before making changes
2. Plan your approach before modifying anything
3. Explain what you are doing as you go
4. Never repeat a function call you have already made with the same arguments";

/// The seed system turn for a new conversation.
pub fn system_message() -> Message {
    Message {
        role: Role::System,
        content: MessageContent::Text(DEFAULT_SYSTEM_PROMPT.to_string()),
    }
}
