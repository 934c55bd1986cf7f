//! Core Data Types
//!
//! Shared message, role, and tool types used across the agent codebase.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// A turn in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

/// Message role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// Message content: text, function calls, or a function-call result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    ToolCalls(Vec<ToolCallRequest>),
    ToolResult(ToolCallResult),
}

// ---------------------------------------------------------------------------
// Tool types
// ---------------------------------------------------------------------------

/// A function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Unique call id assigned when the call is parsed off the wire.
    pub id: String,
    /// Name of the operation to invoke.
    pub name: String,
    /// JSON arguments to pass to the operation.
    pub arguments: serde_json::Value,
}

impl ToolCallRequest {
    /// Deduplication key for loop detection: operation name plus the
    /// compact JSON rendering of the arguments. `serde_json` maps are
    /// key-sorted, so equal argument sets serialize identically.
    pub fn signature(&self) -> String {
        format!("{}:{}", self.name, self.arguments)
    }
}

/// Result of executing a function call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// The call id this result corresponds to.
    pub tool_call_id: String,
    /// Name of the operation that produced this result.
    pub name: String,
    /// The operation's output, or an error description.
    pub content: String,
    /// Whether the operation failed.
    pub is_error: bool,
}

/// An operation definition advertised to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Operation name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON Schema for the operation's parameters.
    pub parameters: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Run events
// ---------------------------------------------------------------------------

/// User-visible events emitted while a run is in flight. The CLI installs a
/// sink that renders these; tests usually pass `None`.
#[derive(Debug, Clone)]
pub enum RunEvent {
    /// A non-empty text part from the model.
    AssistantText(String),
    /// A function call is about to be dispatched.
    ToolCallStarted { name: String },
    /// A function call finished; `content` is the full result text.
    ToolCallFinished {
        name: String,
        content: String,
        is_error: bool,
    },
    /// A `write_file` call is about to overwrite an existing file.
    WritePreview { path: String, diff: String },
}

/// Callback invoked for each [`RunEvent`].
pub type EventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
