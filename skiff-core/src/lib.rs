//! # Skiff Core
//!
//! Core library for the skiff coding agent. Provides the conversation data
//! model, the sandboxed tool layer (file listing/reading/writing and script
//! execution), function-call dispatch, and the agent loop that drives a
//! model through a bounded tool-use conversation.

pub mod agent_loop;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod error;
pub mod fs_tools;
pub mod process;
pub mod provider;
pub mod sandbox;
pub mod system_prompt;
pub mod types;

// Re-export key types
pub use agent_loop::{Agent, RunOutcome, RunReport};
pub use config::{FileConfig, RunConfig, DEFAULT_MODEL};
pub use dispatch::{tool_definitions, Dispatcher};
pub use error::{ProviderError, ToolError};
pub use provider::{ModelClient, ModelResponse, ResponsePart};
pub use types::{
    EventSink, Message, MessageContent, Role, RunEvent, ToolCallRequest, ToolCallResult,
    ToolDefinition,
};
