//! Error Taxonomy
//!
//! Two typed error families: [`ToolError`] for everything the sandboxed
//! tool layer can report (converted to textual tool results and fed back to
//! the model), and [`ProviderError`] for model-client failures (fatal to
//! the run).

use thiserror::Error;

/// Errors raised by the sandbox, file tools, process tool, or dispatcher.
///
/// These never abort a run: the dispatcher renders them as `Error: …`
/// tool results so the model can adapt.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("path traversal not allowed: {0} is outside the working directory")]
    PathTraversal(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("cannot read a directory as a file: {0}")]
    IsADirectory(String),

    #[error("{what} too large ({size} bytes, max {max})")]
    TooLarge {
        what: &'static str,
        size: u64,
        max: u64,
    },

    #[error("file type not allowed: {ext} (allowed: {allowed})")]
    ExtensionNotAllowed { ext: String, allowed: String },

    #[error("execution timed out after {0} seconds")]
    ExecutionTimeout(u64),

    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    #[error("program execution not allowed (pass --allow-run to enable it)")]
    PermissionDenied,

    #[error("missing or invalid argument: {0}")]
    MissingArgument(&'static str),

    #[error("unknown function: {0}")]
    UnknownTool(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a [`crate::provider::ModelClient`]. Any of these ends
/// the run; there is no retry policy.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("API call failed: {0}")]
    Api(String),

    #[error("empty response from model (no candidates)")]
    EmptyResponse,

    #[error("malformed response from model (candidate without content)")]
    MalformedResponse,
}
