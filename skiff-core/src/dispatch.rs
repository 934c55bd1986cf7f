//! Tool Dispatcher
//!
//! Maps a structured function call onto one of the four sandboxed
//! operations. Policy gates (dry-run, run-permission, write allow-list,
//! overwrite preview) live here, not in the tools themselves. Every tool
//! failure is converted into a textual result for the model; nothing in
//! this module aborts a run.

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::RunConfig;
use crate::diff::render_diff;
use crate::error::ToolError;
use crate::types::{EventSink, RunEvent, ToolCallRequest, ToolCallResult, ToolDefinition};
use crate::{fs_tools, process};

// ---------------------------------------------------------------------------
// Tool schema declaration
// ---------------------------------------------------------------------------

/// The fixed declaration of the four operations, sent identically on
/// every model round-trip.
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "get_files_info".to_string(),
            description: "Lists files in a directory relative to the working directory, \
                          with file sizes and directory status"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "directory": {
                        "type": "string",
                        "description": "Directory to list, relative to the working directory \
                                        (defaults to the working directory itself)"
                    }
                }
            }),
        },
        ToolDefinition {
            name: "get_file_content".to_string(),
            description: "Reads the content of a file relative to the working directory"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path of the file to read, relative to the working directory"
                    }
                },
                "required": ["file_path"]
            }),
        },
        ToolDefinition {
            name: "write_file".to_string(),
            description: "Writes content to a file relative to the working directory, \
                          creating parent directories as needed"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path of the file to write, relative to the working directory"
                    },
                    "content": {
                        "type": "string",
                        "description": "Content to write to the file"
                    }
                },
                "required": ["file_path", "content"]
            }),
        },
        ToolDefinition {
            name: "run_file".to_string(),
            description: "Executes a script file relative to the working directory \
                          (.go, .py, .sh, .js, .ts), with optional CLI arguments"
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "file_path": {
                        "type": "string",
                        "description": "Path of the file to execute, relative to the working directory"
                    },
                    "args": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Optional string arguments to pass to the file"
                    }
                },
                "required": ["file_path"]
            }),
        },
    ]
}

// ---------------------------------------------------------------------------
// Argument extraction
// ---------------------------------------------------------------------------

fn require_str<'a>(args: &'a Value, key: &'static str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or(ToolError::MissingArgument(key))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

/// Optional string array; non-string elements are skipped.
fn string_array(args: &Value, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|a| {
            a.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes function calls to the sandboxed tools, applying per-run policy.
pub struct Dispatcher {
    config: RunConfig,
    sink: Option<EventSink>,
}

impl Dispatcher {
    pub fn new(config: RunConfig, sink: Option<EventSink>) -> Self {
        Self { config, sink }
    }

    /// Execute one function call. Errors are folded into the result text
    /// so the model sees the failure and can adapt.
    pub async fn dispatch(&self, call: &ToolCallRequest) -> ToolCallResult {
        debug!(tool = %call.name, "dispatching function call");
        match self.execute(&call.name, &call.arguments).await {
            Ok(content) => ToolCallResult {
                tool_call_id: call.id.clone(),
                name: call.name.clone(),
                content,
                is_error: false,
            },
            Err(e) => {
                warn!(tool = %call.name, err = %e, "function call failed");
                ToolCallResult {
                    tool_call_id: call.id.clone(),
                    name: call.name.clone(),
                    content: format!("Error: {e}"),
                    is_error: true,
                }
            }
        }
    }

    async fn execute(&self, name: &str, args: &Value) -> Result<String, ToolError> {
        match name {
            "get_files_info" => {
                let directory = optional_str(args, "directory").unwrap_or(".");
                fs_tools::list_files(&self.config.root, directory).await
            }

            "get_file_content" => {
                let path = require_str(args, "file_path")?;
                fs_tools::read_file(&self.config.root, path).await
            }

            "write_file" => {
                let path = require_str(args, "file_path")?;
                let content = require_str(args, "content")?;

                if self.config.dry_run {
                    return Ok(format!(
                        "[dry run] would write {} bytes to {path}",
                        content.len()
                    ));
                }

                fs_tools::validate_write_extension(path)?;
                self.preview_overwrite(path, content).await;
                fs_tools::write_file(&self.config.root, path, content).await
            }

            "run_file" => {
                let path = require_str(args, "file_path")?;
                if !self.config.allow_run {
                    return Err(ToolError::PermissionDenied);
                }
                let run_args = string_array(args, "args");
                process::run_file(&self.config.root, path, &run_args).await
            }

            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    /// Surface a diff when an existing file is about to change, unless the
    /// run auto-applies. Never affects the write itself.
    async fn preview_overwrite(&self, path: &str, new_content: &str) {
        if self.config.auto_apply {
            return;
        }
        let Some(sink) = &self.sink else { return };

        if let Ok(old) = fs_tools::read_file(&self.config.root, path).await {
            if old != new_content {
                sink(RunEvent::WritePreview {
                    path: path.to_string(),
                    diff: render_diff(&old, new_content),
                });
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn root() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        (dir, root)
    }

    fn call(name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: "tc1".into(),
            name: name.into(),
            arguments,
        }
    }

    fn collector() -> (EventSink, Arc<Mutex<Vec<RunEvent>>>) {
        let events: Arc<Mutex<Vec<RunEvent>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = {
            let events = events.clone();
            Arc::new(move |e: RunEvent| events.lock().unwrap().push(e)) as EventSink
        };
        (sink, events)
    }

    #[test]
    fn schema_declares_four_operations() {
        let defs = tool_definitions();
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            ["get_files_info", "get_file_content", "write_file", "run_file"]
        );
        assert_eq!(
            defs[2].parameters["required"],
            json!(["file_path", "content"])
        );
        assert_eq!(defs[3].parameters["required"], json!(["file_path"]));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_textual_error() {
        let (_dir, root) = root();
        let dispatcher = Dispatcher::new(RunConfig::new(root), None);
        let result = dispatcher
            .dispatch(&call("delete_everything", json!({})))
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("unknown function"));
    }

    #[tokio::test]
    async fn missing_argument_fails_before_tool_logic() {
        let (_dir, root) = root();
        let dispatcher = Dispatcher::new(RunConfig::new(root), None);
        let result = dispatcher.dispatch(&call("get_file_content", json!({}))).await;
        assert!(result.is_error);
        assert!(result.content.contains("file_path"));
    }

    #[tokio::test]
    async fn wrongly_shaped_argument_is_missing() {
        let (_dir, root) = root();
        let dispatcher = Dispatcher::new(RunConfig::new(root), None);
        let result = dispatcher
            .dispatch(&call(
                "write_file",
                json!({"file_path": "a.txt", "content": 42}),
            ))
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("content"));
    }

    #[tokio::test]
    async fn write_and_read_round_trip() {
        let (_dir, root) = root();
        let dispatcher = Dispatcher::new(RunConfig::new(root), None);

        let write = dispatcher
            .dispatch(&call(
                "write_file",
                json!({"file_path": "notes.txt", "content": "hello"}),
            ))
            .await;
        assert!(!write.is_error, "{}", write.content);

        let read = dispatcher
            .dispatch(&call("get_file_content", json!({"file_path": "notes.txt"})))
            .await;
        assert_eq!(read.content, "hello");
    }

    #[tokio::test]
    async fn dry_run_reports_bytes_without_writing() {
        let (_dir, root) = root();
        let mut config = RunConfig::new(root.clone());
        config.dry_run = true;
        let dispatcher = Dispatcher::new(config, None);

        let result = dispatcher
            .dispatch(&call(
                "write_file",
                json!({"file_path": "out.txt", "content": "hello"}),
            ))
            .await;
        assert!(!result.is_error);
        assert!(result.content.contains("5 bytes"));
        assert!(!root.join("out.txt").exists());
    }

    #[tokio::test]
    async fn write_allow_list_is_enforced() {
        let (_dir, root) = root();
        let dispatcher = Dispatcher::new(RunConfig::new(root.clone()), None);
        let result = dispatcher
            .dispatch(&call(
                "write_file",
                json!({"file_path": "payload.exe", "content": "x"}),
            ))
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("not allowed"));
        assert!(!root.join("payload.exe").exists());
    }

    #[tokio::test]
    async fn run_file_requires_permission_before_resolution() {
        let (_dir, root) = root();
        let dispatcher = Dispatcher::new(RunConfig::new(root), None);
        // Even a traversal path reports the permission gate, not traversal:
        // the gate fires before the path is looked at.
        let result = dispatcher
            .dispatch(&call("run_file", json!({"file_path": "../evil.sh"})))
            .await;
        assert!(result.is_error);
        assert!(result.content.contains("not allowed"));
        assert!(!result.content.contains("traversal"));
    }

    #[tokio::test]
    async fn list_defaults_to_working_directory() {
        let (_dir, root) = root();
        std::fs::write(root.join("a.txt"), "abc").unwrap();
        let dispatcher = Dispatcher::new(RunConfig::new(root), None);
        let result = dispatcher.dispatch(&call("get_files_info", json!({}))).await;
        assert!(!result.is_error);
        assert!(result.content.contains("a.txt"));
    }

    #[tokio::test]
    async fn overwrite_emits_diff_preview() {
        let (_dir, root) = root();
        std::fs::write(root.join("a.txt"), "old\n").unwrap();
        let (sink, events) = collector();
        let dispatcher = Dispatcher::new(RunConfig::new(root), Some(sink));

        dispatcher
            .dispatch(&call(
                "write_file",
                json!({"file_path": "a.txt", "content": "new\n"}),
            ))
            .await;

        let events = events.lock().unwrap();
        let preview = events
            .iter()
            .find(|e| matches!(e, RunEvent::WritePreview { .. }));
        match preview {
            Some(RunEvent::WritePreview { path, diff }) => {
                assert_eq!(path, "a.txt");
                assert!(diff.contains("-old"));
                assert!(diff.contains("+new"));
            }
            _ => panic!("expected a WritePreview event"),
        }
    }

    #[tokio::test]
    async fn auto_apply_skips_diff_preview() {
        let (_dir, root) = root();
        std::fs::write(root.join("a.txt"), "old\n").unwrap();
        let (sink, events) = collector();
        let mut config = RunConfig::new(root.clone());
        config.auto_apply = true;
        let dispatcher = Dispatcher::new(config, Some(sink));

        dispatcher
            .dispatch(&call(
                "write_file",
                json!({"file_path": "a.txt", "content": "new\n"}),
            ))
            .await;

        assert!(events.lock().unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(root.join("a.txt")).unwrap(), "new\n");
    }

    #[tokio::test]
    async fn fresh_file_has_no_preview() {
        let (_dir, root) = root();
        let (sink, events) = collector();
        let dispatcher = Dispatcher::new(RunConfig::new(root), Some(sink));

        dispatcher
            .dispatch(&call(
                "write_file",
                json!({"file_path": "fresh.txt", "content": "hi"}),
            ))
            .await;

        assert!(events.lock().unwrap().is_empty());
    }
}
