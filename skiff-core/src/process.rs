//! Process Tool
//!
//! Runs an allow-listed script file as a child process, confined to the
//! sandbox root and bounded by a hard wall-clock timeout.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::error::ToolError;
use crate::fs_tools::extension_of;
use crate::sandbox;

/// Extensions the agent is allowed to execute.
pub const EXEC_EXTENSIONS: &[&str] = &["go", "py", "sh", "js", "ts"];

/// Hard wall-clock limit for one script execution.
pub const RUN_TIMEOUT: Duration = Duration::from_secs(30);

/// One fixed interpreter per allowed extension.
fn interpreter_for(ext: &str) -> Option<(&'static str, &'static [&'static str])> {
    match ext {
        "go" => Some(("go", &["run"])),
        "py" => Some(("python3", &[])),
        "sh" => Some(("bash", &[])),
        "js" => Some(("node", &[])),
        "ts" => Some(("ts-node", &[])),
        _ => None,
    }
}

/// Execute `path` (relative to `root`) with `args` appended verbatim.
///
/// The child runs with `root` as its working directory. On success the
/// captured stdout is returned; a nonzero exit reports the interpreter's
/// stderr, and a child still running after [`RUN_TIMEOUT`] is killed.
pub async fn run_file(root: &Path, path: &str, args: &[String]) -> Result<String, ToolError> {
    run_with_timeout(root, path, args, RUN_TIMEOUT).await
}

async fn run_with_timeout(
    root: &Path,
    path: &str,
    args: &[String],
    timeout: Duration,
) -> Result<String, ToolError> {
    let abs = sandbox::resolve(root, path)?;

    let ext = extension_of(path).unwrap_or("");
    let (program, pre_args) = interpreter_for(ext).ok_or_else(|| ToolError::ExtensionNotAllowed {
        ext: if ext.is_empty() {
            "(none)".to_string()
        } else {
            format!(".{ext}")
        },
        allowed: EXEC_EXTENSIONS.join(", "),
    })?;

    debug!(path, program, ?args, "running file");

    let mut cmd = Command::new(program);
    cmd.args(pre_args)
        .arg(&abs)
        .args(args)
        .current_dir(root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        // a timed-out child is reaped when the wait future is dropped
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| ToolError::ExecutionFailed(format!("failed to launch {program}: {e}")))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Err(_) => return Err(ToolError::ExecutionTimeout(timeout.as_secs())),
        Ok(Err(e)) => return Err(ToolError::ExecutionFailed(e.to_string())),
        Ok(Ok(output)) => output,
    };

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = if stderr.trim().is_empty() {
            output.status.to_string()
        } else {
            stderr.trim().to_string()
        };
        Err(ToolError::ExecutionFailed(detail))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
