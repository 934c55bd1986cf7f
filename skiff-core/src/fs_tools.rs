//! File Tools
//!
//! Directory listing, file reading, and file writing inside the sandbox
//! root. A shared size cap bounds both reads and writes.

use std::path::Path;

use tracing::debug;

use crate::error::ToolError;
use crate::sandbox;

/// Maximum size in bytes for a file read or a file write.
pub const MAX_FILE_SIZE: u64 = 100_000;

/// Extensions the agent is allowed to write. Independent of the execute
/// allow-list in [`crate::process`]; the two overlap but are not equal.
pub const WRITE_EXTENSIONS: &[&str] = &[
    "go", "py", "sh", "js", "ts", "md", "txt", "json", "yaml", "yml", "toml", "env",
];

/// Extension of `path`, taken after the last `.` of the file name. Unlike
/// `Path::extension`, a leading-dot name such as `.env` yields `env`.
pub(crate) fn extension_of(path: &str) -> Option<&str> {
    let name = Path::new(path).file_name()?.to_str()?;
    name.rfind('.').map(|i| &name[i + 1..])
}

/// Check `path` against the write allow-list.
pub fn validate_write_extension(path: &str) -> Result<(), ToolError> {
    match extension_of(path) {
        Some(ext) if WRITE_EXTENSIONS.contains(&ext) => Ok(()),
        other => Err(ToolError::ExtensionNotAllowed {
            ext: other.map_or_else(|| "(none)".to_string(), |e| format!(".{e}")),
            allowed: WRITE_EXTENSIONS.join(", "),
        }),
    }
}

/// List the immediate entries of `directory` (relative to `root`),
/// one line per entry, sorted by name.
pub async fn list_files(root: &Path, directory: &str) -> Result<String, ToolError> {
    let directory = if directory.is_empty() { "." } else { directory };
    let abs = sandbox::resolve(root, directory)?;

    let mut entries = tokio::fs::read_dir(&abs).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound(directory.to_string())
        } else {
            ToolError::Io(e)
        }
    })?;

    let mut rows: Vec<(String, u64, bool)> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        rows.push((
            entry.file_name().to_string_lossy().into_owned(),
            meta.len(),
            meta.is_dir(),
        ));
    }
    rows.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = String::new();
    for (name, size, is_dir) in rows {
        out.push_str(&format!(
            "- {name}: file_size={size} bytes, is_dir={is_dir}\n"
        ));
    }
    Ok(out)
}

/// Read the full contents of `path` (relative to `root`) as text.
pub async fn read_file(root: &Path, path: &str) -> Result<String, ToolError> {
    let abs = sandbox::resolve(root, path)?;

    let meta = tokio::fs::metadata(&abs)
        .await
        .map_err(|_| ToolError::NotFound(path.to_string()))?;
    if meta.is_dir() {
        return Err(ToolError::IsADirectory(path.to_string()));
    }
    if meta.len() > MAX_FILE_SIZE {
        return Err(ToolError::TooLarge {
            what: "file",
            size: meta.len(),
            max: MAX_FILE_SIZE,
        });
    }

    let bytes = tokio::fs::read(&abs).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write `content` to `path` (relative to `root`), creating missing parent
/// directories and unconditionally overwriting an existing file.
pub async fn write_file(root: &Path, path: &str, content: &str) -> Result<String, ToolError> {
    if content.len() as u64 > MAX_FILE_SIZE {
        return Err(ToolError::TooLarge {
            what: "content",
            size: content.len() as u64,
            max: MAX_FILE_SIZE,
        });
    }

    let abs = sandbox::resolve(root, path)?;
    if let Some(parent) = abs.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&abs, content).await?;

    debug!(path, bytes = content.len(), "wrote file");
    Ok(format!(
        "File {path} written successfully ({} bytes)",
        content.len()
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
