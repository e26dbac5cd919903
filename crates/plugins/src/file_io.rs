//! File I/O plugin — read, write, and list files inside a sandbox root.
//!
//! All paths are interpreted relative to the sandbox root; absolute paths
//! and `..` components are rejected before any filesystem call is made.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

use libreassistant_core::plugin::Plugin;
use libreassistant_core::PluginError;

pub struct FileIoPlugin {
    root: PathBuf,
}

impl FileIoPlugin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a model-supplied path against the sandbox root.
    fn resolve(&self, path: &str) -> Result<PathBuf, PluginError> {
        let candidate = Path::new(path);

        if path.trim().is_empty() {
            return Err(PluginError::InvalidInput("'path' must not be empty".into()));
        }
        if candidate.is_absolute() {
            return Err(PluginError::PermissionDenied {
                plugin_id: "file-io".into(),
                reason: format!("absolute paths are not allowed: {path}"),
            });
        }
        if candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(PluginError::PermissionDenied {
                plugin_id: "file-io".into(),
                reason: format!("path escapes the sandbox root: {path}"),
            });
        }

        Ok(self.root.join(candidate))
    }

    async fn read(&self, path: &str) -> Result<Value, PluginError> {
        let full = self.resolve(path)?;
        let content = tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| PluginError::ExecutionFailed {
                plugin_id: "file-io".into(),
                reason: format!("failed to read {path}: {e}"),
            })?;
        Ok(serde_json::json!({"path": path, "content": content}))
    }

    async fn write(&self, path: &str, content: &str) -> Result<Value, PluginError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PluginError::ExecutionFailed {
                    plugin_id: "file-io".into(),
                    reason: format!("failed to create directories for {path}: {e}"),
                })?;
        }
        tokio::fs::write(&full, content)
            .await
            .map_err(|e| PluginError::ExecutionFailed {
                plugin_id: "file-io".into(),
                reason: format!("failed to write {path}: {e}"),
            })?;
        debug!(path = %path, bytes = content.len(), "Wrote file in sandbox");
        Ok(serde_json::json!({"path": path, "bytes_written": content.len()}))
    }

    async fn list(&self, path: &str) -> Result<Value, PluginError> {
        let full = self.resolve(path)?;
        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&full)
            .await
            .map_err(|e| PluginError::ExecutionFailed {
                plugin_id: "file-io".into(),
                reason: format!("failed to list {path}: {e}"),
            })?;
        while let Some(entry) =
            dir.next_entry()
                .await
                .map_err(|e| PluginError::ExecutionFailed {
                    plugin_id: "file-io".into(),
                    reason: format!("failed to list {path}: {e}"),
                })?
        {
            entries.push(entry.file_name().to_string_lossy().into_owned());
        }
        entries.sort();
        Ok(serde_json::json!({"path": path, "entries": entries}))
    }
}

#[async_trait]
impl Plugin for FileIoPlugin {
    fn id(&self) -> &str {
        "file-io"
    }

    fn description(&self) -> &str {
        "Read, write, and list files inside the assistant's sandbox directory."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["read", "write", "list"],
                    "description": "Which file operation to perform"
                },
                "path": {
                    "type": "string",
                    "description": "Path relative to the sandbox root"
                },
                "content": {
                    "type": "string",
                    "description": "Content to write (write operation only)"
                }
            },
            "required": ["operation", "path"]
        })
    }

    fn input_example(&self) -> Value {
        serde_json::json!({"operation": "read", "path": "notes.txt"})
    }

    async fn execute(&self, input: Map<String, Value>) -> Result<Value, PluginError> {
        let operation = input
            .get("operation")
            .and_then(Value::as_str)
            .ok_or_else(|| PluginError::InvalidInput("Missing 'operation' field".into()))?;

        let path = input
            .get("path")
            .and_then(Value::as_str)
            .ok_or_else(|| PluginError::InvalidInput("Missing 'path' field".into()))?;

        match operation {
            "read" => self.read(path).await,
            "write" => {
                let content = input.get("content").and_then(Value::as_str).ok_or_else(|| {
                    PluginError::InvalidInput("Missing 'content' field for write".into())
                })?;
                self.write(path, content).await
            }
            "list" => self.list(path).await,
            other => Err(PluginError::InvalidInput(format!(
                "Unknown operation '{other}' (expected read, write, or list)"
            ))),
        }
    }
}
