use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::html::render_html;
use crate::config::DocumentsConfig;
use crate::core::{AppError, Result};
use crate::modules::documents::models::DocumentContext;

/// External document generation
///
/// Implementations write the document to `output` and return the path written.
#[async_trait]
pub trait DocumentRenderer: Send + Sync {
    async fn render(&self, context: &DocumentContext, output: &Path) -> Result<PathBuf>;
}

/// Renders HTML and converts it with the `wkhtmltopdf` binary
#[derive(Debug, Clone)]
pub struct WkhtmltopdfRenderer {
    command: String,
    timeout: Duration,
}

impl WkhtmltopdfRenderer {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn from_config(config: &DocumentsConfig) -> Self {
        Self::new(config.wkhtmltopdf_cmd.clone(), config.render_timeout)
    }

    async fn convert(&self, html_path: &Path, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.command);
        cmd.arg("--quiet")
            .arg(html_path)
            .arg(output)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            program = %self.command,
            output = %output.display(),
            timeout_secs = self.timeout.as_secs(),
            "Executing renderer"
        );

        let result = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                AppError::render(format!(
                    "Renderer timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::render(format!("Failed to start {}: {}", self.command, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            tracing::error!(program = %self.command, stderr = %stderr, "Renderer failed");
            return Err(AppError::render(format!("Renderer failed: {}", stderr.trim())));
        }

        Ok(())
    }
}

#[async_trait]
impl DocumentRenderer for WkhtmltopdfRenderer {
    async fn render(&self, context: &DocumentContext, output: &Path) -> Result<PathBuf> {
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::render(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }

        let html_path = output.with_extension("html");
        tokio::fs::write(&html_path, render_html(context))
            .await
            .map_err(|e| AppError::render(format!("Cannot write {}: {}", html_path.display(), e)))?;

        let converted = self.convert(&html_path, output).await;

        if let Err(e) = tokio::fs::remove_file(&html_path).await {
            tracing::debug!(error = %e, path = %html_path.display(), "Could not remove intermediate HTML");
        }
        converted?;

        tracing::info!(
            kind = %context.kind(),
            path = %output.display(),
            "Document rendered"
        );
        Ok(output.to_path_buf())
    }
}
