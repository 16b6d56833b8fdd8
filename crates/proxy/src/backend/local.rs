use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use protocol::config::normalize;
use protocol::{AnalysisRequest, ReportKind};
use system_utils::path::expand_tilde;
use system_utils::process::{spawn_captured, wait_with_output};
use tokio::process::Command;

use super::{ReportArtifact, ReportBackend};
use crate::config::LocalProcessConfig;
use crate::error::ProxyError;

/// Runs the analysis script on this host and serves the newest HTML report it
/// leaves in `output_dir`.
pub(crate) struct LocalProcessBackend {
    command: Vec<String>,
    config_env: String,
    output_dir: PathBuf,
    working_dir: Option<PathBuf>,
    temp_dir: PathBuf,
    timeout: Option<Duration>,
    normalize_keywords: bool,
}

impl LocalProcessBackend {
    pub(crate) fn from_config(config: &LocalProcessConfig) -> Self {
        Self {
            command: config.command.clone(),
            config_env: config.config_env.clone(),
            output_dir: expand_tilde(&config.output_dir),
            working_dir: config.working_dir.as_ref().map(expand_tilde),
            temp_dir: config
                .temp_dir
                .as_ref()
                .map(expand_tilde)
                .unwrap_or_else(std::env::temp_dir),
            timeout: super::seconds(config.timeout_secs),
            normalize_keywords: config.normalize_keywords,
        }
    }

    fn config_contents(&self, payload: &Bytes) -> Result<Vec<u8>, ProxyError> {
        if !self.normalize_keywords {
            return Ok(payload.to_vec());
        }
        let request: AnalysisRequest =
            serde_json::from_slice(payload).context("failed to decode analysis request")?;
        let config = normalize(&request).ok_or(ProxyError::NoKeywords)?;
        let contents =
            serde_json::to_vec_pretty(&config).context("failed to encode analysis config")?;
        Ok(contents)
    }

    async fn run(&self, config_path: &Path) -> Result<ReportArtifact, ProxyError> {
        let (program, args) = self
            .command
            .split_first()
            .context("local_process command is empty")?;
        let mut cmd = Command::new(program);
        cmd.args(args).env(&self.config_env, config_path);
        if let Some(dir) = self.working_dir.as_ref() {
            cmd.current_dir(dir);
        }

        tracing::info!(
            program = %program,
            config = %config_path.display(),
            "starting analysis process"
        );
        let child = spawn_captured(&mut cmd).map_err(ProxyError::ProcessSpawn)?;
        let output = wait_with_output(child, self.timeout, "analysis process")
            .await
            .map_err(|err| ProxyError::ProcessFailed(format!("{err:#}")))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !stdout.trim().is_empty() {
            tracing::debug!(stdout = %stdout.trim(), "analysis process output");
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("analysis process exited with {}", output.status)
            } else {
                stderr
            };
            return Err(ProxyError::ProcessFailed(message));
        }

        let report = latest_html_report(&self.output_dir)
            .await?
            .ok_or_else(|| ProxyError::ArtifactMissing(self.output_dir.clone()))?;
        let body = tokio::fs::read(&report)
            .await
            .with_context(|| format!("failed to read report {}", report.display()))?;
        let filename = report
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| ReportKind::Html.default_filename().to_string());
        tracing::info!(report = %report.display(), bytes = body.len(), "analysis report found");
        Ok(ReportArtifact::new(body, ReportKind::Html).with_filename(filename))
    }

    fn temp_config_path(&self) -> PathBuf {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        self.temp_dir
            .join(format!("localranklens-config-{millis}-{}.json", &suffix[..8]))
    }
}

#[async_trait]
impl ReportBackend for LocalProcessBackend {
    fn name(&self) -> &'static str {
        "local_process"
    }

    async fn generate(&self, payload: Bytes) -> Result<ReportArtifact, ProxyError> {
        let contents = self.config_contents(&payload)?;
        let config_path = self.temp_config_path();
        tokio::fs::write(&config_path, &contents)
            .await
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        let config = TempConfig(config_path);
        self.run(&config.0).await
    }
}

/// Removes the temporary config when dropped, including when the request
/// future is cancelled mid-run.
struct TempConfig(PathBuf);

impl Drop for TempConfig {
    fn drop(&mut self) {
        if let Err(err) = std::fs::remove_file(&self.0) {
            tracing::warn!(
                path = %self.0.display(),
                error = %err,
                "failed to remove temporary config"
            );
        }
    }
}

/// Most recently modified `*.html` file directly inside `dir`.
async fn latest_html_report(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to list {}", dir.display()));
        }
    };
    let mut latest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed to list {}", dir.display()))?
    {
        let path = entry.path();
        let is_html = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("html"))
            .unwrap_or(false);
        if !is_html {
            continue;
        }
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let modified = metadata.modified()?;
        if latest
            .as_ref()
            .map(|(seen, _)| modified > *seen)
            .unwrap_or(true)
        {
            latest = Some((modified, path));
        }
    }
    Ok(latest.map(|(_, path)| path))
}
