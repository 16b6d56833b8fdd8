mod local;
mod remote;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use protocol::{content_disposition, ReportKind};

use crate::config::BackendConfig;
use crate::error::ProxyError;

pub(crate) use local::LocalProcessBackend;
pub(crate) use remote::{RemoteHtmlBackend, RemotePdfBackend};

const HTML_ORIGIN_ENV: &str = "HEROKU_BACKEND_URL";

/// Report bytes produced by a backend, relayed to the caller untouched.
#[derive(Debug, Clone)]
pub(crate) struct ReportArtifact {
    pub(crate) body: Bytes,
    pub(crate) kind: ReportKind,
    pub(crate) filename: String,
}

impl ReportArtifact {
    pub(crate) fn new(body: impl Into<Bytes>, kind: ReportKind) -> Self {
        Self {
            body: body.into(),
            kind,
            filename: kind.default_filename().to_string(),
        }
    }

    pub(crate) fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }
}

impl IntoResponse for ReportArtifact {
    fn into_response(self) -> Response {
        (
            [
                (CONTENT_TYPE, self.kind.content_type().to_string()),
                (CONTENT_DISPOSITION, content_disposition(&self.filename)),
            ],
            self.body,
        )
            .into_response()
    }
}

#[async_trait]
pub(crate) trait ReportBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs one analysis for an already validated JSON payload.
    async fn generate(&self, payload: Bytes) -> Result<ReportArtifact, ProxyError>;
}

/// Builds the single backend this deployment dispatches to.
///
/// `env` resolves environment overrides so callers can substitute it in tests.
pub(crate) fn build_backend<F>(config: &BackendConfig, env: F) -> anyhow::Result<Arc<dyn ReportBackend>>
where
    F: Fn(&str) -> Option<String>,
{
    let backend: Arc<dyn ReportBackend> = match config {
        BackendConfig::RemoteHtml {
            origin,
            timeout_secs,
        } => {
            let origin = resolve_html_origin(origin.as_deref(), env);
            Arc::new(RemoteHtmlBackend::new(&origin, seconds(*timeout_secs))?)
        }
        BackendConfig::RemotePdf { timeout_secs } => {
            Arc::new(RemotePdfBackend::new(seconds(*timeout_secs))?)
        }
        BackendConfig::LocalProcess(local) => Arc::new(LocalProcessBackend::from_config(local)),
    };
    Ok(backend)
}

/// The environment wins over the config file, which wins over the fallback.
fn resolve_html_origin<F>(configured: Option<&str>, env: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    env(HTML_ORIGIN_ENV)
        .filter(|value| !value.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| remote::DEFAULT_HTML_ORIGIN.to_string())
}

fn seconds(value: Option<u64>) -> Option<Duration> {
    value.filter(|secs| *secs > 0).map(Duration::from_secs)
}
