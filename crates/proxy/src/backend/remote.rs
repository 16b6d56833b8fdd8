use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use protocol::{ReportKind, ANALYZE_PATH};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;

use super::{ReportArtifact, ReportBackend};
use crate::error::ProxyError;

pub(super) const DEFAULT_HTML_ORIGIN: &str = "https://your-app-name.herokuapp.com";
const PDF_ORIGIN: &str = "https://localranklens-api.herokuapp.com";

/// POSTs payloads to `{origin}/api/analyze` and hands back the raw body.
struct AnalyzeEndpoint {
    client: Client,
    url: String,
}

impl AnalyzeEndpoint {
    fn new(origin: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build http client")?;
        Ok(Self {
            client,
            url: format!("{}{}", origin.trim_end_matches('/'), ANALYZE_PATH),
        })
    }

    async fn post(&self, payload: Bytes) -> Result<Bytes, ProxyError> {
        tracing::debug!(url = %self.url, bytes = payload.len(), "forwarding analysis request");
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.url))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProxyError::Backend {
                status: status.as_u16(),
                body,
            });
        }
        let body = response
            .bytes()
            .await
            .with_context(|| format!("failed to read response from {}", self.url))?;
        Ok(body)
    }
}

/// Hosted backend that answers with an HTML report. Origin comes from config.
pub(crate) struct RemoteHtmlBackend {
    endpoint: AnalyzeEndpoint,
}

impl RemoteHtmlBackend {
    pub(crate) fn new(origin: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint: AnalyzeEndpoint::new(origin, timeout)?,
        })
    }
}

#[async_trait]
impl ReportBackend for RemoteHtmlBackend {
    fn name(&self) -> &'static str {
        "remote_html"
    }

    async fn generate(&self, payload: Bytes) -> Result<ReportArtifact, ProxyError> {
        let body = self.endpoint.post(payload).await?;
        Ok(ReportArtifact::new(body, ReportKind::Html))
    }
}

/// Hosted backend that answers with a binary PDF. The origin is fixed.
pub(crate) struct RemotePdfBackend {
    endpoint: AnalyzeEndpoint,
}

impl RemotePdfBackend {
    pub(crate) fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        Self::at_origin(PDF_ORIGIN, timeout)
    }

    fn at_origin(origin: &str, timeout: Option<Duration>) -> anyhow::Result<Self> {
        Ok(Self {
            endpoint: AnalyzeEndpoint::new(origin, timeout)?,
        })
    }
}

#[async_trait]
impl ReportBackend for RemotePdfBackend {
    fn name(&self) -> &'static str {
        "remote_pdf"
    }

    async fn generate(&self, payload: Bytes) -> Result<ReportArtifact, ProxyError> {
        let body = self.endpoint.post(payload).await?;
        Ok(ReportArtifact::new(body, ReportKind::Pdf))
    }
}
