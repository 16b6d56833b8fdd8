use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use protocol::validate::missing_fields_message;
use protocol::ErrorBody;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ProxyError {
    #[error("{}", missing_fields_message(.0))]
    Validation(Vec<&'static str>),
    #[error("No valid keywords provided")]
    NoKeywords,
    #[error("Backend analysis failed: {body}")]
    Backend { status: u16, body: String },
    #[error("{0}")]
    ProcessFailed(String),
    #[error("Failed to start analysis process")]
    ProcessSpawn(#[source] std::io::Error),
    #[error("No HTML report found in {}", .0.display())]
    ArtifactMissing(PathBuf),
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ProxyError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            ProxyError::Validation(_) | ProxyError::NoKeywords => StatusCode::BAD_REQUEST,
            ProxyError::Backend { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ProxyError::ProcessFailed(_)
            | ProxyError::ProcessSpawn(_)
            | ProxyError::ArtifactMissing(_)
            | ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ProxyError::Internal(err) => {
                tracing::error!(status = %status, error = %format!("{err:#}"), "request failed");
            }
            ProxyError::ProcessSpawn(err) => {
                tracing::error!(status = %status, error = %err, "analysis process did not start");
            }
            _ if status.is_client_error() => {
                tracing::warn!(status = %status, error = %self, "request rejected");
            }
            _ => {
                tracing::error!(status = %status, error = %self, "request failed");
            }
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}
