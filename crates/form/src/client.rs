use anyhow::Context;
use protocol::{parse_content_disposition, AnalysisRequest, ErrorBody, ReportKind, ANALYZE_PATH};
use reqwest::header::{HeaderMap, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Client;
use std::path::{Path, PathBuf};

/// Writes the payload as pretty JSON, the file a user would hand to a local
/// analysis run.
pub fn export_request(request: &AnalysisRequest, path: &Path) -> anyhow::Result<()> {
    let raw = serde_json::to_string_pretty(request).context("failed to encode request")?;
    std::fs::write(path, raw).with_context(|| format!("failed to write {}", path.display()))
}

/// A report returned by the proxy.
#[derive(Debug)]
pub struct DownloadedReport {
    pub filename: String,
    pub kind: Option<ReportKind>,
    pub body: Vec<u8>,
}

impl DownloadedReport {
    /// Saves under `dir`, keeping only the last component of the suggested
    /// filename.
    pub fn save_into(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        let name = Path::new(&self.filename)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| default_filename(self.kind).to_string());
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(name);
        std::fs::write(&path, &self.body)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

pub async fn submit_request(
    proxy: &str,
    request: &AnalysisRequest,
) -> anyhow::Result<DownloadedReport> {
    let url = format!("{}{}", proxy.trim_end_matches('/'), ANALYZE_PATH);
    let response = Client::new()
        .post(&url)
        .json(request)
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;
    let status = response.status();
    if !status.is_success() {
        let raw = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&raw)
            .map(|body| body.error)
            .unwrap_or(raw);
        anyhow::bail!("analysis failed ({status}): {message}");
    }
    let kind = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(ReportKind::from_content_type);
    let filename = filename_from_headers(response.headers())
        .unwrap_or_else(|| default_filename(kind).to_string());
    let body = response
        .bytes()
        .await
        .context("failed to read report body")?
        .to_vec();
    Ok(DownloadedReport {
        filename,
        kind,
        body,
    })
}

fn filename_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_content_disposition)
}

fn default_filename(kind: Option<ReportKind>) -> &'static str {
    kind.unwrap_or(ReportKind::Html).default_filename()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_dir;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use protocol::{Keywords, Location};
    use serde_json::json;
    use std::collections::BTreeMap;
    use tokio::net::TcpListener;

    fn request() -> AnalysisRequest {
        AnalysisRequest {
            business_name: "Revive Irrigation".to_string(),
            location: Location {
                city: "Spokane".to_string(),
                state: "WA".to_string(),
            },
            keywords: Keywords::Grouped(BTreeMap::from([(
                "core".to_string(),
                vec!["sprinkler repair Spokane".to_string()],
            )])),
            output_prefix: Some("revive-irrigation".to_string()),
        }
    }

    async fn spawn_proxy(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn submit_downloads_report_with_suggested_name() {
        let router = Router::new().route(
            ANALYZE_PATH,
            post(|Json(body): Json<serde_json::Value>| async move {
                let html = format!("<h1>{}</h1>", body["business_name"].as_str().unwrap_or(""));
                (
                    [
                        ("content-type", "text/html"),
                        (
                            "content-disposition",
                            "attachment; filename=\"revive_report.html\"",
                        ),
                    ],
                    html,
                )
            }),
        );
        let proxy = spawn_proxy(router).await;
        let report = submit_request(&proxy, &request()).await.expect("report");
        assert_eq!(report.filename, "revive_report.html");
        assert_eq!(report.kind, Some(ReportKind::Html));
        assert_eq!(report.body, b"<h1>Revive Irrigation</h1>");

        let dir = temp_dir("lrl-client-save");
        let saved = report.save_into(&dir).expect("save");
        assert_eq!(saved, dir.join("revive_report.html"));
    }

    #[tokio::test]
    async fn submit_surfaces_proxy_error_message() {
        let router = Router::new().route(
            ANALYZE_PATH,
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Missing required fields: location.city"})),
                )
            }),
        );
        let proxy = spawn_proxy(router).await;
        let err = submit_request(&proxy, &request())
            .await
            .expect_err("proxy error");
        let message = err.to_string();
        assert!(message.contains("400"), "{message}");
        assert!(message.contains("Missing required fields: location.city"), "{message}");
    }

    #[test]
    fn save_strips_directories_from_filename() {
        let report = DownloadedReport {
            filename: "../../etc/report.pdf".to_string(),
            kind: Some(ReportKind::Pdf),
            body: b"%PDF".to_vec(),
        };
        let dir = temp_dir("lrl-client-strip");
        let saved = report.save_into(&dir).expect("save");
        assert_eq!(saved, dir.join("report.pdf"));
    }

    #[test]
    fn export_writes_pretty_json() {
        let dir = temp_dir("lrl-client-export");
        let path = dir.join("config.json");
        export_request(&request(), &path).expect("export");
        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.contains("\n  \"business_name\": \"Revive Irrigation\""));
        let decoded: AnalysisRequest = serde_json::from_str(&raw).expect("decode");
        assert_eq!(decoded, request());
    }
}
