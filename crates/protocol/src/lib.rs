use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod config;
pub mod validate;

pub const ANALYZE_PATH: &str = "/api/analyze";
pub const CONFIG_PATH: &str = "/api/config";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub city: String,
    pub state: String,
}

/// Keyword payload as sent by the different clients.
///
/// The form sends named groups; the hosted backend historically accepted a
/// newline-joined textarea string. Both are forwarded as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Keywords {
    Grouped(BTreeMap<String, Vec<String>>),
    Flat(String),
}

impl Keywords {
    /// Every keyword in order, trimmed, with blanks dropped.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Keywords::Grouped(groups) => groups
                .values()
                .flatten()
                .map(|keyword| keyword.trim())
                .filter(|keyword| !keyword.is_empty())
                .map(str::to_string)
                .collect(),
            Keywords::Flat(text) => text
                .split('\n')
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

impl Default for Keywords {
    fn default() -> Self {
        Keywords::Grouped(BTreeMap::new())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub business_name: String,
    pub location: Location,
    pub keywords: Keywords,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_prefix: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Html,
    Pdf,
}

impl ReportKind {
    pub fn content_type(self) -> &'static str {
        match self {
            ReportKind::Html => "text/html",
            ReportKind::Pdf => "application/pdf",
        }
    }

    pub fn default_filename(self) -> &'static str {
        match self {
            ReportKind::Html => "localranklens-report.html",
            ReportKind::Pdf => "localranklens-report.pdf",
        }
    }

    pub fn from_content_type(value: &str) -> Option<Self> {
        let essence = value.split(';').next().unwrap_or("").trim();
        match essence {
            "text/html" => Some(ReportKind::Html),
            "application/pdf" => Some(ReportKind::Pdf),
            _ => None,
        }
    }
}

/// JSON body of every non-success proxy response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

pub fn content_disposition(filename: &str) -> String {
    let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
    format!("attachment; filename=\"{escaped}\"")
}

/// Extracts the filename from an `attachment; filename="..."` header value.
pub fn parse_content_disposition(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        let raw = part.strip_prefix("filename=")?;
        let name = raw
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
            .map(|inner| inner.replace("\\\"", "\"").replace("\\\\", "\\"))
            .unwrap_or_else(|| raw.to_string());
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    })
}
