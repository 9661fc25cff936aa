//! Request-scoped values exchanged with the meeting backend. Nothing here
//! outlives a single request/response cycle.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const NO_SUMMARY_PLACEHOLDER: &str = "No summary returned.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingCommand {
    Start,
    Stop,
}

impl RecordingCommand {
    pub fn path(self) -> &'static str {
        match self {
            RecordingCommand::Start => "record",
            RecordingCommand::Stop => "stop",
        }
    }
}

/// A user-selected file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Upload {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Both ways of asking for a summary go to the same endpoint.
#[derive(Debug, Clone)]
pub enum SummarizeRequest {
    /// Sent as multipart form data under the field `file`.
    File(Upload),
    /// Sent as JSON `{"text": ...}`.
    Text(String),
}

#[derive(Serialize)]
pub(crate) struct TextPayload<'a> {
    pub text: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeResponse {
    #[serde(default)]
    pub summary: Option<String>,
}

impl SummarizeResponse {
    pub fn into_summary(self) -> String {
        self.summary
            .unwrap_or_else(|| NO_SUMMARY_PLACEHOLDER.to_string())
    }
}

/// Interprets a summarize answer. JSON bodies are either a bare string or an
/// object with an optional `summary`; anything else is taken as plain text.
pub fn parse_summary(content_type: Option<&str>, body: &str) -> Result<String> {
    let is_json = content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim())
        .is_some_and(|mime| mime == "application/json" || mime.ends_with("+json"));
    if !is_json {
        return Ok(body.to_string());
    }

    match serde_json::from_str::<serde_json::Value>(body)? {
        serde_json::Value::String(summary) => Ok(summary),
        value @ serde_json::Value::Object(_) => {
            Ok(serde_json::from_value::<SummarizeResponse>(value)?.into_summary())
        }
        other => Err(AppError::ParseError(format!(
            "Expected a summary string or object, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(pub String);

impl SearchQuery {
    pub fn new(query: impl Into<String>) -> Self {
        SearchQuery(query.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub date: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}
