use reqwest::multipart::{Form, Part};
use reqwest::{Client, ClientBuilder, Response, Url};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    parse_summary, RecordingCommand, SearchQuery, SearchResult, SummarizeRequest, TextPayload,
};

/// HTTP client for the meeting backend. Cloning shares the connection pool.
#[derive(Clone, Debug)]
pub struct BackendClient {
    http: Client,
    record_url: Url,
    stop_url: Url,
    search_url: Url,
    summarize_url: Url,
}

impl BackendClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = ClientBuilder::new()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(BackendClient {
            http,
            record_url: config.endpoint(RecordingCommand::Start.path())?,
            stop_url: config.endpoint(RecordingCommand::Stop.path())?,
            search_url: config.endpoint("search")?,
            summarize_url: config.summarize_url.clone(),
        })
    }

    /// POSTs an empty body and returns the response body verbatim.
    pub async fn send_recording_command(&self, command: RecordingCommand) -> Result<String> {
        let url = match command {
            RecordingCommand::Start => &self.record_url,
            RecordingCommand::Stop => &self.stop_url,
        };
        debug!(%url, ?command, "sending recording command");

        let res = self.http.post(url.clone()).send().await?;
        let res = ensure_success(res).await?;
        Ok(res.text().await?)
    }

    pub async fn summarize(&self, request: &SummarizeRequest) -> Result<String> {
        let builder = self.http.post(self.summarize_url.clone());
        let builder = match request {
            SummarizeRequest::File(upload) => {
                debug!(file = %upload.file_name, size = upload.bytes.len(), "summarizing file");
                let mut part = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
                if let Some(content_type) = &upload.content_type {
                    part = part.mime_str(content_type).map_err(|e| {
                        AppError::Validation(format!("Invalid content type {}: {}", content_type, e))
                    })?;
                }
                builder.multipart(Form::new().part("file", part))
            }
            SummarizeRequest::Text(text) => {
                debug!(chars = text.len(), "summarizing text");
                builder.json(&TextPayload { text })
            }
        };

        let res = ensure_success(builder.send().await?).await?;
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = res.text().await?;
        parse_summary(content_type.as_deref(), &body)
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        debug!(query = query.as_str(), "searching");
        let res = self
            .http
            .get(self.search_url.clone())
            .query(&[("query", query.as_str())])
            .send()
            .await?;
        let res = ensure_success(res).await?;
        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

async fn ensure_success(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %body, "backend answered with an error status");
    Err(AppError::Status {
        status: status.as_u16(),
        body,
    })
}
