use serde::{Deserialize, Serialize};

use crate::models::SearchResult;

#[derive(Deserialize)]
pub struct SummarizeTextRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
}

#[derive(Serialize)]
pub struct RecordingResponse {
    pub message: String,
}

#[derive(Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchResult>,
}
