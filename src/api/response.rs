//! JSON envelope shared by every `/api` route.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{AppError, Result};

#[derive(Serialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    pub meta: Meta,
}

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Error,
}

#[derive(Serialize)]
pub struct Meta {
    pub status: Outcome,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

pub fn success<T: Serialize>(data: T) -> Response {
    let envelope = Envelope {
        data: Some(data),
        meta: Meta {
            status: Outcome::Success,
            status_code: StatusCode::OK.as_u16(),
            timestamp: Utc::now(),
            message: None,
            error: None,
        },
    };
    (StatusCode::OK, Json(envelope)).into_response()
}

pub fn failure(err: &AppError) -> Response {
    let status = err.status_code();
    let envelope: Envelope<()> = Envelope {
        data: None,
        meta: Meta {
            status: Outcome::Error,
            status_code: status.as_u16(),
            timestamp: Utc::now(),
            message: Some(err.to_string()),
            error: Some(err.kind()),
        },
    };
    (status, Json(envelope)).into_response()
}

pub fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(data) => success(data),
        Err(err) => failure(&err),
    }
}
