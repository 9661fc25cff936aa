//! The UI controller: one request slot per action, each with its own lifecycle.
//!
//! Sending an action again aborts the request still in flight for that action,
//! and a completion only reaches the display while its generation is current,
//! so what is shown is always the answer to the last request sent. Callers of
//! a superseded request get [`AppError::Cancelled`], even when their request
//! had already finished.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::AbortHandle;
use tracing::{info, warn};

use crate::backend::BackendClient;
use crate::error::{AppError, Result};
use crate::models::{RecordingCommand, SearchQuery, SearchResult, SummarizeRequest, Upload};

pub const MISSING_FILE_MESSAGE: &str = "Please select a file.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Record,
    Stop,
    Summarize,
    Search,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Record, Action::Stop, Action::Summarize, Action::Search];

    pub fn name(self) -> &'static str {
        match self {
            Action::Record => "record",
            Action::Stop => "stop",
            Action::Summarize => "summarize",
            Action::Search => "search",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Pending {
        since: DateTime<Utc>,
    },
    Succeeded {
        at: DateTime<Utc>,
    },
    Failed {
        at: DateTime<Utc>,
        message: String,
    },
}

impl RequestState {
    pub fn name(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Pending { .. } => "pending",
            RequestState::Succeeded { .. } => "succeeded",
            RequestState::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionStatus {
    pub action: Action,
    #[serde(flatten)]
    pub state: RequestState,
}

/// Snapshot of everything the console shows.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsoleView {
    pub alert: Option<String>,
    pub summary: Option<String>,
    pub search_results: Vec<SearchResult>,
    pub requests: Vec<ActionStatus>,
}

impl ConsoleView {
    pub fn state_of(&self, action: Action) -> Option<&RequestState> {
        self.requests
            .iter()
            .find(|status| status.action == action)
            .map(|status| &status.state)
    }
}

#[derive(Default)]
struct Slot {
    generation: u64,
    in_flight: Option<AbortHandle>,
    state: RequestState,
}

#[derive(Default)]
struct Display {
    alert: Option<String>,
    summary: Option<String>,
    search_results: Vec<SearchResult>,
    slots: [Slot; 4],
}

impl Display {
    fn snapshot(&self, alert: Option<String>) -> ConsoleView {
        ConsoleView {
            alert,
            summary: self.summary.clone(),
            search_results: self.search_results.clone(),
            requests: Action::ALL
                .iter()
                .map(|&action| ActionStatus {
                    action,
                    state: self.slots[action.index()].state.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Clone)]
pub struct UiController {
    client: BackendClient,
    display: Arc<Mutex<Display>>,
}

impl UiController {
    pub fn new(client: BackendClient) -> Self {
        UiController {
            client,
            display: Arc::new(Mutex::new(Display::default())),
        }
    }

    pub async fn start_recording(&self) -> Result<String> {
        self.send_recording_command(RecordingCommand::Start).await
    }

    pub async fn stop_recording(&self) -> Result<String> {
        self.send_recording_command(RecordingCommand::Stop).await
    }

    async fn send_recording_command(&self, command: RecordingCommand) -> Result<String> {
        let action = match command {
            RecordingCommand::Start => Action::Record,
            RecordingCommand::Stop => Action::Stop,
        };
        let client = self.client.clone();
        self.dispatch(
            action,
            async move { client.send_recording_command(command).await },
            |display, message| display.alert = Some(message.clone()),
        )
        .await
    }

    /// Summarizes a selected file. Without one, the alert is raised and no
    /// request is sent; a summarize already in flight is left alone.
    pub async fn summarize_file(&self, upload: Option<Upload>) -> Result<String> {
        let Some(upload) = upload else {
            warn!("summarize requested without a file");
            lock(&self.display).alert = Some(MISSING_FILE_MESSAGE.to_string());
            return Err(AppError::Validation(MISSING_FILE_MESSAGE.to_string()));
        };
        self.summarize(SummarizeRequest::File(upload)).await
    }

    pub async fn summarize_text(&self, text: impl Into<String>) -> Result<String> {
        self.summarize(SummarizeRequest::Text(text.into())).await
    }

    pub async fn summarize(&self, request: SummarizeRequest) -> Result<String> {
        let client = self.client.clone();
        self.dispatch(
            Action::Summarize,
            async move { client.summarize(&request).await },
            |display, summary| display.summary = Some(summary.clone()),
        )
        .await
    }

    pub async fn search(&self, query: impl Into<String>) -> Result<Vec<SearchResult>> {
        let query = SearchQuery::new(query);
        let client = self.client.clone();
        self.dispatch(
            Action::Search,
            async move { client.search(&query).await },
            |display, results| display.search_results = results.clone(),
        )
        .await
    }

    pub fn view(&self) -> ConsoleView {
        let display = lock(&self.display);
        display.snapshot(display.alert.clone())
    }

    /// Like [`view`](Self::view), but the alert is consumed: it is shown once.
    pub fn take_view(&self) -> ConsoleView {
        let mut display = lock(&self.display);
        let alert = display.alert.take();
        display.snapshot(alert)
    }

    async fn dispatch<T, F>(&self, action: Action, request: F, apply: fn(&mut Display, &T)) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (generation, handle) = {
            let mut display = lock(&self.display);
            let slot = &mut display.slots[action.index()];
            slot.generation += 1;
            let generation = slot.generation;
            if let Some(previous) = slot.in_flight.take() {
                info!(action = action.name(), "aborting superseded request");
                previous.abort();
            }
            slot.state = RequestState::Pending { since: Utc::now() };
            info!(action = action.name(), generation, "request dispatched");

            let shared = Arc::clone(&self.display);
            // The lock is held until the abort handle is stored, so the task
            // cannot complete before its slot knows about it.
            let handle = tokio::spawn(async move {
                let outcome = request.await;
                complete(&shared, action, generation, &outcome, apply);
                outcome
            });
            slot.in_flight = Some(handle.abort_handle());
            (generation, handle)
        };

        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_cancelled() => return Err(AppError::Cancelled),
            Err(err) => std::panic::resume_unwind(err.into_panic()),
        };

        // A newer request may have been sent after this one finished but
        // before its caller resumed; the abort then had nothing to stop.
        if lock(&self.display).slots[action.index()].generation != generation {
            info!(action = action.name(), generation, "completed request was superseded");
            return Err(AppError::Cancelled);
        }
        outcome
    }

    /// Raises `err` as the alert without touching any request slot.
    pub fn report(&self, err: &AppError) {
        warn!(error = %err, "reporting error on the console");
        lock(&self.display).alert = Some(err.to_string());
    }
}

fn complete<T>(
    display: &Mutex<Display>,
    action: Action,
    generation: u64,
    outcome: &Result<T>,
    apply: fn(&mut Display, &T),
) {
    let mut display = lock(display);
    let slot = &mut display.slots[action.index()];
    if slot.generation != generation {
        info!(action = action.name(), generation, "discarding stale response");
        return;
    }
    slot.in_flight = None;

    match outcome {
        Ok(value) => {
            slot.state = RequestState::Succeeded { at: Utc::now() };
            apply(&mut display, value);
            info!(action = action.name(), generation, "request succeeded");
        }
        Err(err) => {
            let message = err.to_string();
            warn!(action = action.name(), generation, error = %message, "request failed");
            slot.state = RequestState::Failed {
                at: Utc::now(),
                message: message.clone(),
            };
            display.alert = Some(message);
        }
    }
}

fn lock(display: &Mutex<Display>) -> MutexGuard<'_, Display> {
    display.lock().unwrap_or_else(PoisonError::into_inner)
}
