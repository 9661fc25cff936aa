pub mod api;
pub mod backend;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod render;

use std::sync::Arc;

use backend::BackendClient;
use config::Config;
use controller::UiController;
use error::Result;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub controller: UiController,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        let client = BackendClient::new(&config)?;
        Ok(AppState {
            config: Arc::new(config),
            controller: UiController::new(client),
        })
    }
}
