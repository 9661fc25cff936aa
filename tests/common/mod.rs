#![allow(dead_code)]

use std::env::VarError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::Router;
use meeting_console::backend::BackendClient;
use meeting_console::config::Config;
use meeting_console::controller::UiController;
use tokio::net::TcpListener;

/// Serves `router` on an ephemeral port and returns its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock backend");
    });
    format!("http://{}/", addr)
}

/// A base URL nothing is listening on.
pub async fn dead_backend_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}/", addr)
}

pub fn config_for(base_url: &str, extra: &[(&str, &str)]) -> Config {
    Config::from_lookup(|key| {
        if key == "BACKEND_URL" {
            return Ok(base_url.to_string());
        }
        extra
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
            .ok_or(VarError::NotPresent)
    })
    .expect("config")
}

pub fn controller_for(base_url: &str) -> UiController {
    let config = config_for(base_url, &[]);
    UiController::new(BackendClient::new(&config).expect("client"))
}

#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
