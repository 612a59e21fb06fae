pub mod api;
pub mod config;
pub mod content;
pub mod error;
pub mod extract;
pub mod fetcher;

use fetcher::HttpClients;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub http: HttpClients,
}

impl AppState {
    pub fn new() -> error::Result<Self> {
        Ok(AppState {
            http: HttpClients::new()?,
        })
    }
}
