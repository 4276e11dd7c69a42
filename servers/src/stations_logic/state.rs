use lib_stations::SessionHub;
use lib_stations::chat::GeminiClient;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<SessionHub>,
    // None when no API key is configured
    pub chat: Option<Arc<GeminiClient>>,
    // Period of each located session's update timer
    pub update_interval: Duration,
}

impl AppState {
    pub fn new(hub: Arc<SessionHub>, chat: Option<GeminiClient>, update_interval: Duration) -> Self {
        Self {
            hub,
            chat: chat.map(Arc::new),
            update_interval,
        }
    }
}
