//! Websocket wire format: every frame is `{"event": <name>, "data": <payload>}`.

use lib_stations::AnnotatedStation;
use lib_stations::sessions::{Snapshot, SnapshotKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Kept raw so validation can say what exactly is wrong with it.
    UserLocation(Value),
    ChatMessage(ChatText),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    InitialStations(Vec<AnnotatedStation>),
    StationUpdate(Vec<AnnotatedStation>),
    ChatReply(ChatText),
    Error(ErrorMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatText {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorMessage {
            message: message.into(),
        })
    }

    pub fn chat_reply(text: impl Into<String>) -> Self {
        ServerEvent::ChatReply(ChatText { text: text.into() })
    }
}

impl From<Snapshot> for ServerEvent {
    fn from(snapshot: Snapshot) -> Self {
        match snapshot.kind {
            SnapshotKind::Initial => ServerEvent::InitialStations(snapshot.stations),
            SnapshotKind::Update => ServerEvent::StationUpdate(snapshot.stations),
        }
    }
}
