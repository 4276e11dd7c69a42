//! # Chat
//!
//! A thin proxy to a generative-AI `generateContent` endpoint. Each websocket
//! session owns one `ChatConversation`; the backend is stateless and receives
//! the whole history on every call.

pub mod conversation;
pub mod gemini;

pub use conversation::{
    ChatBackend, ChatConversation, ChatError, ChatPart, ChatRole, ChatTurn, GENERIC_ERROR_REPLY,
    NO_ANSWER_REPLY,
};
pub use gemini::{GeminiClient, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
