//! OpenAI provider clients.
//!
//! [`OpenAiChatClient`] drives Stage 1 (page structures, character
//! inference) over Chat Completions; [`OpenAiImageClient`] drives Stage 2
//! over the Images API, including the edits endpoint used by consistency
//! mode.

mod chat;
mod images;

pub use chat::OpenAiChatClient;
pub use images::OpenAiImageClient;
