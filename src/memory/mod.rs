//! 记忆层：对话记录、运行 transcript、结果持久化

pub mod conversation;
pub mod persistence;
pub mod transcript;

pub use conversation::{Conversation, Message};
pub use persistence::ResultWriter;
pub use transcript::Transcript;
