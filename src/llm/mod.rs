//! LLM 层：客户端抽象与实现（OpenAI 兼容 / Mock / 脚本化）

pub mod mock;
pub mod openai;
pub mod traits;

pub use mock::{MockLlmClient, RecordedCall, ScriptedLlmClient};
pub use openai::OpenAiClient;
pub use traits::{
    ChatMessage, ChatRole, GenerationOption, GenerationOptions, GenerationRequest, LlmClient,
    LlmError,
};
