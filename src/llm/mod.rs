//! LLM integration for extracting proposals from replies.

mod client;
pub mod proposals;

pub use client::{
    LlmAppConfig, LlmClient, LlmConfig, LlmDeviceConfig, LlmError, LlmProvider,
    DEFAULT_PROPOSALS_PROMPT,
};
pub use proposals::{extract_proposals, EntityExtractor};
