//! LLM client module.

mod anthropic;
mod factory;
mod llm_client;
mod mock;

pub use anthropic::*;
pub use factory::*;
pub use llm_client::*;
pub use mock::*;
