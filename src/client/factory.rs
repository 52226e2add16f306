//! LLM client factory.
//!
//! Epistemic foundation:
//! - I^R: The provider is chosen by configuration at startup
//! - K_i: Anything other than exactly "anthropic" selects the mock

use crate::client::{AnthropicLlmClient, LlmClient, MockLlmClient};
use crate::models::{LlmConfig, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the LLM client selected by `config.provider`.
///
/// # Errors
///
/// Returns `PlannerError::Config` when the Anthropic provider is selected
/// but no API key can be resolved.
///
/// # Example
///
/// ```ignore
/// let config = Config::load(Path::new("config.toml"))?;
/// let client = create_client(&config.llm)?;
/// let analysis = client.analyze_issue(&issue).await?;
/// ```
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let provider = if config.provider.is_empty() {
        "mock"
    } else {
        config.provider.as_str()
    };
    info!(provider = %provider, "Creating LLM client");

    match provider {
        "anthropic" => Ok(Arc::new(AnthropicLlmClient::new(&config.anthropic)?)),
        _ => Ok(Arc::new(
            MockLlmClient::new().with_delay(Duration::from_millis(config.mock_delay_ms)),
        )),
    }
}
