//! Error types for issue-planner.
//!
//! Epistemic taxonomy:
//! - B_i falsified: Expected failures (not found, invalid input, bad config)
//! - I^B materialized: Infrastructure failures (network, timeout, API status)
//! - K_i violated: Internal invariant violations (bugs)

use thiserror::Error;

/// Top-level error type for issue-planner.
#[derive(Debug, Error)]
pub enum PlannerError {
    // ═══════════════════════════════════════════════════════════════════
    // B_i FALSIFIED: Belief proven wrong (expected failures)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Issue {0} not found")]
    IssueNotFound(String),

    #[error("Issue {0} already exists")]
    IssueExists(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    // ═══════════════════════════════════════════════════════════════════
    // I^B MATERIALIZED: Bounded ignorance became known-bad
    // ═══════════════════════════════════════════════════════════════════

    #[error("Anthropic API error: {0}")]
    AnthropicApi(#[from] AnthropicError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // ═══════════════════════════════════════════════════════════════════
    // K_i VIOLATED: Invariant broken (bug, should not happen)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Anthropic Messages API specific errors.
#[derive(Debug, Error)]
pub enum AnthropicError {
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl PlannerError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Check if this error came from the remote call and may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Network(_) | Self::AnthropicApi(_)
        )
    }
}

/// Result type alias for issue-planner.
pub type Result<T> = std::result::Result<T, PlannerError>;
