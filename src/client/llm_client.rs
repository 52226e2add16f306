//! LLM client capability contract.
//!
//! Epistemic foundation:
//! - K_i: Every backend answers the same two questions about an issue
//! - B_i: The backend will produce a usable answer (might fail)
//! - I^R: Which backend is used is resolved from configuration

use crate::models::{AnalysisResult, Issue, PlanResult, Result};
use async_trait::async_trait;
use std::fmt;

/// Backend behind an [`LlmClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Mock,
    Anthropic,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Mock => write!(f, "mock"),
            Provider::Anthropic => write!(f, "anthropic"),
        }
    }
}

/// Analysis and planning over issues.
///
/// Implementations never mutate the issue they are given. They return
/// fresh results which the caller merges back into its own copy.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Which backend this client talks to.
    fn provider(&self) -> Provider;

    /// Infer labels, assignee, confidence and priority for an issue.
    async fn analyze_issue(&self, issue: &Issue) -> Result<AnalysisResult>;

    /// Produce a numbered step plan for an issue.
    async fn plan_issue(&self, issue: &Issue) -> Result<PlanResult>;
}
