//! issue-planner - In-memory issue service with LLM analysis and planning.
//!
//! ## Architecture
//!
//! - **LLM clients**: [`LlmClient`] trait with a deterministic mock and an
//!   Anthropic Messages API backend, selected by [`create_client`]
//! - **Store**: [`IssueStore`], an ordered in-memory collection
//! - **Server**: axum router exposing CRUD plus `/analyze` and `/plan`
//! - **Logging**: console plus `combined.log` / `error.log` sinks
//!
//! ## Epistemic Design
//!
//! - K_i (Knowledge): Closed label/assignee sets, typed results
//! - B_i (Beliefs): Untrusted request bodies and model replies (Result, fallback)
//! - I^R (Resolvable): Provider, model, retry policy from configuration
//! - I^B (Bounded): Network/API uncertainties (retry, backoff)

pub mod client;
pub mod logging;
pub mod models;
pub mod server;
pub mod store;

// Re-exports for convenience
pub use client::{AnthropicLlmClient, LlmClient, MockLlmClient, Provider, create_client};
pub use models::{AnalysisResult, Config, Issue, PlanResult, PlannerError, Priority, Result};
pub use server::{AppState, router};
pub use store::IssueStore;
