//! Core data models for issue-planner.
//!
//! Epistemic mapping:
//! - K_i (Knowledge): Issue shape, closed label and assignee sets
//! - B_i (Beliefs): Untrusted JSON input wrapped in Result
//! - I^R (Resolvable): Config parameters
//! - I^B (Bounded): Error variants with fallback strategies

mod config;
mod error;
mod issue;

pub use config::*;
pub use error::*;
pub use issue::*;
