//! Deterministic mock LLM client.
//!
//! Epistemic foundation:
//! - K_i: Output is a pure function of the issue text
//! - K_i: No network, so every call succeeds
//! - I^R: Simulated latency is configurable

use crate::client::{LlmClient, Provider};
use crate::models::{ASSIGNEES, AnalysisResult, Issue, LABELS, PlanResult, Priority, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

const DEFAULT_DELAY: Duration = Duration::from_millis(500);

const PLAN_TEMPLATES: [&str; 3] = [
    "1. Review the requirements\n2. Create test cases\n3. Implement the solution\n4. Update documentation",
    "1. Analyze impact\n2. Design solution\n3. Implement changes\n4. Test thoroughly\n5. Deploy",
    "1. Investigate root cause\n2. Develop fix\n3. Add regression tests\n4. Submit PR",
];

/// Hash-based stand-in for a real model.
#[derive(Debug, Clone)]
pub struct MockLlmClient {
    delay: Duration,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    /// Create a mock client with the default simulated latency.
    pub fn new() -> Self {
        Self {
            delay: DEFAULT_DELAY,
        }
    }

    /// Override the simulated latency.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    async fn simulate_latency(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Compute the analysis for an issue without waiting.
    pub fn analysis_for(issue: &Issue) -> AnalysisResult {
        let hash = text_hash(&[&issue.id, &issue.title, &issue.description]);

        let label_count = (hash % 3 + 1) as usize;
        let labels = select_items(&LABELS, label_count, hash);
        let assigned_to = ASSIGNEES[(hash % ASSIGNEES.len() as u32) as usize].to_string();
        let confidence = 0.5 + f64::from(hash % 50) / 100.0;

        AnalysisResult {
            labels,
            assigned_to,
            confidence,
            priority: Some(Priority::from_confidence(confidence)),
        }
    }

    /// Compute the plan for an issue without waiting.
    pub fn plan_for(issue: &Issue) -> PlanResult {
        let hash = text_hash(&[&issue.id, &issue.title]);
        let index = (hash % PLAN_TEMPLATES.len() as u32) as usize;
        PlanResult {
            plan: PLAN_TEMPLATES[index].to_string(),
        }
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> Provider {
        Provider::Mock
    }

    async fn analyze_issue(&self, issue: &Issue) -> Result<AnalysisResult> {
        self.simulate_latency().await;
        let analysis = Self::analysis_for(issue);
        debug!(issue_id = %issue.id, labels = ?analysis.labels, "Mock analysis complete");
        Ok(analysis)
    }

    async fn plan_issue(&self, issue: &Issue) -> Result<PlanResult> {
        self.simulate_latency().await;
        debug!(issue_id = %issue.id, "Mock plan complete");
        Ok(Self::plan_for(issue))
    }
}

/// 32-bit rolling hash over the UTF-16 code units of the concatenated parts.
///
/// `h = h * 31 + unit` with i32 wraparound, folded by absolute value.
/// i32::MIN folds to 2^31.
fn text_hash(parts: &[&str]) -> u32 {
    let hash = parts
        .iter()
        .flat_map(|part| part.encode_utf16())
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
    hash.unsigned_abs()
}

/// Draw `count` items without replacement, indexing each draw with the same seed.
fn select_items(items: &[&str], count: usize, seed: u32) -> Vec<String> {
    let mut available: Vec<&str> = items.to_vec();
    let mut selected = Vec::with_capacity(count);

    while selected.len() < count && !available.is_empty() {
        let index = seed as usize % available.len();
        selected.push(available.remove(index).to_string());
    }

    selected
}
