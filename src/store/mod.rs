//! In-memory issue store.
//!
//! Epistemic foundation:
//! - K_i: Issues are kept in insertion order, ids are unique
//! - B_i: Caller-supplied ids exist (might not) → IssueNotFound
//! - K_i: The lock is only held for the duration of a read or write,
//!   never across an LLM call

use crate::models::{AnalysisResult, Issue, PlanResult, PlannerError, Result};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

/// Thread-safe collection of issues.
#[derive(Debug, Default)]
pub struct IssueStore {
    issues: RwLock<Vec<Issue>>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new issue.
    ///
    /// B_i(id is unused) → IssueExists on collision
    pub async fn create(&self, issue: Issue) -> Result<()> {
        let mut issues = self.issues.write().await;
        if issues.iter().any(|i| i.id == issue.id) {
            return Err(PlannerError::IssueExists(issue.id));
        }
        debug!(issue_id = %issue.id, "Stored issue");
        issues.push(issue);
        Ok(())
    }

    /// All issues, oldest first.
    pub async fn list(&self) -> Vec<Issue> {
        self.issues.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Result<Issue> {
        self.issues
            .read()
            .await
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| PlannerError::IssueNotFound(id.to_string()))
    }

    /// Shallow-merge a JSON object over the stored issue and re-validate.
    ///
    /// The id cannot be changed. A patch that leaves the issue without a
    /// required field is rejected and the stored issue is untouched.
    pub async fn update(&self, id: &str, patch: Value) -> Result<Issue> {
        let Value::Object(patch) = patch else {
            return Err(PlannerError::InvalidInput(
                "Update body must be a JSON object".to_string(),
            ));
        };

        let mut issues = self.issues.write().await;
        let slot = issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| PlannerError::IssueNotFound(id.to_string()))?;

        let mut merged = match serde_json::to_value(&*slot) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(PlannerError::Internal(
                    "Issue did not serialize to an object".to_string(),
                ));
            }
            Err(e) => return Err(PlannerError::Internal(e.to_string())),
        };
        merged.extend(patch);
        merged.insert("id".to_string(), Value::String(id.to_string()));

        let updated = Issue::from_json(Value::Object(merged))?;
        *slot = updated.clone();
        debug!(issue_id = %id, "Updated issue");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut issues = self.issues.write().await;
        let index = issues
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| PlannerError::IssueNotFound(id.to_string()))?;
        issues.remove(index);
        debug!(issue_id = %id, "Deleted issue");
        Ok(())
    }

    /// Merge an analysis into the stored issue.
    pub async fn apply_analysis(&self, id: &str, analysis: &AnalysisResult) -> Result<Issue> {
        self.modify(id, |issue| issue.apply_analysis(analysis)).await
    }

    /// Store a plan on the issue.
    pub async fn apply_plan(&self, id: &str, plan: &PlanResult) -> Result<Issue> {
        self.modify(id, |issue| issue.apply_plan(plan)).await
    }

    async fn modify<F>(&self, id: &str, f: F) -> Result<Issue>
    where
        F: FnOnce(&mut Issue),
    {
        let mut issues = self.issues.write().await;
        let issue = issues
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| PlannerError::IssueNotFound(id.to_string()))?;
        f(issue);
        Ok(issue.clone())
    }
}
