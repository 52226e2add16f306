//! Issue and LLM result types for issue-planner.
//!
//! K_i: These types represent the core data flow between the store,
//! the HTTP layer and the LLM clients.

use crate::models::{PlannerError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Labels an analysis may assign.
pub const LABELS: [&str; 6] = [
    "bug",
    "feature",
    "enhancement",
    "documentation",
    "refactoring",
    "testing",
];

/// People an issue may be assigned to.
pub const ASSIGNEES: [&str; 3] = [
    "alice@example.com",
    "bob@example.com",
    "charlie@example.com",
];

/// A tracked issue.
///
/// K_i: id, title, description, author and createdAt are always present.
/// The analysis and plan fields are filled in by the caller after an
/// LLM round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<IssueComment>>,

    /// Comma-joined analysis labels
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

/// A comment attached to an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueComment {
    pub author: String,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    pub text: String,
}

impl Issue {
    /// Create an issue with only the required fields set.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        author: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            author: author.into(),
            created_at,
            comments: None,
            labels: None,
            assigned_to: None,
            confidence: None,
            priority: None,
            plan: None,
        }
    }

    /// Build an issue from an untyped JSON body.
    ///
    /// B_i(body has every required field) → Result
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            let reason = e.to_string();
            if reason.starts_with("missing field") {
                PlannerError::InvalidInput(format!(
                    "Please ensure issue has all required fields - id, title, description, author, createdAt ({reason})"
                ))
            } else {
                PlannerError::InvalidInput(format!("Invalid issue: {reason}"))
            }
        })
    }

    /// Read an issue from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PlannerError::io(format!("Failed to read {}", path.display()), e))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| PlannerError::ParseError(format!("{}: {e}", path.display())))?;
        Self::from_json(value)
    }

    /// Merge an analysis result into this issue.
    pub fn apply_analysis(&mut self, analysis: &AnalysisResult) {
        self.labels = Some(analysis.labels.join(","));
        self.assigned_to = Some(analysis.assigned_to.clone());
        self.confidence = Some(analysis.confidence);
        self.priority = analysis.priority;
    }

    /// Merge a plan result into this issue.
    pub fn apply_plan(&mut self, plan: &PlanResult) {
        self.plan = Some(plan.plan.clone());
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let priority = self
            .priority
            .map(|p| p.to_string())
            .unwrap_or_else(|| "not set".to_string());
        write!(
            f,
            "{} (Priority: {}) assigned to {}",
            self.title,
            priority,
            self.assigned_to.as_deref().unwrap_or("unassigned")
        )
    }
}

/// Lenient timestamp parsing for `createdAt`.
///
/// Accepts RFC 3339, a zone-less date-time (taken as UTC) or a bare
/// `YYYY-MM-DD` date (midnight UTC).
mod timestamp {
    use super::*;
    use serde::Deserializer;
    use serde::de::Error;

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        if let Ok(naive) = s.parse::<NaiveDateTime>() {
            return Some(naive.and_utc());
        }
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid createdAt timestamp '{raw}'")))
    }
}

/// Issue priority.
///
/// K_i: Exactly three levels exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Map a confidence score onto a priority.
    ///
    /// Above 0.8 is high, above 0.6 is medium, everything else is low.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence > 0.8 {
            Priority::High
        } else if confidence > 0.6 {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Result of analyzing an issue.
///
/// `priority` is optional on the wire: a remote reply that omits it is
/// still accepted and the field stays absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub labels: Vec<String>,
    pub assigned_to: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl AnalysisResult {
    /// Result used when a remote reply cannot be interpreted.
    pub fn fallback() -> Self {
        Self {
            labels: vec!["bug".to_string()],
            assigned_to: ASSIGNEES[0].to_string(),
            confidence: 0.5,
            priority: Some(Priority::Medium),
        }
    }
}

/// Result of planning an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResult {
    /// Numbered step list, by convention starting with "1."
    pub plan: String,
}
