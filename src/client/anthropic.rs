//! Anthropic Messages API client.
//!
//! Epistemic foundation:
//! - K_i: The Messages API takes a model, a user turn and a token cap
//! - B_i: API will respond within timeout (might fail)
//! - B_i: The reply text contains the structure we asked for (might not)
//! - I^B: Network availability unknowable → retry with backoff

use crate::client::{LlmClient, Provider};
use crate::models::{
    ASSIGNEES, AnalysisResult, AnthropicConfig, AnthropicError, Issue, LABELS, PlanResult,
    PlannerError, Result,
};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

static JSON_OBJECT: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?s)\{.*\}").expect("valid JSON object regex"));

/// Message in a Messages API request.
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Messages API request payload.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
}

/// Messages API response. Only the first content block is read.
#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// LLM client backed by Anthropic's Messages API.
///
/// Features:
/// - Retry with exponential backoff (`2^attempt * base delay`)
/// - Tolerant extraction of JSON and numbered plans from free text
pub struct AnthropicLlmClient {
    client: reqwest::Client,
    headers: HeaderMap,
    model: String,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_base_delay: Duration,
}

impl AnthropicLlmClient {
    /// Create a new Anthropic client.
    ///
    /// B_i(api key configured) → Result, never retried
    pub fn new(config: &AnthropicConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        let timeout = Duration::from_secs(config.timeout_secs);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PlannerError::Network)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&api_key).map_err(|_| {
                PlannerError::InvalidInput("API key contains invalid header characters".to_string())
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        info!(model = %config.model, "Initialized Anthropic client");

        Ok(Self {
            client,
            headers,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout,
            max_retries: config.max_retries,
            retry_base_delay: Duration::from_millis(config.retry_base_delay_ms),
        })
    }

    /// Replace the underlying HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Delay before the attempt following `attempt`.
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Send the prompt and return the reply text, retrying failed attempts.
    ///
    /// I^B(transient failure) → sleep `2^attempt * base` and try again,
    /// up to `max_retries` attempts in total.
    async fn call_api(&self, prompt: &str) -> Result<String> {
        let mut attempt: u32 = 1;

        loop {
            debug!(attempt, "Making Anthropic API call");

            match self.send_once(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "API call failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// A single request/response exchange.
    async fn send_once(&self, prompt: &str) -> Result<String> {
        let request = MessagesRequest {
            model: &self.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&self.base_url)
            .headers(self.headers.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlannerError::Timeout(self.timeout)
                } else {
                    PlannerError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AnthropicError::ApiError {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body: MessagesResponse = response.json().await.map_err(|e| {
            AnthropicError::InvalidResponse(format!("Failed to decode response: {e}"))
        })?;

        body.content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| {
                AnthropicError::InvalidResponse("No content in response".to_string()).into()
            })
    }
}

#[async_trait]
impl LlmClient for AnthropicLlmClient {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    async fn analyze_issue(&self, issue: &Issue) -> Result<AnalysisResult> {
        info!(issue_id = %issue.id, "Starting analysis");

        let reply = self
            .call_api(&analysis_prompt(issue))
            .await
            .inspect_err(|e| {
                error!(issue_id = %issue.id, error = %e, "Error analyzing issue with Anthropic");
            })?;
        debug!(issue_id = %issue.id, "Received raw response from Anthropic");

        let analysis = parse_analysis(&reply);
        info!(issue_id = %issue.id, "Completed analysis");
        Ok(analysis)
    }

    async fn plan_issue(&self, issue: &Issue) -> Result<PlanResult> {
        info!(issue_id = %issue.id, "Starting plan generation");

        let reply = self
            .call_api(&planning_prompt(issue))
            .await
            .inspect_err(|e| {
                error!(issue_id = %issue.id, error = %e, "Error generating plan with Anthropic");
            })?;
        debug!(issue_id = %issue.id, "Received raw planning response from Anthropic");

        let plan = parse_plan(&reply);
        info!(issue_id = %issue.id, "Completed plan generation");
        Ok(PlanResult { plan })
    }
}

fn issue_block(issue: &Issue) -> String {
    format!(
        "Issue ID: {}\nTitle: {}\nDescription: {}\nAuthor: {}\nCreated At: {}",
        issue.id,
        issue.title,
        issue.description,
        issue.author,
        issue.created_at.to_rfc3339()
    )
}

fn analysis_prompt(issue: &Issue) -> String {
    format!(
        r#"You are an AI assistant that helps analyze software development issues.
Please analyze the following issue and provide:
1. Appropriate labels (from: {labels})
2. A suggested assignee (choose from: {assignees})
3. A confidence score (between 0.5 and 1.0)
4. Priority level (low, medium, or high)

{issue}

Format your response as JSON with the following structure:
{{
  "labels": ["label1", "label2"],
  "assignedTo": "email@example.com",
  "confidence": 0.X,
  "priority": "low|medium|high"
}}
"#,
        labels = LABELS.join(", "),
        assignees = ASSIGNEES.join(", "),
        issue = issue_block(issue),
    )
}

fn planning_prompt(issue: &Issue) -> String {
    format!(
        "You are an AI assistant that helps plan software development tasks.
Please generate a detailed plan for the following issue:

{}

Provide a step-by-step plan to implement this issue.
Format your response as a numbered list with clear, actionable steps.
",
        issue_block(issue)
    )
}

/// Extract an analysis from free text.
///
/// B_i(reply contains a well-formed JSON object) → fallback on failure,
/// never an error.
fn parse_analysis(reply: &str) -> AnalysisResult {
    let parsed = JSON_OBJECT
        .find(reply)
        .ok_or_else(|| "Could not extract JSON from response".to_string())
        .and_then(|m| {
            serde_json::from_str::<AnalysisResult>(m.as_str())
                .map_err(|e| format!("Invalid response structure: {e}"))
        });

    match parsed {
        Ok(analysis) => analysis,
        Err(reason) => {
            error!(reason = %reason, "Failed to parse analysis response");
            debug!(raw = %reply, "Raw response");
            AnalysisResult::fallback()
        }
    }
}

/// Trim the reply and drop any preamble before the first "1.".
fn parse_plan(reply: &str) -> String {
    let plan = reply.trim();
    if plan.starts_with("1.") {
        return plan.to_string();
    }
    match plan.find("1.") {
        Some(start) => plan[start..].to_string(),
        None => plan.to_string(),
    }
}
