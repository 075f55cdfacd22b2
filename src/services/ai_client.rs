//! External extraction/review collaborator
//!
//! The multi-role "architects and engineers" framing collapses to one
//! interface with two capabilities: propose a candidate line-item set from
//! document text, and review a candidate set into an approval or a rejection
//! with feedback. The remote service is a black box; anything malformed it
//! sends back is normalized at this edge or treated as "zero items" — this
//! boundary never fails a request.

#![allow(async_fn_in_trait)]

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::domain::{LineItem, ParseOutcome};
use crate::services::parser;

/// Reviewer verdict over a candidate item set.
#[derive(Debug, Clone)]
pub enum ReviewOutcome {
    /// Carries the finalized item set (possibly revised by the reviewer).
    Approved(Vec<LineItem>),
    /// Free-text feedback to loop back into the next proposal round.
    Rejected(String),
}

/// The extraction seam. Both the regex heuristic and the remote LLM service
/// satisfy it; the host pipeline does not care which.
pub trait ExtractionBackend {
    async fn propose(&self, document_text: &str, round: u32, feedback: Option<&str>)
        -> Vec<LineItem>;
    async fn review(&self, candidate: &[LineItem]) -> ReviewOutcome;
}

/// Deterministic in-process backend: propose via the pattern parser, approve
/// everything on review.
pub struct HeuristicBackend;

impl ExtractionBackend for HeuristicBackend {
    async fn propose(
        &self,
        document_text: &str,
        _round: u32,
        _feedback: Option<&str>,
    ) -> Vec<LineItem> {
        match parser::parse(document_text) {
            ParseOutcome::Items { items } => items,
            ParseOutcome::Raw { .. } => Vec::new(),
        }
    }

    async fn review(&self, candidate: &[LineItem]) -> ReviewOutcome {
        ReviewOutcome::Approved(candidate.to_vec())
    }
}

/// Client for the remote AI extraction service.
#[derive(Clone)]
pub struct AiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl AiClient {
    pub fn new(base_url: &str, token: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, "AI extraction client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("X-Internal-Token", &self.token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("AI service unavailable: {}", url))?
            .error_for_status()
            .context("AI service returned an error status")?;

        response
            .json::<Value>()
            .await
            .context("AI service returned a non-JSON body")
    }

    /// Check AI service health.
    pub async fn health_check(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);

        self.client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .context("AI service health check failed")?
            .error_for_status()
            .context("AI service unhealthy")?;

        Ok(())
    }
}

impl ExtractionBackend for AiClient {
    async fn propose(
        &self,
        document_text: &str,
        round: u32,
        feedback: Option<&str>,
    ) -> Vec<LineItem> {
        #[derive(Serialize)]
        struct Request<'a> {
            document_text: &'a str,
            round: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            prior_feedback: Option<&'a str>,
        }

        match self
            .post(
                "/v1/extract/propose",
                &Request {
                    document_text,
                    round,
                    prior_feedback: feedback,
                },
            )
            .await
        {
            Ok(value) => normalize_items(&value),
            Err(e) => {
                // Equivalent to "zero line items extracted": the caller's
                // raw-text fallback takes over.
                tracing::warn!(error = %e, round, "Extraction proposal failed");
                Vec::new()
            }
        }
    }

    async fn review(&self, candidate: &[LineItem]) -> ReviewOutcome {
        #[derive(Serialize)]
        struct Request<'a> {
            items: &'a [LineItem],
        }

        let value = match self.post("/v1/extract/review", &Request { items: candidate }).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Review call failed; keeping candidate as-is");
                return ReviewOutcome::Approved(candidate.to_vec());
            }
        };

        let approved = value
            .get("approved")
            .and_then(Value::as_bool)
            .unwrap_or(true);

        if approved {
            let finalized = value
                .get("items")
                .map(normalize_items)
                .filter(|items| !items.is_empty())
                .unwrap_or_else(|| candidate.to_vec());
            ReviewOutcome::Approved(finalized)
        } else {
            let feedback = value
                .get("feedback")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            ReviewOutcome::Rejected(feedback)
        }
    }
}

/// Map any of the historically observed response shapes into the canonical
/// line-item sequence: a bare array, `{items: [...]}`,
/// `{final_plan: {...}}`, and `{room, item, spec, qty}` records. Done once,
/// here at the edge — never inside aggregation logic.
pub fn normalize_items(value: &Value) -> Vec<LineItem> {
    match value {
        Value::Array(records) => records.iter().filter_map(normalize_record).collect(),
        Value::Object(map) => {
            if let Some(inner) = map.get("items") {
                return normalize_items(inner);
            }
            if let Some(inner) = map.get("final_plan") {
                return normalize_items(inner);
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn normalize_record(record: &Value) -> Option<LineItem> {
    let obj = record.as_object()?;

    let text = |keys: &[&str]| -> Option<String> {
        keys.iter()
            .filter_map(|k| obj.get(*k))
            .find_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let mut description = text(&["description", "item"])?;
    // {room, item, spec, qty} records fold spec into the description
    if let Some(spec) = text(&["spec"]) {
        if !description.contains(&spec) {
            description = format!("{} {}", description, spec);
        }
    }

    let quantity = obj
        .get("quantity")
        .or_else(|| obj.get("qty"))
        .and_then(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => parser::parse_quantity(s),
            _ => None,
        })
        .filter(|q| q.is_finite() && *q > 0.0)?;

    Some(LineItem {
        item_code: text(&["item_code", "code"]),
        description,
        quantity,
        unit: text(&["unit"]).unwrap_or_else(|| "ea".to_string()),
    })
}
