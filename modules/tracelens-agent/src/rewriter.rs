use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use reason_client::{ReasoningService, StructuredOutput};
use tracelens_common::TimeFilter;

const REWRITE_SYSTEM: &str = "You are an expert at refining search queries for log analysis. \
    Rewrite the user question into a concise, keyword-heavy search query suited for vector \
    retrieval. Keep entity names (pod ids, service names, trace ids) exactly as written. \
    Respond with the query only.";

const TIME_SYSTEM: &str = "Analyze the user question and extract time range filters. \
    Return JSON with keys 'start_date' and 'end_date' in ISO 8601 format \
    (YYYY-MM-DDTHH:MM:SS). Use null for any bound the question does not state.";

/// Structured response for time extraction. Nullable on both sides.
#[derive(Debug, Deserialize, JsonSchema)]
struct DateWindow {
    start_date: Option<String>,
    end_date: Option<String>,
}

/// Turns a free-form question into a retrieval-optimized query and,
/// separately, into structured time bounds.
pub struct QueryRewriter {
    reason: Arc<dyn ReasoningService>,
}

impl QueryRewriter {
    pub fn new(reason: Arc<dyn ReasoningService>) -> Self {
        Self { reason }
    }

    /// Produce a keyword-dense retrieval query. Embedded identifiers are
    /// preserved verbatim by instruction. Failures propagate: rewriting has
    /// no degraded fallback.
    pub async fn rewrite(&self, question: &str) -> Result<String> {
        let user = format!("User question: {question}\nOptimized query:");
        let rewritten = self.reason.complete(REWRITE_SYSTEM, &user).await?;
        Ok(rewritten.trim().to_string())
    }

    /// Extract inclusive time bounds from the question. Best-effort: any
    /// service or parse failure yields an unbounded filter, never an error.
    pub async fn extract_time_filter(&self, question: &str, now: DateTime<Utc>) -> TimeFilter {
        match self.try_extract(question, now).await {
            Ok(filter) => filter,
            Err(e) => {
                warn!(error = %e, "time extraction failed, retrieval proceeds unbounded");
                TimeFilter::unbounded()
            }
        }
    }

    async fn try_extract(&self, question: &str, now: DateTime<Utc>) -> Result<TimeFilter> {
        let user = format!(
            "Current time: {}\n\nUser question: {question}",
            now.to_rfc3339()
        );

        let raw = self
            .reason
            .complete_structured(TIME_SYSTEM, &user, DateWindow::response_schema())
            .await?;
        let window: DateWindow = serde_json::from_str(&raw)?;

        // Individual unparseable dates degrade to unbounded on that side.
        Ok(TimeFilter {
            start: window.start_date.as_deref().and_then(parse_date),
            end: window.end_date.as_deref().and_then(parse_date),
        })
    }
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
