use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Log severity levels, ordered. `Warn` and above count as elevated
/// for root-cause traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

impl Severity {
    /// Parse a severity from a log-level string. Unknown levels map to Info.
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DEBUG" | "TRACE" => Severity::Debug,
            "WARN" | "WARNING" => Severity::Warn,
            "ERROR" | "ERR" => Severity::Error,
            "CRITICAL" | "FATAL" => Severity::Critical,
            _ => Severity::Info,
        }
    }

    pub fn is_elevated(self) -> bool {
        self >= Severity::Warn
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional inclusive time bounds extracted from the question.
/// A `None` side means unbounded on that side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TimeFilter {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Inclusive containment check.
    pub fn contains(&self, t: DateTime<Utc>) -> bool {
        if let Some(start) = self.start {
            if t < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if t > end {
                return false;
            }
        }
        true
    }
}

/// A causally-prior elevated-severity event in the same trace as an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseCandidate {
    pub service: String,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
}

impl RootCauseCandidate {
    /// Dedup key: two candidates with the same service, message and
    /// timestamp are the same event seen through different paths.
    pub fn dedup_key(&self) -> (String, String, DateTime<Utc>) {
        (self.service.clone(), self.message.clone(), self.timestamp)
    }
}

/// One unit of retrieved context, assembled from an anchor event and its
/// causal neighborhood. Enriched in place by the reranker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Narrative text block describing the event, its source and its
    /// root-cause candidates.
    pub text: String,
    pub trace_id: Option<String>,
    pub service: Option<String>,
    /// Retrieval score: vector similarity on the hybrid path, 1.0 on the
    /// exact-trace path.
    pub score: f64,
    /// Set by the reranker.
    pub rerank_score: Option<f64>,
    /// Set by the reranker.
    pub rerank_reason: Option<String>,
    /// Ordered ascending by time, deduplicated.
    pub root_causes: Vec<RootCauseCandidate>,
}

impl EvidenceItem {
    /// Truncated single-line snippet for the response's context_sources.
    pub fn snippet(&self, max_chars: usize) -> String {
        let flat: String = self.text.replace('\n', " ");
        let cut: String = flat.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

/// One entry of the reranker's structured response: which candidate, how
/// relevant, and why. Indices outside the candidate list are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingDecision {
    pub index: usize,
    pub relevance_score: f64,
    pub reasoning: String,
}

/// The mutable record threaded through the pipeline. Each stage writes only
/// the fields it owns; the orchestrator holds exclusive ownership for the
/// lifetime of one request.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub original_question: String,
    pub optimized_question: String,
    pub time_filter: TimeFilter,
    pub retrieved: Vec<EvidenceItem>,
    pub reranked: Vec<EvidenceItem>,
    pub final_answer: String,
}

impl PipelineState {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            original_question: question.into(),
            ..Default::default()
        }
    }
}

/// Caller-facing request shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

/// Caller-facing response shape. Always well-formed: "no answer available"
/// is communicated inside `answer`, never as a failure signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub original_question: String,
    pub optimized_question: String,
    pub extracted_dates: TimeFilter,
    pub context_sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn severity_parse_and_order() {
        assert_eq!(Severity::parse("warn"), Severity::Warn);
        assert_eq!(Severity::parse("WARNING"), Severity::Warn);
        assert_eq!(Severity::parse("fatal"), Severity::Critical);
        assert_eq!(Severity::parse("nonsense"), Severity::Info);
        assert!(Severity::Error > Severity::Warn);
    }

    #[test]
    fn elevated_is_warn_and_above() {
        assert!(!Severity::Info.is_elevated());
        assert!(Severity::Warn.is_elevated());
        assert!(Severity::Critical.is_elevated());
    }

    #[test]
    fn time_filter_inclusive_bounds() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap();
        let filter = TimeFilter {
            start: Some(start),
            end: Some(end),
        };

        assert!(filter.contains(start));
        assert!(filter.contains(end));
        assert!(!filter.contains(start - chrono::Duration::seconds(1)));
        assert!(!filter.contains(end + chrono::Duration::seconds(1)));
        assert!(TimeFilter::unbounded().contains(start));
    }

    #[test]
    fn snippet_truncates_and_flattens() {
        let item = EvidenceItem {
            text: "line one\nline two".to_string(),
            trace_id: None,
            service: None,
            score: 0.5,
            rerank_score: None,
            rerank_reason: None,
            root_causes: vec![],
        };
        assert_eq!(item.snippet(8), "line one...");
    }
}
