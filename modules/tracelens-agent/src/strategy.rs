use std::sync::OnceLock;

use regex::Regex;

/// Canonical trace identifier shape: a UUID-like token. Detected as an
/// opaque token in the original question, never interpreted.
fn trace_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"\b[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}\b",
        )
        .expect("trace id pattern must compile")
    })
}

/// How to retrieve evidence for one request. Resolved once from the
/// original question, then carried through retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalStrategy {
    /// The question names a trace: fetch every event of that trace,
    /// bypassing similarity ranking.
    ExactTrace(String),
    /// No identifier present: vector similarity fused with causal-graph
    /// traversal.
    HybridSearch,
}

impl RetrievalStrategy {
    pub fn detect(question: &str) -> Self {
        match trace_id_pattern().find(question) {
            Some(m) => RetrievalStrategy::ExactTrace(m.as_str().to_string()),
            None => RetrievalStrategy::HybridSearch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_with_uuid_selects_exact_trace() {
        let strategy = RetrievalStrategy::detect(
            "What happened in trace a1b2c3d4-e5f6-7890-abcd-ef1234567890?",
        );
        assert_eq!(
            strategy,
            RetrievalStrategy::ExactTrace("a1b2c3d4-e5f6-7890-abcd-ef1234567890".to_string())
        );
    }

    #[test]
    fn question_without_identifier_selects_hybrid() {
        let strategy = RetrievalStrategy::detect("Why did payment-service fail?");
        assert_eq!(strategy, RetrievalStrategy::HybridSearch);
    }

    #[test]
    fn partial_uuid_is_not_an_identifier() {
        let strategy = RetrievalStrategy::detect("error code a1b2c3d4-e5f6 in checkout");
        assert_eq!(strategy, RetrievalStrategy::HybridSearch);
    }

    #[test]
    fn uppercase_uuid_is_detected() {
        let strategy =
            RetrievalStrategy::detect("check A1B2C3D4-E5F6-7890-ABCD-EF1234567890 please");
        assert!(matches!(strategy, RetrievalStrategy::ExactTrace(_)));
    }
}
