use std::sync::Arc;

use anyhow::Result;

use reason_client::ReasoningService;
use tracelens_common::EvidenceItem;

/// Substituted for the context block when no evidence survived retrieval
/// and reranking. The model is instructed to say so rather than speculate.
pub const NO_EVIDENCE_MARKER: &str = "No relevant evidence found.";

const SYNTH_SYSTEM: &str = "You are an advanced site reliability engineering assistant. \
    Answer the user's question based strictly on the provided log evidence. \
    The evidence is enriched with causal graph relationships.\n\n\
    Directives:\n\
    1. Identify the root cause if an error is present; consult each item's \
    'Potential root causes' section where one is present.\n\
    2. If one service failed, check whether another failed before it in the \
    same trace, and connect those failures explicitly.\n\
    3. Cite specific pod ids, trace ids and timestamps verbatim.\n\
    4. If the evidence does not answer the question, state that plainly.";

/// Final stage: grounds a natural-language answer in the reranked evidence.
/// Returns the raw generated text; no post-validation.
pub struct AnswerSynthesizer {
    reason: Arc<dyn ReasoningService>,
}

impl AnswerSynthesizer {
    pub fn new(reason: Arc<dyn ReasoningService>) -> Self {
        Self { reason }
    }

    /// Failures propagate: synthesis has no degraded fallback.
    pub async fn synthesize(&self, question: &str, evidence: &[EvidenceItem]) -> Result<String> {
        let context = context_block(evidence);
        let user = format!("Evidence:\n{context}\n\nUser question: {question}\n\nAnswer:");
        self.reason.complete(SYNTH_SYSTEM, &user).await
    }
}

fn context_block(evidence: &[EvidenceItem]) -> String {
    if evidence.is_empty() {
        return NO_EVIDENCE_MARKER.to_string();
    }

    evidence
        .iter()
        .map(|item| {
            format!(
                "Evidence (relevance {:.2}):\n{}",
                item.rerank_score.unwrap_or(0.0),
                item.text,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
