use std::sync::Arc;

use anyhow::Result;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::warn;

use reason_client::{ReasoningService, StructuredOutput};
use tracelens_common::{EvidenceItem, RankingDecision};

const RERANK_SYSTEM: &str = "You are an expert observability and log-analysis assistant. \
    Rerank the provided log evidence by relevance to the user's query.\n\n\
    Criteria:\n\
    1. Direct relation to the error or service named in the query.\n\
    2. High severity (ERROR/CRITICAL) prioritized over INFO.\n\
    3. Root-cause indicators (exceptions, timeouts in related entries).\n\
    4. Temporal proximity.\n\n\
    Return the most relevant candidates sorted by score descending.";

/// Reasoning-service response schema for reranking.
#[derive(Debug, Deserialize, JsonSchema)]
struct RankedResult {
    /// The original index of the candidate in the provided list
    index: i64,
    /// Relevance score between 0.0 and 1.0
    relevance_score: f64,
    /// Short explanation of why this entry is relevant
    reasoning: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct RankingResponse {
    ranked_results: Vec<RankedResult>,
}

/// Secondary relevance model over retrieved candidates.
///
/// Degrades gracefully: any service or parse failure falls back to the
/// first `top_k` candidates in retrieval order, unscored.
pub struct Reranker {
    reason: Arc<dyn ReasoningService>,
}

impl Reranker {
    pub fn new(reason: Arc<dyn ReasoningService>) -> Self {
        Self { reason }
    }

    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<EvidenceItem>,
        top_k: usize,
    ) -> Vec<EvidenceItem> {
        // Empty input short-circuits before any service call.
        if candidates.is_empty() {
            return Vec::new();
        }

        match self.try_rerank(query, &candidates, top_k).await {
            Ok(reranked) => reranked,
            Err(e) => {
                warn!(error = %e, "reranking failed, falling back to retrieval order");
                candidates.into_iter().take(top_k).collect()
            }
        }
    }

    async fn try_rerank(
        &self,
        query: &str,
        candidates: &[EvidenceItem],
        top_k: usize,
    ) -> Result<Vec<EvidenceItem>> {
        let blocks = serialize_candidates(candidates);
        let user = format!(
            "User query: {query}\n\nCandidates to rank:\n{blocks}\n\
             Only return the top {top_k} candidates."
        );

        let raw = self
            .reason
            .complete_structured(RERANK_SYSTEM, &user, RankingResponse::response_schema())
            .await?;
        let response: RankingResponse = serde_json::from_str(&raw)?;

        let decisions = accepted_decisions(response.ranked_results, candidates.len(), top_k);

        Ok(decisions
            .into_iter()
            .map(|d| {
                let mut item = candidates[d.index].clone();
                item.rerank_score = Some(d.relevance_score);
                item.rerank_reason = Some(d.reasoning);
                item
            })
            .collect())
    }
}

/// Serialize candidates into numbered blocks: text plus non-text attributes.
fn serialize_candidates(candidates: &[EvidenceItem]) -> String {
    let mut out = String::new();
    for (i, item) in candidates.iter().enumerate() {
        out.push_str(&format!(
            "--- CANDIDATE {i} ---\ntrace_id: {} | service: {} | retrieval_score: {:.4}\n{}\n\n",
            item.trace_id.as_deref().unwrap_or("unknown"),
            item.service.as_deref().unwrap_or("unknown"),
            item.score,
            item.text,
        ));
    }
    out
}

/// Validate the service's ranking: drop out-of-range indices silently,
/// preserve the given order, cap at `top_k`.
fn accepted_decisions(
    results: Vec<RankedResult>,
    candidate_count: usize,
    top_k: usize,
) -> Vec<RankingDecision> {
    results
        .into_iter()
        .filter_map(|r| {
            let index = usize::try_from(r.index).ok()?;
            if index >= candidate_count {
                return None;
            }
            Some(RankingDecision {
                index,
                relevance_score: r.relevance_score,
                reasoning: r.reasoning,
            })
        })
        .take(top_k)
        .collect()
}
