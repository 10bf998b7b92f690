use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::info;

use reason_client::{ReasoningService, TextEmbedder};
use tracelens_common::{PipelineState, QueryResponse};
use tracelens_graph::EvidenceStore;

use crate::reranker::Reranker;
use crate::retriever::Retriever;
use crate::rewriter::QueryRewriter;
use crate::synthesizer::AnswerSynthesizer;

/// Maximum characters of each evidence snippet in `context_sources`.
const SNIPPET_CHARS: usize = 150;

/// Five strictly sequential stages: rewrite, extract time filter, retrieve,
/// rerank, synthesize. No branching, no retries, no early exit — empty
/// retrieval still flows through reranking and synthesis.
///
/// One `PipelineState` per request, owned exclusively by this orchestrator;
/// concurrent requests share nothing mutable.
pub struct Pipeline {
    rewriter: QueryRewriter,
    retriever: Retriever,
    reranker: Reranker,
    synthesizer: AnswerSynthesizer,
    top_k: usize,
}

impl Pipeline {
    pub fn new(
        reason: Arc<dyn ReasoningService>,
        embedder: Arc<dyn TextEmbedder>,
        store: Arc<dyn EvidenceStore>,
        retrieval_limit: usize,
        top_k: usize,
    ) -> Self {
        Self {
            rewriter: QueryRewriter::new(reason.clone()),
            retriever: Retriever::new(store, embedder, retrieval_limit),
            reranker: Reranker::new(reason.clone()),
            synthesizer: AnswerSynthesizer::new(reason),
            top_k,
        }
    }

    /// Run the full pipeline for one question. Only rewrite and synthesis
    /// failures surface; the middle stages degrade in place.
    pub async fn run(&self, question: &str) -> Result<PipelineState> {
        let mut state = PipelineState::new(question);

        info!(stage = "rewrite", "optimizing query");
        state.optimized_question = self.rewriter.rewrite(&state.original_question).await?;

        info!(stage = "extract_time_filter", "extracting time bounds");
        state.time_filter = self
            .rewriter
            .extract_time_filter(&state.original_question, Utc::now())
            .await;

        info!(stage = "retrieve", "retrieving evidence");
        state.retrieved = self
            .retriever
            .retrieve(
                &state.optimized_question,
                &state.original_question,
                &state.time_filter,
            )
            .await;

        info!(
            stage = "rerank",
            candidates = state.retrieved.len(),
            "reranking evidence"
        );
        state.reranked = self
            .reranker
            .rerank(
                &state.optimized_question,
                state.retrieved.clone(),
                self.top_k,
            )
            .await;

        info!(
            stage = "synthesize",
            evidence = state.reranked.len(),
            "generating answer"
        );
        state.final_answer = self
            .synthesizer
            .synthesize(&state.original_question, &state.reranked)
            .await?;

        Ok(state)
    }

    /// Run the pipeline and shape the caller-facing response.
    pub async fn answer(&self, question: &str) -> Result<QueryResponse> {
        let state = self.run(question).await?;

        let context_sources = state
            .reranked
            .iter()
            .map(|item| {
                format!(
                    "[Score: {:.2}] {}",
                    item.rerank_score.unwrap_or(0.0),
                    item.snippet(SNIPPET_CHARS)
                )
            })
            .collect();

        Ok(QueryResponse {
            answer: state.final_answer,
            original_question: state.original_question,
            optimized_question: state.optimized_question,
            extracted_dates: state.time_filter,
            context_sources,
        })
    }
}
