use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use reason_client::TextEmbedder;
use tracelens_common::{EvidenceItem, TimeFilter};
use tracelens_graph::narrative::{evidence_from_anchor, evidence_from_trace_event};
use tracelens_graph::EvidenceStore;

use crate::strategy::RetrievalStrategy;

/// Strategy-selecting retriever over the evidence store.
///
/// Store-access failures are caught at this boundary and degrade to an
/// empty evidence list; the pipeline always completes.
pub struct Retriever {
    store: Arc<dyn EvidenceStore>,
    embedder: Arc<dyn TextEmbedder>,
    limit: usize,
}

impl Retriever {
    pub fn new(store: Arc<dyn EvidenceStore>, embedder: Arc<dyn TextEmbedder>, limit: usize) -> Self {
        Self {
            store,
            embedder,
            limit,
        }
    }

    /// The strategy is resolved from the original question (identifiers
    /// survive there verbatim); the rewritten query drives the embedding.
    pub async fn retrieve(
        &self,
        rewritten_query: &str,
        original_question: &str,
        filter: &TimeFilter,
    ) -> Vec<EvidenceItem> {
        match self
            .try_retrieve(rewritten_query, original_question, filter)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "retrieval failed, degrading to empty evidence");
                Vec::new()
            }
        }
    }

    async fn try_retrieve(
        &self,
        rewritten_query: &str,
        original_question: &str,
        filter: &TimeFilter,
    ) -> Result<Vec<EvidenceItem>> {
        match RetrievalStrategy::detect(original_question) {
            RetrievalStrategy::ExactTrace(trace_id) => {
                info!(trace_id = trace_id.as_str(), "exact-trace retrieval");
                let events = self.store.trace_events(&trace_id).await?;
                Ok(events.into_iter().map(evidence_from_trace_event).collect())
            }
            RetrievalStrategy::HybridSearch => {
                info!("hybrid semantic retrieval");
                let embedding = self.embedder.embed(rewritten_query).await?;
                let anchors = self
                    .store
                    .similar_events(&embedding, self.limit, filter)
                    .await?;
                Ok(anchors.into_iter().map(evidence_from_anchor).collect())
            }
        }
    }
}
