pub mod pipeline;
pub mod reranker;
pub mod retriever;
pub mod rewriter;
pub mod strategy;
pub mod synthesizer;
pub mod testing;

pub use pipeline::Pipeline;
pub use reranker::Reranker;
pub use retriever::Retriever;
pub use rewriter::QueryRewriter;
pub use strategy::RetrievalStrategy;
pub use synthesizer::{AnswerSynthesizer, NO_EVIDENCE_MARKER};
