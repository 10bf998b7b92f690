use std::sync::Arc;

use tracelens_agent::testing::MockReasoner;
use tracelens_agent::Reranker;
use tracelens_common::EvidenceItem;

fn candidate(text: &str, score: f64) -> EvidenceItem {
    EvidenceItem {
        text: text.to_string(),
        trace_id: Some("trace-1".to_string()),
        service: Some("payment-service".to_string()),
        score,
        rerank_score: None,
        rerank_reason: None,
        root_causes: vec![],
    }
}

#[tokio::test]
async fn empty_candidates_skip_the_service_entirely() {
    let reasoner = Arc::new(MockReasoner::new());
    let reranker = Reranker::new(reasoner.clone());

    let result = reranker.rerank("payment errors", vec![], 5).await;

    assert!(result.is_empty());
    assert_eq!(reasoner.structured_count(), 0);
}

#[tokio::test]
async fn service_order_and_scores_are_attached() {
    let reasoner = Arc::new(MockReasoner::new().on_structured(
        r#"{"ranked_results": [
            {"index": 1, "relevance_score": 0.95, "reasoning": "direct error match"},
            {"index": 0, "relevance_score": 0.40, "reasoning": "background noise"}
        ]}"#,
    ));
    let reranker = Reranker::new(reasoner);

    let result = reranker
        .rerank(
            "payment errors",
            vec![candidate("info entry", 0.9), candidate("error entry", 0.7)],
            5,
        )
        .await;

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].text, "error entry");
    assert_eq!(result[0].rerank_score, Some(0.95));
    assert_eq!(result[0].rerank_reason.as_deref(), Some("direct error match"));
    assert_eq!(result[1].text, "info entry");
}

#[tokio::test]
async fn out_of_range_indices_are_silently_dropped() {
    let reasoner = Arc::new(MockReasoner::new().on_structured(
        r#"{"ranked_results": [
            {"index": 7, "relevance_score": 0.99, "reasoning": "phantom"},
            {"index": 0, "relevance_score": 0.80, "reasoning": "real"}
        ]}"#,
    ));
    let reranker = Reranker::new(reasoner);

    let result = reranker
        .rerank("payment errors", vec![candidate("only entry", 0.9)], 5)
        .await;

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].text, "only entry");
    assert_eq!(result[0].rerank_score, Some(0.80));
}

#[tokio::test]
async fn results_are_capped_at_top_k() {
    let reasoner = Arc::new(MockReasoner::new().on_structured(
        r#"{"ranked_results": [
            {"index": 0, "relevance_score": 0.9, "reasoning": "a"},
            {"index": 1, "relevance_score": 0.8, "reasoning": "b"},
            {"index": 2, "relevance_score": 0.7, "reasoning": "c"}
        ]}"#,
    ));
    let reranker = Reranker::new(reasoner);

    let result = reranker
        .rerank(
            "payment errors",
            vec![
                candidate("a", 0.9),
                candidate("b", 0.8),
                candidate("c", 0.7),
            ],
            2,
        )
        .await;

    assert_eq!(result.len(), 2);
}

#[tokio::test]
async fn service_failure_falls_back_to_retrieval_order_unscored() {
    let reasoner = Arc::new(MockReasoner::new().on_structured_err("503 service unavailable"));
    let reranker = Reranker::new(reasoner);

    let result = reranker
        .rerank(
            "payment errors",
            vec![
                candidate("first", 0.9),
                candidate("second", 0.8),
                candidate("third", 0.7),
            ],
            2,
        )
        .await;

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].text, "first");
    assert_eq!(result[1].text, "second");
    assert!(result[0].rerank_score.is_none());
    assert!(result[1].rerank_score.is_none());
}

#[tokio::test]
async fn malformed_response_falls_back_to_retrieval_order() {
    let reasoner = Arc::new(MockReasoner::new().on_structured("this is not json"));
    let reranker = Reranker::new(reasoner);

    let result = reranker
        .rerank("payment errors", vec![candidate("first", 0.9)], 5)
        .await;

    assert_eq!(result.len(), 1);
    assert_eq!(result[0].text, "first");
    assert!(result[0].rerank_score.is_none());
}
