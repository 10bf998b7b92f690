use std::sync::Arc;

use chrono::{TimeZone, Utc};

use tracelens_agent::testing::MockReasoner;
use tracelens_agent::QueryRewriter;

fn now() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn rewrite_trims_the_model_output() {
    let reasoner = Arc::new(MockReasoner::new().on_complete("  payment-service errors  \n"));
    let rewriter = QueryRewriter::new(reasoner);

    let rewritten = rewriter.rewrite("Why did payment-service fail?").await.unwrap();
    assert_eq!(rewritten, "payment-service errors");
}

#[tokio::test]
async fn extracted_bounds_are_parsed() {
    let reasoner = Arc::new(MockReasoner::new().on_structured(
        r#"{"start_date": "2026-03-01T00:00:00", "end_date": "2026-03-01T12:00:00Z"}"#,
    ));
    let rewriter = QueryRewriter::new(reasoner);

    let filter = rewriter
        .extract_time_filter("errors this morning", now())
        .await;

    assert_eq!(
        filter.start.unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
    );
    assert_eq!(filter.end.unwrap(), now());
}

#[tokio::test]
async fn service_failure_degrades_to_unbounded() {
    let reasoner = Arc::new(MockReasoner::new().on_structured_err("timeout"));
    let rewriter = QueryRewriter::new(reasoner);

    let filter = rewriter
        .extract_time_filter("errors this morning", now())
        .await;
    assert!(filter.is_unbounded());
}

#[tokio::test]
async fn malformed_response_degrades_to_unbounded() {
    let reasoner = Arc::new(MockReasoner::new().on_structured("not json at all"));
    let rewriter = QueryRewriter::new(reasoner);

    let filter = rewriter.extract_time_filter("errors", now()).await;
    assert!(filter.is_unbounded());
}

#[tokio::test]
async fn unparseable_dates_degrade_per_side() {
    let reasoner = Arc::new(MockReasoner::new().on_structured(
        r#"{"start_date": "last tuesday-ish", "end_date": "2026-03-01T12:00:00"}"#,
    ));
    let rewriter = QueryRewriter::new(reasoner);

    let filter = rewriter.extract_time_filter("errors", now()).await;
    assert!(filter.start.is_none());
    assert_eq!(filter.end.unwrap(), now());
}

#[tokio::test]
async fn no_temporal_language_is_idempotent() {
    let null_dates = r#"{"start_date": null, "end_date": null}"#;
    let reasoner = Arc::new(
        MockReasoner::new()
            .on_structured(null_dates)
            .on_structured(null_dates),
    );
    let rewriter = QueryRewriter::new(reasoner);

    let first = rewriter
        .extract_time_filter("Why did payment-service fail?", now())
        .await;
    let second = rewriter
        .extract_time_filter("Why did payment-service fail?", now())
        .await;

    assert!(first.is_unbounded());
    assert_eq!(first, second);
}
