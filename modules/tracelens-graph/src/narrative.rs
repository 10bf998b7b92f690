use std::collections::HashSet;

use tracelens_common::{EvidenceItem, RootCauseCandidate};

use crate::store::{AnchorEvent, TraceEvent};

/// Marker emitted when an anchor has no causally-prior elevated events.
pub const NO_PRECEDING_ERRORS: &str = "No preceding errors found in this trace.";

/// Drop duplicate (service, message, timestamp) triples and order the
/// survivors ascending by time.
pub fn dedup_root_causes(causes: Vec<RootCauseCandidate>) -> Vec<RootCauseCandidate> {
    let mut seen = HashSet::new();
    let mut unique: Vec<RootCauseCandidate> = causes
        .into_iter()
        .filter(|c| seen.insert(c.dedup_key()))
        .collect();
    unique.sort_by_key(|c| c.timestamp);
    unique
}

/// Assemble one narrative evidence item from a vector-search anchor and its
/// causal neighborhood.
pub fn evidence_from_anchor(anchor: AnchorEvent) -> EvidenceItem {
    let root_causes = dedup_root_causes(anchor.root_causes);
    let text = narrative_text(&anchor.event, Some(&root_causes));

    EvidenceItem {
        text,
        trace_id: non_empty(&anchor.event.trace_id),
        service: non_empty(&anchor.event.service),
        score: anchor.score,
        rerank_score: None,
        rerank_reason: None,
        root_causes,
    }
}

/// Assemble an evidence item from an exact-trace event. No similarity
/// ranking applies on this path, so the score is fixed at 1.0. The trace is
/// already returned whole, so no root-cause traversal runs and the narrative
/// carries no root-cause section.
pub fn evidence_from_trace_event(event: TraceEvent) -> EvidenceItem {
    let text = narrative_text(&event, None);

    EvidenceItem {
        text,
        trace_id: non_empty(&event.trace_id),
        service: non_empty(&event.service),
        score: 1.0,
        rerank_score: None,
        rerank_reason: None,
        root_causes: Vec::new(),
    }
}

// `root_causes` is None when no backward traversal ran for this event; only
// an empty traversal result earns the no-preceding-errors marker.
fn narrative_text(event: &TraceEvent, root_causes: Option<&[RootCauseCandidate]>) -> String {
    let mut text = format!(
        "Log event: '{}' (severity: {}) at {}\n",
        event.message,
        event.severity,
        event.timestamp.to_rfc3339(),
    );

    match &event.pod {
        Some(pod) => {
            text.push_str(&format!(
                "Source: service '{}' on pod '{}'\n",
                event.service, pod
            ));
        }
        None => {
            text.push_str(&format!("Source: service '{}'\n", event.service));
        }
    }

    text.push_str(&format!("Trace: {}\n", event.trace_id));
    if let Some(scenario) = &event.scenario {
        text.push_str(&format!("Scenario: {scenario}\n"));
    }

    match root_causes {
        Some([]) => {
            text.push_str(NO_PRECEDING_ERRORS);
            text.push('\n');
        }
        Some(causes) => {
            text.push_str("Potential root causes (preceding errors in this trace):\n");
            for cause in causes {
                text.push_str(&format!(
                    "  - service '{}' logged {} at {}: '{}'\n",
                    cause.service,
                    cause.severity,
                    cause.timestamp.to_rfc3339(),
                    cause.message,
                ));
            }
        }
        None => {}
    }

    text
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
