//! Test mocks for the pipeline's three trait boundaries:
//! MockReasoner (ReasoningService), MockEvidenceStore (EvidenceStore) and
//! FixedEmbedder (TextEmbedder). No network, no database.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use reason_client::{ReasoningService, TextEmbedder};
use tracelens_common::{RootCauseCandidate, Severity, TimeFilter};
use tracelens_graph::{AnchorEvent, EvidenceStore, TraceEvent};

/// Embedding dimension for test vectors.
pub const TEST_EMBEDDING_DIM: usize = 64;

// ---------------------------------------------------------------------------
// MockReasoner
// ---------------------------------------------------------------------------

/// Queue-based reasoning service. Free-text and structured responses are
/// scripted separately, in call order. Records every prompt so tests can
/// assert on what a stage actually sent.
#[derive(Default)]
pub struct MockReasoner {
    completions: Mutex<VecDeque<Result<String, String>>>,
    structured: Mutex<VecDeque<Result<String, String>>>,
    complete_calls: AtomicUsize,
    structured_calls: AtomicUsize,
    seen_completions: Mutex<Vec<(String, String)>>,
    seen_structured: Mutex<Vec<(String, String)>>,
}

impl MockReasoner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_complete(self, response: &str) -> Self {
        self.completions
            .lock()
            .unwrap()
            .push_back(Ok(response.to_string()));
        self
    }

    pub fn on_complete_err(self, message: &str) -> Self {
        self.completions
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn on_structured(self, response: &str) -> Self {
        self.structured
            .lock()
            .unwrap()
            .push_back(Ok(response.to_string()));
        self
    }

    pub fn on_structured_err(self, message: &str) -> Self {
        self.structured
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn complete_count(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }

    pub fn structured_count(&self) -> usize {
        self.structured_calls.load(Ordering::SeqCst)
    }

    /// The user prompt of the last free-text completion, if any.
    pub fn last_completion_prompt(&self) -> Option<String> {
        self.seen_completions
            .lock()
            .unwrap()
            .last()
            .map(|(_, user)| user.clone())
    }

    /// The user prompt of the last structured completion, if any.
    pub fn last_structured_prompt(&self) -> Option<String> {
        self.seen_structured
            .lock()
            .unwrap()
            .last()
            .map(|(_, user)| user.clone())
    }
}

#[async_trait]
impl ReasoningService for MockReasoner {
    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_completions
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        match self.completions.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!("MockReasoner: {message}")),
            None => Err(anyhow!("MockReasoner: no scripted completion left")),
        }
    }

    async fn complete_structured(
        &self,
        system: &str,
        user: &str,
        _schema: serde_json::Value,
    ) -> Result<String> {
        self.structured_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_structured
            .lock()
            .unwrap()
            .push((system.to_string(), user.to_string()));
        match self.structured.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!("MockReasoner: {message}")),
            None => Err(anyhow!("MockReasoner: no scripted structured response left")),
        }
    }
}

// ---------------------------------------------------------------------------
// FixedEmbedder
// ---------------------------------------------------------------------------

/// Deterministic hash-based vectors: same text, same embedding.
pub struct FixedEmbedder;

#[async_trait]
impl TextEmbedder for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; TEST_EMBEDDING_DIM];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % TEST_EMBEDDING_DIM] += byte as f32 / 255.0;
        }
        Ok(vector)
    }
}

// ---------------------------------------------------------------------------
// MockEvidenceStore
// ---------------------------------------------------------------------------

/// In-memory evidence store. Traces are registered per id; anchors are a
/// flat list filtered and sorted the way the real query would.
#[derive(Default)]
pub struct MockEvidenceStore {
    traces: HashMap<String, Vec<TraceEvent>>,
    anchors: Vec<AnchorEvent>,
    fail: bool,
    trace_calls: AtomicUsize,
    similar_calls: AtomicUsize,
    seen_filters: Mutex<Vec<TimeFilter>>,
}

impl MockEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_trace(mut self, trace_id: &str, mut events: Vec<TraceEvent>) -> Self {
        events.sort_by_key(|e| e.timestamp);
        self.traces.insert(trace_id.to_string(), events);
        self
    }

    pub fn with_anchors(mut self, anchors: Vec<AnchorEvent>) -> Self {
        self.anchors = anchors;
        self
    }

    /// Every store call fails, exercising the degradation path.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn trace_calls(&self) -> usize {
        self.trace_calls.load(Ordering::SeqCst)
    }

    pub fn similar_calls(&self) -> usize {
        self.similar_calls.load(Ordering::SeqCst)
    }

    pub fn seen_filters(&self) -> Vec<TimeFilter> {
        self.seen_filters.lock().unwrap().clone()
    }
}

#[async_trait]
impl EvidenceStore for MockEvidenceStore {
    async fn trace_events(&self, trace_id: &str) -> Result<Vec<TraceEvent>> {
        self.trace_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(anyhow!("MockEvidenceStore: connection refused"));
        }
        Ok(self.traces.get(trace_id).cloned().unwrap_or_default())
    }

    async fn similar_events(
        &self,
        _embedding: &[f32],
        limit: usize,
        filter: &TimeFilter,
    ) -> Result<Vec<AnchorEvent>> {
        self.similar_calls.fetch_add(1, Ordering::SeqCst);
        self.seen_filters.lock().unwrap().push(filter.clone());
        if self.fail {
            return Err(anyhow!("MockEvidenceStore: connection refused"));
        }

        // Hard time bound before scoring, then similarity descending.
        let mut hits: Vec<AnchorEvent> = self
            .anchors
            .iter()
            .filter(|a| filter.contains(a.event.timestamp))
            .cloned()
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

pub fn ts(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0).unwrap()
}

pub fn test_event(
    message: &str,
    severity: Severity,
    timestamp: DateTime<Utc>,
    service: &str,
    trace_id: &str,
) -> TraceEvent {
    TraceEvent {
        message: message.to_string(),
        severity,
        timestamp,
        service: service.to_string(),
        pod: Some(format!("{service}-pod-0")),
        trace_id: trace_id.to_string(),
        scenario: Some("checkout".to_string()),
    }
}

pub fn test_anchor(event: TraceEvent, score: f64, root_causes: Vec<RootCauseCandidate>) -> AnchorEvent {
    AnchorEvent {
        event,
        score,
        root_causes,
    }
}

pub fn test_cause(service: &str, message: &str, timestamp: DateTime<Utc>) -> RootCauseCandidate {
    RootCauseCandidate {
        service: service.to_string(),
        message: message.to_string(),
        severity: Severity::Error,
        timestamp,
    }
}
