use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use neo4rs::query;
use tracing::debug;

use tracelens_common::{RootCauseCandidate, Severity, TimeFilter};

use crate::GraphClient;

/// One log event with its joined source attributes, as read from the graph.
///
/// Schema: (LogEntry)-[:EMITTED_BY]->(Service), (LogEntry)-[:RUNNING_ON]->(Pod),
/// (LogEntry)-[:PART_OF_TRACE]->(Trace)-[:IS_SCENARIO]->(Scenario).
#[derive(Debug, Clone)]
pub struct TraceEvent {
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub pod: Option<String>,
    pub trace_id: String,
    pub scenario: Option<String>,
}

/// A vector-search hit plus its causal neighborhood: the prior
/// elevated-severity events in the same trace.
#[derive(Debug, Clone)]
pub struct AnchorEvent {
    pub event: TraceEvent,
    pub score: f64,
    pub root_causes: Vec<RootCauseCandidate>,
}

/// Read boundary to the evidence store. The retriever depends on this
/// trait, not on Neo4j, so the pipeline is testable without a database.
#[async_trait]
pub trait EvidenceStore: Send + Sync {
    /// All events of one trace, ordered ascending by timestamp.
    async fn trace_events(&self, trace_id: &str) -> Result<Vec<TraceEvent>>;

    /// Top-`limit` nearest neighbors of `embedding`, expanded outward to
    /// source attributes and backward in time to root-cause candidates.
    /// The time filter is applied inside the query, before scoring.
    /// Ordered descending by similarity score.
    async fn similar_events(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: &TimeFilter,
    ) -> Result<Vec<AnchorEvent>>;
}

/// Neo4j-backed evidence store. Holds connection parameters only; a bolt
/// connection is established per operation and dropped on every exit path.
pub struct GraphStore {
    uri: String,
    user: String,
    password: String,
    vector_index: String,
}

impl GraphStore {
    pub fn new(uri: &str, user: &str, password: &str, vector_index: &str) -> Self {
        Self {
            uri: uri.to_string(),
            user: user.to_string(),
            password: password.to_string(),
            vector_index: vector_index.to_string(),
        }
    }

    async fn connect(&self) -> Result<GraphClient> {
        GraphClient::connect(&self.uri, &self.user, &self.password).await
    }
}

#[async_trait]
impl EvidenceStore for GraphStore {
    async fn trace_events(&self, trace_id: &str) -> Result<Vec<TraceEvent>> {
        let client = self.connect().await?;

        let q = query(
            "MATCH (e:LogEntry)-[:PART_OF_TRACE]->(t:Trace {trace_id: $trace_id})
             MATCH (e)-[:EMITTED_BY]->(s:Service)
             OPTIONAL MATCH (e)-[:RUNNING_ON]->(p:Pod)
             OPTIONAL MATCH (t)-[:IS_SCENARIO]->(sc:Scenario)
             RETURN e.message AS message, e.level AS level, e.timestamp AS timestamp,
                    s.name AS service, p.id AS pod, t.trace_id AS trace_id,
                    sc.name AS scenario
             ORDER BY e.timestamp ASC",
        )
        .param("trace_id", trace_id);

        let mut events = Vec::new();
        let mut stream = client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            if let Some(event) = row_to_event(&row) {
                events.push(event);
            }
        }

        debug!(trace_id, events = events.len(), "exact trace lookup");
        Ok(events)
    }

    async fn similar_events(
        &self,
        embedding: &[f32],
        limit: usize,
        filter: &TimeFilter,
    ) -> Result<Vec<AnchorEvent>> {
        let client = self.connect().await?;

        // Timestamps are stored as RFC 3339 strings; lexicographic order
        // matches chronological order, so the bounds apply as plain string
        // comparisons inside the query.
        let mut bounds = Vec::new();
        if filter.start.is_some() {
            bounds.push("anchor.timestamp >= $start");
        }
        if filter.end.is_some() {
            bounds.push("anchor.timestamp <= $end");
        }
        let time_clause = if bounds.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", bounds.join(" AND "))
        };

        // One row per (anchor, prior) pair; anchors without priors yield a
        // single row with null cause columns. Grouped back in Rust.
        let cypher = format!(
            "CALL db.index.vector.queryNodes($index, $limit, $embedding)
             YIELD node AS anchor, score
             {time_clause}
             MATCH (anchor)-[:EMITTED_BY]->(s:Service)
             OPTIONAL MATCH (anchor)-[:RUNNING_ON]->(p:Pod)
             OPTIONAL MATCH (anchor)-[:PART_OF_TRACE]->(t:Trace)
             OPTIONAL MATCH (t)-[:IS_SCENARIO]->(sc:Scenario)
             OPTIONAL MATCH (t)<-[:PART_OF_TRACE]-(prior:LogEntry)-[:EMITTED_BY]->(ps:Service)
             WHERE prior.timestamp < anchor.timestamp
               AND prior.level IN ['WARN', 'ERROR', 'CRITICAL']
             RETURN elementId(anchor) AS anchor_key,
                    anchor.message AS message, anchor.level AS level,
                    anchor.timestamp AS timestamp,
                    s.name AS service, p.id AS pod, t.trace_id AS trace_id,
                    sc.name AS scenario, score,
                    ps.name AS cause_service, prior.message AS cause_message,
                    prior.level AS cause_level, prior.timestamp AS cause_timestamp
             ORDER BY score DESC"
        );

        let embedding_vec: Vec<f64> = embedding.iter().map(|&v| v as f64).collect();
        let mut q = query(&cypher)
            .param("index", self.vector_index.as_str())
            .param("limit", limit as i64)
            .param("embedding", embedding_vec);
        if let Some(start) = filter.start {
            q = q.param("start", start.to_rfc3339());
        }
        if let Some(end) = filter.end {
            q = q.param("end", end.to_rfc3339());
        }

        let mut anchors: Vec<AnchorEvent> = Vec::new();
        let mut index_by_key: HashMap<String, usize> = HashMap::new();

        let mut stream = client.graph.execute(q).await?;
        while let Some(row) = stream.next().await? {
            let key: String = row.get("anchor_key").unwrap_or_default();

            let idx = match index_by_key.get(&key) {
                Some(&idx) => idx,
                None => {
                    let Some(event) = row_to_event(&row) else {
                        continue;
                    };
                    let score: f64 = row.get("score").unwrap_or(0.0);
                    anchors.push(AnchorEvent {
                        event,
                        score,
                        root_causes: Vec::new(),
                    });
                    index_by_key.insert(key, anchors.len() - 1);
                    anchors.len() - 1
                }
            };

            if let Some(cause) = row_to_root_cause(&row) {
                anchors[idx].root_causes.push(cause);
            }
        }

        debug!(anchors = anchors.len(), "vector similarity retrieval");
        Ok(anchors)
    }
}

fn row_to_event(row: &neo4rs::Row) -> Option<TraceEvent> {
    let message: String = row.get("message").ok()?;
    let timestamp = parse_timestamp(&row.get::<String>("timestamp").ok()?)?;
    let level: String = row.get("level").unwrap_or_default();
    let service: String = row.get("service").unwrap_or_default();
    let trace_id: String = row.get("trace_id").unwrap_or_default();

    Some(TraceEvent {
        message,
        severity: Severity::parse(&level),
        timestamp,
        service,
        pod: non_empty(row.get("pod").unwrap_or_default()),
        trace_id,
        scenario: non_empty(row.get("scenario").unwrap_or_default()),
    })
}

fn row_to_root_cause(row: &neo4rs::Row) -> Option<RootCauseCandidate> {
    let message: String = row.get("cause_message").ok()?;
    if message.is_empty() {
        return None;
    }
    let timestamp = parse_timestamp(&row.get::<String>("cause_timestamp").ok()?)?;
    let level: String = row.get("cause_level").unwrap_or_default();

    Some(RootCauseCandidate {
        service: row.get("cause_service").unwrap_or_default(),
        message,
        severity: Severity::parse(&level),
        timestamp,
    })
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Parse an RFC 3339 timestamp, falling back to a bare naive datetime.
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_rfc3339() {
        let dt = parse_timestamp("2026-03-01T12:30:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-03-01T12:30:00+00:00");
    }

    #[test]
    fn parse_timestamp_naive_fallback() {
        assert!(parse_timestamp("2026-03-01T12:30:00").is_some());
        assert!(parse_timestamp("not a date").is_none());
    }
}
