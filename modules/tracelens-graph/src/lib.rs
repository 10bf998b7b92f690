pub mod client;
pub mod narrative;
pub mod store;

pub use client::GraphClient;
pub use store::{AnchorEvent, EvidenceStore, GraphStore, TraceEvent};
