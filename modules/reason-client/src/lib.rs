pub mod client;
pub mod schema;
pub mod traits;
pub(crate) mod types;

pub use client::Reasoner;
pub use schema::StructuredOutput;
pub use traits::{ReasoningService, TextEmbedder};
