use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,

    // Reasoning service
    pub openai_api_key: String,
    pub chat_model: String,
    pub embedding_model: String,

    // Retrieval
    pub vector_index: String,
    pub retrieval_limit: usize,
    pub rerank_top_k: usize,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            neo4j_uri: required_env("NEO4J_URI"),
            neo4j_user: required_env("NEO4J_USER"),
            neo4j_password: required_env("NEO4J_PASSWORD"),
            openai_api_key: required_env("OPENAI_API_KEY"),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-large".to_string()),
            vector_index: env::var("VECTOR_INDEX")
                .unwrap_or_else(|_| "log_vector_index".to_string()),
            retrieval_limit: env::var("RETRIEVAL_LIMIT")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .expect("RETRIEVAL_LIMIT must be a number"),
            rerank_top_k: env::var("RERANK_TOP_K")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("RERANK_TOP_K must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}
