use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use reason_client::Reasoner;
use tracelens_agent::Pipeline;
use tracelens_common::Config;
use tracelens_graph::GraphStore;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("tracelens_agent=info".parse()?),
        )
        .init();

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.is_empty() {
        anyhow::bail!("usage: tracelens <question>");
    }

    let config = Config::from_env();

    let reasoner = Arc::new(
        Reasoner::new(&config.openai_api_key, &config.chat_model)
            .with_embedding_model(&config.embedding_model),
    );
    let store = Arc::new(GraphStore::new(
        &config.neo4j_uri,
        &config.neo4j_user,
        &config.neo4j_password,
        &config.vector_index,
    ));

    let pipeline = Pipeline::new(
        reasoner.clone(),
        reasoner,
        store,
        config.retrieval_limit,
        config.rerank_top_k,
    );

    info!(question = question.as_str(), "running pipeline");
    let response = pipeline.answer(&question).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
