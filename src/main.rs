use professor_rag_agent::api;
use professor_rag_agent::config::RagConfig;
use professor_rag_agent::database::vector_db::PineconeIndex;
use professor_rag_agent::llm::ChatOrchestrator;
use professor_rag_agent::providers::openai::openai::OpenAIProvider;

use clap::Parser;
use dotenv::dotenv;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    #[arg(long, default_value = "3000")]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Load environment variables
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = RagConfig::from_env();

    let openai_key = env::var("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY must be set");
    let pinecone_key = env::var("PINECONE_API_KEY")
        .expect("PINECONE_API_KEY must be set");

    let provider = OpenAIProvider::new(
        openai_key,
        config.chat_model.clone(),
        config.embedding_model.clone(),
    );

    println!(
        "Connecting to vector index '{}' (namespace '{}')...",
        config.index_name, config.namespace
    );
    let index = PineconeIndex::connect(
        &pinecone_key,
        &config.index_name,
        &config.namespace,
        config.upstream_timeout,
    )
    .await?;

    let orchestrator = ChatOrchestrator::new(Arc::new(provider), Arc::new(index), config);
    let app = api::create_api(orchestrator);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .map_err(|e| format!("Failed to parse bind address: {}", e))?;

    println!("Starting API server on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    println!("Ready to accept connections!");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
