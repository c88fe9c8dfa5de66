mod routes;

use anyhow::Context;
use clap::Parser;
use docqa_core::{
    AnswerEngine, EmbeddingClientConfig, ExtractorRegistry, GenerationClientConfig,
    HttpEmbeddingClient, HttpGenerationClient, IngestionOptions, IngestionPipeline,
    MemoryStore, MemoryVectorIndex,
};
use routes::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Document question-answering server: upload PDF, DOCX, or TXT files and
/// ask questions grounded in their contents.
#[derive(Debug, Parser)]
#[command(name = "docqa-server", version, about)]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "DOCQA_BIND", default_value = "127.0.0.1:5000")]
    bind: SocketAddr,

    /// Embeddings endpoint URL ({input, model} wire format).
    #[arg(
        long,
        env = "DOCQA_EMBEDDING_ENDPOINT",
        default_value = "http://127.0.0.1:8000/v1/embeddings"
    )]
    embedding_endpoint: String,

    /// Embedding model name; vectors in the index are stamped with it.
    #[arg(
        long,
        env = "DOCQA_EMBEDDING_MODEL",
        default_value = "text-embedding-3-small"
    )]
    embedding_model: String,

    /// API key for the embeddings endpoint.
    #[arg(long, env = "DOCQA_EMBEDDING_API_KEY")]
    embedding_api_key: Option<String>,

    /// Base URL of an OpenAI-compatible chat completions API.
    #[arg(
        long,
        env = "DOCQA_GENERATION_BASE_URL",
        default_value = "https://api.deepseek.com"
    )]
    generation_base_url: String,

    /// Chat model used to synthesize answers.
    #[arg(long, env = "DOCQA_CHAT_MODEL", default_value = "deepseek-chat")]
    chat_model: String,

    /// API key for the chat completions API.
    #[arg(long, env = "DOCQA_GENERATION_API_KEY")]
    generation_api_key: Option<String>,

    /// Directory where uploaded files are stored.
    #[arg(long, env = "DOCQA_UPLOAD_DIR", default_value = "uploads")]
    upload_dir: PathBuf,

    /// Maximum accepted upload size in megabytes.
    #[arg(long, env = "DOCQA_MAX_UPLOAD_MB", default_value_t = 10)]
    max_upload_mb: u64,

    /// Maximum characters per chunk.
    #[arg(long, env = "DOCQA_CHUNK_CHARS", default_value_t = 500)]
    chunk_chars: usize,

    /// Number of chunks retrieved per question.
    #[arg(long, env = "DOCQA_TOP_K", default_value_t = 4)]
    top_k: usize,

    /// Timeout for embedding and generation provider calls, in seconds.
    #[arg(long, env = "DOCQA_PROVIDER_TIMEOUT_SECS", default_value_t = 60)]
    provider_timeout_secs: u64,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,docqa_core=debug,docqa_server=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let timeout = Duration::from_secs(cli.provider_timeout_secs);

    let embedder = Arc::new(
        HttpEmbeddingClient::new(EmbeddingClientConfig {
            endpoint: cli.embedding_endpoint,
            model: cli.embedding_model.clone(),
            api_key: cli.embedding_api_key,
            timeout,
        })
        .context("failed to build embedding client")?,
    );
    let generator = Arc::new(
        HttpGenerationClient::new(GenerationClientConfig {
            base_url: cli.generation_base_url,
            model: cli.chat_model,
            api_key: cli.generation_api_key,
            timeout,
        })
        .context("failed to build generation client")?,
    );

    let store = Arc::new(MemoryStore::new());
    let index = Arc::new(MemoryVectorIndex::new(cli.embedding_model));

    let options = IngestionOptions {
        chunk_max_chars: cli.chunk_chars,
        top_k: cli.top_k,
    };
    let pipeline = Arc::new(IngestionPipeline::new(
        store.clone(),
        index.clone(),
        embedder.clone(),
        ExtractorRegistry::with_defaults(),
        options,
    ));
    let engine = Arc::new(AnswerEngine::new(
        store.clone(),
        index.clone(),
        embedder,
        generator,
        cli.top_k,
    ));

    let state = AppState {
        store,
        index,
        pipeline,
        engine,
        upload_dir: cli.upload_dir,
        max_upload_bytes: cli.max_upload_mb * 1024 * 1024,
    };
    let app = routes::router(state);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        bind = %cli.bind,
        started_at = %chrono::Utc::now().to_rfc3339(),
        "docqa-server listening"
    );

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    axum::serve(listener, app)
        .await
        .context("server terminated")?;

    Ok(())
}
