//! visionpipe serving binary.
//!
//! Loads the best checkpoint once at startup and serves predictions next to
//! the proxied text-generation endpoints. A missing or incompatible
//! checkpoint does not stop the server: the prediction path answers 503
//! until a model is available while health reporting and the
//! text-generation path stay live.

mod conversations;
mod error;
mod llm;
mod routes;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use visionpipe::backend::{backend_name, default_device, DefaultBackend};
use visionpipe::inference::Predictor;

use crate::conversations::ConversationLog;
use crate::llm::LlmClient;
use crate::state::AppState;

/// visionpipe inference server
#[derive(Parser, Debug)]
#[command(name = "visionpipe-server")]
#[command(version)]
#[command(about = "HTTP API for image classification and text generation")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Path to the checkpoint file
    #[arg(long, default_value = "../checkpoints/best.mpk")]
    checkpoint_path: PathBuf,

    /// Number of output classes the checkpoint was trained with
    #[arg(short, long, default_value = "10")]
    num_classes: usize,

    /// Path of the conversation log
    #[arg(long, default_value = "conversations.jsonl")]
    conversations_path: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();

    info!("visionpipe server v{}", env!("CARGO_PKG_VERSION"));
    info!("  Backend:       {}", backend_name());
    info!("  Checkpoint:    {:?}", cli.checkpoint_path);
    info!("  Classes:       {}", cli.num_classes);
    info!("  Conversations: {:?}", cli.conversations_path);

    // All dependencies are built once here and shared immutably; request
    // handlers never construct or mutate them.
    let predictor = match Predictor::<DefaultBackend>::from_checkpoint(
        &cli.checkpoint_path,
        cli.num_classes,
        default_device(),
    ) {
        Ok(predictor) => Some(predictor),
        Err(e) => {
            warn!(
                "could not load model from {:?}: {}. Prediction requests will answer 503.",
                cli.checkpoint_path, e
            );
            None
        }
    };

    let llm = LlmClient::from_env();
    if !llm.available() {
        warn!("OPENAI_API_KEY not set; text-generation requests will answer 503");
    }

    let log = ConversationLog::open(&cli.conversations_path)?;
    info!("Conversation log holds {} records", log.len().await);

    let state = Arc::new(AppState::new(predictor, llm, log));

    let app = Router::new()
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/predict", post(routes::predict::predict))
        .route("/generate", post(routes::generate::generate_text))
        .route("/summarize", post(routes::generate::summarize_text))
        .route("/code-complete", post(routes::generate::code_complete))
        .route("/conversations", get(routes::conversations::list_conversations))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port).parse()?;
    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
