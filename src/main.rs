use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use roster_uploads::client::{
    HttpTransport, HttpUploadApi, LoggingObserver, UploadCandidate, UploadOrchestrator,
    UploadState,
};
use roster_uploads::config::{ClientConfig, StorageConfig};
use roster_uploads::infrastructure::storage;
use roster_uploads::models::{StoredObject, public_link};
use roster_uploads::{AppState, create_app};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the edge API that signs uploads and lists stored objects
    Serve {
        /// Port for the API server
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Upload one file straight to object storage
    Upload {
        /// File to upload
        path: PathBuf,
    },
    /// List stored objects
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roster_uploads=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.command {
        Command::Serve { port } => serve(port).await,
        Command::Upload { path } => upload(path).await,
        Command::List => list().await,
    }
}

async fn serve(port: u16) -> anyhow::Result<()> {
    info!("🚀 Starting roster upload API...");

    let config = StorageConfig::from_env()?;
    let storage_service = storage::setup_storage(&config).await;
    info!(
        "🔏 Presigned URLs expire after {}s",
        config.presign_expires_secs
    );

    let state = AppState {
        storage: storage_service,
        config,
    };

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        })
        .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
            info!("📥 {} {}", request.method(), request.uri().path());
        })
        .on_response(
            |response: &axum::http::Response<_>,
             latency: std::time::Duration,
             _span: &tracing::Span| {
                info!(
                    "📤 Finished in {:?} with status {}",
                    latency,
                    response.status()
                );
            },
        );

    let app = create_app(state).layer(trace_layer);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("✅ API Server listening on: http://0.0.0.0:{}", port);
    info!("📖 Swagger UI documentation: http://localhost:{}/swagger-ui", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server exited cleanly.");
    Ok(())
}

fn orchestrator(config: &ClientConfig) -> anyhow::Result<UploadOrchestrator> {
    let api = Arc::new(HttpUploadApi::new(&config.api_base)?);
    Ok(UploadOrchestrator::new(
        api.clone(),
        Arc::new(HttpTransport::default()),
        api,
    )
    .with_observer(Arc::new(LoggingObserver::new()))
    .with_max_file_size(config.max_file_size))
}

async fn upload(path: PathBuf) -> anyhow::Result<()> {
    let config = ClientConfig::from_env();
    let orchestrator = orchestrator(&config)?;

    let candidate = UploadCandidate::from_path(&path).await?;
    info!(
        "📄 {} ({} bytes, {})",
        candidate.name,
        candidate.byte_size,
        candidate.content_type()
    );

    let state = UploadState::default().select(candidate);
    let state = orchestrator.upload(state).await;

    if let Some(message) = state.message {
        anyhow::bail!(message);
    }

    print_objects(&state.objects, &config);
    Ok(())
}

async fn list() -> anyhow::Result<()> {
    let config = ClientConfig::from_env();
    let state = orchestrator(&config)?
        .refresh(UploadState::default())
        .await;

    print_objects(&state.objects, &config);
    Ok(())
}

fn print_objects(objects: &[StoredObject], config: &ClientConfig) {
    for object in objects {
        let location = match &config.public_host {
            Some(host) => public_link(host, &object.key),
            None => object.key.clone(),
        };
        println!("{:>12}  {:<25}  {}", object.size, object.uploaded, location);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
