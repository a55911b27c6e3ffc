use perpindex::{
    api, config::Config, db::init_db, ChainReader, HttpChainReader, Projector, Replayer,
    Repository,
};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let chain: Arc<dyn ChainReader> =
        Arc::new(HttpChainReader::new(config.chain_reader_url.clone()));

    let projector =
        match Projector::restore(repo.clone(), chain, config.projector.clone()).await {
            Ok(p) => p,
            Err(e) => {
                eprintln!("Failed to restore projector state: {}", e);
                std::process::exit(1);
            }
        };

    // Project the event stream before serving reads
    let mut replayer = Replayer::new(projector, repo.clone(), config.dedupe_events);
    if let Err(e) = replayer.replay_file(Path::new(&config.events_path)).await {
        eprintln!("Replay of {} failed: {}", config.events_path, e);
        std::process::exit(1);
    }

    // Create router
    let app = api::create_router(api::AppState::new(repo));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
