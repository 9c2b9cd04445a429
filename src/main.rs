mod clients;
mod config;
mod dashboard;
mod helpers;
mod models;
mod routes;
mod session;
mod sync;

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use clients::HttpResourceClient;
use dashboard::DashboardHost;
use session::Session;
use sync::PollSettings;

#[derive(Clone)]
pub struct AppState {
    pub host: Arc<DashboardHost>,
    pub session: Arc<Session>,
    pub config: Arc<config::Config>,
}

fn config_path() -> String {
    let args: Vec<String> = std::env::args().skip(1).collect();
    args.iter()
        .zip(args.iter().skip(1))
        .find_map(|(k, v)| (k == "-config" || k == "--config").then(|| v.clone()))
        .or_else(|| args.first().filter(|a| !a.starts_with('-')).cloned())
        .unwrap_or_else(|| "/etc/stack-console/config.yaml".to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stack_console=info,tower_http=info".into()),
        )
        .init();

    let config_path = config_path();
    let cfg = config::Config::load(&PathBuf::from(&config_path)).unwrap_or_else(|e| {
        eprintln!("error loading config: {}", e);
        std::process::exit(1);
    });

    let session = Arc::new(Session::new(cfg.session.operator_token.clone()));

    let client = HttpResourceClient::new(
        &cfg.backend.base_url,
        cfg.request_timeout(),
        session.clone(),
    )
    .unwrap_or_else(|e| {
        eprintln!("error creating backend client: {}", e);
        std::process::exit(1);
    });

    let settings = PollSettings::new(cfg.poll_interval(), cfg.request_timeout());
    let host = Arc::new(DashboardHost::new(Arc::new(client), settings, session.clone()));
    let cfg = Arc::new(cfg);

    // Shutdown signal
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());

    // Mount the dashboard whenever the session is authenticated
    let host_clone = host.clone();
    let auth_rx = session.subscribe();
    let host_task = tokio::spawn(async move {
        host_clone.run(auth_rx, shutdown_rx).await;
    });

    let state = AppState {
        host,
        session,
        config: cfg.clone(),
    };

    let router = routes::build_router(state);

    let listen_addr = cfg.listen_addr();
    let listener = TcpListener::bind(&listen_addr).await.unwrap_or_else(|e| {
        eprintln!("failed to bind {}: {}", listen_addr, e);
        std::process::exit(1);
    });

    info!(
        backend = %cfg.backend.base_url,
        poll_secs = cfg.poll_interval_secs,
        "stack-console listening on {}",
        listen_addr
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(());
        })
        .await
        .unwrap_or_else(|e| {
            eprintln!("server error: {}", e);
            std::process::exit(1);
        });

    let _ = host_task.await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
