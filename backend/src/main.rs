use std::sync::Arc;

use tokio::signal;
use todo_backend::{api, auth::AccessGuard, config::Config, service::TaskService, store::SqliteTaskStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!("Configuration error: {}", error);
            std::process::exit(1);
        }
    };

    let store = match SqliteTaskStore::from_url(&config.database_url) {
        Ok(store) => store,
        Err(error) => {
            tracing::error!(database_url = %config.database_url, "Failed to open task store: {}", error);
            std::process::exit(1);
        }
    };

    let guard = match AccessGuard::new(&config.users()) {
        Ok(guard) => guard,
        Err(error) => {
            tracing::error!("Failed to provision users: {}", error);
            std::process::exit(1);
        }
    };

    let app = api::app(TaskService::new(Arc::new(store)), guard);

    let addr = config.addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(error) => {
            tracing::error!(%addr, "Failed to bind: {}", error);
            std::process::exit(1);
        }
    };
    tracing::info!("Server running on http://{}", addr);
    tracing::info!("Database: {}", config.database_url);

    if let Err(error) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", error);
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", error);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install SIGTERM handler: {}", error);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutting down");
}
