use std::sync::Arc;
use std::time::Duration;

use axum::http::header;
use tokio::{signal, sync::mpsc};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{error, info, warn};

use stockroom_api as api;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(&cfg.log_level, cfg.log_json);

    let db_pool = api::db::establish_connection(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db_pool).await.map_err(|e| {
            error!("failed running migrations: {e}");
            e
        })?;
    }
    let db = Arc::new(db_pool);

    // Event channel plus its detached consumer. Notification delivery is
    // best-effort and lives entirely outside the request path.
    let (event_tx, event_rx) = mpsc::channel(1024);
    let event_sender = api::events::EventSender::new(event_tx);

    let notifier: Option<Arc<dyn api::events::Notifier>> = match &cfg.smtp {
        Some(smtp) => match api::events::EmailNotifier::new(db.clone(), smtp) {
            Ok(notifier) => {
                info!("email notifications enabled via {}", smtp.host);
                Some(Arc::new(notifier))
            }
            Err(err) => {
                warn!("failed to initialize email notifier, continuing without: {err}");
                None
            }
        },
        None => {
            info!("SMTP not configured; notifications are log-only");
            None
        }
    };
    tokio::spawn(api::events::process_events(event_rx, notifier));

    let services = api::handlers::AppServices::new(db.clone(), event_sender.clone(), &cfg);
    let state = api::AppState {
        db,
        config: cfg.clone(),
        event_sender,
        services,
    };

    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let app = api::api_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(cors);

    let addr = cfg.listen_addr();
    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
