use actix_web::{web, App, HttpServer};
use db_pool::{create_pool, DbConfig};
use std::io;
use std::sync::Arc;
use thought_service::config::StoreBackend;
use thought_service::db::{MemoryThoughtStore, PgThoughtStore, ThoughtStore};
use thought_service::handlers::{configure_routes, cors, ServiceInfo};
use thought_service::services::ThoughtService;
use thought_service::{logging, metrics, Config};

async fn build_store(config: &Config) -> io::Result<Arc<dyn ThoughtStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryThoughtStore::new()))
        }
        StoreBackend::Postgres => {
            let mut db_cfg = DbConfig::from_env("thought-service")
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            if db_cfg.database_url.is_empty() {
                db_cfg.database_url = config.database.url.clone();
            }
            db_cfg.log_config();

            let pool = create_pool(db_cfg).await.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to create database pool: {}", e),
                )
            })?;

            let store = PgThoughtStore::new(pool);
            store.migrate().await.map_err(|e| {
                io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to run migrations: {}", e),
                )
            })?;
            tracing::info!("Database migrations applied");

            Ok(Arc::new(store))
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Thought Service
///
/// Persistence gateway for Free Fall. Serves the post/comment/like API at the
/// root and under `/api`, plus `/health`, `/health/ready` and `/metrics`.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    logging::init_tracing(config.log.format);

    tracing::info!("Starting thought-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        env = %config.app.env,
        site_url = %config.app.site_url,
        api_base_url = %config.app.api_base_url,
        store = ?config.store.backend,
        "Configuration loaded"
    );

    let store = build_store(&config).await?;
    let service = web::Data::new(ThoughtService::with_policy(store, config.store.policy()));
    let info = web::Data::new(ServiceInfo {
        api_base_url: config.app.api_base_url.clone(),
    });

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(service.clone())
            .app_data(info.clone())
            .wrap(cors(&cors_config))
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .service(web::scope("/api").configure(configure_routes))
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run();

    let server_handle = server.handle();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    tokio::select! {
        result = server => {
            result?;
        }
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    tracing::info!("thought-service shut down");
    Ok(())
}
