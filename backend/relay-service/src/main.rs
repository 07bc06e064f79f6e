use actix_web::{web, App, HttpServer};
use relay_service::bind::bind_first_available;
use relay_service::{logging, routes, Config, RelayHub, RelayState};
use std::io;

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

/// Relay Service
///
/// WebSocket fan-out for Free Fall on `/ws` and `/api/socket`, with
/// `/health` and `/metrics`.
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

    logging::init_tracing(config.log_format);
    tracing::info!("Starting relay-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        fanout = ?config.fanout,
        heartbeat = ?config.heartbeat,
        origins = %config.allowed_origins,
        "Configuration loaded"
    );

    let listener = bind_first_available(&config.host, &config.candidate_ports())?;
    let addr = listener.local_addr()?;

    let origins = config.origins();
    let state = web::Data::new(RelayState {
        hub: RelayHub::new(),
        fanout: config.fanout,
        heartbeat: config.heartbeat,
        allowed_origins: origins.clone(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(routes::cors(&origins))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(routes::configure)
    })
    .listen(listener)?
    .run();

    tracing::info!("Relay listening on {}", addr);

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

    tracing::info!("relay-service shut down");
    Ok(())
}
