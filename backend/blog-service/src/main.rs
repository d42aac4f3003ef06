use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;

use blog_service::db::{self, PgCommentRepository, PgImageRepository, PgPostRepository};
use blog_service::handlers::{self, health::HealthState};
use blog_service::openapi::{self, ApiDoc};
use blog_service::{build_storage, metrics, middleware, AppServices, Config};
use db_pool::{create_pool, DbConfig};

const SERVICE_NAME: &str = "blog-service";

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    for origin in allowed_origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method().allow_any_header().max_age(3600)
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

/// Blog Service
///
/// # Routes
///
/// - `/api/posts/*` - Posts, likes, tags, comments and the post image
/// - `/api/health`, `/api/health/ready`, `/api/health/live` - Probes
/// - `/metrics` - Prometheus metrics
/// - `/api/openapi.json` - OpenAPI document
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().map_err(anyhow::Error::msg)?;
    tracing::info!(env = %config.app.env, "Starting {}", SERVICE_NAME);

    let mut db_cfg = DbConfig::from_env(SERVICE_NAME).map_err(anyhow::Error::msg)?;
    db_cfg.database_url = config.database.url.clone();
    db_cfg.max_connections = config.database.max_connections;
    db_cfg.log_config();

    let db_pool = create_pool(db_cfg)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&db_pool)
        .await
        .context("Failed to run database migrations")?;

    let storage = Arc::new(build_storage(&config.storage));
    storage
        .ensure_base_dir()
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.storage.upload_dir))?;
    tracing::info!(upload_dir = %storage.base_dir().display(), "Image storage ready");

    let services = AppServices::new(
        Arc::new(PgPostRepository::new(db_pool.clone())),
        Arc::new(PgCommentRepository::new(db_pool.clone())),
        Arc::new(PgImageRepository::new(db_pool.clone())),
        storage.clone(),
        &config.storage,
    );
    let health_state = web::Data::new(HealthState::new(db_pool.clone(), storage));
    let openapi_doc = web::Data::new(ApiDoc::openapi());

    let bind_address = config.bind_address();
    let workers = config.app.workers;
    let allowed_origins = config.cors.allowed_origins.clone();

    let server = HttpServer::new(move || {
        App::new()
            .app_data(openapi_doc.clone())
            .app_data(health_state.clone())
            .wrap(middleware::MetricsMiddleware)
            .wrap(build_cors(&allowed_origins))
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(metrics::serve_metrics))
            .route(ApiDoc::openapi_json_path(), web::get().to(openapi::openapi_json))
            .configure(handlers::configure_health)
            .configure(|cfg| services.configure(cfg))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .workers(workers)
    .run();

    tracing::info!("HTTP server listening on {}", bind_address);

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    tokio::select! {
        result = server_task => {
            result.context("HTTP server task failed")??;
        }
        _ = shutdown_signal() => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
        }
    }

    db_pool.close().await;
    tracing::info!("{} shut down", SERVICE_NAME);
    Ok(())
}
