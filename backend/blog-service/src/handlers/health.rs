/// Health endpoints: summary, readiness (PostgreSQL + upload directory) and liveness
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::services::FileStorageService;

pub const SERVICE_NAME: &str = "blog-service";

pub struct HealthState {
    db_pool: PgPool,
    storage: Arc<FileStorageService>,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct ComponentCheck {
    pub status: ComponentStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    checks: HashMap<String, ComponentCheck>,
    timestamp: String,
}

impl HealthState {
    pub fn new(db_pool: PgPool, storage: Arc<FileStorageService>) -> Self {
        Self { db_pool, storage }
    }

    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        let mut conn = db_pool::acquire_with_metrics(&self.db_pool, SERVICE_NAME).await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await.map(|_| ())
    }

    async fn check_postgres_component(&self) -> ComponentCheck {
        let start = Instant::now();
        let result = self.check_postgres().await;
        let latency_ms = Some(start.elapsed().as_millis() as u64);

        match result {
            Ok(()) => ComponentCheck {
                status: ComponentStatus::Healthy,
                message: "PostgreSQL connection successful".to_string(),
                latency_ms,
            },
            Err(e) => ComponentCheck {
                status: ComponentStatus::Unhealthy,
                message: format!("PostgreSQL connection failed: {}", e),
                latency_ms,
            },
        }
    }
}

/// Upload directory must exist and be a writable directory.
pub async fn check_upload_dir(dir: &Path) -> ComponentCheck {
    let (status, message) = match tokio::fs::metadata(dir).await {
        Ok(meta) if !meta.is_dir() => (
            ComponentStatus::Unhealthy,
            format!("{} is not a directory", dir.display()),
        ),
        Ok(meta) if meta.permissions().readonly() => (
            ComponentStatus::Unhealthy,
            format!("{} is read-only", dir.display()),
        ),
        Ok(_) => (
            ComponentStatus::Healthy,
            "Upload directory available".to_string(),
        ),
        Err(e) => (
            ComponentStatus::Unhealthy,
            format!("Upload directory unavailable: {}", e),
        ),
    };

    ComponentCheck {
        status,
        message,
        latency_ms: None,
    }
}

pub async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.check_postgres().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "error": "PostgreSQL connection failed",
                "service": SERVICE_NAME
            }))
        }
    }
}

pub async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let mut checks = HashMap::new();
    checks.insert(
        "postgresql".to_string(),
        state.check_postgres_component().await,
    );
    checks.insert(
        "storage".to_string(),
        check_upload_dir(state.storage.base_dir()).await,
    );

    let ready = checks
        .values()
        .all(|check| check.status == ComponentStatus::Healthy);
    let response = ReadinessResponse {
        ready,
        status: if ready {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        },
        checks,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}
