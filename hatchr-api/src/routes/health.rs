use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;

use hatchr_shared::types::api::{HealthCheck, HealthResponse, HealthStatus};

use crate::AppState;

// --- GET /api/health ---

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let database = match state.db.get() {
        Ok(mut conn) => match diesel::sql_query("SELECT 1").execute(&mut conn) {
            Ok(_) => HealthCheck::passed("database"),
            Err(e) => query_failed(&e),
        },
        Err(e) => {
            tracing::warn!(error = %e, "health check could not reach the database");
            HealthCheck::failed("database", HealthStatus::Unhealthy, "database unreachable")
        }
    };

    let response = HealthResponse::healthy("hatchr-api", env!("CARGO_PKG_VERSION")).with_checks(vec![database]);
    (response.http_status(), Json(response))
}

/// Logs the driver error; callers only see a fixed message.
fn query_failed(err: &diesel::result::Error) -> HealthCheck {
    tracing::warn!(error = %err, "health check query failed");
    HealthCheck::failed("database", HealthStatus::Unhealthy, "database query failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error};

    #[test]
    fn query_errors_are_not_echoed() {
        let err = Error::DatabaseError(
            DatabaseErrorKind::Unknown,
            Box::new("relation \"secret_table\" does not exist".to_string()),
        );
        let check = query_failed(&err);
        assert_eq!(check.status, HealthStatus::Unhealthy);
        assert_eq!(check.message.as_deref(), Some("database query failed"));
    }
}
