use axum::Json;
use chrono::Utc;

use crate::dto::HealthResponse;

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now(),
        message: "rentfolio api is running",
    })
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use chrono::Utc;

    use super::health_handler;

    #[tokio::test]
    async fn health_reports_status_timestamp_and_message() {
        let Json(body) = health_handler().await;

        assert_eq!(body.status, "healthy");
        assert!(!body.message.is_empty());
        assert!(body.timestamp <= Utc::now());
    }
}
