pub async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now(),
    }))
}

pub async fn root() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "service": "Silica License Authority",
        "status": "running",
        "timestamp": chrono::Utc::now(),
    }))
}
