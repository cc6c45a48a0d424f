use actix_web::HttpResponse;

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Smart QR Generator API is running",
        "timestamp": chrono::Utc::now().timestamp_millis(),
    }))
}
