use actix_web::web;

use crate::handlers::health_handlers::health_check;
use crate::handlers::qr_handlers::{
    create_qr, delete_qr, get_qr, get_qr_image, get_qr_stats, list_qr_codes, update_qr,
};
use crate::handlers::redirect_handlers::handle_redirect;
use crate::middlewares::authmw::JwtAuth;

/// Configure the routes
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // Public scan endpoint at the root level
    cfg.route("/q/{qr_id}", web::get().to(handle_redirect));
    // Liveness probe - no auth required
    cfg.route("/api/health", web::get().to(health_check));
    // Owner-scoped QR management - requires a bearer token
    cfg.service(
        web::scope("/api/qr")
            .wrap(JwtAuth)
            .route("", web::post().to(create_qr))
            .route("", web::get().to(list_qr_codes))
            .route("/{qr_id}", web::get().to(get_qr))
            .route("/{qr_id}", web::patch().to(update_qr))
            .route("/{qr_id}", web::delete().to(delete_qr))
            .route("/{qr_id}/stats", web::get().to(get_qr_stats))
            .route("/{qr_id}/image", web::get().to(get_qr_image)),
    );
}
