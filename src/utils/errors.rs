use actix_web::error;
use std::env;
use std::fmt::Display;

pub fn dev_mode() -> bool {
    env::var("APP_ENV").is_ok_and(|v| v == "development")
}

/// Map an unexpected failure to a 500. The underlying cause is always
/// logged; it only reaches the response body in development mode.
pub fn internal_error<E: Display>(err: E) -> actix_web::Error {
    log::error!("Internal error: {}", err);
    if dev_mode() {
        error::ErrorInternalServerError(format!("Internal error: {}", err))
    } else {
        error::ErrorInternalServerError("An internal server error occurred")
    }
}
