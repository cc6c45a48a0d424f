use actix_web::{HttpResponse, http, web};

use crate::models::qr_record::RedirectValidity;
use crate::state::app_state::AppState;
use crate::utils::error_page::ErrorPage;

fn html_page(mut builder: actix_web::HttpResponseBuilder, page: ErrorPage) -> HttpResponse {
    builder
        .content_type("text/html; charset=utf-8")
        .body(page.render())
}

/// Public scan endpoint: `GET /q/{qr_id}`.
///
/// Looks up the record, re-evaluates validity (expiry is time-dependent, so
/// never cached), logs the scan, then redirects. The scan event is appended
/// *before* the redirect is issued so that a scan is durably recorded even
/// if the client never follows the response. If the append fails the visitor
/// still gets their redirect; analytics loses one event, not the user.
pub async fn handle_redirect(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let qr_id = path.into_inner();

    let record = match app_state.qr_store.get(&qr_id).await {
        Ok(record) => record,
        Err(e) => {
            log::error!("Redirect lookup failed for {}: {}", qr_id, e);
            return html_page(HttpResponse::InternalServerError(), ErrorPage::Internal);
        }
    };

    // Unknown identifiers get the same generic page as deleted ones
    let Some(record) = record else {
        return html_page(HttpResponse::NotFound(), ErrorPage::NotFound);
    };

    let now = chrono::Utc::now().timestamp_millis();
    match record.redirect_validity(now) {
        RedirectValidity::Invalid(reason) => {
            html_page(HttpResponse::Gone(), ErrorPage::from(reason))
        }
        RedirectValidity::Valid => {
            if let Err(e) = app_state.scan_store.append(&qr_id, now).await {
                log::error!("Failed to record scan for {}: {}", qr_id, e);
            }

            HttpResponse::Found()
                .append_header((http::header::LOCATION, record.target_url))
                .finish()
        }
    }
}
