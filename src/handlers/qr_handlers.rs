use actix_web::{HttpRequest, HttpResponse, Responder, Result, error, web};
use qrcode::QrCode;
use qrcode::render::svg;
use validator::Validate;

use crate::middlewares::authmw::owner_id;
use crate::models::qr_record::QrRecord;
use crate::services::stats;
use crate::state::app_state::AppState;
use crate::stores::{Page, QrRecordPatch, TimeRange};
use crate::structs::qr_request::{CreateQrRequest, ListQrParams, StatsParams, UpdateQrRequest};
use crate::structs::qr_response::{
    CreateQrResponse, Pagination, QrDetailResponse, QrListResponse, QrSummary, StatsResponse,
    UpdateQrResponse,
};
use crate::utils::errors::internal_error;
use crate::utils::validators::is_valid_http_url;

fn base_url() -> String {
    std::env::var("HOST").unwrap_or_else(|_| String::from("http://localhost:8080"))
}

fn redirect_url(qr_id: &str) -> String {
    format!("{}/q/{}", base_url(), qr_id)
}

/// Render the scannable SVG for a redirect URL.
fn render_qr_svg(url: &str) -> Result<String> {
    let code = QrCode::new(url.as_bytes())
        .map_err(|e| error::ErrorInternalServerError(format!("QR code generation error: {}", e)))?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(200, 200)
        .quiet_zone(true)
        .build())
}

/// Create a new QR code
pub async fn create_qr(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    web::Json(body): web::Json<CreateQrRequest>,
) -> Result<impl Responder> {
    let owner = owner_id(&req)?;

    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }
    if !is_valid_http_url(&body.target_url) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": "Only http and https URLs are allowed"
        })));
    }

    // Validation happens before any mutation
    let now = chrono::Utc::now().timestamp_millis();
    if let Some(expires_at) = body.expires_at {
        if expires_at <= now {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Expiry date must be in the future"
            })));
        }
    }

    let record = QrRecord::new(
        owner,
        body.name,
        body.target_url,
        body.qr_type,
        body.expires_at,
    );

    app_state
        .qr_store
        .insert(&record)
        .await
        .map_err(internal_error)?;

    let redirect_url = redirect_url(&record.qr_id);
    let qr_svg = render_qr_svg(&redirect_url)?;

    Ok(HttpResponse::Created().json(CreateQrResponse {
        qr_id: record.qr_id,
        name: record.name,
        target_url: record.target_url,
        qr_type: record.qr_type,
        is_active: record.is_active,
        created_at: record.created_at,
        expires_at: record.expires_at,
        redirect_url,
        qr_svg,
    }))
}

/// List the owner's QR codes, newest first, with scan figures attached
pub async fn list_qr_codes(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListQrParams>,
) -> Result<impl Responder> {
    let owner = owner_id(&req)?;

    let page = Page {
        page: query.page.unwrap_or(1).max(1),
        limit: query.limit.unwrap_or(10).max(1),
    };
    let status = query.status.unwrap_or_default();

    let (records, total) = app_state
        .qr_store
        .list(&owner, status, page)
        .await
        .map_err(internal_error)?;

    let mut qr_codes = Vec::with_capacity(records.len());
    for record in records {
        let total_scans = app_state
            .scan_store
            .count(&record.qr_id)
            .await
            .map_err(internal_error)?;
        let last_scanned_at = app_state
            .scan_store
            .most_recent(&record.qr_id, 1)
            .await
            .map_err(internal_error)?
            .first()
            .copied();
        qr_codes.push(QrSummary::from_record(record, total_scans, last_scanned_at));
    }

    Ok(HttpResponse::Ok().json(QrListResponse {
        qr_codes,
        pagination: Pagination {
            current_page: page.page,
            total_pages: total.div_ceil(page.limit),
            total_items: total,
            items_per_page: page.limit,
        },
    }))
}

/// Get single QR code details
pub async fn get_qr(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<impl Responder> {
    let owner = owner_id(&req)?;
    let qr_id = path.into_inner();

    let record = app_state
        .qr_store
        .get_owned(&qr_id, &owner)
        .await
        .map_err(internal_error)?;

    match record {
        Some(record) => {
            let total_scans = app_state
                .scan_store
                .count(&qr_id)
                .await
                .map_err(internal_error)?;
            let last_scanned_at = app_state
                .scan_store
                .most_recent(&qr_id, 1)
                .await
                .map_err(internal_error)?
                .first()
                .copied();

            let redirect_url = redirect_url(&qr_id);
            Ok(HttpResponse::Ok().json(QrDetailResponse {
                summary: QrSummary::from_record(record, total_scans, last_scanned_at),
                redirect_url,
            }))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "QR code not found"
        }))),
    }
}

/// Partially update a QR code
pub async fn update_qr(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    web::Json(body): web::Json<UpdateQrRequest>,
) -> Result<impl Responder> {
    let owner = owner_id(&req)?;
    let qr_id = path.into_inner();

    if let Err(errors) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }
    if let Some(target_url) = &body.target_url {
        if !is_valid_http_url(target_url) {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Only http and https URLs are allowed"
            })));
        }
    }

    if let Some(Some(expires_at)) = body.expires_at {
        if expires_at <= chrono::Utc::now().timestamp_millis() {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Expiry date must be in the future"
            })));
        }
    }

    let patch = QrRecordPatch {
        name: body.name,
        target_url: body.target_url,
        is_active: body.is_active,
        expires_at: body.expires_at,
    };

    let updated = app_state
        .qr_store
        .update(&qr_id, &owner, patch)
        .await
        .map_err(internal_error)?;

    match updated {
        Some(record) => Ok(HttpResponse::Ok().json(UpdateQrResponse {
            qr_id: record.qr_id,
            name: record.name,
            target_url: record.target_url,
            is_active: record.is_active,
            expires_at: record.expires_at,
            updated_at: record.updated_at,
        })),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "QR code not found"
        }))),
    }
}

/// Delete a QR code and its scan history
pub async fn delete_qr(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<impl Responder> {
    let owner = owner_id(&req)?;
    let qr_id = path.into_inner();

    let record = app_state
        .qr_store
        .get_owned(&qr_id, &owner)
        .await
        .map_err(internal_error)?;

    if record.is_none() {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "QR code not found"
        })));
    }

    // Scan events have no FK to the record; cascade explicitly, events first
    app_state
        .scan_store
        .delete_all(&qr_id)
        .await
        .map_err(internal_error)?;
    app_state
        .qr_store
        .delete(&qr_id, &owner)
        .await
        .map_err(internal_error)?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "QR code deleted successfully"
    })))
}

/// Get scan statistics for a QR code
pub async fn get_qr_stats(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    query: web::Query<StatsParams>,
) -> Result<impl Responder> {
    let owner = owner_id(&req)?;
    let qr_id = path.into_inner();

    let record = app_state
        .qr_store
        .get_owned(&qr_id, &owner)
        .await
        .map_err(internal_error)?;

    let Some(record) = record else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "QR code not found"
        })));
    };

    let from = match parse_iso_timestamp(query.from.as_deref()) {
        Ok(ts) => ts,
        Err(response) => return Ok(response),
    };
    let to = match parse_iso_timestamp(query.to.as_deref()) {
        Ok(ts) => ts,
        Err(response) => return Ok(response),
    };

    let granularity = query.group_by.unwrap_or_default();
    let stats = stats::collect(
        app_state.scan_store.as_ref(),
        &qr_id,
        TimeRange { from, to },
        granularity,
    )
    .await
    .map_err(internal_error)?;

    Ok(HttpResponse::Ok().json(StatsResponse {
        qr_id,
        name: record.name,
        stats,
    }))
}

fn parse_iso_timestamp(value: Option<&str>) -> std::result::Result<Option<i64>, HttpResponse> {
    match value {
        None => Ok(None),
        Some(raw) => chrono::DateTime::parse_from_rfc3339(raw)
            .map(|dt| Some(dt.timestamp_millis()))
            .map_err(|_| {
                HttpResponse::BadRequest().json(serde_json::json!({
                    "error": format!("Invalid ISO timestamp: {}", raw)
                }))
            }),
    }
}

/// Get the QR code image as SVG
pub async fn get_qr_image(
    app_state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<impl Responder> {
    let owner = owner_id(&req)?;
    let qr_id = path.into_inner();

    let record = app_state
        .qr_store
        .get_owned(&qr_id, &owner)
        .await
        .map_err(internal_error)?;

    match record {
        Some(_) => {
            let svg = render_qr_svg(&redirect_url(&qr_id))?;
            Ok(HttpResponse::Ok().content_type("image/svg+xml").body(svg))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "QR code not found"
        }))),
    }
}
