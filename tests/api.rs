use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use smartqr::models::qr_record::{QrRecord, QrType};
use smartqr::models::scan_event::{Granularity, PeriodCount};
use smartqr::routes::init_routes;
use smartqr::state::app_state::AppState;
use smartqr::stores::memory::{MemoryQrRecordStore, MemoryScanEventStore};
use smartqr::stores::{Page, QrRecordPatch, QrRecordStore, ScanEventStore, StatusFilter, TimeRange};
use smartqr::utils::jwt::create_token;

struct TestStores {
    qr: MemoryQrRecordStore,
    scans: MemoryScanEventStore,
}

fn test_stores() -> (TestStores, web::Data<AppState>) {
    let qr = MemoryQrRecordStore::default();
    let scans = MemoryScanEventStore::default();
    let state = web::Data::new(AppState {
        qr_store: Arc::new(qr.clone()),
        scan_store: Arc::new(scans.clone()),
    });
    (TestStores { qr, scans }, state)
}

fn bearer(owner: &str) -> (header::HeaderName, String) {
    unsafe { std::env::set_var("JWT_SECRET", "integration-test-secret") };
    let token = create_token(owner).expect("token creation");
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

/// Record store whose every call fails, for exercising the 500 path.
struct FailingQrRecordStore;

#[async_trait]
impl QrRecordStore for FailingQrRecordStore {
    async fn get(&self, _qr_id: &str) -> anyhow::Result<Option<QrRecord>> {
        anyhow::bail!("record store unavailable")
    }

    async fn get_owned(&self, _qr_id: &str, _owner_id: &str) -> anyhow::Result<Option<QrRecord>> {
        anyhow::bail!("record store unavailable")
    }

    async fn insert(&self, _record: &QrRecord) -> anyhow::Result<()> {
        anyhow::bail!("record store unavailable")
    }

    async fn update(
        &self,
        _qr_id: &str,
        _owner_id: &str,
        _patch: QrRecordPatch,
    ) -> anyhow::Result<Option<QrRecord>> {
        anyhow::bail!("record store unavailable")
    }

    async fn delete(&self, _qr_id: &str, _owner_id: &str) -> anyhow::Result<bool> {
        anyhow::bail!("record store unavailable")
    }

    async fn list(
        &self,
        _owner_id: &str,
        _status: StatusFilter,
        _page: Page,
    ) -> anyhow::Result<(Vec<QrRecord>, u64)> {
        anyhow::bail!("record store unavailable")
    }
}

/// Scan store whose every call fails, for exercising the swallowed-append path.
struct FailingScanEventStore;

#[async_trait]
impl ScanEventStore for FailingScanEventStore {
    async fn append(&self, _qr_id: &str, _scanned_at: i64) -> anyhow::Result<()> {
        anyhow::bail!("scan store unavailable")
    }

    async fn count(&self, _qr_id: &str) -> anyhow::Result<u64> {
        anyhow::bail!("scan store unavailable")
    }

    async fn earliest(&self, _qr_id: &str) -> anyhow::Result<Option<i64>> {
        anyhow::bail!("scan store unavailable")
    }

    async fn most_recent(&self, _qr_id: &str, _n: usize) -> anyhow::Result<Vec<i64>> {
        anyhow::bail!("scan store unavailable")
    }

    async fn aggregate_by_period(
        &self,
        _qr_id: &str,
        _range: TimeRange,
        _granularity: Granularity,
    ) -> anyhow::Result<Vec<PeriodCount>> {
        anyhow::bail!("scan store unavailable")
    }

    async fn delete_all(&self, _qr_id: &str) -> anyhow::Result<u64> {
        anyhow::bail!("scan store unavailable")
    }
}

fn record(owner: &str, target_url: &str) -> QrRecord {
    QrRecord::new(
        owner.to_string(),
        Some(String::from("Test code")),
        target_url.to_string(),
        QrType::Url,
        None,
    )
}

fn ts(d: u32, h: u32) -> i64 {
    Utc.with_ymd_and_hms(2025, 7, d, h, 0, 0)
        .unwrap()
        .timestamp_millis()
}

#[actix_web::test]
async fn redirect_logs_a_scan_then_redirects() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com/landing");
    stores.qr.insert(&r).await.unwrap();

    for expected_count in 1..=2u64 {
        let req = test::TestRequest::get()
            .uri(&format!("/q/{}", r.qr_id))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(
            resp.headers().get(header::LOCATION).unwrap(),
            "https://example.com/landing"
        );
        // Every successful redirect appends exactly one scan event
        assert_eq!(stores.scans.count(&r.qr_id).await.unwrap(), expected_count);
    }
}

#[actix_web::test]
async fn expired_code_gets_410_and_no_scan_event() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let mut r = record("alice", "https://example.com");
    r.expires_at = Some(Utc::now().timestamp_millis() - 3_600_000);
    stores.qr.insert(&r).await.unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/q/{}", r.qr_id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::GONE);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("expired"));
    assert_eq!(stores.scans.count(&r.qr_id).await.unwrap(), 0);
}

#[actix_web::test]
async fn disabled_wins_over_expired_in_the_error_page() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let mut r = record("alice", "https://example.com");
    r.is_active = false;
    r.expires_at = Some(Utc::now().timestamp_millis() - 1000);
    stores.qr.insert(&r).await.unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/q/{}", r.qr_id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::GONE);
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("disabled by its owner"));
}

#[actix_web::test]
async fn unknown_identifier_gets_404_and_no_scan_event() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let req = test::TestRequest::get().uri("/q/no-such-id").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(stores.scans.count("no-such-id").await.unwrap(), 0);
}

#[actix_web::test]
async fn redirect_still_issued_when_scan_logging_fails() {
    let qr = MemoryQrRecordStore::default();
    let state = web::Data::new(AppState {
        qr_store: Arc::new(qr.clone()),
        scan_store: Arc::new(FailingScanEventStore),
    });
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com/landing");
    qr.insert(&r).await.unwrap();

    // Availability of the redirect outranks completeness of analytics
    let req = test::TestRequest::get()
        .uri(&format!("/q/{}", r.qr_id))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(
        resp.headers().get(header::LOCATION).unwrap(),
        "https://example.com/landing"
    );
}

#[actix_web::test]
async fn redirect_lookup_failure_renders_the_internal_error_page() {
    let state = web::Data::new(AppState {
        qr_store: Arc::new(FailingQrRecordStore),
        scan_store: Arc::new(MemoryScanEventStore::default()),
    });
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let req = test::TestRequest::get().uri("/q/any-id").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        resp.headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );
    let body = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(body.contains("Something Went Wrong"));
}

#[actix_web::test]
async fn api_requires_a_bearer_token() {
    let (_stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let req = test::TestRequest::get().uri("/api/qr").to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn create_qr_persists_the_record() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let req = test::TestRequest::post()
        .uri("/api/qr")
        .insert_header(bearer("alice"))
        .set_json(serde_json::json!({
            "target_url": "https://example.com/menu",
            "name": "Menu",
            "type": "document"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: serde_json::Value = test::read_body_json(resp).await;
    let qr_id = body["qr_id"].as_str().unwrap();
    assert_eq!(body["name"], "Menu");
    assert_eq!(body["type"], "document");
    assert_eq!(body["is_active"], true);
    assert!(body["redirect_url"].as_str().unwrap().contains("/q/"));
    assert!(body["qr_svg"].as_str().unwrap().contains("<svg"));

    let stored = stores.qr.get(qr_id).await.unwrap().unwrap();
    assert_eq!(stored.owner_id, "alice");
    assert_eq!(stored.target_url, "https://example.com/menu");
}

#[actix_web::test]
async fn create_rejects_invalid_input_before_any_mutation() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let bad_url = test::TestRequest::post()
        .uri("/api/qr")
        .insert_header(bearer("alice"))
        .set_json(serde_json::json!({ "target_url": "ftp://example.com" }))
        .to_request();
    let resp = test::call_service(&app, bad_url).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let past_expiry = test::TestRequest::post()
        .uri("/api/qr")
        .insert_header(bearer("alice"))
        .set_json(serde_json::json!({
            "target_url": "https://example.com",
            "expires_at": Utc::now().timestamp_millis() - 1000
        }))
        .to_request();
    let resp = test::call_service(&app, past_expiry).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let page = Page { page: 1, limit: 10 };
    let (records, _) = stores
        .qr
        .list("alice", StatusFilter::All, page)
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[actix_web::test]
async fn stats_buckets_fifteen_scans_into_three_days() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com");
    stores.qr.insert(&r).await.unwrap();
    for (day, scans) in [(1, 4), (2, 6), (3, 5)] {
        for h in 0..scans {
            stores.scans.append(&r.qr_id, ts(day, h)).await.unwrap();
        }
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/qr/{}/stats?group_by=day", r.qr_id))
        .insert_header(bearer("alice"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["qr_id"], r.qr_id.as_str());
    assert_eq!(body["name"], "Test code");
    assert_eq!(body["total_scans"], 15);
    let periods = body["scans_by_period"].as_array().unwrap();
    assert_eq!(periods.len(), 3);
    let sum: i64 = periods.iter().map(|p| p["count"].as_i64().unwrap()).sum();
    assert_eq!(sum, 15);
    assert_eq!(periods[0]["period"], "2025-07-01");
    assert_eq!(body["recent_scans"].as_array().unwrap().len(), 10);
}

#[actix_web::test]
async fn stats_window_filters_buckets_only() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com");
    stores.qr.insert(&r).await.unwrap();
    for day in 1..=4 {
        stores.scans.append(&r.qr_id, ts(day, 12)).await.unwrap();
    }

    let req = test::TestRequest::get()
        .uri(&format!(
            "/api/qr/{}/stats?from=2025-07-02T00:00:00Z&to=2025-07-03T23:59:59Z",
            r.qr_id
        ))
        .insert_header(bearer("alice"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["scans_by_period"].as_array().unwrap().len(), 2);
    assert_eq!(body["total_scans"], 4);
    assert_eq!(body["first_scan"], ts(1, 12));
    assert_eq!(body["last_scan"], ts(4, 12));
}

#[actix_web::test]
async fn stats_rejects_malformed_timestamps() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com");
    stores.qr.insert(&r).await.unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/qr/{}/stats?from=yesterday", r.qr_id))
        .insert_header(bearer("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn stats_of_empty_history_is_zeroes_not_an_error() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com");
    stores.qr.insert(&r).await.unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/qr/{}/stats", r.qr_id))
        .insert_header(bearer("alice"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["total_scans"], 0);
    assert_eq!(body["first_scan"], serde_json::Value::Null);
    assert_eq!(body["last_scan"], serde_json::Value::Null);
    assert_eq!(body["scans_by_period"].as_array().unwrap().len(), 0);
    assert_eq!(body["recent_scans"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn other_owners_records_look_like_404() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com");
    stores.qr.insert(&r).await.unwrap();

    for uri in [
        format!("/api/qr/{}", r.qr_id),
        format!("/api/qr/{}/stats", r.qr_id),
        format!("/api/qr/{}/image", r.qr_id),
    ] {
        let req = test::TestRequest::get()
            .uri(&uri)
            .insert_header(bearer("mallory"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "leaked via {uri}");
    }
}

#[actix_web::test]
async fn update_can_disable_and_clear_expiry() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let mut r = record("alice", "https://example.com");
    r.expires_at = Some(Utc::now().timestamp_millis() + 86_400_000);
    stores.qr.insert(&r).await.unwrap();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/qr/{}", r.qr_id))
        .insert_header(bearer("alice"))
        .set_json(serde_json::json!({ "is_active": false, "expires_at": null }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["is_active"], false);
    assert_eq!(body["expires_at"], serde_json::Value::Null);

    let stored = stores.qr.get(&r.qr_id).await.unwrap().unwrap();
    assert!(!stored.is_active);
    assert_eq!(stored.expires_at, None);

    // A disabled code refuses redirects from now on
    let req = test::TestRequest::get()
        .uri(&format!("/q/{}", r.qr_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);
}

#[actix_web::test]
async fn delete_cascades_to_scan_events() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com");
    stores.qr.insert(&r).await.unwrap();
    for h in 0..3 {
        stores.scans.append(&r.qr_id, ts(10, h)).await.unwrap();
    }

    let req = test::TestRequest::delete()
        .uri(&format!("/api/qr/{}", r.qr_id))
        .insert_header(bearer("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(stores.qr.get(&r.qr_id).await.unwrap().is_none());
    assert_eq!(stores.scans.count(&r.qr_id).await.unwrap(), 0);
}

#[actix_web::test]
async fn listing_attaches_scan_figures_and_pagination() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com");
    stores.qr.insert(&r).await.unwrap();
    stores.scans.append(&r.qr_id, ts(20, 9)).await.unwrap();
    stores.scans.append(&r.qr_id, ts(21, 9)).await.unwrap();

    let req = test::TestRequest::get()
        .uri("/api/qr?page=1&limit=5")
        .insert_header(bearer("alice"))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

    let codes = body["qr_codes"].as_array().unwrap();
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0]["total_scans"], 2);
    assert_eq!(codes[0]["last_scanned_at"], ts(21, 9));
    assert_eq!(body["pagination"]["total_items"], 1);
    assert_eq!(body["pagination"]["items_per_page"], 5);
    assert_eq!(body["pagination"]["total_pages"], 1);
}

#[actix_web::test]
async fn qr_image_is_served_as_svg() {
    let (stores, state) = test_stores();
    let app = test::init_service(App::new().app_data(state).configure(init_routes)).await;

    let r = record("alice", "https://example.com");
    stores.qr.insert(&r).await.unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/qr/{}/image", r.qr_id))
        .insert_header(bearer("alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/svg+xml"
    );
}
