use serde::Serialize;

use crate::models::qr_record::{QrRecord, QrType};
use crate::services::stats::ScanStats;

#[derive(Serialize)]
pub struct CreateQrResponse {
    pub qr_id: String,
    pub name: String,
    pub target_url: String,
    #[serde(rename = "type")]
    pub qr_type: QrType,
    pub is_active: bool,
    pub created_at: i64,
    pub expires_at: Option<i64>,
    pub redirect_url: String,
    pub qr_svg: String,
}

/// One record in a listing or detail response, with its scan figures attached.
#[derive(Serialize)]
pub struct QrSummary {
    pub qr_id: String,
    pub name: String,
    pub target_url: String,
    #[serde(rename = "type")]
    pub qr_type: QrType,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: Option<i64>,
    pub total_scans: u64,
    pub last_scanned_at: Option<i64>,
}

impl QrSummary {
    pub fn from_record(record: QrRecord, total_scans: u64, last_scanned_at: Option<i64>) -> Self {
        Self {
            qr_id: record.qr_id,
            name: record.name,
            target_url: record.target_url,
            qr_type: record.qr_type,
            is_active: record.is_active,
            created_at: record.created_at,
            updated_at: record.updated_at,
            expires_at: record.expires_at,
            total_scans,
            last_scanned_at,
        }
    }
}

#[derive(Serialize)]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
}

#[derive(Serialize)]
pub struct QrListResponse {
    pub qr_codes: Vec<QrSummary>,
    pub pagination: Pagination,
}

#[derive(Serialize)]
pub struct QrDetailResponse {
    #[serde(flatten)]
    pub summary: QrSummary,
    pub redirect_url: String,
}

#[derive(Serialize)]
pub struct UpdateQrResponse {
    pub qr_id: String,
    pub name: String,
    pub target_url: String,
    pub is_active: bool,
    pub expires_at: Option<i64>,
    pub updated_at: i64,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub qr_id: String,
    pub name: String,
    #[serde(flatten)]
    pub stats: ScanStats,
}
