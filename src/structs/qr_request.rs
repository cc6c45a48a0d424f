use serde::{Deserialize, Deserializer};
use validator::Validate;

use crate::models::qr_record::QrType;
use crate::models::scan_event::Granularity;
use crate::stores::StatusFilter;

#[derive(Deserialize, Validate)]
pub struct CreateQrRequest {
    #[validate(url(message = "Invalid URL format"))]
    pub target_url: String,
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub qr_type: QrType,
    pub expires_at: Option<i64>, // Epoch millis; must be in the future
}

#[derive(Deserialize, Validate, Default)]
pub struct UpdateQrRequest {
    #[validate(url(message = "Invalid URL format"))]
    pub target_url: Option<String>,
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    pub is_active: Option<bool>,
    // Absent field leaves the expiry untouched; an explicit null clears it
    #[serde(default, deserialize_with = "double_option")]
    pub expires_at: Option<Option<i64>>,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct ListQrParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<StatusFilter>,
}

#[derive(Deserialize)]
pub struct StatsParams {
    pub from: Option<String>, // ISO-8601 timestamp
    pub to: Option<String>,   // ISO-8601 timestamp
    pub group_by: Option<Granularity>,
}
