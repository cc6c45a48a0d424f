use std::env;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::qr_record::QrRecord;
use crate::models::scan_event::{Granularity, PeriodCount};

pub mod memory;
pub mod mongo;

/// Lifecycle filter for owner-scoped listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
    Expired,
}

#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    pub fn skip(&self) -> u64 {
        self.page.saturating_sub(1) * self.limit
    }
}

/// Partial update of a QR record. `expires_at` distinguishes "leave as is"
/// (outer `None`) from "clear the expiry" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct QrRecordPatch {
    pub name: Option<String>,
    pub target_url: Option<String>,
    pub is_active: Option<bool>,
    pub expires_at: Option<Option<i64>>,
}

/// Inclusive `[from, to]` window over scan timestamps, in epoch milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRange {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl TimeRange {
    pub fn contains(&self, ts_ms: i64) -> bool {
        self.from.map_or(true, |from| ts_ms >= from)
            && self.to.map_or(true, |to| ts_ms <= to)
    }
}

/// Durable mapping from a QR identifier to its record.
#[async_trait]
pub trait QrRecordStore: Send + Sync {
    /// Unscoped lookup, used by the public redirect path.
    async fn get(&self, qr_id: &str) -> Result<Option<QrRecord>>;

    /// Owner-scoped lookup for the authenticated API.
    async fn get_owned(&self, qr_id: &str, owner_id: &str) -> Result<Option<QrRecord>>;

    async fn insert(&self, record: &QrRecord) -> Result<()>;

    /// Apply a partial update, refreshing `updated_at`. Returns the updated
    /// record, or `None` when the id does not exist for this owner.
    async fn update(
        &self,
        qr_id: &str,
        owner_id: &str,
        patch: QrRecordPatch,
    ) -> Result<Option<QrRecord>>;

    /// Returns whether a record was actually removed.
    async fn delete(&self, qr_id: &str, owner_id: &str) -> Result<bool>;

    /// Owner-scoped listing, newest first. Returns the page of records and
    /// the total number of records matching the filter.
    async fn list(
        &self,
        owner_id: &str,
        status: StatusFilter,
        page: Page,
    ) -> Result<(Vec<QrRecord>, u64)>;
}

/// Append-only log of scan events. Counts are always derived by query;
/// no running counter is maintained anywhere.
#[async_trait]
pub trait ScanEventStore: Send + Sync {
    async fn append(&self, qr_id: &str, scanned_at: i64) -> Result<()>;

    async fn count(&self, qr_id: &str) -> Result<u64>;

    /// Timestamp of the earliest scan, if any.
    async fn earliest(&self, qr_id: &str) -> Result<Option<i64>>;

    /// Up to `n` most recent scan timestamps, descending.
    async fn most_recent(&self, qr_id: &str, n: usize) -> Result<Vec<i64>>;

    /// Bucketed counts over the (optionally windowed) scan history,
    /// ascending by period label. Buckets with zero scans are omitted.
    async fn aggregate_by_period(
        &self,
        qr_id: &str,
        range: TimeRange,
        granularity: Granularity,
    ) -> Result<Vec<PeriodCount>>;

    /// Cascade helper for record deletion. Returns the number of events removed.
    async fn delete_all(&self, qr_id: &str) -> Result<u64>;
}

pub struct StoreFactory;

impl StoreFactory {
    /// Build the store pair for the backend selected by `STORE_BACKEND`
    /// (`mongodb` by default, `memory` for tests and local development).
    pub async fn create() -> Result<(Arc<dyn QrRecordStore>, Arc<dyn ScanEventStore>)> {
        let backend = env::var("STORE_BACKEND").unwrap_or_else(|_| String::from("mongodb"));

        match backend.as_str() {
            "memory" => Ok((
                Arc::new(memory::MemoryQrRecordStore::default()),
                Arc::new(memory::MemoryScanEventStore::default()),
            )),
            _ => {
                let db = crate::db::mongodb::get_database().await?;
                Ok((
                    Arc::new(mongo::MongoQrRecordStore::new(&db)),
                    Arc::new(mongo::MongoScanEventStore::new(&db)),
                ))
            }
        }
    }
}
