use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::RwLock;

use super::{Page, QrRecordPatch, QrRecordStore, ScanEventStore, StatusFilter, TimeRange};
use crate::models::qr_record::QrRecord;
use crate::models::scan_event::{Granularity, PeriodCount, ScanEvent};

/// In-memory record store, used by tests and `STORE_BACKEND=memory`.
/// Cloning shares the underlying map.
#[derive(Default, Clone)]
pub struct MemoryQrRecordStore {
    records: Arc<RwLock<HashMap<String, QrRecord>>>,
}

#[async_trait]
impl QrRecordStore for MemoryQrRecordStore {
    async fn get(&self, qr_id: &str) -> Result<Option<QrRecord>> {
        Ok(self.records.read().get(qr_id).cloned())
    }

    async fn get_owned(&self, qr_id: &str, owner_id: &str) -> Result<Option<QrRecord>> {
        Ok(self
            .records
            .read()
            .get(qr_id)
            .filter(|r| r.owner_id == owner_id)
            .cloned())
    }

    async fn insert(&self, record: &QrRecord) -> Result<()> {
        self.records
            .write()
            .insert(record.qr_id.clone(), record.clone());
        Ok(())
    }

    async fn update(
        &self,
        qr_id: &str,
        owner_id: &str,
        patch: QrRecordPatch,
    ) -> Result<Option<QrRecord>> {
        let mut records = self.records.write();
        let Some(record) = records
            .get_mut(qr_id)
            .filter(|r| r.owner_id == owner_id)
        else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            record.name = name;
        }
        if let Some(target_url) = patch.target_url {
            record.target_url = target_url;
        }
        if let Some(is_active) = patch.is_active {
            record.is_active = is_active;
        }
        if let Some(expires_at) = patch.expires_at {
            record.expires_at = expires_at;
        }
        record.touch();

        Ok(Some(record.clone()))
    }

    async fn delete(&self, qr_id: &str, owner_id: &str) -> Result<bool> {
        let mut records = self.records.write();
        match records.get(qr_id) {
            Some(r) if r.owner_id == owner_id => {
                records.remove(qr_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(
        &self,
        owner_id: &str,
        status: StatusFilter,
        page: Page,
    ) -> Result<(Vec<QrRecord>, u64)> {
        let now = chrono::Utc::now().timestamp_millis();
        let mut matching: Vec<QrRecord> = self
            .records
            .read()
            .values()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| match status {
                StatusFilter::All => true,
                StatusFilter::Active => r.is_active && !r.is_expired(now),
                StatusFilter::Inactive => !r.is_active,
                StatusFilter::Expired => r.is_expired(now),
            })
            .cloned()
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = matching.len() as u64;

        let records = matching
            .into_iter()
            .skip(page.skip() as usize)
            .take(page.limit as usize)
            .collect();

        Ok((records, total))
    }
}

/// In-memory append-only scan log.
#[derive(Default, Clone)]
pub struct MemoryScanEventStore {
    events: Arc<RwLock<Vec<ScanEvent>>>,
}

#[async_trait]
impl ScanEventStore for MemoryScanEventStore {
    async fn append(&self, qr_id: &str, scanned_at: i64) -> Result<()> {
        self.events
            .write()
            .push(ScanEvent::new(qr_id.to_string(), scanned_at));
        Ok(())
    }

    async fn count(&self, qr_id: &str) -> Result<u64> {
        Ok(self
            .events
            .read()
            .iter()
            .filter(|e| e.qr_id == qr_id)
            .count() as u64)
    }

    async fn earliest(&self, qr_id: &str) -> Result<Option<i64>> {
        Ok(self
            .events
            .read()
            .iter()
            .filter(|e| e.qr_id == qr_id)
            .map(|e| e.scanned_at)
            .min())
    }

    async fn most_recent(&self, qr_id: &str, n: usize) -> Result<Vec<i64>> {
        let mut timestamps: Vec<i64> = self
            .events
            .read()
            .iter()
            .filter(|e| e.qr_id == qr_id)
            .map(|e| e.scanned_at)
            .collect();
        timestamps.sort_by(|a, b| b.cmp(a));
        timestamps.truncate(n);
        Ok(timestamps)
    }

    async fn aggregate_by_period(
        &self,
        qr_id: &str,
        range: TimeRange,
        granularity: Granularity,
    ) -> Result<Vec<PeriodCount>> {
        // BTreeMap keeps labels sorted; the label formats are zero-padded,
        // so lexicographic order is chronological order.
        let mut buckets: BTreeMap<String, i64> = BTreeMap::new();
        for event in self.events.read().iter() {
            if event.qr_id == qr_id && range.contains(event.scanned_at) {
                *buckets.entry(granularity.label(event.scanned_at)).or_insert(0) += 1;
            }
        }

        Ok(buckets
            .into_iter()
            .map(|(period, count)| PeriodCount { period, count })
            .collect())
    }

    async fn delete_all(&self, qr_id: &str) -> Result<u64> {
        let mut events = self.events.write();
        let before = events.len();
        events.retain(|e| e.qr_id != qr_id);
        Ok((before - events.len()) as u64)
    }
}
