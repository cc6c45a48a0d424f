use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use mongodb::Database;
use mongodb::bson::{Bson, Document, doc, from_document};
use mongodb::options::ReturnDocument;

use super::{Page, QrRecordPatch, QrRecordStore, ScanEventStore, StatusFilter, TimeRange};
use crate::models::qr_record::QrRecord;
use crate::models::scan_event::{Granularity, PeriodCount, ScanEvent};

const QR_COLLECTION: &str = "qr_codes";
const SCAN_COLLECTION: &str = "scan_logs";

pub struct MongoQrRecordStore {
    collection: mongodb::Collection<QrRecord>,
}

impl MongoQrRecordStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<QrRecord>(QR_COLLECTION),
        }
    }

    fn status_filter(owner_id: &str, status: StatusFilter) -> Document {
        let now = chrono::Utc::now().timestamp_millis();
        let mut filter = doc! { "owner_id": owner_id };

        match status {
            StatusFilter::All => {}
            StatusFilter::Active => {
                filter.insert("is_active", true);
                filter.insert(
                    "$or",
                    vec![
                        doc! { "expires_at": Bson::Null },
                        doc! { "expires_at": { "$gt": now } },
                    ],
                );
            }
            StatusFilter::Inactive => {
                filter.insert("is_active", false);
            }
            StatusFilter::Expired => {
                filter.insert("expires_at", doc! { "$lte": now });
            }
        }

        filter
    }
}

#[async_trait]
impl QrRecordStore for MongoQrRecordStore {
    async fn get(&self, qr_id: &str) -> Result<Option<QrRecord>> {
        self.collection
            .find_one(doc! { "qr_id": qr_id })
            .await
            .context("Failed to look up QR record")
    }

    async fn get_owned(&self, qr_id: &str, owner_id: &str) -> Result<Option<QrRecord>> {
        self.collection
            .find_one(doc! { "qr_id": qr_id, "owner_id": owner_id })
            .await
            .context("Failed to look up QR record")
    }

    async fn insert(&self, record: &QrRecord) -> Result<()> {
        self.collection
            .insert_one(record)
            .await
            .context("Failed to insert QR record")?;
        Ok(())
    }

    async fn update(
        &self,
        qr_id: &str,
        owner_id: &str,
        patch: QrRecordPatch,
    ) -> Result<Option<QrRecord>> {
        let mut set = doc! { "updated_at": chrono::Utc::now().timestamp_millis() };
        if let Some(name) = patch.name {
            set.insert("name", name);
        }
        if let Some(target_url) = patch.target_url {
            set.insert("target_url", target_url);
        }
        if let Some(is_active) = patch.is_active {
            set.insert("is_active", is_active);
        }
        if let Some(expires_at) = patch.expires_at {
            set.insert("expires_at", expires_at.map_or(Bson::Null, Bson::from));
        }

        self.collection
            .find_one_and_update(
                doc! { "qr_id": qr_id, "owner_id": owner_id },
                doc! { "$set": set },
            )
            .return_document(ReturnDocument::After)
            .await
            .context("Failed to update QR record")
    }

    async fn delete(&self, qr_id: &str, owner_id: &str) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "qr_id": qr_id, "owner_id": owner_id })
            .await
            .context("Failed to delete QR record")?;
        Ok(result.deleted_count > 0)
    }

    async fn list(
        &self,
        owner_id: &str,
        status: StatusFilter,
        page: Page,
    ) -> Result<(Vec<QrRecord>, u64)> {
        let filter = Self::status_filter(owner_id, status);

        let total = self
            .collection
            .count_documents(filter.clone())
            .await
            .context("Failed to count QR records")?;

        let mut cursor = self
            .collection
            .find(filter)
            .sort(doc! { "created_at": -1 })
            .skip(page.skip())
            .limit(page.limit as i64)
            .await
            .context("Failed to list QR records")?;

        let mut records = Vec::new();
        while let Some(result) = cursor.next().await {
            records.push(result.context("Failed to read QR record")?);
        }

        Ok((records, total))
    }
}

pub struct MongoScanEventStore {
    collection: mongodb::Collection<ScanEvent>,
}

impl MongoScanEventStore {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection::<ScanEvent>(SCAN_COLLECTION),
        }
    }
}

#[async_trait]
impl ScanEventStore for MongoScanEventStore {
    async fn append(&self, qr_id: &str, scanned_at: i64) -> Result<()> {
        let event = ScanEvent::new(qr_id.to_string(), scanned_at);
        self.collection
            .insert_one(&event)
            .await
            .context("Failed to append scan event")?;
        Ok(())
    }

    async fn count(&self, qr_id: &str) -> Result<u64> {
        self.collection
            .count_documents(doc! { "qr_id": qr_id })
            .await
            .context("Failed to count scan events")
    }

    async fn earliest(&self, qr_id: &str) -> Result<Option<i64>> {
        let event = self
            .collection
            .find_one(doc! { "qr_id": qr_id })
            .sort(doc! { "scanned_at": 1 })
            .await
            .context("Failed to read earliest scan event")?;
        Ok(event.map(|e| e.scanned_at))
    }

    async fn most_recent(&self, qr_id: &str, n: usize) -> Result<Vec<i64>> {
        let mut cursor = self
            .collection
            .find(doc! { "qr_id": qr_id })
            .sort(doc! { "scanned_at": -1 })
            .limit(n as i64)
            .await
            .context("Failed to read recent scan events")?;

        let mut timestamps = Vec::new();
        while let Some(result) = cursor.next().await {
            timestamps.push(result.context("Failed to read scan event")?.scanned_at);
        }
        Ok(timestamps)
    }

    async fn aggregate_by_period(
        &self,
        qr_id: &str,
        range: TimeRange,
        granularity: Granularity,
    ) -> Result<Vec<PeriodCount>> {
        let mut match_doc = doc! { "qr_id": qr_id };
        if range.from.is_some() || range.to.is_some() {
            let mut window = doc! {};
            if let Some(from) = range.from {
                window.insert("$gte", from);
            }
            if let Some(to) = range.to {
                window.insert("$lte", to);
            }
            match_doc.insert("scanned_at", window);
        }

        // scanned_at is stored as epoch millis, so convert before formatting
        let pipeline = vec![
            doc! { "$match": match_doc },
            doc! { "$group": {
                "_id": { "$dateToString": {
                    "format": granularity.format_str(),
                    "date": { "$toDate": "$scanned_at" },
                }},
                "count": { "$sum": 1 },
            }},
            doc! { "$sort": { "_id": 1 } },
            doc! { "$project": { "_id": 0, "period": "$_id", "count": 1 } },
        ];

        let mut cursor = self
            .collection
            .aggregate(pipeline)
            .await
            .context("Failed to aggregate scan events")?;

        let mut buckets = Vec::new();
        while let Some(result) = cursor.next().await {
            let document = result.context("Failed to read aggregation bucket")?;
            buckets.push(
                from_document::<PeriodCount>(document)
                    .context("Malformed aggregation bucket")?,
            );
        }
        Ok(buckets)
    }

    async fn delete_all(&self, qr_id: &str) -> Result<u64> {
        let result = self
            .collection
            .delete_many(doc! { "qr_id": qr_id })
            .await
            .context("Failed to delete scan events")?;
        Ok(result.deleted_count)
    }
}
