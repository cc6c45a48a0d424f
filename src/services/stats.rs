use anyhow::Result;
use serde::Serialize;

use crate::models::scan_event::{Granularity, PeriodCount};
use crate::stores::{ScanEventStore, TimeRange};

/// How many timestamps `recent_scans` carries.
pub const RECENT_SCANS_LIMIT: usize = 10;

/// Aggregate scan statistics for one QR identifier.
///
/// `total_scans`, `first_scan`, `last_scan` and `recent_scans` are always
/// all-time figures; only `scans_by_period` honors the requested window.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ScanStats {
    pub total_scans: u64,
    pub first_scan: Option<i64>,
    pub last_scan: Option<i64>,
    pub scans_by_period: Vec<PeriodCount>,
    pub recent_scans: Vec<i64>,
}

pub async fn collect(
    scan_store: &dyn ScanEventStore,
    qr_id: &str,
    range: TimeRange,
    granularity: Granularity,
) -> Result<ScanStats> {
    let total_scans = scan_store.count(qr_id).await?;
    let recent_scans = scan_store.most_recent(qr_id, RECENT_SCANS_LIMIT).await?;
    let first_scan = scan_store.earliest(qr_id).await?;
    let last_scan = recent_scans.first().copied();
    let scans_by_period = scan_store
        .aggregate_by_period(qr_id, range, granularity)
        .await?;

    Ok(ScanStats {
        total_scans,
        first_scan,
        last_scan,
        scans_by_period,
        recent_scans,
    })
}
