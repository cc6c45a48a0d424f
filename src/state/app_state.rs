use std::sync::Arc;

use crate::stores::{QrRecordStore, ScanEventStore};

/// Shared application state: the two durable stores behind trait objects,
/// so handlers stay agnostic of the storage backend.
pub struct AppState {
    pub qr_store: Arc<dyn QrRecordStore>,
    pub scan_store: Arc<dyn ScanEventStore>,
}
