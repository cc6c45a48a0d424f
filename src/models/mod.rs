pub mod qr_record;
pub mod scan_event;
