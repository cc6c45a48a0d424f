use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DEFAULT_QR_NAME: &str = "Untitled QR";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum QrType {
    #[default]
    Url,
    Form,
    Video,
    Document,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct QrRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub qr_id: String,       // Opaque public identifier, doubles as the redirect path segment
    pub owner_id: String,    // All read/update/delete operations are scoped to the owner
    pub name: String,
    pub target_url: String,
    #[serde(rename = "type")]
    pub qr_type: QrType,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: Option<i64>, // None means the code never expires
}

/// Outcome of checking whether a record may be redirected to right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectValidity {
    Valid,
    Invalid(InvalidReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    Disabled,
    Expired,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::Disabled => write!(f, "disabled"),
            InvalidReason::Expired => write!(f, "expired"),
        }
    }
}

impl QrRecord {
    pub fn new(
        owner_id: String,
        name: Option<String>,
        target_url: String,
        qr_type: QrType,
        expires_at: Option<i64>,
    ) -> Self {
        let now = chrono::Utc::now().timestamp_millis();

        Self {
            id: None,
            qr_id: Uuid::new_v4().to_string(),
            owner_id,
            name: name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| String::from(DEFAULT_QR_NAME)),
            target_url,
            qr_type,
            is_active: true,
            created_at: now,
            updated_at: now,
            expires_at,
        }
    }

    /// Evaluate whether this record currently permits redirection.
    ///
    /// Pure and time-parameterized; called on every redirect attempt since
    /// expiry is time-dependent. A record can be both inactive and past its
    /// expiry: `disabled` wins as the reported reason.
    pub fn redirect_validity(&self, now_ms: i64) -> RedirectValidity {
        if !self.is_active {
            return RedirectValidity::Invalid(InvalidReason::Disabled);
        }
        if self.is_expired(now_ms) {
            return RedirectValidity::Invalid(InvalidReason::Expired);
        }
        RedirectValidity::Valid
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        match self.expires_at {
            Some(expiry) => expiry <= now_ms,
            None => false, // No expiration date means it never expires
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}
