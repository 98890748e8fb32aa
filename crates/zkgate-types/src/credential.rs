use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored ticket credential as returned by `GET /user/me/ticket-credentials`.
///
/// `data` is the credential JSON; for users with `is_encrypted` set it is
/// an encrypted envelope under the same password-derived key as the
/// identity secrets. Immutable once stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TicketCredential {
    pub event_id: String,
    pub data: String,
    pub issued_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
}

/// One-time issuance response from
/// `POST /events/{event_id}/request-ticket-credential`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnencryptedTicketCredential {
    pub event_id: String,
    pub credential: String,
    pub issued_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
}

/// Stored email credential as returned by `GET /user/me/email-credential`.
///
/// One per user; `data` follows the same conditional-encryption contract
/// as ticket credentials.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmailCredential {
    pub data: String,
    pub issued_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
}

/// One-time issuance response from `POST /user/me/request-email-credential`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UnencryptedEmailCredential {
    pub credential: String,
    pub issued_at: DateTime<Utc>,
    pub expire_at: DateTime<Utc>,
}
