use crate::value::SignalValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `POST /events/{event_id}/attendance`.
///
/// The admin code travels with the write; the backend is the authority on
/// it. `(event_id, nullifier)` is a uniqueness constraint server-side.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecordAttendanceRequest {
    #[serde(rename = "type")]
    pub credential_type: String,
    pub context: SignalValue,
    pub nullifier: SignalValue,
    pub key_id: SignalValue,
    pub event_id: String,
    pub admin_code: String,
}

/// The durable fact "this nullifier attended this event".
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub event_id: String,
    pub nullifier: SignalValue,
    pub key_id: SignalValue,
    pub context: SignalValue,
    pub recorded_at: DateTime<Utc>,
}
