use crate::value::SignalValue;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event record as served by the backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub chain_id: u64,
    pub context_id: SignalValue,
    /// Explicit context string, when the event overrides the canonical
    /// `"Event Ticket: <event_id>"` form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_string: Option<String>,
    pub issuer_key_id: SignalValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

impl Event {
    /// The canonical context string for this event. The same event must
    /// always yield the same string regardless of who computes it.
    pub fn canonical_context_string(&self) -> String {
        match &self.context_string {
            Some(s) if !s.is_empty() => s.clone(),
            _ => format!("Event Ticket: {}", self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, context_string: Option<&str>) -> Event {
        Event {
            id: id.to_string(),
            name: "Test Event".to_string(),
            description: None,
            url: None,
            chain_id: 1,
            context_id: SignalValue::zero(),
            context_string: context_string.map(str::to_string),
            issuer_key_id: SignalValue::zero(),
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_canonical_context_defaults_to_event_id() {
        assert_eq!(
            event("evt-123", None).canonical_context_string(),
            "Event Ticket: evt-123"
        );
    }

    #[test]
    fn test_explicit_context_string_wins() {
        assert_eq!(
            event("evt-123", Some("DevCon 2026 Entry")).canonical_context_string(),
            "DevCon 2026 Entry"
        );
    }

    #[test]
    fn test_empty_context_string_falls_back() {
        assert_eq!(
            event("evt-123", Some("")).canonical_context_string(),
            "Event Ticket: evt-123"
        );
    }
}
