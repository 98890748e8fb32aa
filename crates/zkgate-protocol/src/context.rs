//! Deterministic context and nullifier-scope derivation.
//!
//! A proof is valid for an event iff its embedded context signal equals
//! the event's context id, so both sides must derive the id from the same
//! canonical string. The external nullifier shares the derivation but
//! lives in a separate hash domain: it scopes the public nullifier to one
//! event without being equal to the context id itself.

use zkgate_crypto::keccak256;
use zkgate_types::SignalValue;

const EXTERNAL_NULLIFIER_DOMAIN: &[u8] = b"zkgate.external-nullifier.v1:";

/// Context id of a canonical context string. Stable across processes.
pub fn compute_context_id(context_string: &str) -> SignalValue {
    SignalValue::from_bytes(keccak256(context_string.as_bytes()))
}

/// External nullifier for a canonical context string. Same string always
/// yields the same value; different strings yield unlinkable values.
pub fn compute_external_nullifier(context_string: &str) -> SignalValue {
    let mut input = Vec::with_capacity(EXTERNAL_NULLIFIER_DOMAIN.len() + context_string.len());
    input.extend_from_slice(EXTERNAL_NULLIFIER_DOMAIN);
    input.extend_from_slice(context_string.as_bytes());
    SignalValue::from_bytes(keccak256(&input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_id_deterministic() {
        let a = compute_context_id("Event Ticket: evt-123");
        let b = compute_context_id("Event Ticket: evt-123");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_events_different_contexts() {
        assert_ne!(
            compute_context_id("Event Ticket: evt-123"),
            compute_context_id("Event Ticket: evt-456")
        );
    }

    #[test]
    fn test_external_nullifier_deterministic() {
        let a = compute_external_nullifier("Event Ticket: evt-123");
        let b = compute_external_nullifier("Event Ticket: evt-123");
        assert_eq!(a, b);
    }

    #[test]
    fn test_external_nullifier_distinct_from_context_id() {
        let s = "Event Ticket: evt-123";
        assert_ne!(compute_context_id(s), compute_external_nullifier(s));
    }

    #[test]
    fn test_external_nullifier_scoped_per_event() {
        assert_ne!(
            compute_external_nullifier("Event Ticket: evt-123"),
            compute_external_nullifier("Event Ticket: evt-456")
        );
    }
}
