//! The portable proof artifact.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use zkgate_types::{GateError, GateResult, SignalValue};

/// Intrinsic public signals every proof exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PublicSignal {
    Type,
    Context,
    Nullifier,
    KeyId,
    ExpiredAtLowerBound,
    EqualCheckId,
    Pseudonym,
}

impl PublicSignal {
    pub fn key(&self) -> &'static str {
        match self {
            PublicSignal::Type => "type",
            PublicSignal::Context => "context",
            PublicSignal::Nullifier => "nullifier",
            PublicSignal::KeyId => "key_id",
            PublicSignal::ExpiredAtLowerBound => "expired_at_lower_bound",
            PublicSignal::EqualCheckId => "equal_check_id",
            PublicSignal::Pseudonym => "pseudonym",
        }
    }
}

/// Self-contained proof object: opaque proof bytes plus named public
/// signals. Serialized to JSON for QR or deep-link transport; never
/// persisted by the attendee beyond the current session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WholeProof {
    /// Base64 opaque proof bytes, interpreted only by the backend that
    /// produced them.
    pub proof: String,
    pub public_signals: BTreeMap<String, SignalValue>,
}

impl WholeProof {
    pub fn public_signal(&self, signal: PublicSignal) -> Option<SignalValue> {
        self.public_signals.get(signal.key()).copied()
    }

    pub fn to_json(&self) -> GateResult<String> {
        serde_json::to_string(self).map_err(|e| GateError::Serialization(e.to_string()))
    }

    pub fn from_json(data: &str) -> GateResult<Self> {
        serde_json::from_str(data).map_err(|e| GateError::MalformedProof(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WholeProof {
        let mut signals = BTreeMap::new();
        signals.insert("context".to_string(), SignalValue::from_u64(7));
        signals.insert("nullifier".to_string(), SignalValue::from_u64(8));
        WholeProof {
            proof: "b64".to_string(),
            public_signals: signals,
        }
    }

    #[test]
    fn test_signal_accessor() {
        let proof = sample();
        assert_eq!(
            proof.public_signal(PublicSignal::Context),
            Some(SignalValue::from_u64(7))
        );
        assert_eq!(proof.public_signal(PublicSignal::KeyId), None);
    }

    #[test]
    fn test_json_round_trip() {
        let proof = sample();
        let json = proof.to_json().unwrap();
        let back = WholeProof::from_json(&json).unwrap();
        assert_eq!(
            back.public_signal(PublicSignal::Nullifier),
            proof.public_signal(PublicSignal::Nullifier)
        );
    }

    #[test]
    fn test_invalid_json_is_malformed_proof() {
        assert!(matches!(
            WholeProof::from_json("{not json"),
            Err(GateError::MalformedProof(_))
        ));
    }
}
