//! Public-parameter query handed to the proving backend.

use serde::{Deserialize, Serialize};
use zkgate_types::SignalValue;

/// `equal_check_id` and `pseudonym` are opaque constants in this protocol
/// revision; they are configurable here but carry no richer semantics.
pub const DEFAULT_EQUAL_CHECK_ID: u64 = 0;
pub const DEFAULT_PSEUDONYM: u64 = 0xdeadbeef;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofOptions {
    /// The proof attests the credential is still valid at this instant
    /// (unix seconds, in the future at generation time).
    pub expired_at_lower_bound: i64,
    pub external_nullifier: SignalValue,
    pub equal_check_id: SignalValue,
    pub pseudonym: SignalValue,
}

/// `{conditions: [], options: {...}}` — conditions are unused by the unit
/// credential type but remain part of the wire shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProofQuery {
    pub conditions: Vec<serde_json::Value>,
    pub options: ProofOptions,
}

impl ProofQuery {
    pub fn new(expired_at_lower_bound: i64, external_nullifier: SignalValue) -> Self {
        Self {
            conditions: Vec::new(),
            options: ProofOptions {
                expired_at_lower_bound,
                external_nullifier,
                equal_check_id: SignalValue::from_u64(DEFAULT_EQUAL_CHECK_ID),
                pseudonym: SignalValue::from_u64(DEFAULT_PSEUDONYM),
            },
        }
    }

    pub fn with_equal_check_id(mut self, v: SignalValue) -> Self {
        self.options.equal_check_id = v;
        self
    }

    pub fn with_pseudonym(mut self, v: SignalValue) -> Self {
        self.options.pseudonym = v;
        self
    }
}
