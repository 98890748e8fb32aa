//! Two-stage proof verification.
//!
//! The cheap local context comparison runs before the expensive backend
//! verification: a wrong-event ticket is the dominant real-world failure
//! and deserves its own message without a wasted verification call.

use tracing::debug;
use zkgate_types::{Event, GateError, GateResult, SignalValue, UNIT_CREDENTIAL_TYPE_ID};

use crate::backend::{VerifyResult, VerifyingBackend};
use crate::proof::{PublicSignal, WholeProof};

/// What a proof must match for one event.
#[derive(Clone, Debug)]
pub struct ExpectedProofParams {
    pub type_id: u64,
    pub context_id: SignalValue,
    pub issuer_key_id: SignalValue,
}

impl From<&Event> for ExpectedProofParams {
    fn from(event: &Event) -> Self {
        Self {
            type_id: UNIT_CREDENTIAL_TYPE_ID,
            context_id: event.context_id,
            issuer_key_id: event.issuer_key_id,
        }
    }
}

/// Public signals extracted from a successfully verified proof, ready for
/// the attendance write.
#[derive(Clone, Debug)]
pub struct VerifiedProof {
    pub context: SignalValue,
    pub nullifier: SignalValue,
    pub key_id: SignalValue,
}

pub struct ProofVerifier<V> {
    backend: V,
}

impl<V: VerifyingBackend> ProofVerifier<V> {
    pub fn new(backend: V) -> Self {
        Self { backend }
    }

    pub async fn verify(
        &self,
        proof_json: &str,
        expected: &ExpectedProofParams,
    ) -> GateResult<VerifiedProof> {
        let proof = WholeProof::from_json(proof_json)?;
        self.verify_proof(&proof, expected).await
    }

    pub async fn verify_proof(
        &self,
        proof: &WholeProof,
        expected: &ExpectedProofParams,
    ) -> GateResult<VerifiedProof> {
        let actual_context = proof
            .public_signal(PublicSignal::Context)
            .ok_or(GateError::MissingContextSignal)?;

        if actual_context != expected.context_id {
            debug!(expected = %expected.context_id, actual = %actual_context, "context mismatch");
            return Err(GateError::ContextMismatch {
                expected: expected.context_id.to_hex(),
                actual: actual_context.to_hex(),
            });
        }

        let result = self
            .backend
            .verify(
                expected.type_id,
                expected.context_id,
                expected.issuer_key_id,
                proof,
            )
            .await?;

        if result != VerifyResult::Ok {
            return Err(GateError::VerificationFailed(result.reason().to_string()));
        }

        let nullifier = proof
            .public_signal(PublicSignal::Nullifier)
            .ok_or_else(|| GateError::MalformedProof("nullifier signal missing".into()))?;
        let key_id = proof
            .public_signal(PublicSignal::KeyId)
            .ok_or_else(|| GateError::MalformedProof("key id signal missing".into()))?;

        Ok(VerifiedProof {
            context: actual_context,
            nullifier,
            key_id,
        })
    }
}
