//! Reference proving/verification backend.
//!
//! Stands in for the circuit prover and the on-chain stateful verifier
//! behind the [`ProvingBackend`]/[`VerifyingBackend`] seams. Nullifier
//! derivation is the real protocol (Poseidon over the BN254 field); the
//! zero-knowledge envelope is replaced by a transparent binding tag over
//! the public signals. Swapping in the production backend changes nothing
//! above these traits.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use std::collections::BTreeMap;
use zkgate_crypto::{compute_context_nullifier, constant_time_eq, keccak256};
use zkgate_types::{GateError, GateResult, SignalValue};

use crate::backend::{
    GadgetStore, ProofGenGadgets, ProverIdentity, ProvingBackend, StaticGadgetStore, VerifyResult,
    VerifyingBackend,
};
use crate::credential::Credential;
use crate::proof::{PublicSignal, WholeProof};
use crate::query::ProofQuery;

const BINDING_DOMAIN: &[u8] = b"zkgate.babyzk.v1";

const SIGNAL_ORDER: [PublicSignal; 7] = [
    PublicSignal::Type,
    PublicSignal::Context,
    PublicSignal::Nullifier,
    PublicSignal::KeyId,
    PublicSignal::ExpiredAtLowerBound,
    PublicSignal::EqualCheckId,
    PublicSignal::Pseudonym,
];

fn binding_tag(signals: &BTreeMap<String, SignalValue>) -> GateResult<[u8; 32]> {
    let mut input = Vec::with_capacity(BINDING_DOMAIN.len() + SIGNAL_ORDER.len() * 32);
    input.extend_from_slice(BINDING_DOMAIN);
    for signal in SIGNAL_ORDER {
        let value = signals
            .get(signal.key())
            .ok_or_else(|| GateError::MalformedProof(format!("missing signal {}", signal.key())))?;
        input.extend_from_slice(value.as_bytes());
    }
    Ok(keccak256(&input))
}

#[derive(Clone, Default)]
pub struct BabyzkBackend;

impl BabyzkBackend {
    pub fn new() -> Self {
        Self
    }

    /// Gadget store matching this backend: everything is in-process.
    pub fn gadget_store() -> StaticGadgetStore {
        StaticGadgetStore::new(ProofGenGadgets::default())
    }
}

#[async_trait]
impl ProvingBackend for BabyzkBackend {
    async fn prove(
        &self,
        identity: &ProverIdentity<'_>,
        credential: &Credential,
        _gadgets: &ProofGenGadgets,
        query: &ProofQuery,
    ) -> GateResult<WholeProof> {
        let type_id = credential.type_id()?;
        let sig_block = credential.signature()?;

        // Structural signature check; the cryptographic check lives with
        // the issuer's verifying key at issuance and in the real circuit.
        let sig_bytes = hex::decode(&sig_block.signature)
            .map_err(|_| GateError::MalformedCredential("bad signature hex".into()))?;
        if sig_bytes.len() != 64 {
            return Err(GateError::MalformedCredential(
                "signature is not 64 bytes".into(),
            ));
        }

        if sig_block.identity_commitment != identity.identity_commitment {
            return Err(GateError::ProofGeneration(
                "credential is not bound to this identity".into(),
            ));
        }

        if sig_block.expired_at < query.options.expired_at_lower_bound {
            return Err(GateError::ProofGeneration(
                "credential expires before the attested validity bound".into(),
            ));
        }

        let nullifier = compute_context_nullifier(
            identity.internal_nullifier.as_bytes(),
            query.options.external_nullifier.as_bytes(),
        );

        let mut signals = BTreeMap::new();
        signals.insert(
            PublicSignal::Type.key().to_string(),
            SignalValue::from_u64(type_id),
        );
        signals.insert(
            PublicSignal::Context.key().to_string(),
            credential.header.context,
        );
        signals.insert(
            PublicSignal::Nullifier.key().to_string(),
            SignalValue::from_bytes(nullifier),
        );
        signals.insert(
            PublicSignal::KeyId.key().to_string(),
            sig_block.issuer_key_id,
        );
        signals.insert(
            PublicSignal::ExpiredAtLowerBound.key().to_string(),
            SignalValue::from_u64(query.options.expired_at_lower_bound as u64),
        );
        signals.insert(
            PublicSignal::EqualCheckId.key().to_string(),
            query.options.equal_check_id,
        );
        signals.insert(
            PublicSignal::Pseudonym.key().to_string(),
            query.options.pseudonym,
        );

        let tag = binding_tag(&signals)?;

        Ok(WholeProof {
            proof: BASE64.encode(tag),
            public_signals: signals,
        })
    }
}

#[async_trait]
impl VerifyingBackend for BabyzkBackend {
    async fn verify(
        &self,
        expected_type: u64,
        expected_context: SignalValue,
        expected_issuer: SignalValue,
        proof: &WholeProof,
    ) -> GateResult<VerifyResult> {
        let expected_tag = match binding_tag(&proof.public_signals) {
            Ok(tag) => tag,
            Err(_) => return Ok(VerifyResult::BindingMismatch),
        };

        let proof_bytes = BASE64
            .decode(&proof.proof)
            .map_err(|e| GateError::MalformedProof(format!("bad proof bytes: {}", e)))?;
        if !constant_time_eq(&proof_bytes, &expected_tag) {
            return Ok(VerifyResult::BindingMismatch);
        }

        let type_signal = proof.public_signal(PublicSignal::Type);
        if type_signal != Some(SignalValue::from_u64(expected_type)) {
            return Ok(VerifyResult::TypeMismatch);
        }

        if proof.public_signal(PublicSignal::Context) != Some(expected_context) {
            return Ok(VerifyResult::ContextMismatch);
        }

        if proof.public_signal(PublicSignal::KeyId) != Some(expected_issuer) {
            return Ok(VerifyResult::IssuerMismatch);
        }

        let lower_bound = proof
            .public_signal(PublicSignal::ExpiredAtLowerBound)
            .map(|v| {
                let mut b = [0u8; 8];
                b.copy_from_slice(&v.as_bytes()[24..]);
                u64::from_be_bytes(b)
            })
            .unwrap_or(0);
        if (lower_bound as i64) <= Utc::now().timestamp() {
            return Ok(VerifyResult::ProofExpired);
        }

        Ok(VerifyResult::Ok)
    }
}
