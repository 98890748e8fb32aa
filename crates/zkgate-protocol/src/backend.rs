//! Seams to the external proving and verification capability.
//!
//! The real system proves in a circuit and verifies on-chain; both sit
//! behind these traits. The in-repo [`crate::babyzk`] module is a
//! transparent reference backend used for wiring and tests.

use async_trait::async_trait;
use zkgate_types::{GateResult, IdentityCommitment, SecretValue, SignalValue};

use crate::credential::Credential;
use crate::proof::WholeProof;
use crate::query::ProofQuery;

/// Proving artifacts fetched per credential type (witness generator and
/// proving key in the real backend). Opaque to this crate.
#[derive(Clone, Default)]
pub struct ProofGenGadgets {
    pub witness_gen: Vec<u8>,
    pub proving_key: Vec<u8>,
}

/// Fetches proving gadgets, typically over the network. The fetch is the
/// slowest step of proof generation and fails independently of the proof
/// computation, so it has its own seam and its own error variant.
#[async_trait]
pub trait GadgetStore: Send + Sync {
    async fn fetch_gadgets(&self, type_id: u64) -> GateResult<ProofGenGadgets>;
}

/// Gadgets bundled in-process. Used by the reference backend and tests.
#[derive(Clone, Default)]
pub struct StaticGadgetStore {
    gadgets: ProofGenGadgets,
}

impl StaticGadgetStore {
    pub fn new(gadgets: ProofGenGadgets) -> Self {
        Self { gadgets }
    }
}

#[async_trait]
impl GadgetStore for StaticGadgetStore {
    async fn fetch_gadgets(&self, _type_id: u64) -> GateResult<ProofGenGadgets> {
        Ok(self.gadgets.clone())
    }
}

/// Secret inputs to one proving call.
pub struct ProverIdentity<'a> {
    pub identity_secret: &'a SecretValue,
    pub internal_nullifier: &'a SecretValue,
    pub identity_commitment: IdentityCommitment,
}

#[async_trait]
pub trait ProvingBackend: Send + Sync {
    /// Produce a proof binding the credential to the query's context.
    /// May be slow; the caller guards against overlapping invocations.
    async fn prove(
        &self,
        identity: &ProverIdentity<'_>,
        credential: &Credential,
        gadgets: &ProofGenGadgets,
        query: &ProofQuery,
    ) -> GateResult<WholeProof>;
}

/// Outcome of stateful verification, richer than pass/fail so failures
/// can be reported with their reason.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyResult {
    Ok,
    TypeMismatch,
    ContextMismatch,
    IssuerMismatch,
    ProofExpired,
    BindingMismatch,
}

impl VerifyResult {
    pub fn reason(&self) -> &'static str {
        match self {
            VerifyResult::Ok => "ok",
            VerifyResult::TypeMismatch => "credential type mismatch",
            VerifyResult::ContextMismatch => "context mismatch",
            VerifyResult::IssuerMismatch => "issuer key mismatch",
            VerifyResult::ProofExpired => "proof validity window has passed",
            VerifyResult::BindingMismatch => "proof binding check failed",
        }
    }
}

#[async_trait]
pub trait VerifyingBackend: Send + Sync {
    async fn verify(
        &self,
        expected_type: u64,
        expected_context: SignalValue,
        expected_issuer: SignalValue,
        proof: &WholeProof,
    ) -> GateResult<VerifyResult>;
}
