//! In-memory identity assembly from decrypted secret material.

use std::collections::HashMap;
use zkgate_crypto::{generate_identity_commitment, vault};
use zkgate_types::{
    GateError, GateResult, IdentityCommitment, PasswordKey, SecretValue, User, EVM_DOMAIN,
};

/// Secret material for one identity domain.
#[derive(Clone)]
pub struct IdentitySlice {
    pub identity_secret: SecretValue,
    pub internal_nullifier: SecretValue,
    pub domain: String,
}

impl std::fmt::Debug for IdentitySlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentitySlice")
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

/// Holds decrypted identity slices for the duration of one operation and
/// computes per-domain commitments on demand. Never persisted; rehydrate
/// through [`Identity::hydrate_from_user`] each time.
#[derive(Default)]
pub struct Identity {
    slices: HashMap<String, IdentitySlice>,
}

impl Identity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register secret material for a domain. A later slice for the same
    /// domain replaces the earlier one.
    pub fn add_identity_slice(&mut self, slice: IdentitySlice) {
        self.slices.insert(slice.domain.clone(), slice);
    }

    /// Commitment for a domain, or `None` when no slice is registered.
    /// Callers treat `None` as "identity not set up", never as a default.
    pub fn identity_commitment(&self, domain: &str) -> Option<IdentityCommitment> {
        self.slices
            .get(domain)
            .map(|s| generate_identity_commitment(&s.identity_secret))
    }

    pub fn slice(&self, domain: &str) -> Option<&IdentitySlice> {
        self.slices.get(domain)
    }

    /// Decrypt the user's stored envelopes into an EVM-domain slice.
    ///
    /// Fails with [`GateError::IncompleteIdentity`] when either envelope
    /// is absent and with [`GateError::Decryption`] on a wrong key.
    pub fn hydrate_from_user(user: &User, key: &PasswordKey) -> GateResult<Self> {
        let enc_secret = user
            .encrypted_identity_secret
            .as_deref()
            .ok_or_else(|| GateError::IncompleteIdentity("identity secret missing".into()))?;
        let enc_nullifier = user
            .encrypted_internal_nullifier
            .as_deref()
            .ok_or_else(|| GateError::IncompleteIdentity("internal nullifier missing".into()))?;

        let identity_secret = SecretValue::from_hex(&vault::decrypt_value(enc_secret, key)?)
            .map_err(|_| GateError::Decryption)?;
        let internal_nullifier = SecretValue::from_hex(&vault::decrypt_value(enc_nullifier, key)?)
            .map_err(|_| GateError::Decryption)?;

        let mut identity = Identity::new();
        identity.add_identity_slice(IdentitySlice {
            identity_secret,
            internal_nullifier,
            domain: EVM_DOMAIN.to_string(),
        });
        Ok(identity)
    }
}
