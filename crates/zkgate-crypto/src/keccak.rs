use sha3::{Digest, Keccak256};
use zkgate_types::{IdentityCommitment, PasswordKey, SecretValue};

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash a password directly into a fixed-length key. Deterministic,
/// unsalted; this is the legacy key path that existing envelopes were
/// sealed under. New material goes through [`crate::kdf`].
pub fn hash_password(password: &str) -> PasswordKey {
    PasswordKey::from_bytes(keccak256(password.as_bytes()))
}

/// One-way binding of an identity secret. Same secret always yields the
/// same commitment; this is the server-visible anchor of the identity.
pub fn generate_identity_commitment(secret: &SecretValue) -> IdentityCommitment {
    IdentityCommitment::from_bytes(keccak256(secret.as_bytes()))
}
