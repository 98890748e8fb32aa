use crate::value::IdentityCommitment;
use serde::{Deserialize, Serialize};

/// User record as served by `GET /user/me`.
///
/// The identity secret and internal nullifier are only ever present in
/// their encrypted envelope form. `is_encrypted` distinguishes users who
/// completed password setup from legacy plaintext accounts; callers must
/// branch on it rather than assume universal encryption.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub is_encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_identity_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_internal_nullifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_commitment: Option<IdentityCommitment>,
    /// Hex-encoded KDF salt, present for users whose key was derived with
    /// the salted KDF. Legacy accounts (unsalted keccak key) carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf_salt: Option<String>,
}

impl User {
    /// Whether password setup has produced stored identity material.
    pub fn has_identity(&self) -> bool {
        self.encrypted_identity_secret.is_some() && self.encrypted_internal_nullifier.is_some()
    }
}

/// Body of `PUT /user/update` after password setup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserUpdate {
    pub identity_commitment: IdentityCommitment,
    pub encrypted_identity_secret: String,
    pub encrypted_internal_nullifier: String,
    pub is_encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kdf_salt: Option<String>,
}
