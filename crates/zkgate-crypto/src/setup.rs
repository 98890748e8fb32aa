//! One-time identity setup at password-creation time.

use crate::kdf::{derive_password_key, generate_kdf_salt, KdfParams};
use crate::{generate_random_value, keccak::generate_identity_commitment, vault};
use zkgate_types::{GateResult, IdentityCommitment, PasswordKey, SecretValue, UserUpdate};

/// Everything produced by password setup. The encrypted envelopes and the
/// commitment go to the backend; the key stays in the session; the
/// plaintext secrets exist only inside this bundle and are zeroized with
/// it.
pub struct SetupBundle {
    pub password_key: PasswordKey,
    pub identity_secret: SecretValue,
    pub internal_nullifier: SecretValue,
    pub identity_commitment: IdentityCommitment,
    pub encrypted_identity_secret: String,
    pub encrypted_internal_nullifier: String,
    /// Hex-encoded per-user KDF salt, stored in the clear on the user
    /// record.
    pub kdf_salt: String,
}

impl SetupBundle {
    /// The `PUT /user/update` body persisting the encrypted material.
    pub fn user_update(&self) -> UserUpdate {
        UserUpdate {
            identity_commitment: self.identity_commitment,
            encrypted_identity_secret: self.encrypted_identity_secret.clone(),
            encrypted_internal_nullifier: self.encrypted_internal_nullifier.clone(),
            is_encrypted: true,
            kdf_salt: Some(self.kdf_salt.clone()),
        }
    }
}

/// Generate a fresh identity secret and internal nullifier, derive the
/// password key with a fresh salt, and seal both values. Run exactly once
/// per user, at password-setup time.
pub fn setup_user_credentials(password: &str) -> GateResult<SetupBundle> {
    let salt = generate_kdf_salt();
    let password_key = derive_password_key(password, &salt, &KdfParams::default())?;

    let identity_secret = generate_random_value();
    let internal_nullifier = generate_random_value();
    let identity_commitment = generate_identity_commitment(&identity_secret);

    let encrypted_identity_secret = vault::encrypt_value(&identity_secret.to_hex(), &password_key)?;
    let encrypted_internal_nullifier =
        vault::encrypt_value(&internal_nullifier.to_hex(), &password_key)?;

    Ok(SetupBundle {
        password_key,
        identity_secret,
        internal_nullifier,
        identity_commitment,
        encrypted_identity_secret,
        encrypted_internal_nullifier,
        kdf_salt: format!("0x{}", hex::encode(salt)),
    })
}
