use serde::{Deserialize, Serialize};
use zeroize::Zeroize;
use zkgate_types::{GateError, GateResult, PasswordKey};

const ARGON2_MEMORY: u32 = 64 * 1024;
const ARGON2_TIME: u32 = 3;
const ARGON2_PARALLELISM: u32 = 4;

pub const KDF_SALT_SIZE: usize = 16;

/// Argon2id parameters stored in the clear alongside encrypted material.
#[derive(Clone, Serialize, Deserialize)]
pub struct KdfParams {
    pub algorithm: String,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            algorithm: "argon2id".to_string(),
            memory_kib: ARGON2_MEMORY,
            iterations: ARGON2_TIME,
            parallelism: ARGON2_PARALLELISM,
        }
    }
}

/// Derive the password key with a per-user salt. The salt is not secret;
/// storing it next to the ciphertext keeps the external contract (same
/// password always unlocks the same user's data) while preventing equal
/// passwords from yielding equal keys across users.
pub fn derive_password_key(
    password: &str,
    salt: &[u8],
    params: &KdfParams,
) -> GateResult<PasswordKey> {
    use argon2::{Algorithm, Argon2, Params, Version};

    if params.algorithm != "argon2id" {
        return Err(GateError::Crypto(format!(
            "Unsupported KDF: {}",
            params.algorithm
        )));
    }

    let argon_params = Params::new(
        params.memory_kib,
        params.iterations,
        params.parallelism,
        Some(32),
    )
    .map_err(|e| GateError::Crypto(format!("Invalid KDF params: {}", e)))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params);

    let mut key = [0u8; 32];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut key)
        .map_err(|e| GateError::Crypto(format!("KDF failed: {}", e)))?;

    let result = PasswordKey::from_bytes(key);
    key.zeroize();
    Ok(result)
}

pub fn generate_kdf_salt() -> [u8; KDF_SALT_SIZE] {
    crate::random_bytes::<KDF_SALT_SIZE>()
}

/// Key derivation at login: salted KDF when the user record carries a
/// salt, the legacy unsalted hash otherwise.
pub fn derive_login_key(password: &str, kdf_salt: Option<&str>) -> GateResult<PasswordKey> {
    match kdf_salt {
        Some(salt_hex) => {
            let stripped = salt_hex.strip_prefix("0x").unwrap_or(salt_hex);
            let salt = hex::decode(stripped)
                .map_err(|e| GateError::Crypto(format!("Invalid KDF salt: {}", e)))?;
            derive_password_key(password, &salt, &KdfParams::default())
        }
        None => Ok(crate::keccak::hash_password(password)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_deterministic() {
        let salt = [0xab; KDF_SALT_SIZE];
        let params = KdfParams::default();
        let k1 = derive_password_key("hunter2", &salt, &params).unwrap();
        let k2 = derive_password_key("hunter2", &salt, &params).unwrap();
        assert_eq!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_different_salt_different_key() {
        let params = KdfParams::default();
        let k1 = derive_password_key("hunter2", &[0xab; KDF_SALT_SIZE], &params).unwrap();
        let k2 = derive_password_key("hunter2", &[0xcd; KDF_SALT_SIZE], &params).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_different_password_different_key() {
        let salt = [0xab; KDF_SALT_SIZE];
        let params = KdfParams::default();
        let k1 = derive_password_key("hunter2", &salt, &params).unwrap();
        let k2 = derive_password_key("hunter3", &salt, &params).unwrap();
        assert_ne!(k1.as_bytes(), k2.as_bytes());
    }

    #[test]
    fn test_login_key_matches_setup_paths() {
        let salt = generate_kdf_salt();
        let salt_hex = format!("0x{}", hex::encode(salt));

        let salted = derive_login_key("hunter2", Some(&salt_hex)).unwrap();
        let direct = derive_password_key("hunter2", &salt, &KdfParams::default()).unwrap();
        assert_eq!(salted.as_bytes(), direct.as_bytes());

        let legacy = derive_login_key("hunter2", None).unwrap();
        assert_eq!(
            legacy.as_bytes(),
            crate::keccak::hash_password("hunter2").as_bytes()
        );
        assert_ne!(salted.as_bytes(), legacy.as_bytes());
    }

    #[test]
    fn test_unknown_kdf_rejected() {
        let params = KdfParams {
            algorithm: "scrypt".to_string(),
            ..KdfParams::default()
        };
        assert!(derive_password_key("pw", &[0u8; KDF_SALT_SIZE], &params).is_err());
    }
}
