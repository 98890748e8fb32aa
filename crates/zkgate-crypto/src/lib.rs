#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod kdf;
pub mod keccak;
pub mod poseidon;
pub mod setup;
pub mod vault;

pub use kdf::*;
pub use keccak::*;
pub use poseidon::*;
pub use setup::*;
pub use vault::*;

use zkgate_types::SecretValue;

pub fn random_bytes<const N: usize>() -> [u8; N] {
    use rand::RngCore;
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

/// Cryptographically secure random 256-bit value for identity secrets
/// and internal nullifiers.
pub fn generate_random_value() -> SecretValue {
    SecretValue::from_bytes(random_bytes::<32>())
}

pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
