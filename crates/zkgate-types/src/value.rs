use crate::constants::{PASSWORD_KEY_SIZE, SECRET_VALUE_SIZE};
use crate::error::{GateError, GateResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

fn decode_hex32(s: &str) -> GateResult<[u8; 32]> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| GateError::Crypto(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(GateError::Crypto(format!(
            "Expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// A private 256-bit value: identity secret or internal nullifier.
///
/// Wire form is `0x` + 64 hex chars, but the raw value is only ever
/// transmitted inside an encrypted envelope. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretValue(pub [u8; SECRET_VALUE_SIZE]);

impl SecretValue {
    pub fn from_bytes(bytes: [u8; SECRET_VALUE_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_VALUE_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> GateResult<Self> {
        Ok(Self(decode_hex32(s)?))
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretValue([REDACTED])")
    }
}

impl Drop for SecretValue {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Symmetric key derived from the user's password.
///
/// This is what persists client-side between operations, never the
/// typed password itself. Zeroized on drop.
#[derive(Clone)]
pub struct PasswordKey(pub [u8; PASSWORD_KEY_SIZE]);

impl PasswordKey {
    pub fn from_bytes(bytes: [u8; PASSWORD_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PASSWORD_KEY_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> GateResult<Self> {
        Ok(Self(decode_hex32(s)?))
    }
}

impl fmt::Debug for PasswordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PasswordKey([REDACTED])")
    }
}

impl Drop for PasswordKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Public one-way binding of an identity secret. Safe to store
/// server-side in the clear.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityCommitment(pub [u8; 32]);

impl IdentityCommitment {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> GateResult<Self> {
        Ok(Self(decode_hex32(s)?))
    }
}

impl fmt::Debug for IdentityCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityCommitment({})", self.to_hex())
    }
}

impl fmt::Display for IdentityCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for IdentityCommitment {
    type Error = GateError;

    fn try_from(s: String) -> GateResult<Self> {
        Self::from_hex(&s)
    }
}

impl From<IdentityCommitment> for String {
    fn from(c: IdentityCommitment) -> String {
        c.to_hex()
    }
}

/// A 256-bit public value revealed by a proof or carried by an event
/// record: context ids, external nullifiers, nullifiers, key ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SignalValue(pub [u8; 32]);

impl SignalValue {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> GateResult<Self> {
        Ok(Self(decode_hex32(s)?))
    }

    pub fn zero() -> Self {
        Self([0u8; 32])
    }

    /// Small-integer constructor for fixed query parameters.
    pub fn from_u64(v: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&v.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Debug for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignalValue({})", self.to_hex())
    }
}

impl fmt::Display for SignalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl TryFrom<String> for SignalValue {
    type Error = GateError;

    fn try_from(s: String) -> GateResult<Self> {
        Self::from_hex(&s)
    }
}

impl From<SignalValue> for String {
    fn from(v: SignalValue) -> String {
        v.to_hex()
    }
}
