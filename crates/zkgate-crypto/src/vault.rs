//! Authenticated encryption of secret values under the password key.
//!
//! Two envelope generations share the `0x`-hex wire form:
//!
//! - v2 (written by this code): `0x` + hex(version ∥ nonce ∥ ciphertext ∥
//!   tag), where the sealed plaintext carries a one-byte payload
//!   discriminant (raw 32-byte secret vs UTF-8 text). Shape is never
//!   inferred from length.
//! - legacy: `0x` + hex(nonce ∥ ciphertext ∥ tag); a decrypted payload of
//!   exactly 32 bytes is re-encoded as a `0x`-hex secret, anything else is
//!   UTF-8 text. Retained as a fallback decoder for stored material.
//!
//! Decryption fails closed: a wrong key or a tampered envelope surfaces as
//! [`GateError::Decryption`], never as silently wrong plaintext.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use zkgate_types::{GateError, GateResult, PasswordKey, NONCE_SIZE, TAG_SIZE};

const ENVELOPE_VERSION: u8 = 2;

const PAYLOAD_RAW: u8 = 1;
const PAYLOAD_TEXT: u8 = 2;

fn cipher(key: &PasswordKey) -> GateResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|e| GateError::Crypto(e.to_string()))
}

fn decode_envelope(envelope: &str) -> GateResult<Vec<u8>> {
    let stripped = envelope
        .strip_prefix("0x")
        .ok_or_else(|| GateError::Crypto("Envelope missing 0x prefix".into()))?;
    hex::decode(stripped).map_err(|e| GateError::Crypto(e.to_string()))
}

/// Interpret the caller's value the way the storage contract expects:
/// `0x`-hex input is a raw secret, anything else is UTF-8 text.
fn value_to_payload(value: &str) -> GateResult<Vec<u8>> {
    if let Some(hex_part) = value.strip_prefix("0x") {
        let raw = hex::decode(hex_part).map_err(|e| GateError::Crypto(e.to_string()))?;
        let mut payload = Vec::with_capacity(1 + raw.len());
        payload.push(PAYLOAD_RAW);
        payload.extend_from_slice(&raw);
        Ok(payload)
    } else {
        let mut payload = Vec::with_capacity(1 + value.len());
        payload.push(PAYLOAD_TEXT);
        payload.extend_from_slice(value.as_bytes());
        Ok(payload)
    }
}

/// Encrypt a hex-encoded secret or a UTF-8 string under the password key.
/// A fresh random 96-bit nonce is generated per call.
pub fn encrypt_value(value: &str, key: &PasswordKey) -> GateResult<String> {
    let payload = value_to_payload(value)?;

    let nonce_bytes = crate::random_bytes::<NONCE_SIZE>();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher(key)?
        .encrypt(nonce, payload.as_slice())
        .map_err(|e| GateError::Crypto(e.to_string()))?;

    let mut out = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
    out.push(ENVELOPE_VERSION);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);

    Ok(format!("0x{}", hex::encode(out)))
}

/// Legacy envelope writer: no version byte, no payload discriminant.
/// Kept only so migration and fallback-decoder tests can produce
/// envelopes in the stored format.
pub fn encrypt_value_legacy(value: &str, key: &PasswordKey) -> GateResult<String> {
    let raw = if let Some(hex_part) = value.strip_prefix("0x") {
        hex::decode(hex_part).map_err(|e| GateError::Crypto(e.to_string()))?
    } else {
        value.as_bytes().to_vec()
    };

    let nonce_bytes = crate::random_bytes::<NONCE_SIZE>();
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher(key)?
        .encrypt(nonce, raw.as_slice())
        .map_err(|e| GateError::Crypto(e.to_string()))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);

    Ok(format!("0x{}", hex::encode(out)))
}

fn try_decrypt_v2(buf: &[u8], key: &PasswordKey) -> GateResult<String> {
    if buf.len() < 1 + NONCE_SIZE + TAG_SIZE || buf[0] != ENVELOPE_VERSION {
        return Err(GateError::Decryption);
    }

    let nonce = Nonce::from_slice(&buf[1..1 + NONCE_SIZE]);
    let payload = cipher(key)?
        .decrypt(nonce, &buf[1 + NONCE_SIZE..])
        .map_err(|_| GateError::Decryption)?;

    match payload.split_first() {
        Some((&PAYLOAD_RAW, raw)) => Ok(format!("0x{}", hex::encode(raw))),
        Some((&PAYLOAD_TEXT, text)) => String::from_utf8(text.to_vec())
            .map_err(|e| GateError::Crypto(format!("Invalid UTF-8 payload: {}", e))),
        _ => Err(GateError::Crypto("Unknown payload discriminant".into())),
    }
}

fn try_decrypt_legacy(buf: &[u8], key: &PasswordKey) -> GateResult<String> {
    if buf.len() < NONCE_SIZE + TAG_SIZE {
        return Err(GateError::Decryption);
    }

    let nonce = Nonce::from_slice(&buf[..NONCE_SIZE]);
    let payload = cipher(key)?
        .decrypt(nonce, &buf[NONCE_SIZE..])
        .map_err(|_| GateError::Decryption)?;

    // Length-based dispatch is the legacy convention: a 32-byte payload is
    // a raw secret, everything else is text.
    if payload.len() == 32 {
        Ok(format!("0x{}", hex::encode(payload)))
    } else {
        String::from_utf8(payload).map_err(|_| GateError::Decryption)
    }
}

/// Decrypt an envelope produced by either format generation.
///
/// The v2 parse is attempted first; the authentication tag rejects a
/// legacy envelope misread as v2, after which the legacy decoder runs.
pub fn decrypt_value(envelope: &str, key: &PasswordKey) -> GateResult<String> {
    let buf = decode_envelope(envelope)?;

    match try_decrypt_v2(&buf, key) {
        Ok(plain) => Ok(plain),
        Err(GateError::Decryption) => try_decrypt_legacy(&buf, key),
        Err(e) => Err(e),
    }
}
