//! Poseidon hash over the BN254 scalar field.
//!
//! The proving backend derives per-event nullifiers and in-circuit
//! bindings in field arithmetic; every nullifier and commitment on the
//! proof side MUST go through these functions so that prover and verifier
//! agree bit-for-bit.
//!
//! Parameters: width 3 (rate 2, capacity 1), 8 full / 57 partial rounds,
//! x^5 S-box, arkworks Grain LFSR round constants. Output is the first
//! squeezed element.

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use ark_ff::PrimeField;
use ark_serialize::CanonicalSerialize;
use std::sync::OnceLock;

const FIELD_BITS: u64 = 254;
const RATE: usize = 2;
const FULL_ROUNDS: u64 = 8;
const PARTIAL_ROUNDS: u64 = 57;
const SBOX_ALPHA: u64 = 5;

static SPONGE_CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

/// Fixed sponge parameters, built once. Round constants and the MDS
/// matrix come from the arkworks Grain LFSR generator with no skipped
/// matrices, so any implementation using the same parameter set agrees.
pub fn canonical_config() -> &'static PoseidonConfig<Fr> {
    SPONGE_CONFIG.get_or_init(|| {
        let (ark, mds) =
            find_poseidon_ark_and_mds::<Fr>(FIELD_BITS, RATE, FULL_ROUNDS, PARTIAL_ROUNDS, 0);
        PoseidonConfig {
            full_rounds: FULL_ROUNDS as usize,
            partial_rounds: PARTIAL_ROUNDS as usize,
            alpha: SBOX_ALPHA,
            ark,
            mds,
            rate: RATE,
            capacity: 1,
        }
    })
}

pub fn poseidon_hash_fields(inputs: &[Fr]) -> Fr {
    let mut sponge = PoseidonSponge::new(canonical_config());
    for x in inputs {
        sponge.absorb(x);
    }
    sponge.squeeze_field_elements::<Fr>(1)[0]
}

pub fn poseidon_hash2_fields(left: Fr, right: Fr) -> Fr {
    poseidon_hash_fields(&[left, right])
}

/// Field element to 32 bytes, little-endian compressed form.
pub fn fr_to_bytes(f: &Fr) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    f.serialize_compressed(&mut bytes[..])
        .expect("Fr serialization failed");
    bytes
}

/// 32 bytes to field element (mod order).
pub fn bytes_to_fr(bytes: &[u8; 32]) -> Fr {
    Fr::from_le_bytes_mod_order(bytes)
}

/// Byte interface for two-input hashing.
pub fn poseidon_hash2(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    fr_to_bytes(&poseidon_hash2_fields(bytes_to_fr(left), bytes_to_fr(right)))
}

/// Per-context nullifier: H(internal_nullifier, external_nullifier).
///
/// The same identity in the same context always produces the same value;
/// different contexts produce unlinkable values.
pub fn compute_context_nullifier(
    internal_nullifier: &[u8; 32],
    external_nullifier: &[u8; 32],
) -> [u8; 32] {
    poseidon_hash2(internal_nullifier, external_nullifier)
}
