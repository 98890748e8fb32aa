/// Size of a raw identity secret or internal nullifier in bytes.
pub const SECRET_VALUE_SIZE: usize = 32;

/// AES-256-GCM nonce size.
pub const NONCE_SIZE: usize = 12;

/// AES-256-GCM authentication tag size.
pub const TAG_SIZE: usize = 16;

/// Derived password key size (AES-256 key).
pub const PASSWORD_KEY_SIZE: usize = 32;

/// Credential type id of the unit credential (no disclosed attributes).
pub const UNIT_CREDENTIAL_TYPE_ID: u64 = 1;

/// Validity window of an issued ticket credential.
pub const TICKET_CREDENTIAL_VALID_SECS: i64 = 265 * 24 * 60 * 60;

/// How far into the future a proof attests the credential is still valid.
pub const PROOF_VALIDITY_WINDOW_SECS: i64 = 3 * 24 * 60 * 60;

/// Identity domain tag for EVM-style identities.
pub const EVM_DOMAIN: &str = "evm";

/// Default chain id (Ethereum mainnet).
pub const DEFAULT_CHAIN_ID: u64 = 1;
