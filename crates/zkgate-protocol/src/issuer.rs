//! Issuer-side credential signing.
//!
//! The backend issues credentials; this module is the signing half the
//! reference proving backend validates against. The issuer key id is the
//! keccak hash of the ed25519 verifying key.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use zkgate_crypto::keccak256;
use zkgate_types::{GateError, GateResult, IdentityCommitment, SignalValue};

use crate::credential::{Credential, CredentialSignature};

/// Parameters of one signing operation.
pub struct SignParams {
    pub sig_id: u64,
    pub expired_at: i64,
    pub identity_commitment: IdentityCommitment,
}

pub struct CredentialIssuer {
    signing_key: SigningKey,
    chain_id: u64,
}

/// The message a credential signature covers: the full binding between
/// type, context, holder id, identity commitment, and expiry.
pub fn signing_message(
    cred: &Credential,
    identity_commitment: &IdentityCommitment,
    expired_at: i64,
    chain_id: u64,
) -> Vec<u8> {
    let mut msg = Vec::new();
    msg.extend_from_slice(cred.header.type_id.as_bytes());
    msg.extend_from_slice(cred.header.context.as_bytes());
    msg.extend_from_slice(cred.header.id.as_bytes());
    msg.extend_from_slice(identity_commitment.as_bytes());
    msg.extend_from_slice(&expired_at.to_be_bytes());
    msg.extend_from_slice(&chain_id.to_be_bytes());
    keccak256(&msg).to_vec()
}

impl CredentialIssuer {
    pub fn new(signing_key: SigningKey, chain_id: u64) -> Self {
        Self {
            signing_key,
            chain_id,
        }
    }

    pub fn from_seed(seed: [u8; 32], chain_id: u64) -> Self {
        Self::new(SigningKey::from_bytes(&seed), chain_id)
    }

    /// Public key id this issuer signs under.
    pub fn key_id(&self) -> SignalValue {
        SignalValue::from_bytes(keccak256(self.signing_key.verifying_key().as_bytes()))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// Attach a signature binding the credential to one identity
    /// commitment and one expiry.
    pub fn sign(&self, cred: &mut Credential, params: SignParams) {
        let msg = signing_message(
            cred,
            &params.identity_commitment,
            params.expired_at,
            self.chain_id,
        );
        let sig = self.signing_key.sign(&msg);

        cred.signature = Some(CredentialSignature {
            sig_id: params.sig_id,
            expired_at: params.expired_at,
            identity_commitment: params.identity_commitment,
            issuer_key_id: self.key_id(),
            chain_id: self.chain_id,
            signature: hex::encode(sig.to_bytes()),
        });
    }
}

/// Check a credential's signature against the given verifying key.
pub fn verify_credential_signature(cred: &Credential, key: &VerifyingKey) -> GateResult<()> {
    let sig_block = cred.signature()?;

    let sig_bytes = hex::decode(&sig_block.signature)
        .map_err(|e| GateError::MalformedCredential(format!("bad signature hex: {}", e)))?;
    let sig = ed25519_dalek::Signature::from_slice(&sig_bytes)
        .map_err(|e| GateError::MalformedCredential(format!("bad signature: {}", e)))?;

    let msg = signing_message(
        cred,
        &sig_block.identity_commitment,
        sig_block.expired_at,
        sig_block.chain_id,
    );

    key.verify(&msg, &sig)
        .map_err(|_| GateError::MalformedCredential("issuer signature does not verify".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkgate_types::DEFAULT_CHAIN_ID;

    fn unsigned_credential() -> Credential {
        Credential::parse(
            &serde_json::json!({
                "header": {
                    "version": 1,
                    "type": "1",
                    "context": SignalValue::from_u64(7),
                    "id": "0xabcd"
                }
            })
            .to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let issuer = CredentialIssuer::from_seed([9u8; 32], DEFAULT_CHAIN_ID);
        let mut cred = unsigned_credential();
        issuer.sign(
            &mut cred,
            SignParams {
                sig_id: 100,
                expired_at: 2_000_000_000,
                identity_commitment: IdentityCommitment::from_bytes([1u8; 32]),
            },
        );

        assert_eq!(cred.signature().unwrap().issuer_key_id, issuer.key_id());
        verify_credential_signature(&cred, &issuer.verifying_key()).unwrap();
    }

    #[test]
    fn test_tampered_credential_fails_verification() {
        let issuer = CredentialIssuer::from_seed([9u8; 32], DEFAULT_CHAIN_ID);
        let mut cred = unsigned_credential();
        issuer.sign(
            &mut cred,
            SignParams {
                sig_id: 100,
                expired_at: 2_000_000_000,
                identity_commitment: IdentityCommitment::from_bytes([1u8; 32]),
            },
        );

        cred.header.id = "0xeeee".into();
        assert!(verify_credential_signature(&cred, &issuer.verifying_key()).is_err());
    }

    #[test]
    fn test_wrong_issuer_key_rejected() {
        let issuer = CredentialIssuer::from_seed([9u8; 32], DEFAULT_CHAIN_ID);
        let other = CredentialIssuer::from_seed([8u8; 32], DEFAULT_CHAIN_ID);
        let mut cred = unsigned_credential();
        issuer.sign(
            &mut cred,
            SignParams {
                sig_id: 100,
                expired_at: 2_000_000_000,
                identity_commitment: IdentityCommitment::from_bytes([1u8; 32]),
            },
        );

        assert!(verify_credential_signature(&cred, &other.verifying_key()).is_err());
        assert_ne!(issuer.key_id(), other.key_id());
    }
}
