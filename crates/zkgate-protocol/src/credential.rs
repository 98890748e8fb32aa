//! Unit credential schema and parsing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use zkgate_types::{
    GateError, GateResult, IdentityCommitment, SignalValue, UNIT_CREDENTIAL_TYPE_ID,
};

/// Credential header: the binding between type, context, and holder id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialHeader {
    pub version: u32,
    #[serde(rename = "type")]
    pub type_id: String,
    pub context: SignalValue,
    /// Holder id as assigned by the issuer (hash of the holder's email in
    /// this system). Required.
    pub id: String,
}

/// Issuer signature block.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CredentialSignature {
    pub sig_id: u64,
    pub expired_at: i64,
    pub identity_commitment: IdentityCommitment,
    pub issuer_key_id: SignalValue,
    pub chain_id: u64,
    /// Hex-encoded ed25519 signature over the binding message.
    pub signature: String,
}

/// A parsed ticket credential. The unit type carries no disclosed
/// attributes beyond its binding, so the body is empty.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credential {
    pub header: CredentialHeader,
    #[serde(default)]
    pub body: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<CredentialSignature>,
    #[serde(default)]
    pub attachments: HashMap<String, String>,
}

impl Credential {
    /// Parse credential JSON, enforcing the required header fields.
    pub fn parse(data: &str) -> GateResult<Self> {
        let cred: Credential = serde_json::from_str(data)
            .map_err(|e| GateError::MalformedCredential(e.to_string()))?;

        if cred.header.id.is_empty() {
            return Err(GateError::MalformedCredential(
                "header.id is missing".into(),
            ));
        }
        if cred.header.type_id.is_empty() {
            return Err(GateError::MalformedCredential(
                "header.type is missing".into(),
            ));
        }

        Ok(cred)
    }

    /// Numeric credential type id.
    pub fn type_id(&self) -> GateResult<u64> {
        self.header
            .type_id
            .parse::<u64>()
            .map_err(|_| GateError::MalformedCredential("header.type is not numeric".into()))
    }

    pub fn is_unit_type(&self) -> bool {
        self.type_id()
            .map(|t| t == UNIT_CREDENTIAL_TYPE_ID)
            .unwrap_or(false)
    }

    pub fn signature(&self) -> GateResult<&CredentialSignature> {
        self.signature
            .as_ref()
            .ok_or_else(|| GateError::MalformedCredential("credential is unsigned".into()))
    }

    pub fn to_json(&self) -> GateResult<String> {
        serde_json::to_string(self).map_err(|e| GateError::Serialization(e.to_string()))
    }
}
