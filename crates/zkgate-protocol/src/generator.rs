//! Proof generation pipeline.
//!
//! One linear asynchronous pipeline from the user's stored envelopes to a
//! serialized proof artifact. Each step has its own error; failure at any
//! step aborts and no partial proof is ever returned.

use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;
use zkgate_crypto::vault;
use zkgate_identity::Identity;
use zkgate_types::{
    GateError, GateResult, PasswordKey, TicketCredential, User, EVM_DOMAIN,
    PROOF_VALIDITY_WINDOW_SECS,
};

use crate::backend::{GadgetStore, ProverIdentity, ProvingBackend};
use crate::context::{compute_context_id, compute_external_nullifier};
use crate::credential::Credential;
use crate::proof::WholeProof;
use crate::query::ProofQuery;

/// Clears the in-flight flag on every exit path.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ProofGenerator<B, G> {
    backend: B,
    gadget_store: G,
    in_flight: AtomicBool,
}

impl<B: ProvingBackend, G: GadgetStore> ProofGenerator<B, G> {
    pub fn new(backend: B, gadget_store: G) -> Self {
        Self {
            backend,
            gadget_store,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Generate a proof for one ticket and serialize it for transport.
    ///
    /// `context_string` overrides the canonical `"Event Ticket:
    /// <event_id>"` form when the event defines its own context.
    pub async fn generate(
        &self,
        user: &User,
        key: &PasswordKey,
        ticket: &TicketCredential,
        context_string: Option<&str>,
    ) -> GateResult<String> {
        self.generate_proof(user, key, ticket, context_string)
            .await?
            .to_json()
    }

    pub async fn generate_proof(
        &self,
        user: &User,
        key: &PasswordKey,
        ticket: &TicketCredential,
        context_string: Option<&str>,
    ) -> GateResult<WholeProof> {
        // Proof generation involves a multi-second gadget fetch; a second
        // call for the same session must fail fast instead of racing.
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(GateError::Busy);
        }
        let _guard = InFlightGuard(&self.in_flight);

        // 1. Resolve identity from the stored envelopes.
        let identity = Identity::hydrate_from_user(user, key)?;
        let slice = identity
            .slice(EVM_DOMAIN)
            .ok_or_else(|| GateError::IncompleteIdentity("no slice for domain".into()))?;

        // 2. Commitment for the target domain.
        let commitment = identity
            .identity_commitment(EVM_DOMAIN)
            .ok_or_else(|| GateError::IncompleteIdentity("no commitment for domain".into()))?;

        // 3. Decrypt (per-user flag) and parse the credential.
        let data = if user.is_encrypted {
            vault::decrypt_value(&ticket.data, key)?
        } else {
            ticket.data.clone()
        };
        let credential = Credential::parse(&data)?;

        let now = Utc::now().timestamp();
        if ticket.expire_at.timestamp() <= now {
            return Err(GateError::CredentialExpired(ticket.expire_at.timestamp()));
        }
        let sig_expired_at = credential.signature()?.expired_at;
        if sig_expired_at <= now {
            return Err(GateError::CredentialExpired(sig_expired_at));
        }

        // 4-5. Context id and external nullifier from the same canonical
        // string; consistency here is what verification later checks.
        let canonical = match context_string {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => format!("Event Ticket: {}", ticket.event_id),
        };
        let context_id = compute_context_id(&canonical);
        let external_nullifier = compute_external_nullifier(&canonical);
        debug!(event_id = %ticket.event_id, context = %context_id, "assembled proof context");

        // 6. Public-parameter query. The attested bound must not outlive
        // the credential.
        let lower_bound = (now + PROOF_VALIDITY_WINDOW_SECS).min(sig_expired_at);
        let query = ProofQuery::new(lower_bound, external_nullifier);

        // 7. Gadget fetch, then the proving call itself.
        let type_id = credential.type_id()?;
        let gadgets = self.gadget_store.fetch_gadgets(type_id).await?;

        let prover_identity = ProverIdentity {
            identity_secret: &slice.identity_secret,
            internal_nullifier: &slice.internal_nullifier,
            identity_commitment: commitment,
        };
        let proof = self
            .backend
            .prove(&prover_identity, &credential, &gadgets, &query)
            .await?;

        debug!(event_id = %ticket.event_id, "proof generated");
        Ok(proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::babyzk::BabyzkBackend;
    use crate::backend::{ProofGenGadgets, StaticGadgetStore, VerifyResult, VerifyingBackend};
    use crate::issuer::{CredentialIssuer, SignParams};
    use crate::proof::PublicSignal;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use zkgate_crypto::setup_user_credentials;
    use zkgate_types::{DEFAULT_CHAIN_ID, UNIT_CREDENTIAL_TYPE_ID};

    struct Fixture {
        user: User,
        key: PasswordKey,
        ticket: TicketCredential,
        issuer: CredentialIssuer,
    }

    fn fixture(event_id: &str, encrypted: bool) -> Fixture {
        let bundle = setup_user_credentials("hunter2").unwrap();
        let issuer = CredentialIssuer::from_seed([9u8; 32], DEFAULT_CHAIN_ID);

        let context = compute_context_id(&format!("Event Ticket: {}", event_id));
        let mut cred = Credential::parse(
            &serde_json::json!({
                "header": {"version": 1, "type": "1", "context": context, "id": "0xabcd"},
                "attachments": {"event_id": event_id}
            })
            .to_string(),
        )
        .unwrap();
        issuer.sign(
            &mut cred,
            SignParams {
                sig_id: 100,
                expired_at: Utc::now().timestamp() + 30 * 24 * 60 * 60,
                identity_commitment: bundle.identity_commitment,
            },
        );

        let data = cred.to_json().unwrap();
        let data = if encrypted {
            vault::encrypt_value(&data, &bundle.password_key).unwrap()
        } else {
            data
        };

        let user = User {
            id: "u-1".into(),
            email: "a@example.com".into(),
            is_encrypted: encrypted,
            encrypted_identity_secret: Some(bundle.encrypted_identity_secret.clone()),
            encrypted_internal_nullifier: Some(bundle.encrypted_internal_nullifier.clone()),
            identity_commitment: Some(bundle.identity_commitment),
            kdf_salt: Some(bundle.kdf_salt.clone()),
        };

        let ticket = TicketCredential {
            event_id: event_id.into(),
            data,
            issued_at: Utc::now(),
            expire_at: Utc::now() + Duration::days(30),
        };

        Fixture {
            user,
            key: bundle.password_key.clone(),
            ticket,
            issuer,
        }
    }

    fn generator() -> ProofGenerator<BabyzkBackend, StaticGadgetStore> {
        ProofGenerator::new(BabyzkBackend::new(), BabyzkBackend::gadget_store())
    }

    #[tokio::test]
    async fn test_end_to_end_generate_and_verify() {
        let fx = fixture("evt-123", true);
        let proof_json = generator()
            .generate(&fx.user, &fx.key, &fx.ticket, None)
            .await
            .unwrap();

        let proof = WholeProof::from_json(&proof_json).unwrap();
        let result = BabyzkBackend::new()
            .verify(
                UNIT_CREDENTIAL_TYPE_ID,
                compute_context_id("Event Ticket: evt-123"),
                fx.issuer.key_id(),
                &proof,
            )
            .await
            .unwrap();
        assert_eq!(result, VerifyResult::Ok);
    }

    #[tokio::test]
    async fn test_plaintext_user_skips_decryption() {
        let fx = fixture("evt-123", false);
        let proof = generator()
            .generate_proof(&fx.user, &fx.key, &fx.ticket, None)
            .await
            .unwrap();
        assert!(proof.public_signal(PublicSignal::Nullifier).is_some());
    }

    #[tokio::test]
    async fn test_wrong_password_aborts_pipeline() {
        let fx = fixture("evt-123", true);
        let wrong = zkgate_crypto::hash_password("hunter3");
        assert!(matches!(
            generator()
                .generate_proof(&fx.user, &wrong, &fx.ticket, None)
                .await,
            Err(GateError::Decryption)
        ));
    }

    #[tokio::test]
    async fn test_missing_identity_material() {
        let mut fx = fixture("evt-123", true);
        fx.user.encrypted_identity_secret = None;
        assert!(matches!(
            generator()
                .generate_proof(&fx.user, &fx.key, &fx.ticket, None)
                .await,
            Err(GateError::IncompleteIdentity(_))
        ));
    }

    #[tokio::test]
    async fn test_expired_ticket_rejected() {
        let mut fx = fixture("evt-123", false);
        fx.ticket.expire_at = Utc::now() - Duration::days(1);
        assert!(matches!(
            generator()
                .generate_proof(&fx.user, &fx.key, &fx.ticket, None)
                .await,
            Err(GateError::CredentialExpired(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_ticket_data() {
        let mut fx = fixture("evt-123", false);
        fx.ticket.data = "{\"header\":{}}".into();
        assert!(matches!(
            generator()
                .generate_proof(&fx.user, &fx.key, &fx.ticket, None)
                .await,
            Err(GateError::MalformedCredential(_))
        ));
    }

    #[tokio::test]
    async fn test_explicit_context_string() {
        let fx = fixture("evt-123", false);
        let proof = generator()
            .generate_proof(&fx.user, &fx.key, &fx.ticket, Some("DevCon 2026 Entry"))
            .await
            .unwrap();

        // Context mismatch: credential was issued against the canonical
        // string, so the embedded context differs from the query's.
        assert_eq!(
            proof.public_signal(PublicSignal::Context),
            Some(compute_context_id("Event Ticket: evt-123"))
        );
    }

    struct SlowGadgetStore;

    #[async_trait]
    impl GadgetStore for SlowGadgetStore {
        async fn fetch_gadgets(&self, _type_id: u64) -> GateResult<ProofGenGadgets> {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            Ok(ProofGenGadgets::default())
        }
    }

    #[tokio::test]
    async fn test_overlapping_generation_rejected() {
        let fx = fixture("evt-123", false);
        let generator = Arc::new(ProofGenerator::new(BabyzkBackend::new(), SlowGadgetStore));

        let first = {
            let generator = generator.clone();
            let (user, key, ticket) = (fx.user.clone(), fx.key.clone(), fx.ticket.clone());
            tokio::spawn(async move { generator.generate_proof(&user, &key, &ticket, None).await })
        };

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let second = generator
            .generate_proof(&fx.user, &fx.key, &fx.ticket, None)
            .await;
        assert!(matches!(second, Err(GateError::Busy)));

        // The guard resets once the first call completes.
        assert!(first.await.unwrap().is_ok());
        assert!(generator
            .generate_proof(&fx.user, &fx.key, &fx.ticket, None)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_nullifier_stable_across_generations() {
        let fx = fixture("evt-123", true);
        let g = generator();
        let p1 = g
            .generate_proof(&fx.user, &fx.key, &fx.ticket, None)
            .await
            .unwrap();
        let p2 = g
            .generate_proof(&fx.user, &fx.key, &fx.ticket, None)
            .await
            .unwrap();
        assert_eq!(
            p1.public_signal(PublicSignal::Nullifier),
            p2.public_signal(PublicSignal::Nullifier)
        );
    }

    #[tokio::test]
    async fn test_signal_value_never_equals_commitment() {
        let fx = fixture("evt-123", true);
        let proof = generator()
            .generate_proof(&fx.user, &fx.key, &fx.ticket, None)
            .await
            .unwrap();
        let commitment = fx.user.identity_commitment.unwrap();
        for value in proof.public_signals.values() {
            assert_ne!(value.as_bytes(), commitment.as_bytes());
        }
    }
}
