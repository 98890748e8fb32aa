//! Command implementations, generic over the backend API so they run
//! against the in-memory double in tests.

use anyhow::{bail, Context, Result};
use tracing::info;
use zkgate_client::{
    proof_deep_link, qr_unicode, BackendApi, CheckInOutcome, CheckInSession, CredentialStore,
};
use zkgate_crypto::{derive_login_key, setup_user_credentials};
use zkgate_identity::Session;
use zkgate_protocol::verifier::{ExpectedProofParams, ProofVerifier};
use zkgate_protocol::{BabyzkBackend, ProofGenerator};
use zkgate_types::GateError;

/// Generate identity material for a fresh password and persist the
/// encrypted envelopes on the user record.
pub async fn setup_password<A: BackendApi>(api: &A, password: &str) -> Result<String> {
    let user = api.get_user().await?;
    if user.has_identity() {
        bail!("identity material already set up for {}", user.email);
    }

    let bundle = setup_user_credentials(password)?;
    api.update_user(&bundle.user_update()).await?;
    info!("identity material stored");
    Ok(bundle.identity_commitment.to_hex())
}

/// Request a ticket credential for one event and store it.
pub async fn request_ticket<A: BackendApi>(
    api: &A,
    password: &str,
    event_id: &str,
) -> Result<String> {
    let user = api.get_user().await?;
    let session = Session::new(derive_login_key(password, user.kdf_salt.as_deref())?, None);

    let store = CredentialStore::new(api);
    let ticket = store
        .request_and_store(&user, session.password_key(), event_id)
        .await?;
    Ok(format!(
        "ticket for {} stored, valid until {}",
        ticket.event_id, ticket.expire_at
    ))
}

/// Generate a proof for a stored ticket. Returns the proof JSON plus a
/// scannable deep link rendering.
pub async fn prove<A: BackendApi>(
    api: &A,
    password: &str,
    event_id: &str,
    deep_link_base: &str,
) -> Result<(String, String)> {
    let user = api.get_user().await?;
    let session = Session::new(derive_login_key(password, user.kdf_salt.as_deref())?, None);
    let event = api.get_event(event_id).await?;

    let store = CredentialStore::new(api);
    let ticket = store
        .ticket_for_event(event_id)
        .await?
        .with_context(|| format!("no stored ticket for event {}", event_id))?;

    let generator = ProofGenerator::new(BabyzkBackend::new(), BabyzkBackend::gadget_store());
    let proof_json = generator
        .generate(
            &user,
            session.password_key(),
            &ticket,
            event.context_string.as_deref(),
        )
        .await?;

    let link = proof_deep_link(deep_link_base, event_id, &proof_json);
    let qr = qr_unicode(&link)?;
    Ok((proof_json, qr))
}

/// Verify a proof against one event without recording anything.
pub async fn verify<A: BackendApi>(api: &A, event_id: &str, proof_json: &str) -> Result<String> {
    let event = api.get_event(event_id).await?;
    let verifier = ProofVerifier::new(BabyzkBackend::new());

    match verifier
        .verify(proof_json, &ExpectedProofParams::from(&event))
        .await
    {
        Ok(verified) => Ok(format!(
            "proof valid for {}; nullifier {}",
            event.name,
            verified.nullifier.to_hex()
        )),
        Err(GateError::ContextMismatch { .. }) => {
            bail!("This ticket is for a different event")
        }
        Err(e) => Err(e.into()),
    }
}

/// Run one check-in against a scanned payload, recording attendance when
/// an admin code is given.
pub async fn checkin<A: BackendApi>(
    api: A,
    event_id: &str,
    admin_code: Option<&str>,
    payload: &str,
) -> Result<String> {
    let event = api.get_event(event_id).await?;
    let mut session = CheckInSession::new(api, BabyzkBackend::new(), event);
    match admin_code {
        Some(code) => session.authorize_host(code),
        None => session.begin_scanning(),
    }

    let outcome = session.handle_scan(payload).await?;
    Ok(match outcome {
        CheckInOutcome::Recorded(record) => {
            format!("attendance recorded at {}", record.recorded_at)
        }
        CheckInOutcome::AlreadyRecorded => "ticket already checked in".to_string(),
        CheckInOutcome::VerifiedOnly(_) => {
            "proof valid; no admin code, nothing recorded".to_string()
        }
        CheckInOutcome::Rejected(reason) => format!("rejected: {}", reason.message()),
    })
}
