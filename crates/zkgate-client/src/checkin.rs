//! Host-side check-in flow.
//!
//! One session per event per device. Verification strictly precedes the
//! attendance write; the write only happens in host mode (admin code
//! present). The admin code is opaque here, the backend is the authority
//! on it, and a 401 clears the stored code so the device drops back to
//! verified-only reporting instead of hammering the backend.

use tracing::{info, warn};
use zkgate_protocol::verifier::{ExpectedProofParams, ProofVerifier, VerifiedProof};
use zkgate_protocol::VerifyingBackend;
use zkgate_types::{
    AttendanceRecord, Event, GateError, GateResult, RecordAttendanceRequest,
    UNIT_CREDENTIAL_TYPE_ID,
};

use crate::api::BackendApi;
use crate::qr::{parse_deep_link, DeepLink};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckInState {
    Idle,
    /// Admin-code entry in progress; no scans accepted yet.
    HostAuthorizing,
    Scanning,
    Verifying,
    Recording,
}

/// Why a scan was turned away. Every rejection is recoverable; the
/// session goes back to scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RejectReason {
    WrongEvent,
    InvalidProof(String),
    WrongAdminCode,
    Backend(String),
    Network(String),
}

impl RejectReason {
    pub fn message(&self) -> String {
        match self {
            RejectReason::WrongEvent => "This ticket is for a different event".to_string(),
            RejectReason::InvalidProof(msg) => format!("Invalid proof: {}", msg),
            RejectReason::WrongAdminCode => "Admin code was not accepted".to_string(),
            RejectReason::Backend(msg) => msg.clone(),
            RejectReason::Network(msg) => format!("Network error: {}", msg),
        }
    }
}

#[derive(Clone, Debug)]
pub enum CheckInOutcome {
    /// Attendance written.
    Recorded(AttendanceRecord),
    /// Valid proof, nullifier already attended. Informational.
    AlreadyRecorded,
    /// Valid proof, no admin code on this device, nothing written.
    VerifiedOnly(VerifiedProof),
    Rejected(RejectReason),
}

pub struct CheckInSession<A, V> {
    api: A,
    verifier: ProofVerifier<V>,
    event: Event,
    expected: ExpectedProofParams,
    admin_code: Option<String>,
    state: CheckInState,
}

impl<A: BackendApi, V: VerifyingBackend> CheckInSession<A, V> {
    pub fn new(api: A, backend: V, event: Event) -> Self {
        let expected = ExpectedProofParams::from(&event);
        Self {
            api,
            verifier: ProofVerifier::new(backend),
            event,
            expected,
            admin_code: None,
            state: CheckInState::Idle,
        }
    }

    pub fn state(&self) -> CheckInState {
        self.state
    }

    pub fn is_host(&self) -> bool {
        self.admin_code.is_some()
    }

    /// Start admin-code entry. Scans stay blocked until
    /// [`authorize_host`](Self::authorize_host) completes it.
    pub fn begin_host_authorization(&mut self) {
        self.state = CheckInState::HostAuthorizing;
    }

    /// Enter host mode. The code is held opaquely until the backend
    /// accepts or rejects it on the first write.
    pub fn authorize_host(&mut self, admin_code: impl Into<String>) {
        self.admin_code = Some(admin_code.into());
        self.state = CheckInState::Scanning;
    }

    /// Verified-only mode: scans are checked but never recorded.
    pub fn begin_scanning(&mut self) {
        self.state = CheckInState::Scanning;
    }

    /// Quick check-in: a deep link carrying an admin code puts the
    /// session straight into host mode.
    pub fn apply_deep_link(&mut self, link: &DeepLink) {
        if let Some(code) = &link.admin_code {
            self.authorize_host(code.clone());
        } else {
            self.begin_scanning();
        }
    }

    /// Process one scanned payload, either a proof deep link or raw
    /// proof JSON. Only accepted while scanning.
    pub async fn handle_scan(&mut self, payload: &str) -> GateResult<CheckInOutcome> {
        match self.state {
            CheckInState::Scanning => {}
            CheckInState::Verifying | CheckInState::Recording => return Err(GateError::Busy),
            CheckInState::Idle | CheckInState::HostAuthorizing => {
                return Err(GateError::Internal("scanning has not been started".into()));
            }
        }
        self.state = CheckInState::Verifying;
        let outcome = self.verify_and_record(payload).await;
        self.state = CheckInState::Scanning;
        outcome
    }

    async fn verify_and_record(&mut self, payload: &str) -> GateResult<CheckInOutcome> {
        // An undecodable payload is a bad scan, not a session failure.
        let proof_json = match extract_proof_json(payload) {
            Ok(json) => json,
            Err(e) => {
                return Ok(CheckInOutcome::Rejected(RejectReason::InvalidProof(
                    e.to_string(),
                )));
            }
        };

        let verified = match self.verifier.verify(&proof_json, &self.expected).await {
            Ok(verified) => verified,
            Err(GateError::ContextMismatch { .. }) => {
                return Ok(CheckInOutcome::Rejected(RejectReason::WrongEvent));
            }
            Err(
                e @ (GateError::MalformedProof(_)
                | GateError::MissingContextSignal
                | GateError::VerificationFailed(_)),
            ) => {
                return Ok(CheckInOutcome::Rejected(RejectReason::InvalidProof(
                    e.to_string(),
                )));
            }
            Err(e) => return Err(e),
        };

        let admin_code = match &self.admin_code {
            Some(code) => code.clone(),
            None => return Ok(CheckInOutcome::VerifiedOnly(verified)),
        };

        self.state = CheckInState::Recording;
        let request = RecordAttendanceRequest {
            credential_type: UNIT_CREDENTIAL_TYPE_ID.to_string(),
            context: verified.context,
            nullifier: verified.nullifier,
            key_id: verified.key_id,
            event_id: self.event.id.clone(),
            admin_code,
        };

        match self.api.record_attendance(&request).await {
            Ok(record) => {
                info!(event_id = %self.event.id, "attendance recorded");
                Ok(CheckInOutcome::Recorded(record))
            }
            Err(GateError::DuplicateAttendance) => Ok(CheckInOutcome::AlreadyRecorded),
            Err(GateError::Unauthorized) => {
                warn!(event_id = %self.event.id, "admin code rejected, leaving host mode");
                self.admin_code = None;
                Ok(CheckInOutcome::Rejected(RejectReason::WrongAdminCode))
            }
            Err(e @ (GateError::EventNotFound | GateError::InvalidCredentialType)) => {
                Ok(CheckInOutcome::Rejected(RejectReason::Backend(e.to_string())))
            }
            Err(GateError::Network(msg)) => {
                Ok(CheckInOutcome::Rejected(RejectReason::Network(msg)))
            }
            Err(e) => Err(e),
        }
    }
}

fn extract_proof_json(payload: &str) -> GateResult<String> {
    if payload.contains('?') {
        let link = parse_deep_link(payload)?;
        return link
            .proof_json
            .ok_or_else(|| GateError::MalformedProof("deep link carries no proof".into()));
    }
    Ok(payload.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackendApi;
    use crate::credentials::CredentialStore;
    use crate::qr::proof_deep_link;
    use std::sync::Arc;
    use zkgate_crypto::setup_user_credentials;
    use zkgate_protocol::{BabyzkBackend, ProofGenerator};
    use zkgate_types::User;

    struct Rig {
        api: Arc<MemoryBackendApi>,
        event: Event,
        proof_json: String,
    }

    /// Full pipeline: register event, issue a credential, store it
    /// encrypted, generate a proof for it.
    async fn rig(event_id: &str) -> Rig {
        let bundle = setup_user_credentials("hunter2").unwrap();
        let user = User {
            id: "u-1".into(),
            email: "a@example.com".into(),
            is_encrypted: true,
            encrypted_identity_secret: Some(bundle.encrypted_identity_secret.clone()),
            encrypted_internal_nullifier: Some(bundle.encrypted_internal_nullifier.clone()),
            identity_commitment: Some(bundle.identity_commitment),
            kdf_salt: Some(bundle.kdf_salt.clone()),
        };

        let api = Arc::new(MemoryBackendApi::new(user.clone(), "sesame"));
        let event = api.add_event(event_id, "Test Event", None);

        let store = CredentialStore::new(api.clone());
        let ticket = store
            .request_and_store(&user, &bundle.password_key, event_id)
            .await
            .unwrap();

        let generator = ProofGenerator::new(BabyzkBackend::new(), BabyzkBackend::gadget_store());
        let proof_json = generator
            .generate(&user, &bundle.password_key, &ticket, None)
            .await
            .unwrap();

        Rig {
            api,
            event,
            proof_json,
        }
    }

    fn session(rig: &Rig) -> CheckInSession<Arc<MemoryBackendApi>, BabyzkBackend> {
        CheckInSession::new(rig.api.clone(), BabyzkBackend::new(), rig.event.clone())
    }

    #[tokio::test]
    async fn test_host_records_attendance() {
        let rig = rig("evt-1").await;
        let mut session = session(&rig);
        session.authorize_host("sesame");

        let outcome = session.handle_scan(&rig.proof_json).await.unwrap();
        assert!(matches!(outcome, CheckInOutcome::Recorded(_)));
        assert_eq!(rig.api.attendance_count("evt-1"), 1);
        assert_eq!(session.state(), CheckInState::Scanning);
    }

    #[tokio::test]
    async fn test_second_scan_is_already_recorded() {
        let rig = rig("evt-1").await;
        let mut session = session(&rig);
        session.authorize_host("sesame");

        session.handle_scan(&rig.proof_json).await.unwrap();
        let outcome = session.handle_scan(&rig.proof_json).await.unwrap();
        assert!(matches!(outcome, CheckInOutcome::AlreadyRecorded));
        assert_eq!(rig.api.attendance_count("evt-1"), 1);
    }

    #[tokio::test]
    async fn test_wrong_event_ticket_turned_away_without_write() {
        let rig_a = rig("evt-1").await;
        let rig_b = rig("evt-2").await;

        let mut session = session(&rig_b);
        session.authorize_host("sesame");

        let outcome = session.handle_scan(&rig_a.proof_json).await.unwrap();
        match outcome {
            CheckInOutcome::Rejected(reason) => {
                assert_eq!(reason, RejectReason::WrongEvent);
                assert_eq!(reason.message(), "This ticket is for a different event");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(rig_b.api.attendance_count("evt-2"), 0);
    }

    #[tokio::test]
    async fn test_without_admin_code_verified_only() {
        let rig = rig("evt-1").await;
        let mut session = session(&rig);
        session.begin_scanning();

        let outcome = session.handle_scan(&rig.proof_json).await.unwrap();
        assert!(matches!(outcome, CheckInOutcome::VerifiedOnly(_)));
        assert_eq!(rig.api.attendance_count("evt-1"), 0);
    }

    #[tokio::test]
    async fn test_wrong_admin_code_clears_host_mode() {
        let rig = rig("evt-1").await;
        let mut session = session(&rig);
        session.authorize_host("not-sesame");

        let outcome = session.handle_scan(&rig.proof_json).await.unwrap();
        assert!(matches!(
            outcome,
            CheckInOutcome::Rejected(RejectReason::WrongAdminCode)
        ));
        assert!(!session.is_host());
        assert_eq!(rig.api.attendance_count("evt-1"), 0);

        // Device keeps working in verified-only mode.
        let outcome = session.handle_scan(&rig.proof_json).await.unwrap();
        assert!(matches!(outcome, CheckInOutcome::VerifiedOnly(_)));
    }

    #[tokio::test]
    async fn test_garbage_payload_rejected_as_invalid_proof() {
        let rig = rig("evt-1").await;
        let mut session = session(&rig);
        session.authorize_host("sesame");

        let outcome = session.handle_scan("not a proof at all").await.unwrap();
        assert!(matches!(
            outcome,
            CheckInOutcome::Rejected(RejectReason::InvalidProof(_))
        ));
    }

    #[tokio::test]
    async fn test_scan_requires_scanning_state() {
        let rig = rig("evt-1").await;
        let mut session = session(&rig);

        assert_eq!(session.state(), CheckInState::Idle);
        assert!(session.handle_scan(&rig.proof_json).await.is_err());

        session.begin_host_authorization();
        assert_eq!(session.state(), CheckInState::HostAuthorizing);
        assert!(session.handle_scan(&rig.proof_json).await.is_err());
        assert_eq!(rig.api.attendance_count("evt-1"), 0);

        session.authorize_host("sesame");
        assert_eq!(session.state(), CheckInState::Scanning);
        let outcome = session.handle_scan(&rig.proof_json).await.unwrap();
        assert!(matches!(outcome, CheckInOutcome::Recorded(_)));
    }

    #[tokio::test]
    async fn test_undecodable_deep_link_rejected_as_invalid_proof() {
        let rig = rig("evt-1").await;
        let mut session = session(&rig);
        session.authorize_host("sesame");

        // `proof` param is not valid base64url.
        let outcome = session
            .handle_scan("https://zkgate.dev/checkin?event_id=evt-1&proof=%%%")
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            CheckInOutcome::Rejected(RejectReason::InvalidProof(_))
        ));
        assert_eq!(session.state(), CheckInState::Scanning);
        assert_eq!(rig.api.attendance_count("evt-1"), 0);
    }

    #[tokio::test]
    async fn test_deep_link_payload_accepted() {
        let rig = rig("evt-1").await;
        let mut session = session(&rig);
        session.authorize_host("sesame");

        let link = proof_deep_link("https://zkgate.dev/checkin", "evt-1", &rig.proof_json);
        let outcome = session.handle_scan(&link).await.unwrap();
        assert!(matches!(outcome, CheckInOutcome::Recorded(_)));
    }

    #[tokio::test]
    async fn test_quick_checkin_deep_link_enables_host_mode() {
        let rig = rig("evt-1").await;
        let mut session = session(&rig);

        let link =
            parse_deep_link(&crate::qr::quick_checkin_link("https://z", "evt-1", "sesame"))
                .unwrap();
        session.apply_deep_link(&link);
        assert!(session.is_host());

        let outcome = session.handle_scan(&rig.proof_json).await.unwrap();
        assert!(matches!(outcome, CheckInOutcome::Recorded(_)));
    }
}
