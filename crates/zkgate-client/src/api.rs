//! Backend API adapter.
//!
//! The trait is the seam; [`HttpBackendApi`] speaks to the real backend
//! over HTTPS with bearer auth, [`MemoryBackendApi`] is the in-process
//! double used across the client tests.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use tracing::debug;
use zkgate_types::{
    AttendanceRecord, EmailCredential, Event, GateError, GateResult, RecordAttendanceRequest,
    TicketCredential, UnencryptedEmailCredential, UnencryptedTicketCredential, User, UserUpdate,
};

// The write endpoint is singular, the listing GET is plural. The email
// credential is one-per-user, so both its verbs share one path.
const TICKET_CREDENTIAL_PATH: &str = "/user/me/ticket-credential";
const TICKET_CREDENTIALS_PATH: &str = "/user/me/ticket-credentials";
const EMAIL_CREDENTIAL_PATH: &str = "/user/me/email-credential";
const REQUEST_EMAIL_CREDENTIAL_PATH: &str = "/user/me/request-email-credential";

#[async_trait]
pub trait BackendApi: Send + Sync {
    async fn get_event(&self, event_id: &str) -> GateResult<Event>;
    async fn request_ticket_credential(
        &self,
        event_id: &str,
    ) -> GateResult<UnencryptedTicketCredential>;
    async fn put_ticket_credential(&self, ticket: &TicketCredential) -> GateResult<()>;
    async fn get_ticket_credentials(&self) -> GateResult<Vec<TicketCredential>>;
    async fn request_email_credential(&self) -> GateResult<UnencryptedEmailCredential>;
    async fn put_email_credential(&self, credential: &EmailCredential) -> GateResult<()>;
    async fn get_email_credential(&self) -> GateResult<Option<EmailCredential>>;
    async fn record_attendance(
        &self,
        request: &RecordAttendanceRequest,
    ) -> GateResult<AttendanceRecord>;
    async fn get_user(&self) -> GateResult<User>;
    async fn update_user(&self, update: &UserUpdate) -> GateResult<User>;
}

#[async_trait]
impl<T: BackendApi + ?Sized> BackendApi for &T {
    async fn get_event(&self, event_id: &str) -> GateResult<Event> {
        (**self).get_event(event_id).await
    }

    async fn request_ticket_credential(
        &self,
        event_id: &str,
    ) -> GateResult<UnencryptedTicketCredential> {
        (**self).request_ticket_credential(event_id).await
    }

    async fn put_ticket_credential(&self, ticket: &TicketCredential) -> GateResult<()> {
        (**self).put_ticket_credential(ticket).await
    }

    async fn get_ticket_credentials(&self) -> GateResult<Vec<TicketCredential>> {
        (**self).get_ticket_credentials().await
    }

    async fn request_email_credential(&self) -> GateResult<UnencryptedEmailCredential> {
        (**self).request_email_credential().await
    }

    async fn put_email_credential(&self, credential: &EmailCredential) -> GateResult<()> {
        (**self).put_email_credential(credential).await
    }

    async fn get_email_credential(&self) -> GateResult<Option<EmailCredential>> {
        (**self).get_email_credential().await
    }

    async fn record_attendance(
        &self,
        request: &RecordAttendanceRequest,
    ) -> GateResult<AttendanceRecord> {
        (**self).record_attendance(request).await
    }

    async fn get_user(&self) -> GateResult<User> {
        (**self).get_user().await
    }

    async fn update_user(&self, update: &UserUpdate) -> GateResult<User> {
        (**self).update_user(update).await
    }
}

#[async_trait]
impl<T: BackendApi + ?Sized> BackendApi for std::sync::Arc<T> {
    async fn get_event(&self, event_id: &str) -> GateResult<Event> {
        (**self).get_event(event_id).await
    }

    async fn request_ticket_credential(
        &self,
        event_id: &str,
    ) -> GateResult<UnencryptedTicketCredential> {
        (**self).request_ticket_credential(event_id).await
    }

    async fn put_ticket_credential(&self, ticket: &TicketCredential) -> GateResult<()> {
        (**self).put_ticket_credential(ticket).await
    }

    async fn get_ticket_credentials(&self) -> GateResult<Vec<TicketCredential>> {
        (**self).get_ticket_credentials().await
    }

    async fn request_email_credential(&self) -> GateResult<UnencryptedEmailCredential> {
        (**self).request_email_credential().await
    }

    async fn put_email_credential(&self, credential: &EmailCredential) -> GateResult<()> {
        (**self).put_email_credential(credential).await
    }

    async fn get_email_credential(&self) -> GateResult<Option<EmailCredential>> {
        (**self).get_email_credential().await
    }

    async fn record_attendance(
        &self,
        request: &RecordAttendanceRequest,
    ) -> GateResult<AttendanceRecord> {
        (**self).record_attendance(request).await
    }

    async fn get_user(&self) -> GateResult<User> {
        (**self).get_user().await
    }

    async fn update_user(&self, update: &UserUpdate) -> GateResult<User> {
        (**self).update_user(update).await
    }
}

/// reqwest-backed implementation. One client, one base URL, one bearer
/// token for the session lifetime.
pub struct HttpBackendApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackendApi {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> GateResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| GateError::Network(format!("http client init: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, self.url(path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> GateResult<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| GateError::Network(e.to_string()))?;
        map_status(response.status())?;
        Ok(response)
    }

    async fn json<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> GateResult<T> {
        self.send(builder)
            .await?
            .json()
            .await
            .map_err(|e| GateError::Serialization(format!("response body: {}", e)))
    }
}

/// Status-to-error mapping shared by every endpoint. The attendance write
/// is where all five classes can show up; the rest mostly see 401.
fn map_status(status: StatusCode) -> GateResult<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        StatusCode::UNAUTHORIZED => GateError::Unauthorized,
        StatusCode::NOT_FOUND => GateError::EventNotFound,
        StatusCode::BAD_REQUEST => GateError::InvalidCredentialType,
        StatusCode::CONFLICT => GateError::DuplicateAttendance,
        other => GateError::Network(format!("backend returned {}", other)),
    })
}

#[async_trait]
impl BackendApi for HttpBackendApi {
    async fn get_event(&self, event_id: &str) -> GateResult<Event> {
        self.json(self.request(reqwest::Method::GET, &format!("/events/{}", event_id)))
            .await
    }

    async fn request_ticket_credential(
        &self,
        event_id: &str,
    ) -> GateResult<UnencryptedTicketCredential> {
        debug!(event_id, "requesting ticket credential");
        self.json(self.request(
            reqwest::Method::POST,
            &format!("/events/{}/request-ticket-credential", event_id),
        ))
        .await
    }

    async fn put_ticket_credential(&self, ticket: &TicketCredential) -> GateResult<()> {
        self.send(
            self.request(reqwest::Method::PUT, TICKET_CREDENTIAL_PATH)
                .json(ticket),
        )
        .await?;
        Ok(())
    }

    async fn get_ticket_credentials(&self) -> GateResult<Vec<TicketCredential>> {
        self.json(self.request(reqwest::Method::GET, TICKET_CREDENTIALS_PATH))
            .await
    }

    async fn request_email_credential(&self) -> GateResult<UnencryptedEmailCredential> {
        debug!("requesting email credential");
        self.json(self.request(reqwest::Method::POST, REQUEST_EMAIL_CREDENTIAL_PATH))
            .await
    }

    async fn put_email_credential(&self, credential: &EmailCredential) -> GateResult<()> {
        self.send(
            self.request(reqwest::Method::PUT, EMAIL_CREDENTIAL_PATH)
                .json(credential),
        )
        .await?;
        Ok(())
    }

    async fn get_email_credential(&self) -> GateResult<Option<EmailCredential>> {
        // 404 here means "none stored yet", not a missing resource class.
        let response = self
            .request(reqwest::Method::GET, EMAIL_CREDENTIAL_PATH)
            .send()
            .await
            .map_err(|e| GateError::Network(e.to_string()))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        map_status(response.status())?;
        response
            .json()
            .await
            .map(Some)
            .map_err(|e| GateError::Serialization(format!("response body: {}", e)))
    }

    async fn record_attendance(
        &self,
        request: &RecordAttendanceRequest,
    ) -> GateResult<AttendanceRecord> {
        debug!(event_id = %request.event_id, "recording attendance");
        self.json(
            self.request(
                reqwest::Method::POST,
                &format!("/events/{}/attendance", request.event_id),
            )
            .json(request),
        )
        .await
    }

    async fn get_user(&self) -> GateResult<User> {
        self.json(self.request(reqwest::Method::GET, "/user/me"))
            .await
    }

    async fn update_user(&self, update: &UserUpdate) -> GateResult<User> {
        self.json(
            self.request(reqwest::Method::PUT, "/user/update")
                .json(update),
        )
        .await
    }
}

/// In-memory backend double with the server-side rules the client code
/// depends on: admin-code authorization, `(event_id, nullifier)`
/// uniqueness, and real credential issuance against the stored user's
/// identity commitment.
pub struct MemoryBackendApi {
    state: std::sync::Mutex<MemoryState>,
    issuer: zkgate_protocol::CredentialIssuer,
}

struct MemoryState {
    events: std::collections::HashMap<String, Event>,
    user: User,
    tickets: Vec<TicketCredential>,
    email: Option<EmailCredential>,
    attendance: Vec<AttendanceRecord>,
    admin_code: String,
}

impl MemoryBackendApi {
    pub fn new(user: User, admin_code: impl Into<String>) -> Self {
        Self {
            state: std::sync::Mutex::new(MemoryState {
                events: std::collections::HashMap::new(),
                user,
                tickets: Vec::new(),
                email: None,
                attendance: Vec::new(),
                admin_code: admin_code.into(),
            }),
            issuer: zkgate_protocol::CredentialIssuer::from_seed(
                [42u8; 32],
                zkgate_types::DEFAULT_CHAIN_ID,
            ),
        }
    }

    /// Register an event; its context and issuer key id are filled in the
    /// way the real backend computes them.
    pub fn add_event(&self, id: &str, name: &str, context_string: Option<&str>) -> Event {
        let canonical = match context_string {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => format!("Event Ticket: {}", id),
        };
        let event = Event {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            url: None,
            chain_id: zkgate_types::DEFAULT_CHAIN_ID,
            context_id: zkgate_protocol::compute_context_id(&canonical),
            context_string: context_string.map(str::to_string),
            issuer_key_id: self.issuer.key_id(),
            start_date: None,
            end_date: None,
        };
        self.state
            .lock()
            .expect("memory backend lock")
            .events
            .insert(id.to_string(), event.clone());
        event
    }

    pub fn attendance_count(&self, event_id: &str) -> usize {
        self.state
            .lock()
            .expect("memory backend lock")
            .attendance
            .iter()
            .filter(|r| r.event_id == event_id)
            .count()
    }

    pub fn issuer_key_id(&self) -> zkgate_types::SignalValue {
        self.issuer.key_id()
    }
}

#[async_trait]
impl BackendApi for MemoryBackendApi {
    async fn get_event(&self, event_id: &str) -> GateResult<Event> {
        self.state
            .lock()
            .expect("memory backend lock")
            .events
            .get(event_id)
            .cloned()
            .ok_or(GateError::EventNotFound)
    }

    async fn request_ticket_credential(
        &self,
        event_id: &str,
    ) -> GateResult<UnencryptedTicketCredential> {
        let (event, commitment) = {
            let state = self.state.lock().expect("memory backend lock");
            let event = state
                .events
                .get(event_id)
                .cloned()
                .ok_or(GateError::EventNotFound)?;
            let commitment = state
                .user
                .identity_commitment
                .ok_or_else(|| GateError::IncompleteIdentity("no commitment on record".into()))?;
            (event, commitment)
        };

        let issued_at = Utc::now();
        let expire_at = issued_at + Duration::seconds(zkgate_types::TICKET_CREDENTIAL_VALID_SECS);

        let mut credential = zkgate_protocol::Credential::parse(
            &serde_json::json!({
                "header": {
                    "version": 1,
                    "type": zkgate_types::UNIT_CREDENTIAL_TYPE_ID.to_string(),
                    "context": event.context_id,
                    "id": format!("0x{}", hex::encode(uuid::Uuid::new_v4().as_bytes())),
                },
                "attachments": {"event_id": event_id}
            })
            .to_string(),
        )?;
        self.issuer.sign(
            &mut credential,
            zkgate_protocol::SignParams {
                sig_id: 100,
                expired_at: expire_at.timestamp(),
                identity_commitment: commitment,
            },
        );

        Ok(UnencryptedTicketCredential {
            event_id: event_id.to_string(),
            credential: credential.to_json()?,
            issued_at,
            expire_at,
        })
    }

    async fn put_ticket_credential(&self, ticket: &TicketCredential) -> GateResult<()> {
        self.state
            .lock()
            .expect("memory backend lock")
            .tickets
            .push(ticket.clone());
        Ok(())
    }

    async fn get_ticket_credentials(&self) -> GateResult<Vec<TicketCredential>> {
        Ok(self
            .state
            .lock()
            .expect("memory backend lock")
            .tickets
            .clone())
    }

    async fn request_email_credential(&self) -> GateResult<UnencryptedEmailCredential> {
        let (email, commitment) = {
            let state = self.state.lock().expect("memory backend lock");
            let commitment = state
                .user
                .identity_commitment
                .ok_or_else(|| GateError::IncompleteIdentity("no commitment on record".into()))?;
            (state.user.email.clone(), commitment)
        };

        let issued_at = Utc::now();
        let expire_at = issued_at + Duration::seconds(zkgate_types::TICKET_CREDENTIAL_VALID_SECS);

        // The header id binds the credential to the holder's address, here
        // the hash of the verified email.
        let mut credential = zkgate_protocol::Credential::parse(
            &serde_json::json!({
                "header": {
                    "version": 1,
                    "type": zkgate_types::UNIT_CREDENTIAL_TYPE_ID.to_string(),
                    "context": zkgate_protocol::compute_context_id("Email Credential"),
                    "id": format!("0x{}", hex::encode(zkgate_crypto::keccak256(email.as_bytes()))),
                },
                "attachments": {"email": email}
            })
            .to_string(),
        )?;
        self.issuer.sign(
            &mut credential,
            zkgate_protocol::SignParams {
                sig_id: 100,
                expired_at: expire_at.timestamp(),
                identity_commitment: commitment,
            },
        );

        Ok(UnencryptedEmailCredential {
            credential: credential.to_json()?,
            issued_at,
            expire_at,
        })
    }

    async fn put_email_credential(&self, credential: &EmailCredential) -> GateResult<()> {
        self.state.lock().expect("memory backend lock").email = Some(credential.clone());
        Ok(())
    }

    async fn get_email_credential(&self) -> GateResult<Option<EmailCredential>> {
        Ok(self.state.lock().expect("memory backend lock").email.clone())
    }

    async fn record_attendance(
        &self,
        request: &RecordAttendanceRequest,
    ) -> GateResult<AttendanceRecord> {
        let mut state = self.state.lock().expect("memory backend lock");
        if request.admin_code != state.admin_code {
            return Err(GateError::Unauthorized);
        }
        if !state.events.contains_key(&request.event_id) {
            return Err(GateError::EventNotFound);
        }
        if request.credential_type != zkgate_types::UNIT_CREDENTIAL_TYPE_ID.to_string() {
            return Err(GateError::InvalidCredentialType);
        }
        if state
            .attendance
            .iter()
            .any(|r| r.event_id == request.event_id && r.nullifier == request.nullifier)
        {
            return Err(GateError::DuplicateAttendance);
        }
        let record = AttendanceRecord {
            event_id: request.event_id.clone(),
            nullifier: request.nullifier,
            key_id: request.key_id,
            context: request.context,
            recorded_at: Utc::now(),
        };
        state.attendance.push(record.clone());
        Ok(record)
    }

    async fn get_user(&self) -> GateResult<User> {
        Ok(self.state.lock().expect("memory backend lock").user.clone())
    }

    async fn update_user(&self, update: &UserUpdate) -> GateResult<User> {
        let mut state = self.state.lock().expect("memory backend lock");
        state.user.identity_commitment = Some(update.identity_commitment);
        state.user.encrypted_identity_secret = Some(update.encrypted_identity_secret.clone());
        state.user.encrypted_internal_nullifier =
            Some(update.encrypted_internal_nullifier.clone());
        state.user.is_encrypted = update.is_encrypted;
        state.user.kdf_salt = update.kdf_salt.clone();
        Ok(state.user.clone())
    }
}
