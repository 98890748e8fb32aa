//! Ticket and email credential acquisition and storage.
//!
//! The backend issues plaintext credentials; whether they are stored
//! encrypted follows the per-user `is_encrypted` flag. Issuance is
//! idempotent client-side: one ticket credential per user and event,
//! one email credential per user.

use tracing::{debug, info};
use zkgate_crypto::vault;
use zkgate_types::{EmailCredential, GateResult, PasswordKey, TicketCredential, User};

use crate::api::BackendApi;

pub struct CredentialStore<A> {
    api: A,
}

impl<A: BackendApi> CredentialStore<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// The stored ticket for one event, if any.
    pub async fn ticket_for_event(&self, event_id: &str) -> GateResult<Option<TicketCredential>> {
        Ok(self
            .api
            .get_ticket_credentials()
            .await?
            .into_iter()
            .find(|t| t.event_id == event_id))
    }

    /// Request a ticket credential and store it, encrypting the payload
    /// when the user record says so. Returns the existing stored ticket
    /// instead of requesting a second one for the same event.
    pub async fn request_and_store(
        &self,
        user: &User,
        key: &PasswordKey,
        event_id: &str,
    ) -> GateResult<TicketCredential> {
        if let Some(existing) = self.ticket_for_event(event_id).await? {
            debug!(event_id, "ticket already stored, skipping issuance");
            return Ok(existing);
        }

        let issued = self.api.request_ticket_credential(event_id).await?;

        let data = if user.is_encrypted {
            vault::encrypt_value(&issued.credential, key)?
        } else {
            issued.credential
        };

        let ticket = TicketCredential {
            event_id: issued.event_id,
            data,
            issued_at: issued.issued_at,
            expire_at: issued.expire_at,
        };
        self.api.put_ticket_credential(&ticket).await?;
        info!(event_id, encrypted = user.is_encrypted, "ticket credential stored");
        Ok(ticket)
    }

    /// The stored email credential, if any.
    pub async fn email_credential(&self) -> GateResult<Option<EmailCredential>> {
        self.api.get_email_credential().await
    }

    /// Request an email credential and store it, under the same
    /// conditional-encryption contract as tickets. Returns the stored
    /// credential when one already exists.
    pub async fn request_and_store_email(
        &self,
        user: &User,
        key: &PasswordKey,
    ) -> GateResult<EmailCredential> {
        if let Some(existing) = self.email_credential().await? {
            debug!("email credential already stored, skipping issuance");
            return Ok(existing);
        }

        let issued = self.api.request_email_credential().await?;

        let data = if user.is_encrypted {
            vault::encrypt_value(&issued.credential, key)?
        } else {
            issued.credential
        };

        let credential = EmailCredential {
            data,
            issued_at: issued.issued_at,
            expire_at: issued.expire_at,
        };
        self.api.put_email_credential(&credential).await?;
        info!(encrypted = user.is_encrypted, "email credential stored");
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MemoryBackendApi;
    use zkgate_crypto::setup_user_credentials;

    fn user_with_identity(encrypted: bool) -> (User, PasswordKey) {
        let bundle = setup_user_credentials("hunter2").unwrap();
        let user = User {
            id: "u-1".into(),
            email: "a@example.com".into(),
            is_encrypted: encrypted,
            encrypted_identity_secret: Some(bundle.encrypted_identity_secret.clone()),
            encrypted_internal_nullifier: Some(bundle.encrypted_internal_nullifier.clone()),
            identity_commitment: Some(bundle.identity_commitment),
            kdf_salt: Some(bundle.kdf_salt.clone()),
        };
        (user, bundle.password_key.clone())
    }

    #[tokio::test]
    async fn test_encrypted_user_gets_encrypted_payload() {
        let (user, key) = user_with_identity(true);
        let api = MemoryBackendApi::new(user.clone(), "sesame");
        api.add_event("evt-1", "Test", None);

        let store = CredentialStore::new(api);
        let ticket = store.request_and_store(&user, &key, "evt-1").await.unwrap();

        // Stored payload is an envelope, not credential JSON.
        assert!(ticket.data.starts_with("0x"));
        let decrypted = vault::decrypt_value(&ticket.data, &key).unwrap();
        zkgate_protocol::Credential::parse(&decrypted).unwrap();
    }

    #[tokio::test]
    async fn test_plaintext_user_gets_plain_payload() {
        let (user, key) = user_with_identity(false);
        let api = MemoryBackendApi::new(user.clone(), "sesame");
        api.add_event("evt-1", "Test", None);

        let store = CredentialStore::new(api);
        let ticket = store.request_and_store(&user, &key, "evt-1").await.unwrap();
        zkgate_protocol::Credential::parse(&ticket.data).unwrap();
    }

    #[tokio::test]
    async fn test_issuance_is_idempotent_per_event() {
        let (user, key) = user_with_identity(true);
        let api = MemoryBackendApi::new(user.clone(), "sesame");
        api.add_event("evt-1", "Test", None);

        let store = CredentialStore::new(api);
        let first = store.request_and_store(&user, &key, "evt-1").await.unwrap();
        let second = store.request_and_store(&user, &key, "evt-1").await.unwrap();

        assert_eq!(first.data, second.data);
        assert_eq!(
            store.api().get_ticket_credentials().await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_email_credential_encrypted_and_idempotent() {
        let (user, key) = user_with_identity(true);
        let api = MemoryBackendApi::new(user.clone(), "sesame");

        let store = CredentialStore::new(api);
        assert!(store.email_credential().await.unwrap().is_none());

        let first = store.request_and_store_email(&user, &key).await.unwrap();
        assert!(first.data.starts_with("0x"));
        let decrypted = vault::decrypt_value(&first.data, &key).unwrap();
        zkgate_protocol::Credential::parse(&decrypted).unwrap();

        let second = store.request_and_store_email(&user, &key).await.unwrap();
        assert_eq!(first.data, second.data);
    }

    #[tokio::test]
    async fn test_email_credential_plaintext_user() {
        let (user, key) = user_with_identity(false);
        let api = MemoryBackendApi::new(user.clone(), "sesame");

        let store = CredentialStore::new(api);
        let credential = store.request_and_store_email(&user, &key).await.unwrap();
        zkgate_protocol::Credential::parse(&credential.data).unwrap();
    }
}
