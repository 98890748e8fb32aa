use zkgate_types::PasswordKey;

/// Per-login session state, passed explicitly to every component that
/// needs it. Created at login, dropped at logout; the key zeroizes with
/// it. There is no ambient storage of session material.
pub struct Session {
    password_key: PasswordKey,
    token: Option<String>,
}

impl Session {
    pub fn new(password_key: PasswordKey, token: Option<String>) -> Self {
        Self {
            password_key,
            token,
        }
    }

    /// The operational "password": a fixed-length key, not the typed text.
    pub fn password_key(&self) -> &PasswordKey {
        &self.password_key
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("password_key", &"[REDACTED]")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkgate_crypto::hash_password;

    #[test]
    fn test_session_redacts_debug() {
        let session = Session::new(hash_password("hunter2"), Some("jwt".into()));
        let debug = format!("{:?}", session);
        assert!(!debug.contains("jwt"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_token_lifecycle() {
        let mut session = Session::new(hash_password("hunter2"), None);
        assert!(session.token().is_none());
        session.set_token(Some("abc".into()));
        assert_eq!(session.token(), Some("abc"));
        session.set_token(None);
        assert!(session.token().is_none());
    }
}
