use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Decryption failed: wrong password or corrupted data")]
    Decryption,

    #[error("Identity not set up: {0}")]
    IncompleteIdentity(String),

    #[error("Malformed credential: {0}")]
    MalformedCredential(String),

    #[error("Credential expired at {0}")]
    CredentialExpired(i64),

    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    #[error("Invalid proof: context signal not found")]
    MissingContextSignal,

    #[error("This ticket is for a different event")]
    ContextMismatch { expected: String, actual: String },

    #[error("Failed to fetch proof generation gadgets: {0}")]
    GadgetFetch(String),

    #[error("Proof generation failed: {0}")]
    ProofGeneration(String),

    #[error("Proof verification failed: {0}")]
    VerificationFailed(String),

    #[error("Invalid admin code")]
    Unauthorized,

    #[error("Attendance was previously recorded for this event")]
    DuplicateAttendance,

    #[error("Event not found")]
    EventNotFound,

    #[error("Invalid credential type")]
    InvalidCredentialType,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Another operation is already in progress")]
    Busy,

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type GateResult<T> = Result<T, GateError>;

impl GateError {
    /// Whether the user can recover by retrying the same operation
    /// (network-shaped failures). Integrity failures are never retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GateError::Network(_) | GateError::GadgetFetch(_) | GateError::ProofGeneration(_)
        )
    }
}
