//! Error types shared by solvers, credential stores and DNS providers

use thiserror::Error;

/// Standard result type for solver operations
pub type SolverResult<T> = std::result::Result<T, SolverError>;

/// Errors surfaced to the host for a single present/clean-up call
#[derive(Debug, Error)]
pub enum SolverError {
    /// The per-issuer configuration blob could not be decoded
    #[error("error decoding solver config: {0}")]
    ConfigDecode(#[from] serde_json::Error),

    /// The provider API key could not be resolved
    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    /// A provider call failed; `operation` names the stage
    #[error("{operation} failed: {source}")]
    Provider {
        operation: &'static str,
        #[source]
        source: ProviderError,
    },

    /// Clean-up found no record matching host, type and value
    #[error("no TXT record found for {fqdn}")]
    RecordNotFound { fqdn: String },

    /// Present/clean-up was called before `initialize`
    #[error("solver not initialized")]
    NotInitialized,

    /// `initialize` was called twice
    #[error("solver already initialized")]
    AlreadyInitialized,

    /// The host signalled shutdown
    #[error("solver is shutting down")]
    ShuttingDown,
}

impl SolverError {
    /// Wrap a provider error with the stage it happened in
    pub fn provider(operation: &'static str, source: ProviderError) -> Self {
        Self::Provider { operation, source }
    }

    /// Whether this error came from credential resolution
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::Credential(_))
    }
}

/// Errors from the credential resolver and secret stores
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The referenced secret object does not exist
    #[error("secret {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    /// The secret exists but lacks the requested key
    #[error("secret {namespace}/{name} has no key {key:?}")]
    KeyMissing {
        namespace: String,
        name: String,
        key: String,
    },

    /// The store itself failed (transport, permissions, ...)
    #[error("secret store error: {0}")]
    Store(String),
}

/// Errors from DNS provider API calls
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network failure or non-2xx HTTP status
    #[error("transport error: {message}")]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// HTTP succeeded but the provider reported a business failure
    #[error("provider rejected request (code {code}): {detail}")]
    Rejected { code: String, detail: String },

    /// The response body did not match the expected shape
    #[error("failed to decode provider response: {0}")]
    Decode(String),

    /// The account has no zone with the requested name
    #[error("zone not found: {zone}")]
    ZoneNotFound { zone: String },

    /// The provider client could not be built
    #[error("invalid provider configuration: {0}")]
    Configuration(String),
}

impl ProviderError {
    /// Build a transport error from an HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            status: Some(status),
            message: message.into(),
        }
    }
}
