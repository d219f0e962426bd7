//! DNS provider interface used by the reconciler

use crate::credentials::ApiKey;
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Result type for provider calls
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned identifier, integers normalised to decimal
    pub id: String,
    pub record_type: String,
    pub host: String,
    pub value: String,
}

/// Record operations a DNS provider must support
///
/// Implementations hold no per-call state; the API key is passed to every
/// call so a single provider value can serve any number of issuers.
#[async_trait]
pub trait DnsProvider: Send + Sync + Debug {
    /// Solver name the host routes challenges by
    fn name(&self) -> &'static str;

    /// Create a record `host` (relative to `zone`)
    async fn add_record(
        &self,
        api_key: &ApiKey,
        zone: &str,
        record_type: &str,
        host: &str,
        value: &str,
    ) -> ProviderResult<()>;

    /// All records in `zone`
    async fn list_records(&self, api_key: &ApiKey, zone: &str) -> ProviderResult<Vec<DnsRecord>>;

    /// Delete a record by its provider-assigned identifier
    async fn delete_record(&self, api_key: &ApiKey, zone: &str, record_id: &str)
    -> ProviderResult<()>;
}
