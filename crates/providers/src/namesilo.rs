//! NameSilo DNS provider
//!
//! All operations are `GET /api/{operation}` with query parameters.
//! API reference: <https://www.namesilo.com/api-reference>

use crate::client::{ProviderClient, ProviderCode, ProviderReply};
use acmehook_core::{ApiKey, DnsProvider, DnsRecord, ProviderResult};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_with::{OneOrMany, serde_as};
use std::time::Duration;
use tracing::debug;

/// NameSilo API base URL
pub const NAMESILO_API_BASE: &str = "https://www.namesilo.com";

/// Reply code NameSilo uses for success
const SUCCESS_CODE: &str = "300";

/// NameSilo's minimum record TTL
pub const DEFAULT_TTL: u32 = 3600;

/// `{ "reply": { "code", "detail", ... } }`
#[derive(Debug, Deserialize)]
pub struct NameSiloResponse<T> {
    pub reply: NameSiloReply<T>,
}

#[derive(Debug, Deserialize)]
pub struct NameSiloReply<T> {
    pub code: ProviderCode,
    #[serde(default)]
    pub detail: String,
    #[serde(flatten)]
    pub payload: T,
}

impl<T> ProviderReply for NameSiloResponse<T> {
    fn code(&self) -> &ProviderCode {
        &self.reply.code
    }

    fn detail(&self) -> String {
        self.reply.detail.clone()
    }
}

/// Payload of replies that carry nothing we use
#[derive(Debug, Default, Deserialize)]
pub struct NoPayload {}

/// `dnsListRecords` payload; a single record arrives as an object
#[serde_as]
#[derive(Debug, Default, Deserialize)]
pub struct RecordList {
    #[serde_as(as = "OneOrMany<_>")]
    #[serde(default)]
    pub resource_record: Vec<NameSiloRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NameSiloRecord {
    #[serde(deserialize_with = "crate::client::scalar_string")]
    pub record_id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub host: String,
    #[serde(default)]
    pub value: String,
}

impl From<NameSiloRecord> for DnsRecord {
    fn from(record: NameSiloRecord) -> Self {
        Self {
            id: record.record_id,
            record_type: record.record_type,
            host: record.host,
            value: record.value,
        }
    }
}

/// NameSilo implementation of [`DnsProvider`]
#[derive(Debug, Clone)]
pub struct NameSiloProvider {
    client: ProviderClient,
    ttl: u32,
}

impl NameSiloProvider {
    /// Provider against the production API
    pub fn new() -> ProviderResult<Self> {
        Self::with_base_url(NAMESILO_API_BASE, None)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> ProviderResult<Self> {
        Ok(Self {
            client: ProviderClient::new(base_url, timeout)?,
            ttl: DEFAULT_TTL,
        })
    }

    /// TTL for records created by this provider
    #[must_use]
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    async fn call<T: DeserializeOwned>(
        &self,
        api_key: &ApiKey,
        operation: &str,
        params: &[(&str, &str)],
    ) -> ProviderResult<NameSiloResponse<T>> {
        debug!(operation = %operation, "Calling NameSilo API");

        let request = self
            .client
            .request(Method::GET, &format!("/api/{operation}"), api_key)
            .query(&[("version", "1"), ("type", "json")])
            .query(params);

        self.client.execute(request, SUCCESS_CODE).await
    }
}

#[async_trait]
impl DnsProvider for NameSiloProvider {
    fn name(&self) -> &'static str {
        "namesilo"
    }

    async fn add_record(
        &self,
        api_key: &ApiKey,
        zone: &str,
        record_type: &str,
        host: &str,
        value: &str,
    ) -> ProviderResult<()> {
        let ttl = self.ttl.to_string();
        self.call::<NoPayload>(
            api_key,
            "dnsAddRecord",
            &[
                ("domain", zone),
                ("rrtype", record_type),
                ("rrhost", host),
                ("rrvalue", value),
                ("rrttl", ttl.as_str()),
            ],
        )
        .await?;
        Ok(())
    }

    async fn list_records(&self, api_key: &ApiKey, zone: &str) -> ProviderResult<Vec<DnsRecord>> {
        let response = self
            .call::<RecordList>(api_key, "dnsListRecords", &[("domain", zone)])
            .await?;

        Ok(response
            .reply
            .payload
            .resource_record
            .into_iter()
            .map(DnsRecord::from)
            .collect())
    }

    async fn delete_record(
        &self,
        api_key: &ApiKey,
        zone: &str,
        record_id: &str,
    ) -> ProviderResult<()> {
        self.call::<NoPayload>(
            api_key,
            "dnsDeleteRecord",
            &[("domain", zone), ("rrid", record_id)],
        )
        .await?;
        Ok(())
    }
}
