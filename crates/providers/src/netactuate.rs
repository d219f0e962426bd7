//! NetActuate DNS provider
//!
//! Records live under a numeric zone ID, so every add/list first looks the
//! zone up by name. API reference: <https://docs.netactuate.com/reference/dns>

use crate::client::{ProviderClient, ProviderCode, ProviderReply};
use acmehook_core::challenge::strip_root;
use acmehook_core::{ApiKey, DnsProvider, DnsRecord, ProviderError, ProviderResult};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// NetActuate API base URL
pub const NETACTUATE_API_BASE: &str = "https://vapi2.netactuate.com";

/// Reply code NetActuate uses for success
const SUCCESS_CODE: &str = "200";

/// `{ "result", "message", "code", "data" }`
#[derive(Debug, Deserialize)]
pub struct NetActuateResponse<T> {
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub message: String,
    pub code: ProviderCode,
    pub data: Option<T>,
}

impl<T> ProviderReply for NetActuateResponse<T> {
    fn code(&self) -> &ProviderCode {
        &self.code
    }

    fn detail(&self) -> String {
        if self.message.is_empty() {
            self.result.clone()
        } else {
            self.message.clone()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneSummary {
    pub name: String,
    #[serde(deserialize_with = "crate::client::scalar_string")]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetActuateRecord {
    #[serde(deserialize_with = "crate::client::scalar_string")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub content: String,
}

impl From<NetActuateRecord> for DnsRecord {
    fn from(record: NetActuateRecord) -> Self {
        Self {
            id: record.id,
            record_type: record.record_type,
            host: record.name,
            value: record.content,
        }
    }
}

/// NetActuate implementation of [`DnsProvider`]
#[derive(Debug, Clone)]
pub struct NetActuateProvider {
    client: ProviderClient,
}

impl NetActuateProvider {
    /// Provider against the production API
    pub fn new() -> ProviderResult<Self> {
        Self::with_base_url(NETACTUATE_API_BASE, None)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> ProviderResult<Self> {
        Ok(Self {
            client: ProviderClient::new(base_url, timeout)?,
        })
    }

    /// Numeric ID of the account's zone named `zone`
    pub async fn zone_id(&self, api_key: &ApiKey, zone: &str) -> ProviderResult<String> {
        let request = self
            .client
            .request(Method::GET, "/api/dns/zones", api_key)
            .query(&[("type", "NATIVE")]);
        let response: NetActuateResponse<Vec<ZoneSummary>> =
            self.client.execute(request, SUCCESS_CODE).await?;

        let wanted = strip_root(zone);
        let found = response
            .data
            .unwrap_or_default()
            .into_iter()
            .find(|z| strip_root(&z.name).eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ProviderError::ZoneNotFound {
                zone: wanted.to_string(),
            })?;

        debug!(zone = %wanted, zone_id = %found.id, "Found NetActuate zone");
        Ok(found.id)
    }
}

#[async_trait]
impl DnsProvider for NetActuateProvider {
    fn name(&self) -> &'static str {
        "netactuate"
    }

    async fn add_record(
        &self,
        api_key: &ApiKey,
        zone: &str,
        record_type: &str,
        host: &str,
        value: &str,
    ) -> ProviderResult<()> {
        let zone_id = self.zone_id(api_key, zone).await?;
        let name = format!("{host}.{}", strip_root(zone));

        let request = self
            .client
            .request(Method::POST, "/api/dns/record", api_key)
            .query(&[
                ("domain_id", zone_id.as_str()),
                ("name", name.as_str()),
                ("type", record_type),
                ("record_content", value),
            ]);
        let _: NetActuateResponse<Value> = self.client.execute(request, SUCCESS_CODE).await?;
        Ok(())
    }

    async fn list_records(&self, api_key: &ApiKey, zone: &str) -> ProviderResult<Vec<DnsRecord>> {
        let zone_id = self.zone_id(api_key, zone).await?;

        let request =
            self.client
                .request(Method::GET, &format!("/api/dns/records/{zone_id}"), api_key);
        let response: NetActuateResponse<Vec<NetActuateRecord>> =
            self.client.execute(request, SUCCESS_CODE).await?;

        Ok(response
            .data
            .unwrap_or_default()
            .into_iter()
            .map(DnsRecord::from)
            .collect())
    }

    async fn delete_record(
        &self,
        api_key: &ApiKey,
        _zone: &str,
        record_id: &str,
    ) -> ProviderResult<()> {
        let request = self.client.request(
            Method::DELETE,
            &format!("/api/dns/record/{record_id}"),
            api_key,
        );
        let _: NetActuateResponse<Value> = self.client.execute(request, SUCCESS_CODE).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_ids_normalised() {
        let response: NetActuateResponse<Vec<NetActuateRecord>> = serde_json::from_str(
            r#"{"result": "success", "code": 200, "data": [
                {"id": 4711, "name": "_acme-challenge.example.com", "type": "TXT", "content": "A", "ttl": 3600}
            ]}"#,
        )
        .unwrap();
        let record = DnsRecord::from(response.data.unwrap().remove(0));
        assert_eq!(record.id, "4711");
        assert_eq!(record.host, "_acme-challenge.example.com");
    }

    #[test]
    fn test_detail_prefers_message() {
        let response: NetActuateResponse<Value> = serde_json::from_str(
            r#"{"result": "failure", "message": "Invalid domain_id", "code": 400, "data": null}"#,
        )
        .unwrap();
        assert_eq!(response.detail(), "Invalid domain_id");
        assert!(response.data.is_none());

        let bare: NetActuateResponse<Value> =
            serde_json::from_str(r#"{"result": "failure", "code": "500"}"#).unwrap();
        assert_eq!(bare.detail(), "failure");
    }
}
