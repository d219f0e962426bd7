//! Keyed HTTP client shared by the provider integrations
//!
//! Providers report business failures inside the JSON body, often with an
//! HTTP 200. [`ProviderClient::execute`] therefore checks both layers: a
//! non-2xx status is a transport error, and a decoded reply whose code is
//! not the provider's success code is a rejection.

use acmehook_core::{ApiKey, ProviderError, ProviderResult};
use reqwest::{Client, ClientBuilder, Method, RequestBuilder};
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Provider status code, normalised to a string whatever its wire type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCode(String);

impl ProviderCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ProviderCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        scalar_string(deserializer).map(Self)
    }
}

/// Decode a JSON string, number or bool into its string form
///
/// Used for fields whose type varies between responses (`"300"` vs `300`).
pub fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    struct ScalarVisitor;

    impl Visitor<'_> for ScalarVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a string or number")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.trim().to_string())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            self.visit_str(&v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        #[allow(clippy::cast_possible_truncation)]
        fn visit_f64<E: de::Error>(self, v: f64) -> Result<String, E> {
            if v.fract() == 0.0 && v.is_finite() {
                Ok((v as i64).to_string())
            } else {
                Ok(v.to_string())
            }
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_unit<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }

        fn visit_none<E: de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(ScalarVisitor)
}

/// Status information every provider reply carries
pub trait ProviderReply {
    fn code(&self) -> &ProviderCode;

    /// Human-readable failure detail, passed through verbatim
    fn detail(&self) -> String;
}

/// HTTP client for one provider's API
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Client,
    base_url: String,
}

impl ProviderClient {
    /// Create a client for `base_url`; `timeout` of `None` keeps the transport default
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> ProviderResult<Self> {
        // Ensure base_url ends without a trailing slash
        let base_url = base_url.into().trim_end_matches('/').to_string();

        let mut builder =
            ClientBuilder::new().user_agent(concat!("acmehook/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| {
            ProviderError::Configuration(format!("failed to create HTTP client: {e}"))
        })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request builder carrying the API key as the `key` query parameter
    pub fn request(&self, method: Method, path: &str, api_key: &ApiKey) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("key", api_key.expose())])
    }

    /// Send `request`, decode the reply and check its provider code against `success`
    pub async fn execute<T>(&self, request: RequestBuilder, success: &str) -> ProviderResult<T>
    where
        T: DeserializeOwned + ProviderReply,
    {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            return Err(ProviderError::from_status(status.as_u16(), status.to_string()));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let reply: T = serde_json::from_slice(&body).map_err(|e| {
            debug!(
                error = %e,
                body = %String::from_utf8_lossy(&body),
                "Failed to decode provider reply"
            );
            ProviderError::Decode(e.to_string())
        })?;

        if reply.code().as_str() != success {
            return Err(ProviderError::Rejected {
                code: reply.code().to_string(),
                detail: reply.detail(),
            });
        }

        Ok(reply)
    }
}

/// Request URLs carry the API key, so they are stripped from the message
fn transport_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Transport {
        status: e.status().map(|s| s.as_u16()),
        message: e.without_url().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Reply {
        code: ProviderCode,
    }

    #[test]
    fn test_code_quoted_and_unquoted_match() {
        let quoted: Reply = serde_json::from_str(r#"{"code": "300"}"#).unwrap();
        let bare: Reply = serde_json::from_str(r#"{"code": 300}"#).unwrap();
        assert_eq!(quoted.code, bare.code);
        assert_eq!(bare.code.as_str(), "300");
    }

    #[test]
    fn test_code_other_shapes() {
        let float: Reply = serde_json::from_str(r#"{"code": 200.0}"#).unwrap();
        assert_eq!(float.code.as_str(), "200");

        let null: Reply = serde_json::from_str(r#"{"code": null}"#).unwrap();
        assert_eq!(null.code.as_str(), "");

        let padded: Reply = serde_json::from_str(r#"{"code": " 300 "}"#).unwrap();
        assert_eq!(padded.code.as_str(), "300");
    }

    #[test]
    fn test_code_rejects_objects() {
        assert!(serde_json::from_str::<Reply>(r#"{"code": {"value": 300}}"#).is_err());
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ProviderClient::new("http://localhost:8080/", None).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
