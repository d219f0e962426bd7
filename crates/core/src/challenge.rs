//! Challenge requests and the values derived from them

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Record type published for DNS-01 validation
pub const TXT_RECORD_TYPE: &str = "TXT";

/// Action requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChallengeAction {
    Present,
    CleanUp,
}

/// A single DNS-01 challenge as delivered by the host
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeRequest {
    #[serde(default)]
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<ChallengeAction>,
    #[serde(default, rename = "type")]
    pub challenge_type: String,
    #[serde(default)]
    pub dns_name: String,
    /// Key authorization digest to publish as the TXT value
    pub key: String,
    #[serde(default)]
    pub resource_namespace: String,
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,
    pub resolved_zone: String,
    #[serde(default)]
    pub allow_ambient_credentials: bool,
    /// Opaque per-issuer configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
}

/// Reference to one key of a namespaced secret
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretKeySelector {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub key: String,
}

/// Per-issuer solver configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    #[serde(default, alias = "apiKey")]
    pub api_key_secret_ref: SecretKeySelector,
}

impl SolverConfig {
    /// Decode the config blob; a missing or null blob yields the zero value
    pub fn decode(config: Option<&Value>) -> Result<Self, serde_json::Error> {
        match config {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value) => Self::deserialize(value),
        }
    }
}

/// Zone, relative host and absolute name a challenge record lives at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordTarget {
    /// Zone without the trailing dot
    pub zone: String,
    /// Record label relative to the zone
    pub host: String,
    /// Absolute record name without the trailing dot
    pub fqdn: String,
}

impl RecordTarget {
    pub fn from_request(request: &ChallengeRequest) -> Self {
        let zone = strip_root(&request.resolved_zone);
        let host = strip_zone_suffix(&request.resolved_fqdn, &request.resolved_zone)
            .unwrap_or_else(|| strip_root(&request.resolved_fqdn));

        Self {
            zone: zone.to_string(),
            host: host.to_string(),
            fqdn: strip_root(&request.resolved_fqdn).to_string(),
        }
    }

    /// Providers report either the relative label or the absolute name
    pub fn matches_host(&self, name: &str) -> bool {
        let name = strip_root(name);
        name.eq_ignore_ascii_case(&self.host) || name.eq_ignore_ascii_case(&self.fqdn)
    }
}

/// `fqdn` relative to `zone`, comparing names ASCII case-insensitively
fn strip_zone_suffix<'a>(fqdn: &'a str, zone: &str) -> Option<&'a str> {
    let (fqdn, zone) = (strip_root(fqdn), strip_root(zone));
    let split = fqdn.len().checked_sub(zone.len() + 1)?;
    let (host, rest) = fqdn.split_at_checked(split)?;
    let suffix = rest.strip_prefix('.')?;
    (!host.is_empty() && suffix.eq_ignore_ascii_case(zone)).then_some(host)
}

/// Trim one trailing root dot
pub fn strip_root(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(fqdn: &str, zone: &str) -> ChallengeRequest {
        ChallengeRequest {
            key: "digest".to_string(),
            resolved_fqdn: fqdn.to_string(),
            resolved_zone: zone.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_host_label_derivation() {
        let target = RecordTarget::from_request(&request(
            "_acme-challenge.example.com.",
            "example.com.",
        ));
        assert_eq!(target.zone, "example.com");
        assert_eq!(target.host, "_acme-challenge");
        assert_eq!(target.fqdn, "_acme-challenge.example.com");
    }

    #[test]
    fn test_host_label_keeps_subdomains() {
        let target = RecordTarget::from_request(&request(
            "_acme-challenge.www.example.com.",
            "example.com.",
        ));
        assert_eq!(target.host, "_acme-challenge.www");
    }

    #[test]
    fn test_host_label_ignores_zone_case() {
        let target = RecordTarget::from_request(&request(
            "_acme-challenge.example.com.",
            "Example.com.",
        ));
        assert_eq!(target.host, "_acme-challenge");
        assert_eq!(target.zone, "Example.com");

        let target = RecordTarget::from_request(&request(
            "_ACME-Challenge.EXAMPLE.COM",
            "example.com.",
        ));
        assert_eq!(target.host, "_ACME-Challenge");
    }

    #[test]
    fn test_host_label_outside_zone_falls_back_to_fqdn() {
        let target = RecordTarget::from_request(&request(
            "_acme-challenge.example.org.",
            "example.com.",
        ));
        assert_eq!(target.host, "_acme-challenge.example.org");

        let target = RecordTarget::from_request(&request("example.com.", "example.com."));
        assert_eq!(target.host, "example.com");
    }

    #[test]
    fn test_matches_host_relative_and_absolute() {
        let target = RecordTarget::from_request(&request(
            "_acme-challenge.example.com.",
            "example.com.",
        ));
        assert!(target.matches_host("_acme-challenge"));
        assert!(target.matches_host("_acme-challenge.example.com"));
        assert!(target.matches_host("_ACME-challenge.Example.com."));
        assert!(!target.matches_host("_acme-challenge.www"));
        assert!(!target.matches_host("example.com"));
    }

    #[test]
    fn test_solver_config_missing_is_default() {
        assert_eq!(SolverConfig::decode(None).unwrap(), SolverConfig::default());
        assert_eq!(
            SolverConfig::decode(Some(&Value::Null)).unwrap(),
            SolverConfig::default()
        );
    }

    #[test]
    fn test_solver_config_decode() {
        let config = json!({"apiKeySecretRef": {"name": "namesilo", "key": "api-key"}});
        let decoded = SolverConfig::decode(Some(&config)).unwrap();
        assert_eq!(decoded.api_key_secret_ref.name, "namesilo");
        assert_eq!(decoded.api_key_secret_ref.key, "api-key");

        let legacy = json!({"apiKey": {"name": "namesilo", "key": "token"}});
        let decoded = SolverConfig::decode(Some(&legacy)).unwrap();
        assert_eq!(decoded.api_key_secret_ref.key, "token");
    }

    #[test]
    fn test_solver_config_malformed() {
        let config = json!({"apiKeySecretRef": "not-an-object"});
        assert!(SolverConfig::decode(Some(&config)).is_err());
    }

    #[test]
    fn test_challenge_request_wire_names() {
        let request: ChallengeRequest = serde_json::from_value(json!({
            "uid": "abc",
            "action": "CleanUp",
            "type": "dns-01",
            "dnsName": "example.com",
            "key": "digest",
            "resourceNamespace": "default",
            "resolvedFQDN": "_acme-challenge.example.com.",
            "resolvedZone": "example.com.",
            "allowAmbientCredentials": false,
            "config": {"apiKeySecretRef": {"name": "n", "key": "k"}}
        }))
        .unwrap();

        assert_eq!(request.action, Some(ChallengeAction::CleanUp));
        assert_eq!(request.challenge_type, "dns-01");
        assert_eq!(request.resolved_fqdn, "_acme-challenge.example.com.");
        assert!(request.config.is_some());
    }
}
