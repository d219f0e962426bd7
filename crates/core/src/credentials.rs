//! Provider credential resolution
//!
//! Solvers never hold an API key longer than one call. The key is looked up
//! in a [`SecretStore`] every time, using the secret reference from the
//! issuer's solver configuration and the challenge's resource namespace.

use crate::challenge::SecretKeySelector;
use crate::error::CredentialError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Key/value data of one secret object
pub type SecretData = BTreeMap<String, Vec<u8>>;

/// Provider API key; `Debug` never prints the value
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw key, for building provider requests only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// Backing store for namespaced secrets
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a secret's data, `None` if the secret does not exist
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, CredentialError>;
}

/// Resolves a [`SecretKeySelector`] to an [`ApiKey`]
#[derive(Clone)]
pub struct CredentialResolver {
    store: Arc<dyn SecretStore>,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self { store }
    }

    /// Look up `selector` in `namespace`; a single attempt, no retry
    pub async fn resolve(
        &self,
        namespace: &str,
        selector: &SecretKeySelector,
    ) -> Result<ApiKey, CredentialError> {
        let not_found = || CredentialError::NotFound {
            namespace: namespace.to_string(),
            name: selector.name.clone(),
        };

        // Zero-value config: nothing to look up
        if selector.name.is_empty() {
            return Err(not_found());
        }

        debug!(
            namespace = %namespace,
            secret = %selector.name,
            key = %selector.key,
            "Resolving provider credential"
        );

        let data = self
            .store
            .get_secret(namespace, &selector.name)
            .await?
            .ok_or_else(not_found)?;

        let bytes = data
            .get(&selector.key)
            .ok_or_else(|| CredentialError::KeyMissing {
                namespace: namespace.to_string(),
                name: selector.name.clone(),
                key: selector.key.clone(),
            })?;

        let value = String::from_utf8_lossy(bytes);
        Ok(ApiKey::new(value.trim_end_matches(['\r', '\n'])))
    }
}

/// In-memory secret store for tests and local runs
#[derive(Debug, Default, Clone)]
pub struct MemorySecretStore {
    secrets: HashMap<(String, String), SecretData>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one key to a secret, creating the secret if needed
    #[must_use]
    pub fn with_secret(
        mut self,
        namespace: &str,
        name: &str,
        key: &str,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.secrets
            .entry((namespace.to_string(), name.to_string()))
            .or_default()
            .insert(key.to_string(), value.into());
        self
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<SecretData>, CredentialError> {
        Ok(self
            .secrets
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }
}

#[cfg(feature = "kube")]
pub use kubernetes::KubeSecretStore;

#[cfg(feature = "kube")]
mod kubernetes {
    use super::{SecretData, SecretStore};
    use crate::error::CredentialError;
    use async_trait::async_trait;
    use k8s_openapi::api::core::v1::Secret;
    use kube::{Api, Client};

    /// Secret store backed by Kubernetes `Secret` objects
    #[derive(Clone)]
    pub struct KubeSecretStore {
        client: Client,
    }

    impl KubeSecretStore {
        pub fn new(client: Client) -> Self {
            Self { client }
        }

        /// Build the client from a kube config (in-cluster or kubeconfig)
        pub fn from_config(config: kube::Config) -> Result<Self, CredentialError> {
            let client = Client::try_from(config).map_err(|e| {
                CredentialError::Store(format!("failed to build kubernetes client: {e}"))
            })?;
            Ok(Self::new(client))
        }
    }

    #[async_trait]
    impl SecretStore for KubeSecretStore {
        async fn get_secret(
            &self,
            namespace: &str,
            name: &str,
        ) -> Result<Option<SecretData>, CredentialError> {
            let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
            let secret = api
                .get_opt(name)
                .await
                .map_err(|e| CredentialError::Store(e.to_string()))?;

            Ok(secret.map(|secret| {
                secret
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(key, value)| (key, value.0))
                    .collect()
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selector(name: &str, key: &str) -> SecretKeySelector {
        SecretKeySelector {
            name: name.to_string(),
            key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolve_key() {
        let mut store = MockSecretStore::new();
        store
            .expect_get_secret()
            .withf(|namespace, name| namespace == "cert-manager" && name == "namesilo")
            .times(1)
            .returning(|_, _| {
                let mut data = SecretData::new();
                data.insert("api-key".to_string(), b"s3cr3t\n".to_vec());
                Ok(Some(data))
            });

        let resolver = CredentialResolver::new(Arc::new(store));
        let key = resolver
            .resolve("cert-manager", &selector("namesilo", "api-key"))
            .await
            .unwrap();
        assert_eq!(key.expose(), "s3cr3t");
    }

    #[tokio::test]
    async fn test_missing_secret() {
        let mut store = MockSecretStore::new();
        store.expect_get_secret().returning(|_, _| Ok(None));

        let resolver = CredentialResolver::new(Arc::new(store));
        let err = resolver
            .resolve("default", &selector("absent", "api-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::NotFound { ref name, .. } if name == "absent"));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let store = MemorySecretStore::new().with_secret("default", "namesilo", "other", "x");
        let resolver = CredentialResolver::new(Arc::new(store));
        let err = resolver
            .resolve("default", &selector("namesilo", "api-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::KeyMissing { ref key, .. } if key == "api-key"));
    }

    #[tokio::test]
    async fn test_empty_selector_skips_store() {
        let mut store = MockSecretStore::new();
        store.expect_get_secret().never();

        let resolver = CredentialResolver::new(Arc::new(store));
        let err = resolver
            .resolve("default", &SecretKeySelector::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_store_error_propagates() {
        let mut store = MockSecretStore::new();
        store
            .expect_get_secret()
            .returning(|_, _| Err(CredentialError::Store("forbidden".to_string())));

        let resolver = CredentialResolver::new(Arc::new(store));
        let err = resolver
            .resolve("default", &selector("namesilo", "api-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, CredentialError::Store(ref msg) if msg == "forbidden"));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("s3cr3t");
        assert!(!format!("{key:?}").contains("s3cr3t"));
    }
}
