//! Challenge reconciliation
//!
//! [`Reconciler`] turns present/clean-up requests into provider calls. It
//! keeps no state between calls apart from the credential store handle that
//! is installed once by [`Solver::initialize`].

use crate::challenge::{ChallengeRequest, RecordTarget, SolverConfig, TXT_RECORD_TYPE};
use crate::credentials::{ApiKey, CredentialResolver, SecretStore};
use crate::error::{ProviderError, SolverError, SolverResult};
use crate::provider::{DnsProvider, DnsRecord};
use async_trait::async_trait;
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Contract between the host and a DNS-01 solver
#[async_trait]
pub trait Solver: Send + Sync {
    /// Name the host routes challenges by
    fn name(&self) -> &str;

    /// Install the credential store; must run before any present/clean-up
    async fn initialize(
        &self,
        store: Arc<dyn SecretStore>,
        shutdown: CancellationToken,
    ) -> SolverResult<()>;

    /// Publish the challenge TXT record. Safe to call repeatedly.
    async fn present(&self, request: &ChallengeRequest) -> SolverResult<()>;

    /// Remove the TXT record whose value equals `request.key`, and only that one
    async fn clean_up(&self, request: &ChallengeRequest) -> SolverResult<()>;
}

struct Bound {
    resolver: CredentialResolver,
    shutdown: CancellationToken,
}

/// [`Solver`] implementation over any [`DnsProvider`]
pub struct Reconciler<P> {
    provider: P,
    bound: OnceLock<Bound>,
}

impl<P: DnsProvider> Reconciler<P> {
    /// Create an uninitialized solver
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            bound: OnceLock::new(),
        }
    }

    /// Create a solver with its credential store already installed
    pub fn with_store(provider: P, store: Arc<dyn SecretStore>) -> Self {
        let reconciler = Self::new(provider);
        let _ = reconciler.bound.set(Bound {
            resolver: CredentialResolver::new(store),
            shutdown: CancellationToken::new(),
        });
        reconciler
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn bound(&self) -> SolverResult<&Bound> {
        let bound = self.bound.get().ok_or(SolverError::NotInitialized)?;
        if bound.shutdown.is_cancelled() {
            return Err(SolverError::ShuttingDown);
        }
        Ok(bound)
    }

    /// Config decode, credential lookup and target derivation shared by both actions
    async fn prepare(&self, request: &ChallengeRequest) -> SolverResult<(ApiKey, RecordTarget)> {
        let bound = self.bound()?;
        let config = SolverConfig::decode(request.config.as_ref())?;
        let api_key = bound
            .resolver
            .resolve(&request.resource_namespace, &config.api_key_secret_ref)
            .await?;
        Ok((api_key, RecordTarget::from_request(request)))
    }

    async fn find_existing(
        &self,
        api_key: &ApiKey,
        target: &RecordTarget,
        key: &str,
    ) -> Result<Option<DnsRecord>, ProviderError> {
        let records = self.provider.list_records(api_key, &target.zone).await?;
        Ok(find_challenge_record(&records, target, key).cloned())
    }
}

#[async_trait]
impl<P: DnsProvider> Solver for Reconciler<P> {
    fn name(&self) -> &str {
        self.provider.name()
    }

    async fn initialize(
        &self,
        store: Arc<dyn SecretStore>,
        shutdown: CancellationToken,
    ) -> SolverResult<()> {
        self.bound
            .set(Bound {
                resolver: CredentialResolver::new(store),
                shutdown,
            })
            .map_err(|_| SolverError::AlreadyInitialized)?;

        info!(solver = self.provider.name(), "Solver initialized");
        Ok(())
    }

    async fn present(&self, request: &ChallengeRequest) -> SolverResult<()> {
        let (api_key, target) = self.prepare(request).await?;

        info!(
            solver = self.provider.name(),
            fqdn = %target.fqdn,
            zone = %target.zone,
            "Presenting TXT record"
        );

        let added = self
            .provider
            .add_record(
                &api_key,
                &target.zone,
                TXT_RECORD_TYPE,
                &target.host,
                &request.key,
            )
            .await;

        match added {
            Ok(()) => {
                info!(fqdn = %target.fqdn, "Added TXT record");
                Ok(())
            }
            Err(rejection @ ProviderError::Rejected { .. }) => {
                // A repeated present may hit the provider's duplicate check
                match self.find_existing(&api_key, &target, &request.key).await {
                    Ok(Some(record)) => {
                        info!(
                            fqdn = %target.fqdn,
                            record_id = %record.id,
                            "TXT record already present"
                        );
                        Ok(())
                    }
                    Ok(None) => {
                        warn!(fqdn = %target.fqdn, error = %rejection, "Error adding TXT record");
                        Err(SolverError::provider("add record", rejection))
                    }
                    Err(e) => {
                        warn!(
                            fqdn = %target.fqdn,
                            error = %e,
                            "Could not check for an existing record after rejected add"
                        );
                        Err(SolverError::provider("add record", rejection))
                    }
                }
            }
            Err(e) => {
                warn!(fqdn = %target.fqdn, error = %e, "Error adding TXT record");
                Err(SolverError::provider("add record", e))
            }
        }
    }

    async fn clean_up(&self, request: &ChallengeRequest) -> SolverResult<()> {
        let (api_key, target) = self.prepare(request).await?;

        let records = self
            .provider
            .list_records(&api_key, &target.zone)
            .await
            .map_err(|e| {
                warn!(fqdn = %target.fqdn, error = %e, "Error listing TXT records");
                SolverError::provider("list records", e)
            })?;

        let Some(record) = find_challenge_record(&records, &target, &request.key) else {
            warn!(fqdn = %target.fqdn, "No TXT record found");
            for record in &records {
                debug!(
                    id = %record.id,
                    record_type = %record.record_type,
                    host = %record.host,
                    "Candidate record"
                );
            }
            return Err(SolverError::RecordNotFound {
                fqdn: target.fqdn.clone(),
            });
        };

        info!(
            fqdn = %target.fqdn,
            record_id = %record.id,
            "Deleting TXT record"
        );

        self.provider
            .delete_record(&api_key, &target.zone, &record.id)
            .await
            .map_err(|e| {
                warn!(record_id = %record.id, error = %e, "Error deleting TXT record");
                SolverError::provider("delete record", e)
            })?;

        info!(fqdn = %target.fqdn, "Deleted TXT record");
        Ok(())
    }
}

/// First record matching host, type `TXT` and exact value
///
/// Several validations for one name may be in flight at once, so the value
/// must take part in the match.
pub fn find_challenge_record<'a>(
    records: &'a [DnsRecord],
    target: &RecordTarget,
    key: &str,
) -> Option<&'a DnsRecord> {
    records.iter().find(|record| {
        record.record_type.eq_ignore_ascii_case(TXT_RECORD_TYPE)
            && record.value == key
            && target.matches_host(&record.host)
    })
}
