//! acmehook core: DNS-01 challenge reconciliation
//!
//! This crate holds everything that does not depend on a particular DNS
//! provider:
//! - challenge request types and solver configuration decoding
//! - credential resolution against a namespaced secret store
//! - the [`DnsProvider`] interface
//! - the [`Reconciler`], which implements [`Solver`] for any provider

pub mod challenge;
pub mod credentials;
pub mod error;
pub mod provider;
pub mod solver;

#[cfg(any(test, feature = "tests"))]
pub mod testing;

pub use challenge::{
    ChallengeAction, ChallengeRequest, RecordTarget, SecretKeySelector, SolverConfig,
};
pub use credentials::{ApiKey, CredentialResolver, MemorySecretStore, SecretData, SecretStore};
pub use error::{CredentialError, ProviderError, SolverError, SolverResult};
pub use provider::{DnsProvider, DnsRecord, ProviderResult};
pub use solver::{Reconciler, Solver, find_challenge_record};

#[cfg(feature = "kube")]
pub use credentials::KubeSecretStore;
