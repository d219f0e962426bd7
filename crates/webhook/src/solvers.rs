//! Builds the enabled solvers from configuration

use crate::config::ProvidersConfig;
use acmehook_core::{ProviderResult, Reconciler, Solver};
use acmehook_providers::{NameSiloProvider, NetActuateProvider};
use std::sync::Arc;
use tracing::info;

pub fn build_solvers(config: &ProvidersConfig) -> ProviderResult<Vec<Arc<dyn Solver>>> {
    let mut solvers: Vec<Arc<dyn Solver>> = Vec::new();

    if config.namesilo.enabled {
        let provider = NameSiloProvider::with_base_url(
            config.namesilo.base_url.clone(),
            Some(config.namesilo.timeout()),
        )?
        .with_ttl(config.namesilo.ttl);
        info!(base_url = %config.namesilo.base_url, "Enabled NameSilo solver");
        solvers.push(Arc::new(Reconciler::new(provider)));
    }

    if config.netactuate.enabled {
        let provider = NetActuateProvider::with_base_url(
            config.netactuate.base_url.clone(),
            Some(config.netactuate.timeout()),
        )?;
        info!(base_url = %config.netactuate.base_url, "Enabled NetActuate solver");
        solvers.push(Arc::new(Reconciler::new(provider)));
    }

    Ok(solvers)
}
