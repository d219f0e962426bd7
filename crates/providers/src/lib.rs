//! DNS provider integrations for acmehook
//!
//! Each provider implements [`acmehook_core::DnsProvider`] on top of the
//! shared [`client::ProviderClient`].

pub mod client;
pub mod namesilo;
pub mod netactuate;

pub use client::{ProviderClient, ProviderCode, ProviderReply};
pub use namesilo::NameSiloProvider;
pub use netactuate::NetActuateProvider;
