//! cert-manager webhook host for the acmehook solvers

pub mod config;
pub mod error;
pub mod logging;
pub mod server;
pub mod solvers;

pub use crate::config::WebhookConfig;
pub use server::{AppState, ChallengePayload, ChallengeResponse, router};
pub use solvers::build_solvers;
