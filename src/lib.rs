//! # Credential Resolver Library
//!
//! Turns heterogeneous credential sources (service-account key files, the
//! instance metadata endpoint, raw OAuth tokens, already-parsed key material)
//! into one uniform [`Credential`], keeps a persistent record per identity and
//! renews expired tokens.
//!
//! Modules:
//! - `credential`: the uniform credential record and its scopes
//! - `sources`: token exchanges (refresh token, JWT assertion, metadata)
//! - `resolvers`: one resolver per source kind
//! - `registry`: per-identity coordination of resolution and refresh
//! - `store`: SQLite persistence of credentials
//! - `discovery`: gcloud credential database discovery
//! - `config`: service configuration

pub mod cache;
pub mod config;
pub mod credential;
pub mod discovery;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod registry;
pub mod resolvers;
pub mod sources;
pub mod store;
pub mod utils;

#[cfg(test)]
mod tests;

pub use crate::credential::{Credential, Scopes, SigningKey, SourceKind};
pub use crate::error::{AuthError, Result};
pub use crate::registry::{CredentialRegistry, CredentialState};
pub use crate::resolvers::SourceDescriptor;
pub use crate::sources::TokenSource;
pub use crate::store::CredentialStore;
