//! Orchestrates resolvers, the store and token renewal.

pub mod credential_registry;
pub mod locks;
pub mod state;

pub use credential_registry::CredentialRegistry;
pub use state::CredentialState;
