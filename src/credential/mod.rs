//! Normalized credential representation shared by every resolver.

pub mod credential;
pub mod scopes;

pub use credential::{Credential, SigningKey, SourceKind};
pub use scopes::Scopes;
