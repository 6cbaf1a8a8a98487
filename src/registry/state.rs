/// Lifecycle of the credential held for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// Nothing known about the identity.
    Unresolved,
    /// A resolution or refresh for the identity is in flight.
    Resolving,
    /// Held and not expired.
    Valid,
    /// Held but past its expiry.
    Expired,
    /// The last attempt for the identity failed; re-resolve to recover.
    Failed,
}
