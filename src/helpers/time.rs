use chrono::{DateTime, Duration, Utc};
use tokio::time::Instant;

/// Absolute expiry for a token valid `expires_in` seconds from now.
/// Negative lifetimes are clamped to "already expired". `None` when the
/// lifetime does not fit a timestamp.
pub fn expiry_from_now(expires_in: i64) -> Option<DateTime<Utc>> {
    let lifetime = Duration::try_seconds(expires_in.max(0))?;
    Utc::now().checked_add_signed(lifetime)
}

pub fn now_i64() -> i64 {
    Utc::now().timestamp()
}

pub fn get_instant() -> Instant {
    Instant::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expiry_is_relative_to_now() {
        let expiry = expiry_from_now(3600).unwrap();
        let delta = expiry.timestamp() - now_i64();
        assert!((3599..=3600).contains(&delta));
    }

    #[test]
    fn negative_lifetime_is_already_expired() {
        assert!(expiry_from_now(-10).unwrap() <= Utc::now());
    }

    #[test]
    fn oversized_lifetime_has_no_expiry() {
        assert!(expiry_from_now(9_000_000_000_000_000).is_none());
        assert!(expiry_from_now(i64::MAX).is_none());
    }
}
