//! A single cached payload and its deadline.

use std::time::Duration;

use bytes::Bytes;
use tokio::time::Instant;

/// Upper bound used when `now + ttl` would overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(30 * 365 * 24 * 60 * 60);

/// Entry stored in the cache.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    value: Bytes,
    expires_at: Instant,
}

impl CacheEntry {
    /// Create an entry that expires `ttl` from now.
    pub fn new(value: Bytes, ttl: Duration) -> Self {
        let now = Instant::now();
        let expires_at = now.checked_add(ttl).unwrap_or(now + FAR_FUTURE);
        Self { value, expires_at }
    }

    /// The cached payload.
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Whether the entry is dead at `now`. The deadline itself counts as expired.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Whether the entry is dead right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_expired() {
        let entry = CacheEntry::new(Bytes::from_static(b"v"), Duration::from_secs(10));
        assert!(!entry.is_expired());

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(entry.is_expired());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_ttl_is_immediately_expired() {
        let entry = CacheEntry::new(Bytes::from_static(b"v"), Duration::ZERO);
        assert!(entry.is_expired());
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let entry = CacheEntry::new(Bytes::from_static(b"v"), Duration::MAX);
        assert!(!entry.is_expired());
        assert_eq!(entry.value(), &Bytes::from_static(b"v"));
    }
}
