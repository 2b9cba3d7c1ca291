//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value and policy metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Insert or last-touch time, the reference point for TTL
    pub touched_at: Instant,
    /// Access frequency (only meaningful for LFU)
    pub frequency: u64,
    /// Store-wide write sequence, used to break LFU ties
    pub sequence: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a fresh entry with frequency 1.
    pub fn new(value: V, sequence: u64) -> Self {
        Self {
            value,
            touched_at: Instant::now(),
            frequency: 1,
            sequence,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl`.
    ///
    /// An entry is expired once strictly more than `ttl` has elapsed since it
    /// was last touched. `None` disables expiry.
    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        self.is_expired_at(ttl, Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock.
    pub fn is_expired_at(&self, ttl: Option<Duration>, now: Instant) -> bool {
        match ttl {
            Some(ttl) => now.saturating_duration_since(self.touched_at) > ttl,
            None => false,
        }
    }

    // == Touch ==
    /// Refreshes the TTL reference point.
    pub fn touch(&mut self) {
        self.touched_at = Instant::now();
    }

    /// Age of the entry since its last touch.
    pub fn age(&self) -> Duration {
        self.touched_at.elapsed()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new(vec![1u8, 2, 3], 7);

        assert_eq!(entry.value, vec![1, 2, 3]);
        assert_eq!(entry.frequency, 1);
        assert_eq!(entry.sequence, 7);
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let entry = CacheEntry::new("v", 0);
        let far_future = Instant::now() + Duration::from_secs(365 * 24 * 3600);

        assert!(!entry.is_expired(None));
        assert!(!entry.is_expired_at(None, far_future));
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("v", 0);
        let ttl = Some(Duration::from_millis(50));

        assert!(!entry.is_expired(ttl));

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired(ttl));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new("v", 0);
        let ttl = Duration::from_secs(10);

        // Exactly ttl old is still alive, anything beyond is expired
        assert!(!entry.is_expired_at(Some(ttl), entry.touched_at + ttl));
        assert!(entry.is_expired_at(
            Some(ttl),
            entry.touched_at + ttl + Duration::from_millis(1)
        ));
    }

    #[test]
    fn test_touch_resets_age() {
        let mut entry = CacheEntry::new("v", 0);
        let ttl = Some(Duration::from_millis(50));

        sleep(Duration::from_millis(80));
        assert!(entry.is_expired(ttl));

        entry.touch();
        assert!(!entry.is_expired(ttl));
        assert!(entry.age() < Duration::from_millis(50));
    }
}
