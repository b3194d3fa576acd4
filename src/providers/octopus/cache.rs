use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Releases rarely change once created.
pub const RELEASE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// How long a failed request short-circuits repeat calls to the same URL.
pub const FAILURE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached {
    Body(String),
    KnownFailure,
}

struct CacheEntry {
    value: Cached,
    expires_at: Instant,
}

/// Response bodies keyed by URL, each with its own expiry. Failures are kept
/// too so a failing endpoint is not hammered.
#[derive(Default)]
pub struct ResponseCache {
    entries: HashMap<String, CacheEntry>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &str) -> Option<Cached> {
        self.get_at(key, Instant::now())
    }

    pub fn insert(&mut self, key: &str, body: String, ttl: Duration) {
        self.insert_at(key, Cached::Body(body), ttl, Instant::now());
    }

    pub fn insert_failure(&mut self, key: &str) {
        self.insert_at(key, Cached::KnownFailure, FAILURE_TTL, Instant::now());
    }

    fn get_at(&mut self, key: &str, now: Instant) -> Option<Cached> {
        match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Expired entries are swept on every insert, so keys that are never
    /// read again do not pile up.
    fn insert_at(&mut self, key: &str, value: Cached, ttl: Duration, now: Instant) {
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                expires_at: now + ttl,
            },
        );
    }
}

#[cfg(test)]
impl ResponseCache {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_on_empty_cache() {
        let mut cache = ResponseCache::new();

        assert_eq!(cache.get("https://octopus/api/releases/Releases-1"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hit_before_expiry() {
        let mut cache = ResponseCache::new();
        cache.insert("a", "{}".to_string(), RELEASE_TTL);

        assert_eq!(cache.get("a"), Some(Cached::Body("{}".to_string())));
    }

    #[test]
    fn test_failure_is_remembered() {
        let mut cache = ResponseCache::new();
        cache.insert_failure("a");

        assert_eq!(cache.get("a"), Some(Cached::KnownFailure));
    }

    #[test]
    fn test_entries_expire_independently() {
        let mut cache = ResponseCache::new();
        cache.insert("ok", "{}".to_string(), RELEASE_TTL);
        cache.insert_failure("failed");

        let later = Instant::now() + FAILURE_TTL + Duration::from_secs(1);

        assert_eq!(cache.get_at("failed", later), None);
        assert_eq!(
            cache.get_at("ok", later),
            Some(Cached::Body("{}".to_string()))
        );
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_sweeps_expired_entries() {
        let mut cache = ResponseCache::new();
        let now = Instant::now();
        cache.insert_at("stale", Cached::KnownFailure, FAILURE_TTL, now);
        cache.insert_at("kept", Cached::Body("{}".to_string()), RELEASE_TTL, now);

        let later = now + FAILURE_TTL + Duration::from_secs(1);
        cache.insert_at("fresh", Cached::Body("[]".to_string()), RELEASE_TTL, later);

        assert_eq!(cache.len(), 2);
        assert!(!cache.entries.contains_key("stale"));
        assert_eq!(
            cache.get_at("kept", later),
            Some(Cached::Body("{}".to_string()))
        );
    }

    #[test]
    fn test_insert_replaces_failure() {
        let mut cache = ResponseCache::new();
        cache.insert_failure("a");
        cache.insert("a", "{}".to_string(), RELEASE_TTL);

        assert_eq!(cache.get("a"), Some(Cached::Body("{}".to_string())));
    }
}
