//! TTL cache with per-key single-flight.
//!
//! Scans are expensive (four upstream providers per request), so identical
//! concurrent requests share one in-flight computation and subsequent
//! requests within the TTL get the stored result. Errors are never cached.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

pub struct ScanCache<V> {
    ttl: Duration,
    store: Mutex<HashMap<String, Entry<V>>>,
    /// One lock per key; holders are the single flight for that key.
    flights: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<V: Clone> ScanCache<V> {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            store: Mutex::new(HashMap::new()),
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached value for `key`, or runs `compute` and stores its
    /// result. Concurrent callers for the same key wait on the first one's
    /// computation instead of duplicating it.
    ///
    /// # Errors
    ///
    /// Propagates `compute`'s error; nothing is stored in that case.
    pub async fn get_or_compute<F, Fut, E>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.fresh(key).await {
            return Ok(hit);
        }

        let flight = {
            let mut flights = self.flights.lock().await;
            Arc::clone(flights.entry(key.to_owned()).or_default())
        };
        let _guard = flight.lock().await;

        // A concurrent flight may have filled the cache while we waited.
        if let Some(hit) = self.fresh(key).await {
            return Ok(hit);
        }

        let outcome = compute().await;

        // The flight is over either way. Waiters already hold their clone of
        // the lock and re-check the store when they wake; dropping the map
        // entry here keeps `flights` from growing with every distinct key.
        {
            let mut flights = self.flights.lock().await;
            flights.remove(key);
        }

        let value = outcome?;
        let mut store = self.store.lock().await;
        store.retain(|_, e| e.stored_at.elapsed() < self.ttl);
        store.insert(
            key.to_owned(),
            Entry {
                value: value.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(value)
    }

    async fn fresh(&self, key: &str) -> Option<V> {
        let store = self.store.lock().await;
        store
            .get(key)
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }

    /// Number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let store = self.store.lock().await;
        store
            .values()
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Cache key for a scan request: location, industry, and result cap.
#[must_use]
pub fn scan_cache_key(location: &str, industry: Option<&str>, max_results: usize) -> String {
    format!(
        "{}|{}|{max_results}",
        location.trim().to_lowercase(),
        industry.map(str::trim).map(str::to_lowercase).unwrap_or_default()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn second_lookup_within_ttl_hits_cache() {
        let cache: ScanCache<u32> = ScanCache::new(Duration::from_secs(300));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let v: Result<u32, Infallible> = cache
                .get_or_compute("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await;
            assert_eq!(v.unwrap(), 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_recomputed() {
        let cache: ScanCache<u32> = ScanCache::new(Duration::from_secs(300));
        let calls = AtomicUsize::new(0);

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, Infallible>(1)
        };
        cache.get_or_compute("k", compute).await.unwrap();

        tokio::time::advance(Duration::from_secs(301)).await;

        let compute = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, Infallible>(2)
        };
        let v = cache.get_or_compute("k", compute).await.unwrap();
        assert_eq!(v, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let cache: ScanCache<u32> = ScanCache::new(Duration::from_secs(300));

        let failed: Result<u32, &str> = cache.get_or_compute("k", || async { Err("boom") }).await;
        assert!(failed.is_err());
        assert!(cache.is_empty().await);

        let ok: Result<u32, &str> = cache.get_or_compute("k", || async { Ok(9) }).await;
        assert_eq!(ok.unwrap(), 9);
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_flight() {
        let cache: Arc<ScanCache<u32>> = Arc::new(ScanCache::new(Duration::from_secs(300)));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let calls = Arc::clone(&calls);
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_compute("same-key", || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        // Hold the flight long enough for others to queue.
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<u32, Infallible>(42)
                    })
                    .await
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn finished_flights_do_not_accumulate() {
        let cache: ScanCache<u32> = ScanCache::new(Duration::from_secs(300));

        for i in 0..100u32 {
            let key = format!("key-{i}");
            let v: Result<u32, Infallible> = cache.get_or_compute(&key, || async { Ok(i) }).await;
            assert_eq!(v.unwrap(), i);
        }
        let failed: Result<u32, &str> = cache
            .get_or_compute("erroring-key", || async { Err("boom") })
            .await;
        assert!(failed.is_err());

        assert!(cache.flights.lock().await.is_empty());
    }

    #[test]
    fn cache_key_normalizes_case_and_whitespace() {
        assert_eq!(
            scan_cache_key(" San Francisco ", Some("HVAC"), 20),
            scan_cache_key("san francisco", Some("hvac "), 20)
        );
        assert_ne!(
            scan_cache_key("94102", Some("hvac"), 20),
            scan_cache_key("94102", Some("hvac"), 50)
        );
        assert_ne!(
            scan_cache_key("94102", None, 20),
            scan_cache_key("94102", Some("hvac"), 20)
        );
    }
}
