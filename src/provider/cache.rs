use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{MarketDataProvider, ProviderResult};
use crate::model::{PriceHistoryBar, PutQuote};

/// Default time-to-live for cached responses.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct Entry<V> {
    fetched_at: Instant,
    value: V,
}

type Table<K, V> = Mutex<HashMap<K, Entry<V>>>;

/// Per-ticker TTL cache in front of another provider.
///
/// Only successful responses are cached, so a failed ticker is retried on the next scan.
pub struct CachedProvider<P> {
    inner: P,
    ttl: Duration,
    spots: Table<String, f64>,
    histories: Table<(String, u32), Vec<PriceHistoryBar>>,
    chains: Table<(String, i64, i64), Vec<PutQuote>>,
}

impl<P: MarketDataProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    pub fn with_ttl(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            spots: Mutex::new(HashMap::new()),
            histories: Mutex::new(HashMap::new()),
            chains: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    /// Drop every cached response.
    pub fn clear(&self) {
        lock(&self.spots).clear();
        lock(&self.histories).clear();
        lock(&self.chains).clear();
    }
}

fn lock<K, V>(table: &Table<K, V>) -> std::sync::MutexGuard<'_, HashMap<K, Entry<V>>> {
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Serve `key` from `table` if fresh, otherwise call `fetch` and store a success.
/// The lock is not held during `fetch`.
fn cached<K, V, F>(table: &Table<K, V>, key: K, ttl: Duration, fetch: F) -> ProviderResult<V>
where
    K: Eq + Hash,
    V: Clone,
    F: FnOnce() -> ProviderResult<V>,
{
    if let Some(entry) = lock(table).get(&key) {
        if entry.fetched_at.elapsed() < ttl {
            return Ok(entry.value.clone());
        }
    }

    let value = fetch()?;
    lock(table).insert(
        key,
        Entry {
            fetched_at: Instant::now(),
            value: value.clone(),
        },
    );
    Ok(value)
}

impl<P: MarketDataProvider> MarketDataProvider for CachedProvider<P> {
    fn spot_price(&self, ticker: &str) -> ProviderResult<f64> {
        cached(&self.spots, ticker.to_string(), self.ttl, || {
            self.inner.spot_price(ticker)
        })
    }

    fn price_history(&self, ticker: &str, lookback_days: u32) -> ProviderResult<Vec<PriceHistoryBar>> {
        cached(
            &self.histories,
            (ticker.to_string(), lookback_days),
            self.ttl,
            || self.inner.price_history(ticker, lookback_days),
        )
    }

    fn put_chain(&self, ticker: &str, min_dte: i64, max_dte: i64) -> ProviderResult<Vec<PutQuote>> {
        cached(
            &self.chains,
            (ticker.to_string(), min_dte, max_dte),
            self.ttl,
            || self.inner.put_chain(ticker, min_dte, max_dte),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::provider::ProviderError;

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    impl MarketDataProvider for Counting {
        fn spot_price(&self, ticker: &str) -> ProviderResult<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ProviderError::NotFound {
                    ticker: ticker.to_string(),
                })
            } else {
                Ok(100.0)
            }
        }

        fn price_history(&self, _ticker: &str, _lookback_days: u32) -> ProviderResult<Vec<PriceHistoryBar>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        fn put_chain(&self, _ticker: &str, _min_dte: i64, _max_dte: i64) -> ProviderResult<Vec<PutQuote>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_hits_within_ttl() {
        let provider = CachedProvider::new(Counting {
            calls: AtomicUsize::new(0),
            fail: false,
        });

        assert_eq!(provider.spot_price("SPY").unwrap(), 100.0);
        assert_eq!(provider.spot_price("SPY").unwrap(), 100.0);
        provider.put_chain("SPY", 30, 45).unwrap();
        provider.put_chain("SPY", 30, 45).unwrap();
        provider.put_chain("SPY", 30, 60).unwrap();
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 3);

        provider.clear();
        provider.spot_price("SPY").unwrap();
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_zero_ttl_and_failures_are_not_cached() {
        let provider = CachedProvider::with_ttl(
            Counting {
                calls: AtomicUsize::new(0),
                fail: false,
            },
            Duration::ZERO,
        );
        provider.spot_price("QQQ").unwrap();
        provider.spot_price("QQQ").unwrap();
        assert_eq!(provider.inner().calls.load(Ordering::SeqCst), 2);

        let failing = CachedProvider::new(Counting {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        assert!(failing.spot_price("QQQ").is_err());
        assert!(failing.spot_price("QQQ").is_err());
        assert_eq!(failing.inner().calls.load(Ordering::SeqCst), 2);
    }
}
