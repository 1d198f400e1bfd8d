use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error};

use crate::core::{CanonicalQuery, QueryError, QueryResult};

type Pending = watch::Receiver<Option<QueryResult>>;

/// Статистика кэша
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Количество попаданий
    pub hits: u64,
    /// Количество промахов (каждый промах - одно обращение к адаптеру)
    pub misses: u64,
    /// Присоединения к уже выполняющемуся запросу
    pub joins: u64,
    /// Количество вытеснений по LRU
    pub evictions: u64,
    /// Записи, отброшенные по TTL
    pub expirations: u64,
    /// Текущее количество записей
    pub entries: usize,
}

impl CacheStats {
    /// Доля запросов, не дошедших до адаптера
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.joins;
        if total == 0 {
            0.0
        } else {
            (self.hits + self.joins) as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    result: QueryResult,
    inserted_at: Instant,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    joins: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

struct CacheInner {
    entries: Mutex<LruCache<CanonicalQuery, CacheEntry>>,
    in_flight: Mutex<HashMap<CanonicalQuery, Pending>>,
    ttl: Duration,
    /// Растет при каждой очистке; результаты старых поколений не сохраняются
    generation: AtomicU64,
    counters: Counters,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CacheInner {
    fn lookup_fresh(&self, key: &CanonicalQuery) -> Option<QueryResult> {
        let mut entries = lock(&self.entries);
        let expired = match entries.get(key) {
            Some(entry) if entry.inserted_at.elapsed() < self.ttl => {
                return Some(entry.result.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
            self.counters.expirations.fetch_add(1, Ordering::Relaxed);
            debug!("Cache entry expired: {}", key);
        }
        None
    }

    fn store(&self, key: &CanonicalQuery, result: &QueryResult, generation: u64) {
        let cacheable = match result {
            Ok(_) => true,
            Err(e) => e.kind.is_cacheable(),
        };
        if !cacheable || generation != self.generation.load(Ordering::Acquire) {
            return;
        }

        let entry = CacheEntry {
            result: result.clone(),
            inserted_at: Instant::now(),
        };
        let mut entries = lock(&self.entries);
        if let Some((evicted, _)) = entries.push(key.clone(), entry) {
            if &evicted != key {
                self.counters.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Cache evicted: {}", evicted);
            }
        }
    }
}

/// Снимает запись in-flight при любом завершении задачи, включая панику
struct InFlightGuard {
    inner: Arc<CacheInner>,
    key: CanonicalQuery,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.inner.in_flight).remove(&self.key);
    }
}

/// Shared TTL + LRU memo of canonical queries with single-flight resolution
#[derive(Clone)]
pub struct RequestCache {
    inner: Arc<CacheInner>,
}

impl RequestCache {
    /// Нулевая емкость трактуется как одна запись
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Arc::new(CacheInner {
                entries: Mutex::new(LruCache::new(capacity)),
                in_flight: Mutex::new(HashMap::new()),
                ttl,
                generation: AtomicU64::new(0),
                counters: Counters::default(),
            }),
        }
    }

    /// Returns the cached result or resolves it once for all concurrent callers
    ///
    /// `resolve` вызывается только первым вызывающим; вычисление выполняется
    /// отдельной задачей и не прерывается при отмене любого из ожидающих.
    pub async fn get_or_resolve<F, Fut>(&self, key: CanonicalQuery, resolve: F) -> QueryResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = QueryResult> + Send + 'static,
    {
        let counters = &self.inner.counters;

        if let Some(hit) = self.inner.lookup_fresh(&key) {
            counters.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit: {}", key);
            return hit;
        }

        let mut pending = {
            let mut in_flight = lock(&self.inner.in_flight);

            // Лидер мог завершиться между проверками
            if let Some(hit) = self.inner.lookup_fresh(&key) {
                counters.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit: {}", key);
                return hit;
            }

            match in_flight.get(&key) {
                Some(pending) => {
                    counters.joins.fetch_add(1, Ordering::Relaxed);
                    debug!("Joining in-flight resolution: {}", key);
                    pending.clone()
                }
                None => {
                    counters.misses.fetch_add(1, Ordering::Relaxed);
                    debug!("Cache miss: {}", key);

                    let (sender, receiver) = watch::channel(None);
                    in_flight.insert(key.clone(), receiver.clone());

                    let generation = self.inner.generation.load(Ordering::Acquire);
                    let guard = InFlightGuard {
                        inner: Arc::clone(&self.inner),
                        key,
                    };
                    let future = resolve();
                    tokio::spawn(async move {
                        let result = future.await;
                        guard.inner.store(&guard.key, &result, generation);
                        let _ = sender.send(Some(result));
                        drop(guard);
                    });
                    receiver
                }
            }
        };

        let outcome = match pending.wait_for(Option::is_some).await {
            Ok(value) => value.clone(),
            Err(_) => None,
        };
        outcome.unwrap_or_else(|| {
            error!("Single-flight resolution ended without a result");
            Err(QueryError::internal("query resolution was aborted"))
        })
    }

    /// Drops every entry; resolutions already in flight are not stored
    pub fn clear(&self) {
        self.inner.generation.fetch_add(1, Ordering::AcqRel);
        lock(&self.inner.entries).clear();
        debug!("Request cache cleared");
    }

    pub fn len(&self) -> usize {
        lock(&self.inner.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let counters = &self.inner.counters;
        CacheStats {
            hits: counters.hits.load(Ordering::Relaxed),
            misses: counters.misses.load(Ordering::Relaxed),
            joins: counters.joins.load(Ordering::Relaxed),
            evictions: counters.evictions.load(Ordering::Relaxed),
            expirations: counters.expirations.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
