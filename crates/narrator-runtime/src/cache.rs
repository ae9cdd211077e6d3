//! Caching layer for embeddings.
//!
//! Reference narratives are templated, so the same text is embedded many
//! times in one evaluation run. [`CachedEmbedder`] memoizes any backend.

use std::sync::Arc;

use moka::sync::Cache;
use parking_lot::Mutex;

use crate::embedding::{EmbeddingError, TextEmbedder};

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A [`TextEmbedder`] that memoizes another one by exact text.
///
/// Failures are not cached.
pub struct CachedEmbedder {
    inner: Arc<dyn TextEmbedder>,
    cache: Cache<String, Arc<Vec<f32>>>,
    stats: Mutex<CacheStats>,
}

impl CachedEmbedder {
    pub fn new(inner: Arc<dyn TextEmbedder>, max_entries: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_entries).build();
        Self {
            inner,
            cache,
            stats: Mutex::new(CacheStats::default()),
        }
    }

    pub fn stats(&self) -> CacheStats {
        *self.stats.lock()
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }
}

impl TextEmbedder for CachedEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if let Some(vector) = self.cache.get(text) {
            self.stats.lock().hits += 1;
            return Ok(vector.as_ref().clone());
        }

        self.stats.lock().misses += 1;
        tracing::debug!(backend = self.inner.name(), chars = text.len(), "Embedding cache miss");

        let vector = self.inner.embed(text)?;
        self.cache.insert(text.to_string(), Arc::new(vector.clone()));
        Ok(vector)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingEmbedder {
        calls: AtomicUsize,
        fail: bool,
    }

    impl TextEmbedder for CountingEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EmbeddingError::Backend("offline".into()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }

        fn name(&self) -> &str {
            "counting"
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_cache_operations() {
        let inner = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cached = CachedEmbedder::new(inner.clone(), 100);

        // Cache miss
        assert_eq!(cached.embed("abc").unwrap(), vec![3.0, 1.0]);
        // Cache hit
        assert_eq!(cached.embed("abc").unwrap(), vec![3.0, 1.0]);
        assert_eq!(cached.embed("de").unwrap(), vec![2.0, 1.0]);

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cached.stats(), CacheStats { hits: 1, misses: 2 });
        assert_eq!(cached.entry_count(), 2);
        assert_eq!(cached.name(), "counting");
    }

    #[test]
    fn test_failures_are_not_cached() {
        let inner = Arc::new(CountingEmbedder {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cached = CachedEmbedder::new(inner.clone(), 100);

        assert!(cached.embed("x").is_err());
        assert!(cached.embed("x").is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
