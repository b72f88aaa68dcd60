//! Content-addressed memoization for pure pipeline steps.
//!
//! Entries are keyed by the step name plus the SHA-256 of the step's input
//! serialized as JSON, so two calls with equal inputs share one result.

use crate::error::Result;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

type Key = (&'static str, [u8; 32]);

pub struct MemoCache<V> {
    entries: HashMap<Key, Arc<V>>,
}

impl<V> Default for MemoCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<V> MemoCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `(step, input)`, computing and storing it on a miss.
    ///
    /// A failing `compute` leaves the cache unchanged.
    pub fn get_or_try_insert_with<K, F>(
        &mut self,
        step: &'static str,
        input: &K,
        compute: F,
    ) -> Result<Arc<V>>
    where
        K: Serialize + ?Sized,
        F: FnOnce() -> Result<V>,
    {
        let key = (step, digest(input)?);
        if let Some(value) = self.entries.get(&key) {
            tracing::debug!("memo hit: {}", step);
            return Ok(Arc::clone(value));
        }

        tracing::debug!("memo miss: {}", step);
        let value = Arc::new(compute()?);
        self.entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    /// Drop the entry for `(step, input)`. Returns whether one was present.
    pub fn invalidate<K: Serialize + ?Sized>(&mut self, step: &'static str, input: &K) -> Result<bool> {
        Ok(self.entries.remove(&(step, digest(input)?)).is_some())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn digest<K: Serialize + ?Sized>(input: &K) -> Result<[u8; 32]> {
    let bytes = serde_json::to_vec(input)?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&Sha256::digest(&bytes));
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LensError;
    use std::cell::Cell;

    #[test]
    fn computes_once_per_input() {
        let mut cache = MemoCache::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            Ok(42)
        };

        let a = cache.get_or_try_insert_with("step", "url", compute).unwrap();
        let b = cache.get_or_try_insert_with("step", "url", compute).unwrap();

        assert_eq!(*a, 42);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn different_inputs_and_steps_do_not_collide() {
        let mut cache = MemoCache::new();
        cache
            .get_or_try_insert_with("select", &("car", 10, 20), || Ok(1))
            .unwrap();
        cache
            .get_or_try_insert_with("select", &("car", 10, 21), || Ok(2))
            .unwrap();
        cache
            .get_or_try_insert_with("other", &("car", 10, 20), || Ok(3))
            .unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let mut cache = MemoCache::new();
        cache.get_or_try_insert_with("step", "k", || Ok(1)).unwrap();

        assert!(cache.invalidate("step", "k").unwrap());
        assert!(!cache.invalidate("step", "k").unwrap());

        let value = cache.get_or_try_insert_with("step", "k", || Ok(2)).unwrap();
        assert_eq!(*value, 2);
    }

    #[test]
    fn errors_are_not_cached() {
        let mut cache: MemoCache<u32> = MemoCache::new();
        let failed = cache.get_or_try_insert_with("step", "k", || {
            Err(LensError::Config("boom".into()))
        });
        assert!(failed.is_err());
        assert!(cache.is_empty());
    }
}
