/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Bounded cache with age based eviction, shared by the memoized solvers

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

/// Quantize a float for use in a hash key
///
/// Values that agree to about twelve significant digits map to the same key.
pub fn float_key(value: f64) -> i64 {
    if value == 0.0 || !value.is_finite() {
        return value.to_bits() as i64;
    }
    let exponent = value.abs().log10().floor() as i32;
    let mantissa = value / 10f64.powi(exponent);
    ((mantissa * 1e11).round() as i64).wrapping_mul(1000) + exponent as i64
}

/// Cache with size limit and time-based eviction
#[derive(Debug)]
pub struct LimitedCache<K, V> {
    /// Maximum number of elements to store
    max_size: usize,
    /// Internal storage
    data: HashMap<K, (V, Instant)>,
    /// Maximum age of cache entries in seconds
    max_age: u64,
}

impl<K: Eq + Hash + Clone, V: Clone> LimitedCache<K, V> {
    /// Create a cache holding at most `max_size` entries for `max_age` seconds
    pub fn new(max_size: usize, max_age: u64) -> Self {
        Self {
            max_size: max_size.max(1),
            data: HashMap::with_capacity(max_size),
            max_age,
        }
    }

    /// Look up an entry, refreshing its timestamp on a hit
    pub fn get(&mut self, key: &K) -> Option<V> {
        let (value, timestamp) = self.data.get(key).map(|(v, ts)| (v.clone(), *ts))?;

        if timestamp.elapsed().as_secs() <= self.max_age {
            self.data.insert(key.clone(), (value.clone(), Instant::now()));
            Some(value)
        } else {
            self.data.remove(key);
            None
        }
    }

    /// Insert an entry, evicting stale and then oldest entries when full
    pub fn insert(&mut self, key: K, value: V) {
        self.evict_old_entries();

        if self.data.len() >= self.max_size && !self.data.contains_key(&key) {
            self.remove_oldest_entry();
        }

        self.data.insert(key, (value, Instant::now()));
    }

    fn evict_old_entries(&mut self) {
        let max_age = self.max_age;
        self.data
            .retain(|_, (_, timestamp)| timestamp.elapsed().as_secs() <= max_age);
    }

    fn remove_oldest_entry(&mut self) {
        let oldest_key = self
            .data
            .iter()
            .min_by_key(|(_, (_, timestamp))| *timestamp)
            .map(|(k, _)| k.clone());

        if let Some(key) = oldest_key {
            self.data.remove(&key);
        }
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
