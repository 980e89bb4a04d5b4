/*
MIT License

Copyright (c) 2025 Ameyanagi
*/

//! Memoized solvers for repeated calls with identical arguments, e.g. inside a fit

use super::common::Concentration;
use super::errors::Result;
use super::percus_yevick::percus_yevick;
use super::rmsa::{rmsa, RmsaConfig, RootSelection};
use crate::data::DataArray;
use crate::utils::cache::float_key;
use crate::utils::LimitedCache;
use log::trace;
use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

/// Entries per memoized function
pub const MEMO_SIZE: usize = 128;

/// Lifetime of a memoized result in seconds
const MEMO_AGE: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MemoKey {
    q: Vec<i64>,
    params: Vec<i64>,
}

impl MemoKey {
    fn new(q: &[f64], params: &[f64]) -> Self {
        Self {
            q: q.iter().map(|&v| float_key(v)).collect(),
            params: params.iter().map(|&v| float_key(v)).collect(),
        }
    }
}

type Memo = Lazy<RwLock<LimitedCache<MemoKey, Arc<DataArray>>>>;

static RMSA_CACHE: Memo = Lazy::new(|| RwLock::new(LimitedCache::new(MEMO_SIZE, MEMO_AGE)));
static PY_CACHE: Memo = Lazy::new(|| RwLock::new(LimitedCache::new(MEMO_SIZE, MEMO_AGE)));

/// Encode the concentration, the leading tag tells molarity from volume fraction
fn concentration_params(concentration: Concentration) -> [f64; 2] {
    match concentration {
        Concentration::VolumeFraction(v) => [0.0, v],
        Concentration::Molarity(m) => [1.0, m],
    }
}

fn memoized<F>(cache: &Memo, name: &str, key: MemoKey, compute: F) -> Result<DataArray>
where
    F: FnOnce() -> Result<DataArray>,
{
    {
        // a poisoned lock still holds a consistent cache
        let mut guard = cache.write().unwrap_or_else(|e| e.into_inner());
        if let Some(hit) = guard.get(&key) {
            trace!("{name}: cache hit for {} wavevectors", key.q.len());
            return Ok(hit.as_ref().clone());
        }
    }
    let value = compute()?;
    let mut guard = cache.write().unwrap_or_else(|e| e.into_inner());
    guard.insert(key, Arc::new(value.clone()));
    Ok(value)
}

/// [`rmsa`] with results kept for up to 128 argument sets
pub fn rmsa_cached(
    q: &[f64],
    r: f64,
    scl: f64,
    gamma: f64,
    concentration: Concentration,
    config: &RmsaConfig,
) -> Result<DataArray> {
    let [tag, c] = concentration_params(concentration);
    let selection = match config.root_selection {
        RootSelection::Full => 0.0,
        RootSelection::HayterPenfold => 1.0,
    };
    let key = MemoKey::new(q, &[r, scl, gamma, tag, c, selection]);
    memoized(&RMSA_CACHE, "rmsa", key, || {
        rmsa(q, r, scl, gamma, concentration, config)
    })
}

/// [`percus_yevick`] with results kept for up to 128 argument sets
pub fn percus_yevick_cached(q: &[f64], r: f64, concentration: Concentration) -> Result<DataArray> {
    let [tag, c] = concentration_params(concentration);
    let key = MemoKey::new(q, &[r, tag, c]);
    memoized(&PY_CACHE, "percus_yevick", key, || percus_yevick(q, r, concentration))
}

/// Drop all memoized results
pub fn clear_caches() {
    for cache in [&RMSA_CACHE, &PY_CACHE] {
        cache.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}
