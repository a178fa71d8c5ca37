// font-resolver/src/cache.rs
//
// Copyright © 2019 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The engine cache: memoizes resolved engines per (request, script) with cost accounting and
//! timer-driven eviction.
//!
//! Costs are kept in kilobytes. Whenever the running total exceeds the ceiling, the ceiling is
//! raised to match and a fast decay timer is armed; each `timer_event` then halves the ceiling
//! (never below what is in use elsewhere, nor below the configured floor) and evicts
//! least-recently-used engines that nobody outside the cache holds. Once the ceiling stops
//! moving the timer slows down, and once it is back at the floor the timer stops.
//!
//! A cache belongs to one thread. `with_thread_cache` hands out the calling thread's instance
//! for a given database.

use log::debug;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::EngineRef;
use crate::request::FontRequest;
use crate::script::Script;

/// Default floor for the cost ceiling, in kilobytes.
pub const MIN_COST_KB: usize = 4 * 1024;
/// Default fast decay period.
pub const FAST_TIMEOUT: Duration = Duration::from_secs(10);
/// Default slow decay period.
pub const SLOW_TIMEOUT: Duration = Duration::from_secs(300);
/// Default number of entries above which inserting into an oversized cache sweeps first.
pub const DECREASE_TRIGGER_LIMIT: usize = 256;

static NEXT_CACHE_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_CACHES: RefCell<HashMap<u64, EngineCache>> = RefCell::new(HashMap::new());
}

/// Tuning knobs for an `EngineCache`.
///
/// This object supports a method chaining style for idiomatic initialization; e.g.
///
///     # use font_resolver::cache::CacheConfig;
///     let config = CacheConfig::new().min_cost_kb(1024).decrease_trigger_limit(64).clone();
#[derive(Clone, Debug, PartialEq)]
pub struct CacheConfig {
    /// The cost ceiling never decays below this many kilobytes.
    pub min_cost_kb: usize,
    /// Decay period while the ceiling is shrinking.
    pub fast_timeout: Duration,
    /// Decay period once shrinking has stalled.
    pub slow_timeout: Duration,
    /// Inserting into a cache with at least this many entries and a total above twice the
    /// floor sweeps first.
    pub decrease_trigger_limit: usize,
}

impl Default for CacheConfig {
    fn default() -> CacheConfig {
        CacheConfig {
            min_cost_kb: MIN_COST_KB,
            fast_timeout: FAST_TIMEOUT,
            slow_timeout: SLOW_TIMEOUT,
            decrease_trigger_limit: DECREASE_TRIGGER_LIMIT,
        }
    }
}

impl CacheConfig {
    /// Returns the default configuration.
    #[inline]
    pub fn new() -> CacheConfig {
        CacheConfig::default()
    }

    /// Sets the ceiling floor and returns this config for method chaining.
    #[inline]
    pub fn min_cost_kb(&mut self, min_cost_kb: usize) -> &mut CacheConfig {
        self.min_cost_kb = min_cost_kb;
        self
    }

    /// Sets the fast decay period and returns this config for method chaining.
    #[inline]
    pub fn fast_timeout(&mut self, fast_timeout: Duration) -> &mut CacheConfig {
        self.fast_timeout = fast_timeout;
        self
    }

    /// Sets the slow decay period and returns this config for method chaining.
    #[inline]
    pub fn slow_timeout(&mut self, slow_timeout: Duration) -> &mut CacheConfig {
        self.slow_timeout = slow_timeout;
        self
    }

    /// Sets the sweep-on-insert entry threshold and returns this config for method chaining.
    #[inline]
    pub fn decrease_trigger_limit(&mut self, decrease_trigger_limit: usize) -> &mut CacheConfig {
        self.decrease_trigger_limit = decrease_trigger_limit;
        self
    }
}

/// The state of the decay timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerState {
    /// No decay pending.
    Stopped,
    /// Decaying every `fast_timeout`.
    Fast,
    /// Decaying every `slow_timeout`.
    Slow,
}

/// Identifies a cached engine.
///
/// The whole normalized request takes part in equality and hashing, fallback order included.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// The request, or the resolved definition for single engines.
    pub def: FontRequest,
    /// The script the engine was resolved for.
    pub script: Script,
    /// Whether this key names a multi engine.
    pub multi: bool,
}

impl CacheKey {
    /// Creates a key.
    #[inline]
    pub fn new(def: FontRequest, script: Script, multi: bool) -> CacheKey {
        CacheKey { def, script, multi }
    }
}

/// One reference from the cache to an engine.
#[derive(Clone, Debug)]
pub struct CacheEntry {
    /// The engine.
    pub engine: EngineRef,
    /// Logical time of the last insert or hit.
    pub timestamp: u64,
    /// Number of lookups that found this entry.
    pub hits: u64,
}

/// The per-script engines resolved for one font request.
///
/// Shared between the cache and every `Font` built from the same request.
#[derive(Debug)]
pub struct EngineData {
    cache_id: u64,
    engines: Mutex<Vec<Option<EngineRef>>>,
}

impl EngineData {
    fn new(cache_id: u64) -> EngineData {
        EngineData {
            cache_id,
            engines: Mutex::new(vec![None; Script::COUNT]),
        }
    }

    /// The id of the cache that created this data.
    #[inline]
    pub fn cache_id(&self) -> u64 {
        self.cache_id
    }

    /// Returns the engine loaded for `script`, if any.
    pub fn engine(&self, script: Script) -> Option<EngineRef> {
        self.engines.lock()[script.index()].clone()
    }

    /// Stores the engine for `script`.
    pub fn set_engine(&self, script: Script, engine: EngineRef) {
        self.engines.lock()[script.index()] = Some(engine);
    }

    /// Stores `engine` for every script that has none yet.
    pub fn fill_empty(&self, engine: &EngineRef) {
        for slot in self.engines.lock().iter_mut() {
            if slot.is_none() {
                *slot = Some(engine.clone());
            }
        }
    }

    /// Drops every loaded engine.
    pub fn clear(&self) {
        for slot in self.engines.lock().iter_mut() {
            *slot = None;
        }
    }
}

/// Memoizes resolved engines with cost accounting and decay-timer eviction.
#[derive(Debug)]
pub struct EngineCache {
    id: u64,
    config: CacheConfig,
    binding: Option<(u64, u64)>,
    engines: HashMap<CacheKey, Vec<CacheEntry>>,
    engine_data: HashMap<FontRequest, Arc<EngineData>>,
    // Number of entries per distinct engine, keyed by the engine's address. An engine has an
    // entry here exactly as long as the cache holds it.
    engine_counts: HashMap<usize, usize>,
    total_cost: usize,
    max_cost: usize,
    timer: TimerState,
    clock: u64,
}

impl Default for EngineCache {
    fn default() -> EngineCache {
        EngineCache::new(CacheConfig::default())
    }
}

impl EngineCache {
    /// Creates an empty cache with a fresh id.
    pub fn new(config: CacheConfig) -> EngineCache {
        let max_cost = config.min_cost_kb;
        EngineCache {
            id: NEXT_CACHE_ID.fetch_add(1, Ordering::Relaxed),
            config,
            binding: None,
            engines: HashMap::new(),
            engine_data: HashMap::new(),
            engine_counts: HashMap::new(),
            total_cost: 0,
            max_cost,
            timer: TimerState::Stopped,
            clock: 0,
        }
    }

    /// The unique id of this cache.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The configuration this cache was created with.
    #[inline]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Ties this cache to a database generation. A cache that was bound to a different one holds
    /// engines for fonts that may no longer exist, so it is cleared first.
    pub fn bind(&mut self, database_id: u64, generation: u64) {
        let binding = Some((database_id, generation));
        if self.binding.is_some() && self.binding != binding {
            debug!(
                "engine cache {} is stale ({:?} -> {:?}), clearing",
                self.id, self.binding, binding
            );
            self.clear();
        }
        self.binding = binding;
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    /// Looks up an engine. A hit refreshes the entry's timestamp.
    pub fn find_engine(&mut self, key: &CacheKey) -> Option<EngineRef> {
        let timestamp = self.tick();
        let entry = self.engines.get_mut(key)?.last_mut()?;
        entry.hits += 1;
        entry.timestamp = timestamp;
        Some(entry.engine.clone())
    }

    /// Caches `engine` under `key`.
    ///
    /// With `insert_multi`, the entry is added next to existing ones for the key; otherwise it
    /// replaces them. The engine's cost is charged only the first time the cache takes hold of
    /// it, however many keys it ends up under.
    pub fn insert_engine(&mut self, key: CacheKey, engine: EngineRef, insert_multi: bool) {
        if self.should_sweep_before_insert() {
            self.decrease_cache();
        }

        debug!(
            "EngineCache({}): inserting new engine {:p}, type {:?}",
            self.id,
            Arc::as_ptr(&engine),
            engine.engine_type()
        );

        let entry = CacheEntry {
            engine: engine.clone(),
            timestamp: self.tick(),
            hits: 0,
        };

        let entries = self.engines.entry(key).or_insert_with(Vec::new);
        let replaced = if insert_multi {
            vec![]
        } else {
            mem::replace(entries, vec![])
        };
        entries.push(entry);

        let count = self.engine_counts.entry(engine_address(&engine)).or_insert(0);
        *count += 1;
        if *count == 1 {
            self.increase_cost(engine.cache_cost());
        }

        for entry in replaced {
            self.release_entry(&entry.engine);
        }
    }

    fn release_entry(&mut self, engine: &EngineRef) {
        let address = engine_address(engine);
        let remaining = match self.engine_counts.get_mut(&address) {
            Some(count) => {
                *count -= 1;
                *count
            }
            None => return,
        };
        if remaining == 0 {
            self.engine_counts.remove(&address);
            self.decrease_cost(engine.cache_cost());
        }
    }

    /// Looks up the engine data for a request.
    pub fn find_engine_data(&self, def: &FontRequest) -> Option<Arc<EngineData>> {
        self.engine_data.get(def).cloned()
    }

    /// Creates empty engine data owned by this cache.
    pub fn new_engine_data(&self) -> Arc<EngineData> {
        Arc::new(EngineData::new(self.id))
    }

    /// Caches `engine_data` for `def`, charging its size once.
    pub fn insert_engine_data(&mut self, def: FontRequest, engine_data: Arc<EngineData>) {
        if self.should_sweep_before_insert() {
            self.decrease_cache();
        }

        debug!("EngineCache({}): inserting engine data for {:?}", self.id, def.family);
        if self.engine_data.insert(def, engine_data).is_none() {
            self.increase_cost(mem::size_of::<EngineData>());
        }
    }

    fn should_sweep_before_insert(&self) -> bool {
        self.total_cost > 2 * self.config.min_cost_kb
            && self.len() + self.engine_data.len() >= self.config.decrease_trigger_limit
    }

    /// Adds `bytes`, rounded to whole kilobytes (at least one), to the running total.
    ///
    /// Going over the ceiling raises it and makes the decay timer fast.
    pub fn increase_cost(&mut self, bytes: usize) {
        let kb = cost_in_kb(bytes);
        self.total_cost += kb;
        debug!(
            "  COST: increased {} kb, total_cost {} kb, max_cost {} kb",
            kb, self.total_cost, self.max_cost
        );

        if self.total_cost > self.max_cost {
            self.max_cost = self.total_cost;
            if self.timer != TimerState::Fast {
                debug!("  TIMER: starting fast timer ({:?})", self.config.fast_timeout);
                self.timer = TimerState::Fast;
            }
        }
    }

    /// Subtracts `bytes`, rounded to whole kilobytes (at least one), from the running total.
    ///
    /// # Panics
    ///
    /// Panics if that would take the total below zero, which means the accounting is broken.
    pub fn decrease_cost(&mut self, bytes: usize) {
        let kb = cost_in_kb(bytes);
        assert!(
            kb <= self.total_cost,
            "EngineCache::decrease_cost: cost {} kb is greater than total_cost {} kb",
            kb,
            self.total_cost
        );
        self.total_cost -= kb;
        debug!(
            "  COST: decreased {} kb, total_cost {} kb, max_cost {} kb",
            kb, self.total_cost, self.max_cost
        );
    }

    /// Runs one tick of the decay timer.
    pub fn timer_event(&mut self) {
        if self.total_cost <= self.max_cost && self.max_cost <= self.config.min_cost_kb {
            debug!("  TIMER: stopping timer, total_cost {} kb", self.total_cost);
            self.timer = TimerState::Stopped;
            return;
        }
        self.decrease_cache();
    }

    /// Lowers the ceiling and evicts what nobody outside the cache holds until the total fits.
    pub fn decrease_cache(&mut self) {
        debug!("EngineCache({}): sweeping, {} entries", self.id, self.len());

        let in_use_cost = self.in_use_cost();
        let new_max_cost = (self.max_cost / 2)
            .max(in_use_cost)
            .max(self.config.min_cost_kb);
        debug!(
            "  in use: {} kb, total: {} kb, max: {} kb, new max: {} kb",
            in_use_cost, self.total_cost, self.max_cost, new_max_cost
        );

        if new_max_cost == self.max_cost {
            if self.timer == TimerState::Fast {
                debug!("  cannot shrink cache, slowing timer");
                self.timer = TimerState::Slow;
            }
            return;
        } else if self.timer != TimerState::Fast {
            debug!("  dropping into passing gear");
            self.timer = TimerState::Fast;
        }
        self.max_cost = new_max_cost;

        // Engine data that no font holds any more.
        let unused: Vec<FontRequest> = self
            .engine_data
            .iter()
            .filter(|&(_, data)| Arc::strong_count(data) == 1)
            .map(|(def, _)| def.clone())
            .collect();
        for def in unused {
            self.engine_data.remove(&def);
            self.decrease_cost(mem::size_of::<EngineData>());
        }

        // Least recently used engines that only the cache holds, one at a time.
        while self.total_cost > self.max_cost {
            let victim = match self.least_recently_used_unheld() {
                Some(victim) => victim,
                None => break,
            };
            let address = engine_address(&victim);
            debug!(
                "  evicting engine {:p} ({} entries)",
                Arc::as_ptr(&victim),
                self.engine_counts.get(&address).cloned().unwrap_or(0)
            );

            for entries in self.engines.values_mut() {
                entries.retain(|entry| !Arc::ptr_eq(&entry.engine, &victim));
            }
            self.engines.retain(|_, entries| !entries.is_empty());
            self.engine_counts.remove(&address);
            self.decrease_cost(victim.cache_cost());
        }

        debug!(
            "  after sweep: {} entries, total_cost {} kb, max_cost {} kb",
            self.len(),
            self.total_cost,
            self.max_cost
        );
    }

    fn in_use_cost(&self) -> usize {
        let mut in_use_cost = 0;

        for data in self.engine_data.values() {
            if Arc::strong_count(data) > 1 {
                in_use_cost += mem::size_of::<EngineData>().max(1024);
            }
        }

        for entry in self.engines.values().flatten() {
            let count = self.entry_count(&entry.engine);
            if count > 0 && Arc::strong_count(&entry.engine) > count {
                in_use_cost += entry.engine.cache_cost() / count;
            }
        }

        // One byte per entry, for rounding.
        in_use_cost += self.len();

        (in_use_cost + 512) / 1024
    }

    fn least_recently_used_unheld(&self) -> Option<EngineRef> {
        let mut best: Option<&CacheEntry> = None;
        for entry in self.engines.values().flatten() {
            if Arc::strong_count(&entry.engine) != self.entry_count(&entry.engine) {
                continue;
            }
            let better = match best {
                None => true,
                Some(best) => (entry.timestamp, entry.hits) < (best.timestamp, best.hits),
            };
            if better {
                best = Some(entry);
            }
        }
        best.map(|entry| entry.engine.clone())
    }

    /// Drops every engine and every engine data, and resets the ceiling to its floor.
    ///
    /// Fonts holding engine data find it emptied and load their engines again.
    pub fn clear(&mut self) {
        debug!("EngineCache({}): clearing {} entries", self.id, self.len());

        for data in self.engine_data.values() {
            data.clear();
        }
        self.engine_data.clear();

        // Dropping a multi engine may release the last hold on its sub-engines; those go with the
        // map, so one pass suffices.
        self.engines.clear();
        self.engine_counts.clear();

        self.total_cost = 0;
        self.max_cost = self.config.min_cost_kb;
        self.timer = TimerState::Stopped;
    }

    /// The running total, in kilobytes.
    #[inline]
    pub fn total_cost(&self) -> usize {
        self.total_cost
    }

    /// The current ceiling, in kilobytes.
    #[inline]
    pub fn max_cost(&self) -> usize {
        self.max_cost
    }

    /// The number of cache entries pointing at `engine`.
    pub fn entry_count(&self, engine: &EngineRef) -> usize {
        self.engine_counts
            .get(&engine_address(engine))
            .cloned()
            .unwrap_or(0)
    }

    /// The number of distinct engines held.
    #[inline]
    pub fn engine_count(&self) -> usize {
        self.engine_counts.len()
    }

    /// The number of engine data held.
    #[inline]
    pub fn engine_data_count(&self) -> usize {
        self.engine_data.len()
    }

    /// The number of engine entries.
    pub fn len(&self) -> usize {
        self.engines.values().map(Vec::len).sum()
    }

    /// Returns true if the cache holds neither engines nor engine data.
    pub fn is_empty(&self) -> bool {
        self.engines.is_empty() && self.engine_data.is_empty()
    }

    /// The entries cached under `key`, oldest first.
    pub fn entries(&self, key: &CacheKey) -> &[CacheEntry] {
        self.engines.get(key).map(|entries| &entries[..]).unwrap_or(&[])
    }

    /// The state of the decay timer.
    #[inline]
    pub fn timer_state(&self) -> TimerState {
        self.timer
    }

    /// When the host should next call `timer_event`, or `None` if no decay is pending.
    pub fn next_timeout(&self) -> Option<Duration> {
        match self.timer {
            TimerState::Stopped => None,
            TimerState::Fast => Some(self.config.fast_timeout),
            TimerState::Slow => Some(self.config.slow_timeout),
        }
    }
}

#[inline]
fn engine_address(engine: &EngineRef) -> usize {
    Arc::as_ptr(engine) as *const () as usize
}

#[inline]
fn cost_in_kb(bytes: usize) -> usize {
    ((bytes + 512) / 1024).max(1)
}

/// Runs `f` with the calling thread's cache for `database_id`, creating it on first use.
///
/// # Panics
///
/// Panics if called from within `f`.
pub fn with_thread_cache<F, R>(database_id: u64, config: &CacheConfig, f: F) -> R
where
    F: FnOnce(&mut EngineCache) -> R,
{
    THREAD_CACHES.with(|caches| {
        let mut caches = caches.borrow_mut();
        let cache = caches
            .entry(database_id)
            .or_insert_with(|| EngineCache::new(config.clone()));
        f(cache)
    })
}

/// Drops the calling thread's cache for `database_id`, if any.
pub(crate) fn remove_thread_cache(database_id: u64) {
    let _ = THREAD_CACHES.try_with(|caches| {
        if let Ok(mut caches) = caches.try_borrow_mut() {
            caches.remove(&database_id);
        }
    });
}
