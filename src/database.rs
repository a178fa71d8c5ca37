// font-resolver/src/database.rs
//
// Copyright © 2019 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The font database: resolves requests to engines.
//!
//! A `FontDatabase` owns a source, the description store, and the fallbacks cache, all behind one
//! re-entrant lock that is held for the whole of a resolution. Engines are cached per thread; see
//! `cache::with_thread_cache`. Every resolution succeeds: when nothing matches, the result is a
//! box placeholder engine.

use log::{debug, warn};
use lru::LruCache;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{self, Debug, Formatter};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::{self, CacheConfig, CacheKey, EngineCache};
use crate::engine::{Engine, EngineRef, EngineType};
use crate::error::SelectionError;
use crate::family_name::{self, FamilyName};
use crate::font::Font;
use crate::matching::{self, FontMatch};
use crate::properties::{Stretch, Style, StyleKey, Weight};
use crate::request::{FontRequest, StyleHint, StyleStrategy};
use crate::script::{Script, WritingSystem, WritingSystems};
use crate::source::{self, Source};
use crate::store::FontStore;

/// The resolution used to convert point sizes when none is given.
pub const DEFAULT_DPI: f32 = 96.0;
/// Default capacity of the fallbacks cache.
pub const FALLBACKS_CACHE_CAPACITY: usize = 64;

static NEXT_DATABASE_ID: AtomicU64 = AtomicU64::new(1);

/// Settings for a `FontDatabase`.
///
/// This object supports a method chaining style for idiomatic initialization; e.g.
///
///     # use font_resolver::database::DatabaseConfig;
///     let config = DatabaseConfig::new().dpi(72.0).default_family("Arial").clone();
#[derive(Clone, Debug, PartialEq)]
pub struct DatabaseConfig {
    /// Resolution for point-to-pixel conversion.
    pub dpi: f32,
    /// A family tried after the requested one and before "any family".
    pub default_family: Option<String>,
    /// Matching stops at the first family scoring below this.
    pub short_circuit_score: u32,
    /// Number of fallback lists remembered.
    pub fallbacks_cache_capacity: usize,
    /// Configuration of the per-thread engine caches.
    pub cache: CacheConfig,
}

impl Default for DatabaseConfig {
    fn default() -> DatabaseConfig {
        DatabaseConfig {
            dpi: DEFAULT_DPI,
            default_family: None,
            short_circuit_score: matching::SHORT_CIRCUIT_SCORE,
            fallbacks_cache_capacity: FALLBACKS_CACHE_CAPACITY,
            cache: CacheConfig::default(),
        }
    }
}

impl DatabaseConfig {
    /// Returns the default configuration.
    #[inline]
    pub fn new() -> DatabaseConfig {
        DatabaseConfig::default()
    }

    /// Sets the resolution and returns this config for method chaining.
    #[inline]
    pub fn dpi(&mut self, dpi: f32) -> &mut DatabaseConfig {
        self.dpi = dpi;
        self
    }

    /// Sets the default family and returns this config for method chaining.
    #[inline]
    pub fn default_family(&mut self, family: &str) -> &mut DatabaseConfig {
        self.default_family = Some(family.to_owned());
        self
    }

    /// Sets the short-circuit score and returns this config for method chaining.
    ///
    /// 0 disables the early exit, so every candidate family is scored.
    #[inline]
    pub fn short_circuit_score(&mut self, score: u32) -> &mut DatabaseConfig {
        self.short_circuit_score = score;
        self
    }

    /// Sets the fallbacks cache capacity and returns this config for method chaining.
    #[inline]
    pub fn fallbacks_cache_capacity(&mut self, capacity: usize) -> &mut DatabaseConfig {
        self.fallbacks_cache_capacity = capacity;
        self
    }

    /// Sets the engine cache configuration and returns this config for method chaining.
    #[inline]
    pub fn cache(&mut self, cache: CacheConfig) -> &mut DatabaseConfig {
        self.cache = cache;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct FallbacksKey {
    family: String,
    style: Style,
    style_hint: StyleHint,
    script: Script,
}

struct State {
    store: FontStore,
    fallbacks_cache: LruCache<FallbacksKey, Vec<String>>,
    substitutions: HashMap<String, Vec<String>>,
    generation: u64,
}

/// Resolves font requests to engines.
pub struct FontDatabase<S> {
    id: u64,
    source: S,
    config: DatabaseConfig,
    state: ReentrantMutex<RefCell<State>>,
}

impl<S> FontDatabase<S>
where
    S: Source,
{
    /// Creates a database over `source` with the default configuration.
    pub fn new(source: S) -> FontDatabase<S> {
        FontDatabase::with_config(source, DatabaseConfig::default())
    }

    /// Creates a database over `source`.
    pub fn with_config(source: S, config: DatabaseConfig) -> FontDatabase<S> {
        let capacity =
            NonZeroUsize::new(config.fallbacks_cache_capacity).unwrap_or(NonZeroUsize::MIN);
        FontDatabase {
            id: NEXT_DATABASE_ID.fetch_add(1, Ordering::Relaxed),
            source,
            config,
            state: ReentrantMutex::new(RefCell::new(State {
                store: FontStore::new(),
                fallbacks_cache: LruCache::new(capacity),
                substitutions: HashMap::new(),
                generation: 0,
            })),
        }
    }

    /// The unique id of this database.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The source fonts come from.
    #[inline]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The configuration.
    #[inline]
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Returns an engine for `request` and `script`, using the calling thread's cache.
    ///
    /// Never fails: if nothing can be matched or built, the result is a box placeholder.
    pub fn resolve(&self, request: &FontRequest, script: Script) -> EngineRef {
        self.with_cache(|cache| self.resolve_in(cache, request, script))
    }

    /// Returns an engine for `request` and `script`, using `cache`.
    pub fn resolve_in(
        &self,
        cache: &mut EngineCache,
        request: &FontRequest,
        script: Script,
    ) -> EngineRef {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        cache.bind(self.id, state.generation);

        let request = request.normalized(self.config.dpi);
        let engine = self.find_font(&mut state, cache, &request, script);
        self.release_handles(&mut state.store);
        engine
    }

    /// Runs `f` with the calling thread's engine cache for this database.
    pub fn with_cache<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut EngineCache) -> R,
    {
        let guard = self.state.lock();
        let generation = guard.borrow().generation;
        cache::with_thread_cache(self.id, &self.config.cache, |cache| {
            cache.bind(self.id, generation);
            f(cache)
        })
    }

    /// Runs `f` with the description store, initializing it first if needed.
    pub fn with_store<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&FontStore) -> R,
    {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        self.ensure_initialized(&mut state.store);
        f(&state.store)
    }

    /// Matches `request` against the store without building an engine.
    ///
    /// The family may carry a foundry (`"Family [Foundry]"`). Returns `None` when no family
    /// supports `script`.
    pub fn match_font(&self, request: &FontRequest, script: Script) -> Option<FontMatch> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let request = request.normalized(self.config.dpi);
        let name = FamilyName::parse(&request.family);
        let result = self.match_in(&mut state, script, &request, &name, &[]).ok();
        self.release_handles(&mut state.store);
        result
    }

    /// Drops everything derived from the installed font set.
    ///
    /// Engines already handed out stay valid; later resolutions build new ones. Caches on other
    /// threads notice the change on their next use.
    pub fn invalidate(&self) {
        let guard = self.state.lock();
        let generation = {
            let mut state = guard.borrow_mut();
            state.generation += 1;
            debug!("invalidating font database {} (generation {})", self.id, state.generation);

            for handle in state.store.free() {
                self.source.release_handle(handle);
            }
            state.fallbacks_cache.clear();
            state.generation
        };
        self.source.invalidate();

        cache::with_thread_cache(self.id, &self.config.cache, |cache| {
            cache.clear();
            cache.bind(self.id, generation);
        });
    }

    /// Clears the calling thread's engine cache.
    pub fn clear_cache(&self) {
        self.with_cache(EngineCache::clear);
    }

    /// Runs one tick of the calling thread's cache decay timer. Hosts call this when
    /// `EngineCache::next_timeout` elapses.
    pub fn cache_timer_event(&self) {
        self.with_cache(EngineCache::timer_event);
    }

    /// Makes `substitute` a family to try after `family`.
    pub fn insert_substitution(&self, family: &str, substitute: &str) {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let substitutes = state
            .substitutions
            .entry(family.to_lowercase())
            .or_insert_with(Vec::new);
        if !substitutes
            .iter()
            .any(|existing| family_name::eq_ignore_case(existing, substitute))
        {
            substitutes.push(substitute.to_owned());
        }
    }

    /// Returns the substitutes registered for `family`.
    pub fn substitutes(&self, family: &str) -> Vec<String> {
        let guard = self.state.lock();
        let state = guard.borrow();
        state
            .substitutions
            .get(&family.to_lowercase())
            .cloned()
            .unwrap_or_else(Vec::new)
    }

    /// Lists the families `request` names followed by their substitutes.
    pub fn family_list(&self, request: &FontRequest) -> Vec<String> {
        let guard = self.state.lock();
        let state = guard.borrow();
        family_list(&state, request)
    }

    /// Returns the families to try when `family` cannot render `script`.
    ///
    /// Only families known to the store are listed, without duplicates, those supporting the
    /// script first. Results are memoized until `invalidate`.
    pub fn fallbacks_for_family(
        &self,
        family: &str,
        style: Style,
        style_hint: StyleHint,
        script: Script,
    ) -> Vec<String> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        let fallbacks = self.fallbacks_in(&mut state, family, style, style_hint, script);
        self.release_handles(&mut state.store);
        fallbacks
    }

    /// Returns the engine for fallback family `index` of a multi engine, resolving it on first
    /// use with the calling thread's cache. Returns `None` if `multi` is not a multi engine or
    /// has no such fallback.
    pub fn fallback_engine(&self, multi: &Engine, index: usize) -> Option<EngineRef> {
        self.with_cache(|cache| self.fallback_engine_in(cache, multi, index))
    }

    /// Like `fallback_engine`, with an explicit cache.
    pub fn fallback_engine_in(
        &self,
        cache: &mut EngineCache,
        multi: &Engine,
        index: usize,
    ) -> Option<EngineRef> {
        let multi_engine = multi.as_multi()?;
        if let Some(engine) = multi_engine.loaded_fallback(index) {
            return Some(engine);
        }
        let family = multi_engine.fallback_families().get(index)?;

        let mut request = multi.def();
        request.style_strategy |= StyleStrategy::NO_FONT_MERGING;
        request.family = family.clone();

        // The script was already taken into account when the fallback list was built.
        let engine = self.resolve_in(cache, &request, Script::Common);
        engine.update_def(|def| {
            def.weight = request.weight;
            if request.style != Style::Normal {
                def.style = request.style;
            }
        });
        Some(multi_engine.store_fallback(index, engine))
    }

    pub(crate) fn load(&self, cache: &mut EngineCache, font: &mut Font, script: Script) -> EngineRef {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        cache.bind(self.id, state.generation);

        let mut request = font.request.clone();
        if request.pixel_size < 0.0 {
            let pixel_size = ((request.point_size * font.dpi / 72.0) * 100.0 + 0.5).floor() / 100.0;
            request.pixel_size = pixel_size.round();
        }
        if request.point_size < 0.0 {
            request.point_size = request.pixel_size * 72.0 / font.dpi;
        }

        let mut families = family_list(&state, &request);
        request.family = families.join(",");

        let engine_data = match font.engine_data {
            Some(ref engine_data) => engine_data.clone(),
            None => {
                let engine_data = match cache.find_engine_data(&request) {
                    Some(engine_data) => engine_data,
                    None => {
                        let engine_data = cache.new_engine_data();
                        cache.insert_engine_data(request.clone(), engine_data.clone());
                        engine_data
                    }
                };
                font.engine_data = Some(engine_data.clone());
                engine_data
            }
        };

        if let Some(engine) = engine_data.engine(script) {
            return engine;
        }

        let mut candidates = vec![];
        if !families.is_empty() {
            let primary = families.remove(0);
            for fallback in families {
                if !request
                    .fallback_families
                    .iter()
                    .any(|existing| family_name::eq_ignore_case(existing, &fallback))
                {
                    request.fallback_families.push(fallback);
                }
            }
            let default_family = self
                .config
                .default_family
                .as_ref()
                .filter(|family| !family_name::eq_ignore_case(family, &primary))
                .cloned();
            candidates.push(primary);
            candidates.extend(default_family);
        }

        let mut engine = None;
        for candidate in candidates {
            request.family = candidate;
            let found = self.find_font(&mut state, cache, &request, script);
            if found.engine_type() != EngineType::Box {
                engine = Some(found);
                break;
            }
            // The requested fallbacks were already tried with the first family.
            request.fallback_families.clear();
        }
        let engine = match engine {
            Some(engine) => engine,
            None => {
                // The empty family finds the first font supporting the script.
                request.family = String::new();
                self.find_font(&mut state, cache, &request, script)
            }
        };
        self.release_handles(&mut state.store);

        if font.dpi > 0.0 {
            let dpi = font.dpi;
            engine.update_def(|def| def.point_size = def.pixel_size * 72.0 / dpi);
        }

        if engine.is_symbol()
            || font
                .request
                .style_strategy
                .contains(StyleStrategy::NO_FONT_MERGING)
        {
            engine_data.fill_empty(&engine);
        } else {
            engine_data.set_engine(script, engine.clone());
        }
        engine
    }

    /// Lists families that support `writing_system`.
    ///
    /// Families with more than one foundry are listed once per foundry, as `"Family [Foundry]"`.
    pub fn families(&self, writing_system: WritingSystem) -> Vec<String> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        self.ensure_initialized(&mut state.store);

        let mut families = vec![];
        let mut index = 0;
        while index < state.store.len() {
            index = state.store.ensure_populated(index, &self.source);
            let family = state.store.family_at(index);
            index += 1;

            if family.foundries().is_empty() || !family.writing_systems.supports(writing_system) {
                continue;
            }
            if family.foundries().len() == 1 {
                families.push(family.name.clone());
                continue;
            }
            for foundry in family.foundries() {
                if foundry.name.is_empty() {
                    families.push(family.name.clone());
                } else {
                    families.push(format!("{} [{}]", family.name, foundry.name));
                }
            }
        }
        self.release_handles(&mut state.store);
        families
    }

    /// Returns true if some family answers to `family`, by name or alias.
    pub fn has_family(&self, family: &str) -> bool {
        let name = FamilyName::parse(family);
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        self.ensure_initialized(&mut state.store);
        let resolved = self.source.resolve_family_alias(&state.store, &name.family);
        state.store.contains(&resolved)
    }

    /// Returns the writing systems `family` supports; empty for an unknown family.
    pub fn writing_systems(&self, family: &str) -> WritingSystems {
        self.with_family(family, |family| family.writing_systems)
            .unwrap_or_else(WritingSystems::empty)
    }

    /// Returns true if `family` is fixed-pitch.
    pub fn is_fixed_pitch(&self, family: &str) -> bool {
        self.with_family(family, |family| family.fixed_pitch)
            .unwrap_or(false)
    }

    /// Returns true if `family` has a smoothly scalable style named `style_name`. An empty style
    /// name matches any style.
    pub fn is_smoothly_scalable(&self, family: &str, style_name: &str) -> bool {
        let name = FamilyName::parse(family);
        let key = StyleKey::from_style_name(style_name);
        self.with_family(family, |family| {
            family
                .foundries()
                .iter()
                .filter(|foundry| {
                    name.foundry.is_empty()
                        || family_name::eq_ignore_case(&foundry.name, &name.foundry)
                })
                .flat_map(|foundry| foundry.styles())
                .filter(|style| {
                    style_name.is_empty()
                        || style.style_name == style_name
                        || (style.style_name.is_empty() && style.key.matches(&key))
                })
                .any(|style| style.smoothly_scalable)
        })
        .unwrap_or(false)
    }

    /// Lists the style names of `family`, in registration order.
    pub fn styles(&self, family: &str) -> Vec<String> {
        let name = FamilyName::parse(family);
        self.with_family(family, |family| {
            let mut styles: Vec<String> = vec![];
            let foundries = family.foundries().iter().filter(|foundry| {
                name.foundry.is_empty() || family_name::eq_ignore_case(&foundry.name, &name.foundry)
            });
            for style in foundries.flat_map(|foundry| foundry.styles()) {
                let style_name = if style.style_name.is_empty() {
                    style_string(&style.key)
                } else {
                    style.style_name.clone()
                };
                if !styles.contains(&style_name) {
                    styles.push(style_name);
                }
            }
            styles
        })
        .unwrap_or_else(Vec::new)
    }

    fn with_family<F, R>(&self, family: &str, f: F) -> Option<R>
    where
        F: FnOnce(&crate::family::Family) -> R,
    {
        let name = FamilyName::parse(family);
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        self.ensure_initialized(&mut state.store);

        let resolved = self.source.resolve_family_alias(&state.store, &name.family);
        let index = state
            .store
            .families()
            .iter()
            .position(|family| family.matches_name(&resolved))?;
        let index = state.store.ensure_populated(index, &self.source);
        self.release_handles(&mut state.store);
        Some(f(state.store.family_at(index)))
    }

    fn ensure_initialized(&self, store: &mut FontStore) {
        if store.initialized {
            return;
        }
        debug!("populating font database {}", self.id);
        self.source.populate_font_database(store);
        store.initialized = true;
        self.release_handles(store);
    }

    fn release_handles(&self, store: &mut FontStore) {
        for handle in store.take_released_handles() {
            self.source.release_handle(handle);
        }
    }

    fn match_in(
        &self,
        state: &mut State,
        script: Script,
        request: &FontRequest,
        name: &FamilyName,
        blacklist: &[String],
    ) -> Result<FontMatch, SelectionError> {
        self.ensure_initialized(&mut state.store);
        matching::match_font(
            &mut state.store,
            &self.source,
            script,
            request,
            &name.family,
            &name.foundry,
            blacklist,
            self.config.short_circuit_score,
        )
        .ok_or(SelectionError::NotFound)
    }

    fn find_font(
        &self,
        state: &mut State,
        cache: &mut EngineCache,
        request: &FontRequest,
        script: Script,
    ) -> EngineRef {
        let multi = request.merges_fonts();
        let key = CacheKey::new(request.clone(), script, multi);
        if let Some(engine) = cache.find_engine(&key) {
            debug!("find_font: cache hit for {:?}, script {:?}", request.family, script);
            return engine;
        }

        let match_script = if multi { Script::Common } else { script };
        let name = FamilyName::parse(&request.family);
        let mut blacklist: Vec<String> = vec![];

        let mut found = self.match_in(state, match_script, request, &name, &blacklist);
        if found.is_err() && self.source.populate_family_aliases(&mut state.store) {
            found = self.match_in(state, match_script, request, &name, &blacklist);
        }

        let mut engine = None;
        match found {
            Ok(mut found) => {
                // An empty family would let the source run its own matching.
                let mut load_def = request.clone();
                if load_def.family.is_empty() {
                    load_def.family = found.family.clone();
                }
                match self.load_engine(state, cache, script, &load_def, &found) {
                    Ok(loaded) => {
                        found.relocate(&state.store);
                        self.init_font_def(state, &found, request, &loaded, multi);
                        if load_def.family != request.family {
                            cache.insert_engine(key.clone(), loaded.clone(), false);
                        }
                        engine = Some(loaded);
                    }
                    Err(error) => {
                        debug!("find_font: {}", error);
                        blacklist.push(found.family);
                    }
                }
            }
            Err(error) => debug!("find_font: {} for {:?}", error, request.family),
        }

        if engine.is_none() && !request.family.is_empty() {
            let mut fallbacks = request.fallback_families.clone();
            fallbacks.extend(self.fallbacks_in(
                state,
                &request.family,
                request.style,
                request.style_hint,
                script,
            ));
            if script.is_complex() {
                fallbacks.push(String::new());
            }

            for fallback in fallbacks {
                let mut def = request.clone();
                def.family = fallback;
                engine = self.find_fallback(state, cache, &def, script, multi, &mut blacklist);
                if engine.is_some() {
                    break;
                }
            }
        }

        match engine {
            Some(engine) => engine,
            None => {
                let pixel_size = request.match_pixel_size();
                debug!("find_font: nothing found, using a box of {} pixels", pixel_size);
                let engine = Arc::new(Engine::placeholder(pixel_size));
                cache.insert_engine(key, engine.clone(), false);
                engine
            }
        }
    }

    fn find_fallback(
        &self,
        state: &mut State,
        cache: &mut EngineCache,
        def: &FontRequest,
        script: Script,
        multi: bool,
        blacklist: &mut Vec<String>,
    ) -> Option<EngineRef> {
        let key = CacheKey::new(def.clone(), script, multi);
        if let Some(engine) = cache.find_engine(&key) {
            return Some(engine);
        }

        let match_script = if multi { Script::Common } else { script };
        let name = FamilyName::parse(&def.family);
        while let Ok(mut found) =
            self.match_in(state, match_script, def, &name, blacklist.as_slice())
        {
            let mut load_def = def.clone();
            if load_def.family.is_empty() {
                load_def.family = found.family.clone();
            }
            match self.load_engine(state, cache, script, &load_def, &found) {
                Ok(engine) => {
                    found.relocate(&state.store);
                    self.init_font_def(state, &found, &load_def, &engine, multi);
                    if load_def.family != def.family {
                        // Later lookups for the first family supporting the script hit this key.
                        cache.insert_engine(key, engine.clone(), false);
                    }
                    return Some(engine);
                }
                Err(error) => {
                    debug!("find_fallback: {}", error);
                    blacklist.push(found.family);
                }
            }
        }
        None
    }

    fn load_single_engine(
        &self,
        state: &mut State,
        cache: &mut EngineCache,
        script: Script,
        request: &FontRequest,
        found: &FontMatch,
    ) -> Result<EngineRef, SelectionError> {
        let failed = SelectionError::EngineConstructionFailed {
            family: found.family.clone(),
        };

        let family = state.store.family_at(found.desc.family);
        let style = &family.foundries()[found.desc.foundry].styles()[found.desc.style];
        let size = &style.pixel_sizes()[found.desc.size];

        let mut pixel_size = u32::from(size.pixel_size);
        if size.pixel_size == crate::family::BITMAP_SCALABLE
            || (style.smoothly_scalable && size.pixel_size == crate::family::SMOOTH_SCALABLE)
            || self.source.fonts_always_scalable()
        {
            pixel_size = request.match_pixel_size();
        }

        let mut def = request.clone();
        def.pixel_size = pixel_size as f32;
        let mut key = CacheKey::new(def.clone(), script, false);
        if let Some(engine) = cache.find_engine(&key) {
            return Ok(engine);
        }

        let cache_for_common_script = script != Script::Common
            && family
                .writing_systems
                .supports(WritingSystem::for_script(Script::Latin));
        if cache_for_common_script {
            // An engine loaded for another script can serve this one too.
            key.script = Script::Common;
            let common = cache.find_engine(&key);
            key.script = script;
            if let Some(engine) = common {
                if !engine.supports_script(script) {
                    warn!(
                        "  OpenType support missing for {:?}, script {:?}",
                        def.family, script
                    );
                    return Err(failed);
                }
                engine.set_smoothly_scalable(style.smoothly_scalable);
                cache.insert_engine(key, engine.clone(), false);
                return Ok(engine);
            }
        }

        // Express the stretch relative to the matched style, so that an exact match renders
        // unstretched.
        if style.key.stretch.is_specified()
            && request.stretch.is_specified()
            && (request.style_name.is_empty() || request.style_name != style.style_name)
        {
            let requested = u32::from(request.stretch.0);
            let matched = u32::from(style.key.stretch.0);
            let stretch = (requested * 100 + matched / 2) / matched;
            def.stretch = Stretch(stretch.min(u32::from(Stretch::MAX.0)) as u16);
        } else {
            def.stretch = Stretch::NORMAL;
        }

        let smoothly_scalable = style.smoothly_scalable;
        let engine = match self.source.font_engine(&def, size.handle.as_ref()) {
            Some(engine) => engine,
            None => {
                debug!("  source failed to build an engine for {:?}", def.family);
                return Err(failed);
            }
        };
        if !engine.supports_script(script) {
            warn!(
                "  OpenType support missing for {:?}, script {:?}",
                def.family, script
            );
            return Err(failed);
        }

        engine.set_smoothly_scalable(smoothly_scalable);
        let engine = Arc::new(engine);
        cache.insert_engine(key.clone(), engine.clone(), false);

        if cache_for_common_script && !engine.is_symbol() {
            key.script = Script::Common;
            if cache.find_engine(&key).is_none() {
                cache.insert_engine(key, engine.clone(), false);
            }
        }
        Ok(engine)
    }

    fn load_engine(
        &self,
        state: &mut State,
        cache: &mut EngineCache,
        script: Script,
        request: &FontRequest,
        found: &FontMatch,
    ) -> Result<EngineRef, SelectionError> {
        let engine = self.load_single_engine(state, cache, script, request, found)?;
        if !request.merges_fonts() || engine.is_symbol() {
            return Ok(engine);
        }

        let style = {
            let family = state.store.family_at(found.desc.family);
            family.foundries()[found.desc.foundry].styles()[found.desc.style]
                .key
                .style
        };
        let family = found.family.clone();

        let mut multi = self.source.font_engine_multi(engine, script);
        let mut fallbacks = request.fallback_families.clone();
        fallbacks.extend(self.fallbacks_in(
            state,
            &family,
            style,
            request.fallback_style_hint(),
            script,
        ));
        multi.set_fallback_families(fallbacks);

        // Also cached under the multi key, in case a later lookup finds the single engine.
        let multi = Arc::new(multi);
        cache.insert_engine(CacheKey::new(request.clone(), script, true), multi.clone(), false);
        Ok(multi)
    }

    fn init_font_def(
        &self,
        state: &State,
        found: &FontMatch,
        request: &FontRequest,
        engine: &EngineRef,
        multi: bool,
    ) {
        let family = state.store.family_at(found.desc.family);
        let foundry = &family.foundries()[found.desc.foundry];
        let style = &foundry.styles()[found.desc.style];
        let size = &style.pixel_sizes()[found.desc.size];

        let mut name = family.name.clone();
        if !foundry.name.is_empty() && family.foundries().len() > 1 {
            name = format!("{} [{}]", name, foundry.name);
        }

        let use_request_size = style.smoothly_scalable
            || self.source.fonts_always_scalable()
            || (style.bitmap_scalable
                && request.style_strategy.contains(StyleStrategy::PREFER_MATCH));
        let pixel_size = if use_request_size {
            request.pixel_size
        } else {
            f32::from(size.pixel_size)
        };

        engine.update_def(|def| {
            def.family = name;
            def.pixel_size = pixel_size;
            def.point_size = request.point_size;
            def.style_hint = request.style_hint;
            def.style_strategy = request.style_strategy;
            if !multi {
                def.weight = style.key.weight;
                def.style = style.key.style;
            }
            def.fixed_pitch = family.fixed_pitch;
            def.ignore_pitch = false;
        });
    }

    fn fallbacks_in(
        &self,
        state: &mut State,
        family: &str,
        style: Style,
        style_hint: StyleHint,
        script: Script,
    ) -> Vec<String> {
        let key = FallbacksKey {
            family: family.to_owned(),
            style,
            style_hint,
            script,
        };
        if let Some(fallbacks) = state.fallbacks_cache.get(&key) {
            return fallbacks.clone();
        }

        self.ensure_initialized(&mut state.store);
        let candidates =
            self.source
                .fallbacks_for_family(&mut state.store, family, style, style_hint, script);

        let mut fallbacks: Vec<String> = vec![];
        for candidate in candidates {
            let name = FamilyName::parse(&candidate);
            if !state.store.contains(&name.family) {
                continue;
            }
            if fallbacks
                .iter()
                .any(|existing| family_name::eq_ignore_case(existing, &candidate))
            {
                continue;
            }
            fallbacks.push(candidate);
        }
        let fallbacks = source::sort_families_by_writing_system(
            &self.source,
            &mut state.store,
            script,
            fallbacks,
        );

        debug!("fallbacks for {:?} ({:?}): {:?}", family, script, fallbacks);
        state.fallbacks_cache.put(key, fallbacks.clone());
        fallbacks
    }
}

impl<S> Debug for FontDatabase<S>
where
    S: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("FontDatabase")
            .field("id", &self.id)
            .field("source", &self.source)
            .field("config", &self.config)
            .finish()
    }
}

impl<S> Drop for FontDatabase<S> {
    fn drop(&mut self) {
        cache::remove_thread_cache(self.id);
    }
}

fn family_list(state: &State, request: &FontRequest) -> Vec<String> {
    let mut families = family_name::split_family_list(&request.family);
    let mut substitutes = vec![];
    for family in &families {
        if let Some(family_substitutes) = state.substitutions.get(&family.to_lowercase()) {
            substitutes.extend(family_substitutes.iter().cloned());
        }
    }
    for substitute in substitutes {
        if !families
            .iter()
            .any(|family| family_name::eq_ignore_case(family, &substitute))
        {
            families.push(substitute);
        }
    }
    families
}

fn style_string(key: &StyleKey) -> String {
    // Heavier weights take the label of the nearest named weight below them, lighter ones the
    // label of the nearest named weight above them.
    let weight = match key.weight {
        weight if weight > Weight::NORMAL => match weight {
            weight if weight >= Weight::BLACK => "Black",
            weight if weight >= Weight::EXTRA_BOLD => "Extra Bold",
            weight if weight >= Weight::BOLD => "Bold",
            weight if weight >= Weight::DEMI_BOLD => "Demi Bold",
            weight if weight >= Weight::MEDIUM => "Medium",
            _ => "",
        },
        weight if weight <= Weight::THIN => "Thin",
        weight if weight <= Weight::EXTRA_LIGHT => "Extra Light",
        weight if weight <= Weight::LIGHT => "Light",
        _ => "",
    };
    let slant = match key.style {
        Style::Normal => "",
        Style::Italic => "Italic",
        Style::Oblique => "Oblique",
    };
    let result = [weight, slant]
        .iter()
        .filter(|part| !part.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ");
    if result.is_empty() {
        "Normal".to_owned()
    } else {
        result
    }
}
