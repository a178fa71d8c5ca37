// font-resolver/src/sources/mem.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A source that keeps font descriptions in memory.
//!
//! Families are announced up front and populated on demand, the way platform sources with
//! expensive enumeration behave. The source counts what it is asked to do, which makes it
//! convenient for tests.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::engine::Engine;
use crate::family_name;
use crate::handle::Handle;
use crate::loader::Loader;
use crate::properties::{Style, StyleKey};
use crate::request::{FontRequest, StyleHint};
use crate::script::{Script, WritingSystems};
use crate::source::{self, Source};
use crate::store::{FontRegistration, FontStore};

/// Approximate memory footprint reported for faces that do not set one.
pub const DEFAULT_CACHE_COST: usize = 64 * 1024;

/// One face known to a `MemSource`.
///
/// This object supports a method chaining style for idiomatic initialization; e.g.
///
///     # use font_resolver::sources::mem::MemFont;
///     let font = MemFont::new("Arial").pixel_size(16).clone();
#[derive(Clone, Debug)]
pub struct MemFont {
    /// The family name.
    pub family: String,
    /// The foundry name; may be empty.
    pub foundry: String,
    /// The style name; may be empty.
    pub style_name: String,
    /// Slant, weight and stretch.
    pub key: StyleKey,
    /// The bitmap size, or 0 for a face usable at any size.
    pub pixel_size: u16,
    /// Whether the face is an outline font.
    pub scalable: bool,
    /// Whether the face may be scaled from a bitmap.
    pub bitmap_scalable: bool,
    /// Whether the family is fixed-pitch.
    pub fixed_pitch: bool,
    /// Writing systems the face covers.
    pub writing_systems: WritingSystems,
    /// Bytes reported as the engine's cache cost.
    pub cache_cost: usize,
    /// Scripts engines for this face claim not to support.
    pub unsupported_scripts: Vec<Script>,
    /// Whether this is a symbol font.
    pub symbol: bool,
    /// Whether engines can be built for this face.
    pub loadable: bool,
}

impl MemFont {
    /// Creates a scalable, normal-style Latin face for `family`.
    pub fn new(family: &str) -> MemFont {
        MemFont {
            family: family.to_owned(),
            foundry: String::new(),
            style_name: String::new(),
            key: StyleKey::new(),
            pixel_size: 0,
            scalable: true,
            bitmap_scalable: false,
            fixed_pitch: false,
            writing_systems: WritingSystems::LATIN,
            cache_cost: DEFAULT_CACHE_COST,
            unsupported_scripts: vec![],
            symbol: false,
            loadable: true,
        }
    }

    /// Sets the foundry and returns this face for method chaining.
    #[inline]
    pub fn foundry(&mut self, foundry: &str) -> &mut MemFont {
        self.foundry = foundry.to_owned();
        self
    }

    /// Sets the style name and returns this face for method chaining.
    #[inline]
    pub fn style_name(&mut self, style_name: &str) -> &mut MemFont {
        self.style_name = style_name.to_owned();
        self
    }

    /// Sets the style key and returns this face for method chaining.
    #[inline]
    pub fn key(&mut self, key: StyleKey) -> &mut MemFont {
        self.key = key;
        self
    }

    /// Makes this a bitmap face of `pixel_size` pixels, and returns it for method chaining.
    #[inline]
    pub fn pixel_size(&mut self, pixel_size: u16) -> &mut MemFont {
        self.pixel_size = pixel_size;
        self.scalable = false;
        self
    }

    /// Makes this face scalable from a bitmap, and returns it for method chaining.
    #[inline]
    pub fn bitmap_scalable(&mut self) -> &mut MemFont {
        self.pixel_size = 0;
        self.scalable = false;
        self.bitmap_scalable = true;
        self
    }

    /// Sets the pitch and returns this face for method chaining.
    #[inline]
    pub fn fixed_pitch(&mut self, fixed_pitch: bool) -> &mut MemFont {
        self.fixed_pitch = fixed_pitch;
        self
    }

    /// Sets the writing systems and returns this face for method chaining.
    #[inline]
    pub fn writing_systems(&mut self, writing_systems: WritingSystems) -> &mut MemFont {
        self.writing_systems = writing_systems;
        self
    }

    /// Sets the cache cost and returns this face for method chaining.
    #[inline]
    pub fn cache_cost(&mut self, cache_cost: usize) -> &mut MemFont {
        self.cache_cost = cache_cost;
        self
    }

    /// Marks `script` unsupported by engines for this face, and returns it for method chaining.
    #[inline]
    pub fn unsupported_script(&mut self, script: Script) -> &mut MemFont {
        self.unsupported_scripts.push(script);
        self
    }

    /// Makes this a symbol font, and returns it for method chaining.
    #[inline]
    pub fn symbol(&mut self) -> &mut MemFont {
        self.symbol = true;
        self
    }

    /// Makes engine construction fail for this face, and returns it for method chaining.
    #[inline]
    pub fn unloadable(&mut self) -> &mut MemFont {
        self.loadable = false;
        self
    }

    fn registration(&self) -> FontRegistration {
        FontRegistration {
            family: self.family.clone(),
            style_name: self.style_name.clone(),
            foundry: self.foundry.clone(),
            key: self.key,
            antialiased: self.scalable,
            scalable: self.scalable,
            bitmap_scalable: self.bitmap_scalable,
            pixel_size: self.pixel_size,
            fixed_pitch: self.fixed_pitch,
            writing_systems: self.writing_systems,
            handle: Some(Handle::from_native(self.clone())),
        }
    }
}

/// The engine backend a `MemSource` builds: a face that only knows its bookkeeping data.
#[derive(Clone, Debug)]
pub struct MemFace {
    font: MemFont,
    pixel_size: f32,
}

impl MemFace {
    /// The face this engine was built from.
    #[inline]
    pub fn font(&self) -> &MemFont {
        &self.font
    }

    /// The pixel size this engine was built for.
    #[inline]
    pub fn pixel_size(&self) -> f32 {
        self.pixel_size
    }
}

impl Loader for MemFace {
    fn family_name(&self) -> String {
        self.font.family.clone()
    }

    fn cache_cost(&self) -> usize {
        self.font.cache_cost
    }

    fn supports_script(&self, script: Script) -> bool {
        !self.font.unsupported_scripts.contains(&script)
    }

    fn is_symbol(&self) -> bool {
        self.font.symbol
    }
}

/// A source that keeps font descriptions in memory.
#[derive(Debug, Default)]
pub struct MemSource {
    fonts: Vec<MemFont>,
    aliases: Vec<(String, String)>,
    late_aliases: Vec<(String, String)>,
    fallbacks: HashMap<String, Vec<String>>,
    default_fallbacks: Option<Vec<String>>,
    always_scalable: bool,
    late_aliases_registered: AtomicBool,
    populate_database_calls: AtomicUsize,
    populate_family_calls: Mutex<HashMap<String, usize>>,
    engines_built: AtomicUsize,
    released_handles: AtomicUsize,
    invalidations: AtomicUsize,
}

impl MemSource {
    /// Creates an empty source.
    #[inline]
    pub fn new() -> MemSource {
        MemSource::default()
    }

    /// Creates a source holding `fonts`.
    pub fn from_fonts<I>(fonts: I) -> MemSource
    where
        I: IntoIterator<Item = MemFont>,
    {
        MemSource {
            fonts: fonts.into_iter().collect(),
            ..MemSource::default()
        }
    }

    /// Adds a face.
    pub fn add_font(&mut self, font: MemFont) -> &mut MemSource {
        self.fonts.push(font);
        self
    }

    /// Makes `alias` another name for `family`.
    pub fn add_alias(&mut self, family: &str, alias: &str) -> &mut MemSource {
        self.aliases.push((family.to_owned(), alias.to_owned()));
        self
    }

    /// Like `add_alias`, but only registered when the database asks for more aliases after a
    /// failed match.
    pub fn add_late_alias(&mut self, family: &str, alias: &str) -> &mut MemSource {
        self.late_aliases.push((family.to_owned(), alias.to_owned()));
        self
    }

    /// Sets the fallback list reported for `family`.
    pub fn set_fallbacks(&mut self, family: &str, fallbacks: &[&str]) -> &mut MemSource {
        self.fallbacks.insert(
            family.to_lowercase(),
            fallbacks.iter().map(|family| (*family).to_owned()).collect(),
        );
        self
    }

    /// Sets the fallback list reported for families without one of their own. Without it, every
    /// family supporting the script is reported.
    pub fn set_default_fallbacks(&mut self, fallbacks: &[&str]) -> &mut MemSource {
        self.default_fallbacks = Some(fallbacks.iter().map(|family| (*family).to_owned()).collect());
        self
    }

    /// Makes the source claim every face renders at any size.
    pub fn set_fonts_always_scalable(&mut self, always_scalable: bool) -> &mut MemSource {
        self.always_scalable = always_scalable;
        self
    }

    /// The faces this source holds.
    #[inline]
    pub fn fonts(&self) -> &[MemFont] {
        &self.fonts
    }

    /// How many times the whole database was populated.
    pub fn populate_database_count(&self) -> usize {
        self.populate_database_calls.load(Ordering::SeqCst)
    }

    /// How many times `family` was populated.
    pub fn populate_family_count(&self, family: &str) -> usize {
        self.populate_family_calls
            .lock()
            .get(&family.to_lowercase())
            .cloned()
            .unwrap_or(0)
    }

    /// How many engines were built.
    pub fn engines_built(&self) -> usize {
        self.engines_built.load(Ordering::SeqCst)
    }

    /// How many handles were given back.
    pub fn released_handles(&self) -> usize {
        self.released_handles.load(Ordering::SeqCst)
    }

    /// How many times the source was invalidated.
    pub fn invalidations(&self) -> usize {
        self.invalidations.load(Ordering::SeqCst)
    }
}

impl Source for MemSource {
    fn populate_font_database(&self, store: &mut FontStore) {
        self.populate_database_calls.fetch_add(1, Ordering::SeqCst);
        for font in &self.fonts {
            store.register_family(&font.family);
        }
        for &(ref family, ref alias) in &self.aliases {
            store.register_alias(family, alias);
        }
    }

    fn populate_family(&self, store: &mut FontStore, family_name: &str) {
        *self
            .populate_family_calls
            .lock()
            .entry(family_name.to_lowercase())
            .or_insert(0) += 1;

        for font in &self.fonts {
            if family_name::eq_ignore_case(&font.family, family_name) {
                store.register_font(font.registration());
            }
        }
    }

    fn populate_family_aliases(&self, store: &mut FontStore) -> bool {
        if self.late_aliases.is_empty() || self.late_aliases_registered.swap(true, Ordering::SeqCst)
        {
            return false;
        }
        for &(ref family, ref alias) in &self.late_aliases {
            store.register_family(family);
            store.register_alias(family, alias);
        }
        true
    }

    fn fallbacks_for_family(
        &self,
        store: &mut FontStore,
        family: &str,
        style: Style,
        _: StyleHint,
        script: Script,
    ) -> Vec<String> {
        if let Some(fallbacks) = self.fallbacks.get(&family.to_lowercase()) {
            return fallbacks.clone();
        }
        if let Some(ref fallbacks) = self.default_fallbacks {
            return fallbacks.clone();
        }
        source::default_fallbacks_for_family(self, store, style, script)
    }

    fn font_engine(&self, request: &FontRequest, handle: Option<&Handle>) -> Option<Engine> {
        let font = handle?.as_native::<MemFont>()?;
        if !font.loadable {
            return None;
        }
        self.engines_built.fetch_add(1, Ordering::SeqCst);
        let face = MemFace {
            font: font.clone(),
            pixel_size: request.pixel_size,
        };
        Some(Engine::new(face, request.clone()))
    }

    fn release_handle(&self, _: Handle) {
        self.released_handles.fetch_add(1, Ordering::SeqCst);
    }

    fn fonts_always_scalable(&self) -> bool {
        self.always_scalable
    }

    fn invalidate(&self) {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.late_aliases_registered.store(false, Ordering::SeqCst);
    }
}
