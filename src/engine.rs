// font-resolver/src/engine.rs
//
// Copyright © 2019 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Engines: the shared handles that resolution produces.
//!
//! An engine is either a concrete face built by the source, a multi engine that merges a primary
//! engine with fallback families, or a box placeholder that draws every glyph as an empty box.
//! Engines are shared through `EngineRef`; the strong count of the `Arc` is the engine's total
//! reference count, cache entries included.

use parking_lot::{Mutex, RwLock};
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::loader::Loader;
use crate::request::FontRequest;
use crate::script::Script;

/// A shared engine handle.
pub type EngineRef = Arc<Engine>;

/// What kind of engine this is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineType {
    /// The placeholder used when nothing matched.
    Box,
    /// A composite that merges a primary engine with fallback families.
    Multi,
    /// A face built by the source.
    Native,
}

#[derive(Debug)]
enum EngineKind {
    Box { pixel_size: u32 },
    Multi(MultiEngine),
    Native(Box<dyn Loader>),
}

/// The rendering backend for one resolved font description.
#[derive(Debug)]
pub struct Engine {
    kind: EngineKind,
    def: RwLock<FontRequest>,
    smoothly_scalable: AtomicBool,
}

impl Engine {
    /// Wraps a face built by a source.
    pub fn new<L>(loader: L, def: FontRequest) -> Engine
    where
        L: Loader + 'static,
    {
        Engine::from_kind(EngineKind::Native(Box::new(loader)), def)
    }

    /// Creates the placeholder engine for `pixel_size`. This cannot fail.
    pub fn placeholder(pixel_size: u32) -> Engine {
        let mut def = FontRequest::default();
        def.pixel_size = pixel_size as f32;
        Engine::from_kind(EngineKind::Box { pixel_size }, def)
    }

    /// Creates a multi engine around `primary` with no fallback families yet.
    pub fn multi(primary: EngineRef, script: Script) -> Engine {
        let def = primary.def();
        Engine::from_kind(
            EngineKind::Multi(MultiEngine {
                primary,
                script,
                fallback_families: vec![],
                fallbacks: Mutex::new(vec![]),
            }),
            def,
        )
    }

    fn from_kind(kind: EngineKind, def: FontRequest) -> Engine {
        Engine {
            kind,
            def: RwLock::new(def),
            smoothly_scalable: AtomicBool::new(false),
        }
    }

    /// Returns what kind of engine this is.
    pub fn engine_type(&self) -> EngineType {
        match self.kind {
            EngineKind::Box { .. } => EngineType::Box,
            EngineKind::Multi(_) => EngineType::Multi,
            EngineKind::Native(_) => EngineType::Native,
        }
    }

    /// Returns the approximate memory footprint of this engine, in bytes.
    pub fn cache_cost(&self) -> usize {
        match self.kind {
            EngineKind::Box { .. } => mem::size_of::<Engine>(),
            EngineKind::Multi(_) => 0,
            EngineKind::Native(ref loader) => loader.cache_cost(),
        }
    }

    /// Returns true if this engine can render `script`.
    pub fn supports_script(&self, script: Script) -> bool {
        match self.kind {
            EngineKind::Box { .. } => true,
            EngineKind::Multi(ref multi) => multi.primary.supports_script(script),
            EngineKind::Native(ref loader) => loader.supports_script(script),
        }
    }

    /// Returns true for symbol fonts.
    pub fn is_symbol(&self) -> bool {
        match self.kind {
            EngineKind::Box { .. } => false,
            EngineKind::Multi(ref multi) => multi.primary.is_symbol(),
            EngineKind::Native(ref loader) => loader.is_symbol(),
        }
    }

    /// Returns the face behind a native engine.
    pub fn loader(&self) -> Option<&dyn Loader> {
        match self.kind {
            EngineKind::Native(ref loader) => Some(&**loader),
            _ => None,
        }
    }

    /// Returns the composite state of a multi engine.
    pub fn as_multi(&self) -> Option<&MultiEngine> {
        match self.kind {
            EngineKind::Multi(ref multi) => Some(multi),
            _ => None,
        }
    }

    /// For a box engine, the size its boxes are drawn at.
    pub fn box_pixel_size(&self) -> Option<u32> {
        match self.kind {
            EngineKind::Box { pixel_size } => Some(pixel_size),
            _ => None,
        }
    }

    /// Sets the fallback families of a multi engine. Does nothing for other engines.
    pub fn set_fallback_families(&mut self, families: Vec<String>) {
        if let EngineKind::Multi(ref mut multi) = self.kind {
            *multi.fallbacks.get_mut() = vec![None; families.len()];
            multi.fallback_families = families;
        }
    }

    /// Returns the description this engine was resolved to.
    pub fn def(&self) -> FontRequest {
        self.def.read().clone()
    }

    /// Updates the resolved description.
    pub fn update_def<F>(&self, update: F)
    where
        F: FnOnce(&mut FontRequest),
    {
        update(&mut self.def.write())
    }

    /// Returns true if the matched style was smoothly scalable.
    #[inline]
    pub fn is_smoothly_scalable(&self) -> bool {
        self.smoothly_scalable.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn set_smoothly_scalable(&self, smoothly_scalable: bool) {
        self.smoothly_scalable
            .store(smoothly_scalable, Ordering::Relaxed)
    }
}

/// The composite state of a multi engine.
///
/// Slot 0 is the primary engine. Slot `i + 1` is the engine for `fallback_families()[i]`, loaded
/// on demand by `FontDatabase::fallback_engine` and then held here.
#[derive(Debug)]
pub struct MultiEngine {
    primary: EngineRef,
    script: Script,
    fallback_families: Vec<String>,
    fallbacks: Mutex<Vec<Option<EngineRef>>>,
}

impl MultiEngine {
    /// Returns the primary engine.
    #[inline]
    pub fn primary(&self) -> &EngineRef {
        &self.primary
    }

    /// Returns the script this engine was built for.
    #[inline]
    pub fn script(&self) -> Script {
        self.script
    }

    /// Returns the fallback families, in priority order.
    #[inline]
    pub fn fallback_families(&self) -> &[String] {
        &self.fallback_families
    }

    /// Returns the engine for fallback family `index`, if it has been loaded.
    pub fn loaded_fallback(&self, index: usize) -> Option<EngineRef> {
        self.fallbacks.lock().get(index).cloned().flatten()
    }

    pub(crate) fn store_fallback(&self, index: usize, engine: EngineRef) -> EngineRef {
        let mut fallbacks = self.fallbacks.lock();
        match fallbacks.get_mut(index) {
            Some(Some(existing)) => existing.clone(),
            Some(slot) => {
                *slot = Some(engine.clone());
                engine
            }
            None => engine,
        }
    }
}
