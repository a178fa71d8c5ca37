// font-resolver/src/font.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A font as text layout sees it: a request plus the engines resolved for it, one per script.

use std::sync::Arc;

use crate::cache::{EngineCache, EngineData};
use crate::database::{FontDatabase, DEFAULT_DPI};
use crate::engine::EngineRef;
use crate::request::FontRequest;
use crate::script::Script;
use crate::source::Source;

/// A request together with its lazily loaded per-script engines.
///
/// Engines are shared through the cache's `EngineData`, so fonts built from equal requests on the
/// same thread share engines.
#[derive(Clone, Debug)]
pub struct Font {
    pub(crate) request: FontRequest,
    pub(crate) dpi: f32,
    pub(crate) engine_data: Option<Arc<EngineData>>,
    small_caps: Option<Box<Font>>,
}

impl Font {
    /// Creates a font for `request` at the default resolution.
    #[inline]
    pub fn new(request: FontRequest) -> Font {
        Font::with_dpi(request, DEFAULT_DPI)
    }

    /// Creates a font for `request` at `dpi`.
    pub fn with_dpi(request: FontRequest, dpi: f32) -> Font {
        Font {
            request,
            dpi,
            engine_data: None,
            small_caps: None,
        }
    }

    /// The request this font was created for.
    #[inline]
    pub fn request(&self) -> &FontRequest {
        &self.request
    }

    /// The resolution sizes are converted at.
    #[inline]
    pub fn dpi(&self) -> f32 {
        self.dpi
    }

    /// The engine data this font shares with the cache, once loaded.
    #[inline]
    pub fn engine_data(&self) -> Option<&Arc<EngineData>> {
        self.engine_data.as_ref()
    }

    /// Returns the engine for `script`, loading it through the calling thread's cache if needed.
    pub fn engine_for_script<S>(&mut self, database: &FontDatabase<S>, script: Script) -> EngineRef
    where
        S: Source,
    {
        database.with_cache(|cache| self.engine_for_script_in(database, cache, script))
    }

    /// Like `engine_for_script`, with an explicit cache.
    ///
    /// Scripts up to and including Latin share the Common engine. Engine data created by another
    /// cache is dropped and loaded again from this one.
    pub fn engine_for_script_in<S>(
        &mut self,
        database: &FontDatabase<S>,
        cache: &mut EngineCache,
        script: Script,
    ) -> EngineRef
    where
        S: Source,
    {
        let script = if script <= Script::Latin {
            Script::Common
        } else {
            script
        };

        let stale = match self.engine_data {
            Some(ref engine_data) => engine_data.cache_id() != cache.id(),
            None => false,
        };
        if stale {
            self.engine_data = None;
        }

        if let Some(engine) = self
            .engine_data
            .as_ref()
            .and_then(|engine_data| engine_data.engine(script))
        {
            return engine;
        }
        database.load(cache, self, script)
    }

    /// The derived small-caps font: 70% of this font's size, created on first use and owned by
    /// this font.
    pub fn small_caps(&mut self) -> &mut Font {
        let (request, dpi) = (&self.request, self.dpi);
        self.small_caps
            .get_or_insert_with(|| Box::new(Font::with_dpi(small_caps_request(request), dpi)))
    }
}

fn small_caps_request(request: &FontRequest) -> FontRequest {
    let mut request = request.clone();
    if request.point_size > 0.0 {
        request.point_size *= 0.7;
        request.pixel_size = -1.0;
    } else {
        let pixel_size = request.pixel_size.max(0.0) as i32;
        request.pixel_size = ((pixel_size * 7 + 5) / 10) as f32;
        request.point_size = -1.0;
    }
    request
}
