// font-resolver/src/loader.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Provides a common interface to the platform-specific object that actually renders a font.
//!
//! Glyph loading, shaping and rasterization live behind this trait and are none of this crate's
//! business. The resolver only needs enough to cache and validate what it hands out.

use std::fmt::Debug;

use crate::script::Script;

/// Provides a common interface to the platform-specific object that actually renders a font.
pub trait Loader: Debug + Send + Sync {
    /// Returns the name of the family this face belongs to.
    fn family_name(&self) -> String;

    /// Returns the approximate memory footprint of this face, in bytes.
    ///
    /// Only used for cache bookkeeping.
    fn cache_cost(&self) -> usize;

    /// Returns true if the face has what it takes to render `script` (e.g. the OpenType tables
    /// for a complex script).
    fn supports_script(&self, script: Script) -> bool;

    /// Returns true for symbol fonts. These never get merged with fallbacks and are not shared
    /// across scripts.
    fn is_symbol(&self) -> bool {
        false
    }
}
