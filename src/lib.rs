// font-resolver/src/lib.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `font-resolver` turns abstract font requests into shared rendering engines.
//!
//! The pieces, bottom-up:
//!
//! * `store`: the hierarchical registry of font descriptions (family, foundry, style, size) that a
//!   `Source` populates, lazily per family.
//!
//! * `matching`: scores registered descriptions against a `FontRequest`.
//!
//! * `cache`: memoizes engines per request and script, with cost accounting and timer-driven
//!   eviction.
//!
//! * `database`: ties these together behind a lock; `FontDatabase::resolve` always returns an
//!   engine, falling back through alternative families and, as a last resort, to a placeholder.
//!
//! Glyph loading and rasterization are not handled here; a `Source` builds engines around its own
//! `Loader` implementation.

#[macro_use]
extern crate bitflags;

pub mod cache;
pub mod database;
pub mod engine;
pub mod error;
pub mod family;
pub mod family_name;
pub mod font;
pub mod handle;
pub mod loader;
pub mod matching;
pub mod properties;
pub mod request;
pub mod script;
pub mod source;
pub mod store;

#[cfg(feature = "source")]
pub mod sources;
