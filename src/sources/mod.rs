// font-resolver/src/sources/mod.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Font sources that can back a `FontDatabase`.
//!
//! Platform sources live with the platform integration. The in-memory source here serves
//! embedders that manage their own fonts, and tests.

pub mod mem;

pub use self::mem::{MemFace, MemFont, MemSource};
