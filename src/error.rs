// font-resolver/src/error.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Various types of errors that can occur while selecting a font.
//!
//! None of these escape `FontDatabase::resolve`: they are consumed by the fallback resolver, which
//! degrades to a placeholder engine instead of failing.

use thiserror::Error;

/// Reasons why a lookup might fail to produce an engine.
#[derive(Clone, PartialEq, Debug, Error)]
pub enum SelectionError {
    /// No registered family, style or size matched the request.
    #[error("no font found")]
    NotFound,

    /// A description matched, but the source could not build an engine for it (or the engine it
    /// built does not support the requested script).
    ///
    /// The family is skipped for the remainder of the resolution.
    #[error("failed to construct a font engine for family `{family}`")]
    EngineConstructionFailed {
        /// Name of the offending family.
        family: String,
    },
}
