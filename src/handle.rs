// font-resolver/src/handle.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Encapsulates the information a source needs to build an engine for one registered size.
//!
//! The store never looks inside a handle. It keeps one per pixel size, hands it back to the
//! source when an engine is built, and returns it to the source for release when the size is
//! replaced or the store is invalidated.

use std::any::Any;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

/// Encapsulates the information a source needs to build an engine for one registered size.
///
/// Cloning is cheap; clones refer to the same source object.
#[derive(Clone)]
pub struct Handle {
    inner: Arc<dyn Any + Sync + Send>,
}

impl Handle {
    /// Creates a new handle wrapping a source-specific object, e.g. a file path and face index
    /// or a platform font reference.
    pub fn from_native<T>(inner: T) -> Handle
    where
        T: Any + Sync + Send,
    {
        Handle {
            inner: Arc::new(inner),
        }
    }

    /// Retrieves the source-specific object.
    ///
    /// Returns `None` if the handle wraps an object of another type.
    #[inline]
    pub fn as_native<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl Debug for Handle {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Handle({:p})", Arc::as_ptr(&self.inner) as *const ())
    }
}
