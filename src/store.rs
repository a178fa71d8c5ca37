// font-resolver/src/store.rs
//
// Copyright © 2019 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The font description store: every family the source has told us about, kept sorted by name.
//!
//! Families are created on first reference, either all at once by
//! `Source::populate_font_database` or one at a time when a family is looked up. A family's styles
//! are only asked for when the matcher first needs them (`ensure_populated`).

use log::{debug, warn};
use std::mem;

use crate::family::{Family, BITMAP_SCALABLE, SMOOTH_SCALABLE};
use crate::family_name;
use crate::handle::Handle;
use crate::properties::StyleKey;
use crate::script::WritingSystems;
use crate::source::Source;

/// Everything a source reports about one face at one size.
///
/// This object is normally built with struct-update syntax:
///
///     # use font_resolver::store::FontRegistration;
///     let registration = FontRegistration {
///         family: "Arial".to_owned(),
///         pixel_size: 16,
///         ..FontRegistration::default()
///     };
#[derive(Clone, Debug, Default)]
pub struct FontRegistration {
    /// The family name.
    pub family: String,
    /// The style name, e.g. "Bold Italic". May be empty.
    pub style_name: String,
    /// The foundry name. May be empty.
    pub foundry: String,
    /// Slant, weight and stretch.
    pub key: StyleKey,
    /// Whether the face renders antialiased.
    pub antialiased: bool,
    /// Whether the face is smoothly scalable (an outline font).
    pub scalable: bool,
    /// Whether the face can be scaled from a bitmap.
    pub bitmap_scalable: bool,
    /// The pixel size of a bitmap face, or 0 for a face usable at any size.
    pub pixel_size: u16,
    /// Whether the family is fixed-pitch.
    pub fixed_pitch: bool,
    /// Writing systems the face covers. Accumulates into the family.
    pub writing_systems: WritingSystems,
    /// The source's handle for this face.
    pub handle: Option<Handle>,
}

/// The hierarchical registry of font descriptions.
#[derive(Debug, Default)]
pub struct FontStore {
    families: Vec<Family>,
    released: Vec<Handle>,
    pub(crate) initialized: bool,
}

impl FontStore {
    /// Creates an empty store.
    pub fn new() -> FontStore {
        FontStore::default()
    }

    /// Returns the families, sorted case-insensitively by name.
    #[inline]
    pub fn families(&self) -> &[Family] {
        &self.families
    }

    /// Returns the number of families.
    #[inline]
    pub fn len(&self) -> usize {
        self.families.len()
    }

    /// Returns true if no family has been registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }

    /// Binary-searches for `name` by exact (case-insensitive) family name. Aliases are not
    /// consulted. On a miss, returns the index where the family would be inserted.
    pub fn family_index(&self, name: &str) -> Result<usize, usize> {
        self.families
            .binary_search_by(|family| family_name::compare_ignore_case(&family.name, name))
    }

    /// Looks up a family by name without creating or populating it.
    pub fn family(&self, name: &str) -> Option<&Family> {
        self.family_index(name)
            .ok()
            .map(|index| &self.families[index])
    }

    /// Returns the family at `index`.
    #[inline]
    pub fn family_at(&self, index: usize) -> &Family {
        &self.families[index]
    }

    /// Looks up a family by name, creating an unpopulated one in sorted position if it is
    /// missing. Idempotent.
    pub fn family_or_insert(&mut self, name: &str) -> usize {
        match self.family_index(name) {
            Ok(index) => index,
            Err(index) => {
                debug!("adding family {:?} at {} (total {})", name, index, self.families.len());
                self.families.insert(index, Family::new(name));
                index
            }
        }
    }

    /// Makes sure the source has reported the styles of the family at `index`.
    ///
    /// The source is asked at most once per family until the store is invalidated. Because the
    /// source may register further families while populating, the family can move; its current
    /// index is returned.
    pub fn ensure_populated<S>(&mut self, index: usize, source: &S) -> usize
    where
        S: Source + ?Sized,
    {
        if self.families[index].populated {
            return index;
        }

        let name = self.families[index].name.clone();
        source.populate_family(self, &name);

        let index = match self.family_index(&name) {
            Ok(index) => index,
            Err(_) => index,
        };
        if !self.families[index].populated {
            warn!("source did not populate family {:?}", name);
            self.families[index].populated = true;
        }
        index
    }

    /// Creates or updates the nodes for one face and marks its family populated.
    ///
    /// A handle previously registered for the same size is queued for release.
    pub fn register_font(&mut self, font: FontRegistration) {
        let index = self.family_or_insert(&font.family);
        let family = &mut self.families[index];
        family.fixed_pitch = font.fixed_pitch;
        family.writing_systems |= font.writing_systems;
        family.populated = true;

        let size = match font.pixel_size {
            0 if font.bitmap_scalable && !font.scalable => BITMAP_SCALABLE,
            0 => SMOOTH_SCALABLE,
            pixel_size => pixel_size,
        };

        let style = family
            .foundry_or_insert(&font.foundry)
            .style_or_insert(&font.key, &font.style_name);
        style.smoothly_scalable = font.scalable;
        style.bitmap_scalable = style.bitmap_scalable || font.bitmap_scalable;
        style.antialiased = font.antialiased;

        let pixel_size = style.pixel_size_or_insert(size);
        let old_handle = mem::replace(&mut pixel_size.handle, font.handle);
        if let Some(old_handle) = old_handle {
            self.released.push(old_handle);
        }
    }

    /// Creates an unpopulated family; its styles will be asked for on first use.
    pub fn register_family(&mut self, name: &str) {
        self.family_or_insert(name);
    }

    /// Makes `alias` another name for `family`. Does nothing if the family is unknown or the alias
    /// is empty or already present.
    pub fn register_alias(&mut self, family: &str, alias: &str) {
        if alias.is_empty() {
            return;
        }
        let index = match self.family_index(family) {
            Ok(index) => index,
            Err(_) => return,
        };
        let family = &mut self.families[index];
        if family
            .aliases
            .iter()
            .any(|existing| family_name::eq_ignore_case(existing, alias))
        {
            return;
        }
        family.aliases.push(alias.to_owned());
    }

    /// Returns the name of the first family whose name or alias is `alias`, or `alias` itself.
    pub fn resolve_alias(&self, alias: &str) -> String {
        if !alias.is_empty() {
            if let Some(family) = self.families.iter().find(|family| family.matches_name(alias)) {
                return family.name.clone();
            }
        }
        alias.to_owned()
    }

    /// Returns true if some family answers to `name`, by name or alias.
    pub fn contains(&self, name: &str) -> bool {
        self.families.iter().any(|family| family.matches_name(name))
    }

    pub(crate) fn take_released_handles(&mut self) -> Vec<Handle> {
        mem::replace(&mut self.released, vec![])
    }

    /// Drops every node, returning the handles they owned so they can be released.
    pub(crate) fn free(&mut self) -> Vec<Handle> {
        let mut handles = self.take_released_handles();
        for mut family in self.families.drain(..) {
            handles.extend(family.take_handles());
        }
        self.initialized = false;
        handles
    }
}
