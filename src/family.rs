// font-resolver/src/family.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The nodes of the font description store: family → foundry → style → pixel size.
//!
//! Foundries, styles and sizes keep insertion order. Matching scans them linearly and the first
//! candidate wins ties.

use crate::family_name;
use crate::handle::Handle;
use crate::properties::StyleKey;
use crate::script::WritingSystems;

/// Pixel size of the entry that serves every size of a smoothly scalable style.
pub const SMOOTH_SCALABLE: u16 = 0xffff;
/// Pixel size of the entry that serves every size of a bitmap-scalable style.
pub const BITMAP_SCALABLE: u16 = 0;

/// One registered size of a style, with the source's handle for it.
#[derive(Clone, Debug)]
pub struct PixelSize {
    /// The size in pixels, or `SMOOTH_SCALABLE`/`BITMAP_SCALABLE`.
    pub pixel_size: u16,
    /// The handle the source gave us when registering this size.
    pub handle: Option<Handle>,
}

impl PixelSize {
    /// Returns true if this is one of the "any size" entries rather than a fixed size.
    #[inline]
    pub fn is_scalable(&self) -> bool {
        self.pixel_size == SMOOTH_SCALABLE || self.pixel_size == BITMAP_SCALABLE
    }
}

/// A style within a foundry.
#[derive(Clone, Debug)]
pub struct FontStyle {
    /// Slant, weight and stretch.
    pub key: StyleKey,
    /// The name the source gave this style, e.g. "Semibold Italic". May be empty.
    pub style_name: String,
    /// Renders at any size without loss.
    pub smoothly_scalable: bool,
    /// Can be scaled from a bitmap, with loss.
    pub bitmap_scalable: bool,
    /// Whether the source renders this style antialiased.
    pub antialiased: bool,
    pixel_sizes: Vec<PixelSize>,
}

impl FontStyle {
    pub(crate) fn new(key: StyleKey, style_name: &str) -> FontStyle {
        FontStyle {
            key,
            style_name: style_name.to_owned(),
            smoothly_scalable: false,
            bitmap_scalable: false,
            antialiased: false,
            pixel_sizes: vec![],
        }
    }

    /// Returns the registered sizes, in insertion order.
    #[inline]
    pub fn pixel_sizes(&self) -> &[PixelSize] {
        &self.pixel_sizes
    }

    /// Returns the index of the entry for exactly `size`.
    pub fn pixel_size_index(&self, size: u16) -> Option<usize> {
        self.pixel_sizes
            .iter()
            .position(|pixel_size| pixel_size.pixel_size == size)
    }

    /// Returns the entry for exactly `size`, if registered.
    #[inline]
    pub fn pixel_size(&self, size: u16) -> Option<&PixelSize> {
        self.pixel_size_index(size).map(|index| &self.pixel_sizes[index])
    }

    pub(crate) fn pixel_size_or_insert(&mut self, size: u16) -> &mut PixelSize {
        let index = match self.pixel_size_index(size) {
            Some(index) => index,
            None => {
                self.pixel_sizes.push(PixelSize {
                    pixel_size: size,
                    handle: None,
                });
                self.pixel_sizes.len() - 1
            }
        };
        &mut self.pixel_sizes[index]
    }

    pub(crate) fn take_handles(&mut self) -> impl Iterator<Item = Handle> + '_ {
        self.pixel_sizes
            .iter_mut()
            .filter_map(|pixel_size| pixel_size.handle.take())
    }
}

/// A foundry (vendor) within a family. The empty name stands for "no particular foundry".
#[derive(Clone, Debug)]
pub struct Foundry {
    /// The foundry name; may be empty.
    pub name: String,
    styles: Vec<FontStyle>,
}

impl Foundry {
    pub(crate) fn new(name: &str) -> Foundry {
        Foundry {
            name: name.to_owned(),
            styles: vec![],
        }
    }

    /// Returns the styles, in insertion order.
    #[inline]
    pub fn styles(&self) -> &[FontStyle] {
        &self.styles
    }

    /// Finds the style registered for `key` and `style_name`.
    ///
    /// When both the query and a candidate have a style name, the names decide. Otherwise the keys
    /// are compared loosely (see `StyleKey::matches`).
    pub fn style_index(&self, key: &StyleKey, style_name: &str) -> Option<usize> {
        self.styles.iter().position(|style| {
            if !style_name.is_empty() && !style.style_name.is_empty() {
                style.style_name == style_name
            } else {
                style.key.matches(key)
            }
        })
    }

    pub(crate) fn style_or_insert(&mut self, key: &StyleKey, style_name: &str) -> &mut FontStyle {
        let index = match self.style_index(key, style_name) {
            Some(index) => index,
            None => {
                self.styles.push(FontStyle::new(*key, style_name));
                self.styles.len() - 1
            }
        };
        &mut self.styles[index]
    }

    pub(crate) fn styles_mut(&mut self) -> &mut [FontStyle] {
        &mut self.styles
    }
}

/// A font family: the unit the store is keyed by.
#[derive(Clone, Debug)]
pub struct Family {
    /// The family name, as first registered.
    pub name: String,
    /// Other names this family answers to.
    pub aliases: Vec<String>,
    /// Whether every face in the family is fixed-pitch.
    pub fixed_pitch: bool,
    /// Writing systems the family covers.
    pub writing_systems: WritingSystems,
    pub(crate) populated: bool,
    foundries: Vec<Foundry>,
}

impl Family {
    pub(crate) fn new(name: &str) -> Family {
        Family {
            name: name.to_owned(),
            aliases: vec![],
            fixed_pitch: false,
            writing_systems: WritingSystems::empty(),
            populated: false,
            foundries: vec![],
        }
    }

    /// Returns the foundries, in insertion order.
    #[inline]
    pub fn foundries(&self) -> &[Foundry] {
        &self.foundries
    }

    /// Returns true once the source has reported this family's styles.
    #[inline]
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    /// Returns true if `name` is this family's name or one of its aliases, ignoring case.
    pub fn matches_name(&self, name: &str) -> bool {
        family_name::eq_ignore_case(&self.name, name)
            || self
                .aliases
                .iter()
                .any(|alias| family_name::eq_ignore_case(alias, name))
    }

    /// Finds a foundry by name, ignoring case. An empty name finds the only foundry when there is
    /// exactly one.
    pub fn foundry_index(&self, name: &str) -> Option<usize> {
        if name.is_empty() && self.foundries.len() == 1 {
            return Some(0);
        }
        self.foundries
            .iter()
            .position(|foundry| family_name::eq_ignore_case(&foundry.name, name))
    }

    pub(crate) fn foundry_or_insert(&mut self, name: &str) -> &mut Foundry {
        let index = match self.foundry_index(name) {
            Some(index) => index,
            None => {
                self.foundries.push(Foundry::new(name));
                self.foundries.len() - 1
            }
        };
        &mut self.foundries[index]
    }

    pub(crate) fn take_handles(&mut self) -> Vec<Handle> {
        let mut handles = vec![];
        for foundry in &mut self.foundries {
            for style in foundry.styles_mut() {
                handles.extend(style.take_handles());
            }
        }
        handles
    }
}
