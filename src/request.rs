// font-resolver/src/request.rs
//
// Copyright © 2019 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The abstract description of the font a caller wants.

use std::hash::{Hash, Hasher};

use crate::properties::{Stretch, Style, StyleKey, Weight};

/// A hint about which kind of family to fall back to when the requested one is unavailable.
///
/// These mirror the generic CSS families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StyleHint {
    /// No preference.
    AnyStyle,
    /// Low-contrast faces without ornamentation: e.g. Helvetica.
    SansSerif,
    /// The formal text style for a script: e.g. Times.
    Serif,
    /// Fixed-width faces: e.g. Courier.
    TypeWriter,
    /// Decorative faces: e.g. Old English.
    Decorative,
    /// The system UI face.
    System,
    /// Informal, handwritten-looking faces.
    Cursive,
    /// Fixed-width faces.
    Monospace,
    /// Decorative or expressive faces.
    Fantasy,
}

impl Default for StyleHint {
    fn default() -> StyleHint {
        StyleHint::AnyStyle
    }
}

bitflags! {
    /// Flags that steer matching toward bitmap or outline faces and control font merging.
    pub struct StyleStrategy: u32 {
        const PREFER_DEFAULT = 0x0001;
        const PREFER_BITMAP = 0x0002;
        const PREFER_DEVICE = 0x0004;
        const PREFER_OUTLINE = 0x0008;
        /// Only smoothly scalable styles are acceptable.
        const FORCE_OUTLINE = 0x0010;
        /// An exact size beats quality: bitmap-scalable entries may be scaled.
        const PREFER_MATCH = 0x0020;
        /// Quality beats an exact size: never scale bitmaps.
        const PREFER_QUALITY = 0x0040;
        const PREFER_ANTIALIAS = 0x0080;
        const NO_ANTIALIAS = 0x0100;
        const NO_SUBPIXEL_ANTIALIAS = 0x0800;
        /// Return a single engine instead of a multi engine that merges in fallback fonts.
        const NO_FONT_MERGING = 0x8000;
    }
}

impl Default for StyleStrategy {
    fn default() -> StyleStrategy {
        StyleStrategy::PREFER_DEFAULT
    }
}

/// What the matcher requires of a family's pitch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pitch {
    /// Pitch is irrelevant.
    Any,
    /// Fixed pitch (monospace) is wanted.
    Fixed,
    /// Proportional pitch is wanted.
    Proportional,
}

/// The normalized description of the font a caller wants.
///
/// Sizes use negative values for "unset"; `normalized` fills in one from the other.
///
/// This object supports a method chaining style for idiomatic initialization; e.g.
///
///     # use font_resolver::request::FontRequest;
///     # use font_resolver::properties::Weight;
///     let request = FontRequest::new("Arial").pixel_size(16.0).weight(Weight::BOLD).clone();
#[derive(Clone, Debug)]
pub struct FontRequest {
    /// A family name or a comma-separated list of them. Empty means "first family supporting
    /// the script".
    pub family: String,
    /// An explicit style name such as "Condensed Bold"; matched exactly before any key distance.
    pub style_name: String,
    /// Families to merge in, in priority order.
    pub fallback_families: Vec<String>,
    /// Size in points, or negative if unset.
    pub point_size: f32,
    /// Size in pixels, or negative if unset.
    pub pixel_size: f32,
    /// Matching and merging flags.
    pub style_strategy: StyleStrategy,
    /// Generic family to fall back to.
    pub style_hint: StyleHint,
    /// Requested weight.
    pub weight: Weight,
    /// Requested slant.
    pub style: Style,
    /// Requested stretch; `Stretch::ANY` for no preference.
    pub stretch: Stretch,
    /// Whether a fixed-pitch family is wanted. Only consulted when `ignore_pitch` is false.
    pub fixed_pitch: bool,
    /// Whether pitch is irrelevant.
    pub ignore_pitch: bool,
}

impl Default for FontRequest {
    fn default() -> FontRequest {
        FontRequest {
            family: String::new(),
            style_name: String::new(),
            fallback_families: vec![],
            point_size: -1.0,
            pixel_size: -1.0,
            style_strategy: StyleStrategy::default(),
            style_hint: StyleHint::default(),
            weight: Weight::NORMAL,
            style: Style::Normal,
            stretch: Stretch::ANY,
            fixed_pitch: false,
            ignore_pitch: true,
        }
    }
}

impl FontRequest {
    /// Creates a request for `family` with default properties and no size.
    pub fn new(family: &str) -> FontRequest {
        FontRequest {
            family: family.to_owned(),
            ..FontRequest::default()
        }
    }

    /// Sets the family and returns this request for method chaining.
    #[inline]
    pub fn family(&mut self, family: &str) -> &mut FontRequest {
        self.family = family.to_owned();
        self
    }

    /// Sets the style name and returns this request for method chaining.
    #[inline]
    pub fn style_name(&mut self, style_name: &str) -> &mut FontRequest {
        self.style_name = style_name.to_owned();
        self
    }

    /// Sets the pixel size and returns this request for method chaining.
    #[inline]
    pub fn pixel_size(&mut self, pixel_size: f32) -> &mut FontRequest {
        self.pixel_size = pixel_size;
        self
    }

    /// Sets the point size and returns this request for method chaining.
    #[inline]
    pub fn point_size(&mut self, point_size: f32) -> &mut FontRequest {
        self.point_size = point_size;
        self
    }

    /// Sets the weight and returns this request for method chaining.
    #[inline]
    pub fn weight(&mut self, weight: Weight) -> &mut FontRequest {
        self.weight = weight;
        self
    }

    /// Sets the slant and returns this request for method chaining.
    #[inline]
    pub fn style(&mut self, style: Style) -> &mut FontRequest {
        self.style = style;
        self
    }

    /// Sets the stretch and returns this request for method chaining.
    #[inline]
    pub fn stretch(&mut self, stretch: Stretch) -> &mut FontRequest {
        self.stretch = stretch;
        self
    }

    /// Sets the style strategy and returns this request for method chaining.
    #[inline]
    pub fn style_strategy(&mut self, style_strategy: StyleStrategy) -> &mut FontRequest {
        self.style_strategy = style_strategy;
        self
    }

    /// Sets the style hint and returns this request for method chaining.
    #[inline]
    pub fn style_hint(&mut self, style_hint: StyleHint) -> &mut FontRequest {
        self.style_hint = style_hint;
        self
    }

    /// Asks for a fixed-pitch or proportional family, and returns this request for method
    /// chaining.
    #[inline]
    pub fn fixed_pitch(&mut self, fixed_pitch: bool) -> &mut FontRequest {
        self.fixed_pitch = fixed_pitch;
        self.ignore_pitch = false;
        self
    }

    /// Sets the fallback families and returns this request for method chaining.
    #[inline]
    pub fn fallback_families(&mut self, families: &[&str]) -> &mut FontRequest {
        self.fallback_families = families.iter().map(|family| (*family).to_owned()).collect();
        self
    }

    /// Returns a copy with both sizes filled in for the given resolution.
    ///
    /// The pixel size is rounded to hundredths and then to a whole pixel, so that requests
    /// differing only by floating-point noise share cache entries.
    pub fn normalized(&self, dpi: f32) -> FontRequest {
        let mut request = self.clone();
        if request.pixel_size < 0.0 && request.point_size >= 0.0 {
            let pixel_size = ((request.point_size * dpi / 72.0) * 100.0 + 0.5).floor() / 100.0;
            request.pixel_size = pixel_size.round();
        }
        if request.point_size < 0.0 && request.pixel_size >= 0.0 && dpi > 0.0 {
            request.point_size = request.pixel_size * 72.0 / dpi;
        }
        request
    }

    /// The pixel size the matcher compares against.
    #[inline]
    pub fn match_pixel_size(&self) -> u32 {
        if self.pixel_size > 0.0 {
            self.pixel_size as u32
        } else {
            0
        }
    }

    /// The style key the matcher looks for. An unspecified stretch prefers normal width.
    pub fn style_key(&self) -> StyleKey {
        let stretch = if self.stretch.is_specified() {
            self.stretch
        } else {
            Stretch::NORMAL
        };
        StyleKey {
            style: self.style,
            weight: self.weight,
            stretch,
        }
    }

    /// What the matcher requires of a family's pitch.
    #[inline]
    pub fn pitch(&self) -> Pitch {
        if self.ignore_pitch {
            Pitch::Any
        } else if self.fixed_pitch {
            Pitch::Fixed
        } else {
            Pitch::Proportional
        }
    }

    /// The hint to pass when asking for fallbacks: fixed-pitch requests without a hint prefer
    /// typewriter faces.
    #[inline]
    pub fn fallback_style_hint(&self) -> StyleHint {
        if self.style_hint == StyleHint::AnyStyle && self.fixed_pitch {
            StyleHint::TypeWriter
        } else {
            self.style_hint
        }
    }

    /// Whether resolution wraps the result in a multi engine.
    #[inline]
    pub fn merges_fonts(&self) -> bool {
        !self.style_strategy.contains(StyleStrategy::NO_FONT_MERGING)
    }
}

// Sizes compare by bit pattern so that `Eq` and `Hash` agree.
impl PartialEq for FontRequest {
    fn eq(&self, other: &FontRequest) -> bool {
        self.family == other.family
            && self.style_name == other.style_name
            && self.fallback_families == other.fallback_families
            && self.point_size.to_bits() == other.point_size.to_bits()
            && self.pixel_size.to_bits() == other.pixel_size.to_bits()
            && self.style_strategy == other.style_strategy
            && self.style_hint == other.style_hint
            && self.weight == other.weight
            && self.style == other.style
            && self.stretch == other.stretch
            && self.fixed_pitch == other.fixed_pitch
            && self.ignore_pitch == other.ignore_pitch
    }
}

impl Eq for FontRequest {}

impl Hash for FontRequest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.family.hash(state);
        self.style_name.hash(state);
        self.fallback_families.hash(state);
        self.point_size.to_bits().hash(state);
        self.pixel_size.to_bits().hash(state);
        self.style_strategy.hash(state);
        self.style_hint.hash(state);
        self.weight.hash(state);
        self.style.hash(state);
        self.stretch.hash(state);
        self.fixed_pitch.hash(state);
        self.ignore_pitch.hash(state);
    }
}
