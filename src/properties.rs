// font-resolver/src/properties.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Properties that specify which style of a family to use: slant, weight, and stretchiness.

use std::fmt::{self, Debug, Display, Formatter};

/// Allows italic or oblique faces to be selected.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum Style {
    /// A face that is neither italic not obliqued.
    Normal,
    /// A form that is generally cursive in nature.
    Italic,
    /// A typically-sloped version of the regular face.
    Oblique,
}

impl Default for Style {
    fn default() -> Style {
        Style::Normal
    }
}

impl Display for Style {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(self, f)
    }
}

/// The degree of blackness or stroke thickness of a font. This value ranges from 0 to 99, with
/// 50 as normal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Weight(pub u8);

impl Default for Weight {
    #[inline]
    fn default() -> Weight {
        Weight::NORMAL
    }
}

impl Weight {
    /// Thin weight (0), the thinnest value.
    pub const THIN: Weight = Weight(0);
    /// Extra light weight (12).
    pub const EXTRA_LIGHT: Weight = Weight(12);
    /// Light weight (25).
    pub const LIGHT: Weight = Weight(25);
    /// Normal (50).
    pub const NORMAL: Weight = Weight(50);
    /// Medium weight (57, higher than normal).
    pub const MEDIUM: Weight = Weight(57);
    /// Demibold weight (63).
    pub const DEMI_BOLD: Weight = Weight(63);
    /// Bold weight (75).
    pub const BOLD: Weight = Weight(75);
    /// Extra-bold weight (81).
    pub const EXTRA_BOLD: Weight = Weight(81);
    /// Black weight (87).
    pub const BLACK: Weight = Weight(87);
    /// The largest representable weight.
    pub const MAX: Weight = Weight(99);

    /// Parses a weight out of a style name such as "Semibold Italic".
    ///
    /// Exact names are checked first, then substrings. Anything unrecognized is normal.
    pub fn from_style_name(style_name: &str) -> Weight {
        let s = style_name.to_lowercase();
        match &*s {
            "normal" | "regular" => return Weight::NORMAL,
            "bold" => return Weight::BOLD,
            "semibold" | "semi bold" | "demibold" | "demi bold" => return Weight::DEMI_BOLD,
            "medium" => return Weight::MEDIUM,
            "black" => return Weight::BLACK,
            "light" => return Weight::LIGHT,
            "thin" => return Weight::THIN,
            _ => {}
        }

        if s.starts_with("ex") || s.starts_with("ul") {
            let rest = s.get(2..).unwrap_or("");
            if rest == "tralight" || rest == "tra light" {
                return Weight::EXTRA_LIGHT;
            }
            if rest == "trabold" || rest == "tra bold" {
                return Weight::EXTRA_BOLD;
            }
        }

        if s.contains("bold") {
            if s.contains("demi") {
                return Weight::DEMI_BOLD;
            }
            return Weight::BOLD;
        }
        if s.contains("thin") {
            return Weight::THIN;
        }
        if s.contains("light") {
            return Weight::LIGHT;
        }
        if s.contains("black") {
            return Weight::BLACK;
        }
        Weight::NORMAL
    }
}

/// The width of a font as a percentage of the normal width.
///
/// Widths range from 1 to 4000, with 100 as the normal width. Zero means "unspecified", and
/// matches any width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stretch(pub u16);

impl Default for Stretch {
    #[inline]
    fn default() -> Stretch {
        Stretch::ANY
    }
}

impl Stretch {
    /// No particular width was asked for.
    pub const ANY: Stretch = Stretch(0);
    /// Ultra-condensed width (50%), the narrowest named width.
    pub const ULTRA_CONDENSED: Stretch = Stretch(50);
    /// Extra-condensed width (62%).
    pub const EXTRA_CONDENSED: Stretch = Stretch(62);
    /// Condensed width (75%).
    pub const CONDENSED: Stretch = Stretch(75);
    /// Semi-condensed width (87%).
    pub const SEMI_CONDENSED: Stretch = Stretch(87);
    /// Normal width (100%).
    pub const NORMAL: Stretch = Stretch(100);
    /// Semi-expanded width (112%).
    pub const SEMI_EXPANDED: Stretch = Stretch(112);
    /// Expanded width (125%).
    pub const EXPANDED: Stretch = Stretch(125);
    /// Extra-expanded width (150%).
    pub const EXTRA_EXPANDED: Stretch = Stretch(150);
    /// Ultra-expanded width (200%), the widest named width.
    pub const ULTRA_EXPANDED: Stretch = Stretch(200);
    /// The widest representable width.
    pub const MAX: Stretch = Stretch(4000);

    /// Returns true if a width was actually specified.
    #[inline]
    pub fn is_specified(self) -> bool {
        self.0 != 0
    }
}

/// Distance added when one side is italic and the other oblique.
const SLANT_NEAR_MISS: u32 = 0x0001;
/// Distance added when one side is upright and the other slanted.
const SLANT_MISMATCH: u32 = 0x1000;

/// Identifies one style within a foundry: slant, weight and stretch.
///
/// This object supports a method chaining style for idiomatic initialization; e.g.
///
///     # use font_resolver::properties::{StyleKey, Style};
///     println!("{:?}", StyleKey::new().style(Style::Italic));
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct StyleKey {
    /// The slant.
    pub style: Style,
    /// The weight.
    pub weight: Weight,
    /// The stretch; `Stretch::ANY` leaves it unspecified.
    pub stretch: Stretch,
}

impl StyleKey {
    /// Initializes a key to normal style, normal weight, and unspecified stretch.
    #[inline]
    pub fn new() -> StyleKey {
        StyleKey::default()
    }

    /// Derives a key from a style name such as "Bold Italic".
    pub fn from_style_name(style_name: &str) -> StyleKey {
        let style = if style_name.contains("Italic") {
            Style::Italic
        } else if style_name.contains("Oblique") {
            Style::Oblique
        } else {
            Style::Normal
        };
        StyleKey {
            style,
            weight: Weight::from_style_name(style_name),
            stretch: Stretch::ANY,
        }
    }

    /// Sets the value of the style property and returns this key for method chaining.
    #[inline]
    pub fn style(&mut self, style: Style) -> &mut StyleKey {
        self.style = style;
        self
    }

    /// Sets the value of the weight property and returns this key for method chaining.
    #[inline]
    pub fn weight(&mut self, weight: Weight) -> &mut StyleKey {
        self.weight = weight;
        self
    }

    /// Sets the value of the stretch property and returns this key for method chaining.
    #[inline]
    pub fn stretch(&mut self, stretch: Stretch) -> &mut StyleKey {
        self.stretch = stretch;
        self
    }

    /// Loose equality used by the matcher: stretch only has to agree when both sides specify one.
    ///
    /// This relation is not transitive, which is why it is not `PartialEq`.
    pub fn matches(&self, other: &StyleKey) -> bool {
        self.style == other.style
            && self.weight == other.weight
            && (!self.stretch.is_specified()
                || !other.stretch.is_specified()
                || self.stretch == other.stretch)
    }

    /// How far `other` is from this key.
    ///
    /// The weight difference, plus the stretch difference when both stretches are specified, plus
    /// a slant penalty: 0x0001 for italic against oblique, 0x1000 for upright against slanted.
    pub fn distance(&self, other: &StyleKey) -> u32 {
        let mut distance = (i32::from(self.weight.0) - i32::from(other.weight.0)).abs() as u32;

        if self.stretch.is_specified() && other.stretch.is_specified() {
            distance += (i32::from(self.stretch.0) - i32::from(other.stretch.0)).abs() as u32;
        }

        if self.style != other.style {
            if self.style != Style::Normal && other.style != Style::Normal {
                distance += SLANT_NEAR_MISS;
            } else {
                distance += SLANT_MISMATCH;
            }
        }

        distance
    }
}
