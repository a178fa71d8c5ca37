// font-resolver/src/matching.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Determines the registered description closest to a request.
//!
//! Matching is a scored search. Within a foundry the closest style wins (`best_style`); for that
//! style a size is picked and the combination scored (`best_foundry`); the lowest score across
//! families wins (`match_font`). Lower is better and 0 is exact.

use log::debug;
use std::convert::TryFrom;

use crate::family::{Family, Foundry, BITMAP_SCALABLE, SMOOTH_SCALABLE};
use crate::properties::StyleKey;
use crate::request::{FontRequest, Pitch, StyleStrategy};
use crate::script::{Script, WritingSystem};
use crate::source::Source;
use crate::store::FontStore;

/// Added when the family's pitch is not the requested one.
pub const PITCH_MISMATCH: u32 = 0x4000;
/// Added when the chosen style's key is not the requested one.
pub const STYLE_MISMATCH: u32 = 0x2000;
/// Added when a bitmap has to be scaled to reach the requested size.
pub const BITMAP_SCALED_PENALTY: u32 = 0x1000;

/// Default score below which `match_font` stops looking at further families.
pub const SHORT_CIRCUIT_SCORE: u32 = 10;

/// Identifies a matched family, foundry, style and size by their indices in the store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FontDesc {
    /// Index of the family in `FontStore::families`.
    pub family: usize,
    /// Index of the foundry in `Family::foundries`.
    pub foundry: usize,
    /// Index of the style in `Foundry::styles`.
    pub style: usize,
    /// Index of the size in `FontStyle::pixel_sizes`.
    pub size: usize,
}

/// The outcome of `match_font`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FontMatch {
    /// What was matched.
    pub desc: FontDesc,
    /// Name of the matched family.
    pub family: String,
    /// How far it is from the request.
    pub score: u32,
    /// The pixel size the match will render at.
    pub pixel_size: u32,
}

impl FontMatch {
    /// Points `desc.family` back at the matched family after the store may have changed.
    ///
    /// Populating a family can register new families, and these are inserted in sorted
    /// position, so a family index taken before a population may name another family after it.
    /// Foundry, style and size indices stay valid since those lists only grow at the end.
    pub fn relocate(&mut self, store: &FontStore) {
        if let Ok(index) = store.family_index(&self.family) {
            self.desc.family = index;
        }
    }
}

/// The best foundry/style/size found within one family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FoundryMatch {
    /// Index of the foundry.
    pub foundry: usize,
    /// Index of the style within the foundry.
    pub style: usize,
    /// Index of the size within the style.
    pub size: usize,
    /// The pixel size the match will render at.
    pub pixel_size: u32,
    /// The score of this match.
    pub score: u32,
}

/// Picks the style of `foundry` closest to `key`.
///
/// A style whose non-empty name equals `style_name` wins outright. Otherwise the style with the
/// smallest `StyleKey::distance` wins, the first one on ties. Returns `None` for a foundry without
/// styles.
pub fn best_style(foundry: &Foundry, key: &StyleKey, style_name: &str) -> Option<usize> {
    let mut best = None;
    let mut best_distance = u32::MAX;

    for (index, style) in foundry.styles().iter().enumerate() {
        if !style_name.is_empty() && style.style_name == style_name {
            best = Some(index);
            best_distance = 0;
            break;
        }

        let distance = key.distance(&style.key);
        if distance < best_distance {
            best = Some(index);
            best_distance = distance;
        }
    }

    debug!("          best style has distance {:#x}", best_distance);
    best
}

/// Finds the foundry, style and size of `family` that score below `best_score`.
///
/// `foundry_name`, if not empty, restricts the search to that foundry. Returns `None` if nothing
/// in the family beats `best_score`.
pub fn best_foundry(
    best_score: u32,
    style_strategy: StyleStrategy,
    family: &Family,
    foundry_name: &str,
    key: &StyleKey,
    pixel_size: u32,
    pitch: Pitch,
    style_name: &str,
) -> Option<FoundryMatch> {
    let mut best_score = best_score;
    let mut best = None;

    debug!(
        "  looking for best foundry for family {:?} [{}]",
        family.name,
        family.foundries().len()
    );

    for (foundry_index, foundry) in family.foundries().iter().enumerate() {
        if !foundry_name.is_empty() && !crate::family_name::eq_ignore_case(&foundry.name, foundry_name)
        {
            continue;
        }

        debug!(
            "          looking for matching style in foundry {:?} {}",
            if foundry.name.is_empty() { "-- none --" } else { &foundry.name },
            foundry.styles().len()
        );

        let style_index = match best_style(foundry, key, style_name) {
            Some(style_index) => style_index,
            None => continue,
        };
        let style = &foundry.styles()[style_index];

        if !style.smoothly_scalable && style_strategy.contains(StyleStrategy::FORCE_OUTLINE) {
            debug!("            FORCE_OUTLINE set, but not smoothly scalable");
            continue;
        }

        let mut size = None;
        let mut px = pixel_size;

        // 1. An exact size.
        if !style_strategy.contains(StyleStrategy::FORCE_OUTLINE) {
            size = u16::try_from(pixel_size)
                .ok()
                .and_then(|requested| style.pixel_size_index(requested));
            if size.is_some() {
                debug!("          found exact size match ({} pixels)", pixel_size);
            }
        }

        // 2. A smoothly scalable style.
        if size.is_none()
            && style.smoothly_scalable
            && !style_strategy.contains(StyleStrategy::PREFER_BITMAP)
        {
            size = style.pixel_size_index(SMOOTH_SCALABLE);
            if size.is_some() {
                debug!("          found smoothly scalable font ({} pixels)", pixel_size);
            }
        }

        // 3. A bitmap-scalable style, when an exact size beats quality.
        if size.is_none()
            && style.bitmap_scalable
            && style_strategy.contains(StyleStrategy::PREFER_MATCH)
        {
            size = style.pixel_size_index(BITMAP_SCALABLE);
            if size.is_some() {
                debug!("          found bitmap scalable font ({} pixels)", pixel_size);
            }
        }

        // 4. The closest fixed size. Smaller sizes are penalized by one, since they usually come
        // from truncating a fractional size.
        if size.is_none() {
            let mut best_distance = u32::MAX;
            for (size_index, candidate) in style.pixel_sizes().iter().enumerate() {
                if candidate.is_scalable() {
                    continue;
                }
                let candidate_size = u32::from(candidate.pixel_size);
                let distance = if candidate_size < pixel_size {
                    pixel_size - candidate_size + 1
                } else {
                    candidate_size - pixel_size
                };
                if distance < best_distance {
                    best_distance = distance;
                    size = Some(size_index);
                    debug!("          best size so far: {:3} ({})", candidate_size, pixel_size);
                }
            }

            let size_index = match size {
                Some(size_index) => size_index,
                None => {
                    debug!("          no size supports the script we want");
                    continue;
                }
            };

            let scaled = if style.bitmap_scalable
                && !style_strategy.contains(StyleStrategy::PREFER_QUALITY)
                && pixel_size > 0
                && best_distance * 10 / pixel_size >= 2
            {
                // The closest size is not close enough; scale a bitmap instead.
                style.pixel_size_index(BITMAP_SCALABLE)
            } else {
                None
            };
            match scaled {
                Some(scaled_index) => size = Some(scaled_index),
                None => px = u32::from(style.pixel_sizes()[size_index].pixel_size),
            }
        }

        let size_index = match size {
            Some(size_index) => size_index,
            None => continue,
        };
        let chosen_size = u32::from(style.pixel_sizes()[size_index].pixel_size);

        let mut score = 0;
        match pitch {
            Pitch::Fixed if !family.fixed_pitch => score += PITCH_MISMATCH,
            Pitch::Proportional if family.fixed_pitch => score += PITCH_MISMATCH,
            _ => {}
        }
        if !key.matches(&style.key) {
            score += STYLE_MISMATCH;
        }
        if !style.smoothly_scalable && px != chosen_size {
            score += BITMAP_SCALED_PENALTY;
        }
        if px != pixel_size {
            score += if px > pixel_size {
                px - pixel_size
            } else {
                pixel_size - px
            };
        }

        if score < best_score {
            debug!(
                "          found a match: score {:#x} best score so far {:#x}",
                score, best_score
            );
            best_score = score;
            best = Some(FoundryMatch {
                foundry: foundry_index,
                style: style_index,
                size: size_index,
                pixel_size: px,
                score,
            });
        } else {
            debug!("          score {:#x} no better than best {:#x}", score, best_score);
        }
    }

    best
}

/// Finds the best description for `request` across the families of the store.
///
/// `family_name` empty means "any family": the first families in store order supporting the
/// script win. Families named in `blacklist` are skipped. Families are populated as they
/// are visited.
///
/// The search stops at the first family scoring below `short_circuit_score`, so a later family
/// can lose even if it would have scored lower.
pub fn match_font<S>(
    store: &mut FontStore,
    source: &S,
    script: Script,
    request: &FontRequest,
    family_name: &str,
    foundry_name: &str,
    blacklist: &[String],
    short_circuit_score: u32,
) -> Option<FontMatch>
where
    S: Source + ?Sized,
{
    let key = request.style_key();
    let pitch = request.pitch();
    let pixel_size = request.match_pixel_size();

    debug!(
        "match: family {:?} [{:?}], script {:?}, weight {}, style {:?}, stretch {}, \
         pixel size {}, pitch {:?}",
        if family_name.is_empty() { "-- first in script --" } else { family_name },
        if foundry_name.is_empty() { "-- any --" } else { foundry_name },
        script,
        key.weight.0,
        key.style,
        key.stretch.0,
        pixel_size,
        pitch
    );

    let writing_system = WritingSystem::for_script(script);
    let mut best: Option<FontMatch> = None;
    let mut score = u32::MAX;

    let mut index = 0;
    while index < store.len() {
        let candidate = index;
        index += 1;

        {
            let family = store.family_at(candidate);
            if blacklist
                .iter()
                .any(|failed| crate::family_name::eq_ignore_case(failed, &family.name))
            {
                continue;
            }
            if !family_name.is_empty() && !family.matches_name(family_name) {
                continue;
            }
        }

        let candidate = store.ensure_populated(candidate, source);
        index = candidate + 1;
        if let Some(ref mut best) = best {
            best.relocate(store);
        }
        let family = store.family_at(candidate);

        if !family.writing_systems.supports(writing_system) {
            continue;
        }

        let mut found = best_foundry(
            score,
            request.style_strategy,
            family,
            foundry_name,
            &key,
            pixel_size,
            pitch,
            &request.style_name,
        );
        if found.is_none() && !foundry_name.is_empty() {
            // The specific foundry was not found, so look for any foundry matching our
            // requirements.
            found = best_foundry(
                score,
                request.style_strategy,
                family,
                "",
                &key,
                pixel_size,
                pitch,
                &request.style_name,
            );
        }

        if let Some(found) = found {
            score = found.score;
            best = Some(FontMatch {
                desc: FontDesc {
                    family: candidate,
                    foundry: found.foundry,
                    style: found.style,
                    size: found.size,
                },
                family: family.name.clone(),
                score,
                pixel_size: found.pixel_size,
            });
        }
        if score < short_circuit_score {
            break;
        }
    }

    best
}
