// font-resolver/src/source.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A platform font provider: where descriptions and engines come from.
//!
//! All methods are synchronous. Failure is an empty result or `None`, never a panic. Methods that
//! register fonts receive the store explicitly; they are called with the database lock held.

use crate::engine::{Engine, EngineRef};
use crate::family_name::FamilyName;
use crate::handle::Handle;
use crate::properties::Style;
use crate::request::{FontRequest, StyleHint};
use crate::script::{Script, WritingSystem};
use crate::store::FontStore;

#[cfg(feature = "source")]
pub use crate::sources::mem::MemSource;

/// A platform font provider: where descriptions and engines come from.
pub trait Source {
    /// Registers every installed family. Called once per store generation, before the first
    /// match. Sources that populate lazily only call `FontStore::register_family` here.
    fn populate_font_database(&self, store: &mut FontStore);

    /// Registers every style and size of `family_name`, via `FontStore::register_font`.
    fn populate_family(&self, store: &mut FontStore, family_name: &str);

    /// Registers additional (e.g. localized) family aliases. Returns true if anything was
    /// registered, in which case a failed match is retried.
    fn populate_family_aliases(&self, _store: &mut FontStore) -> bool {
        false
    }

    /// Lists families to try when `family` cannot render `script`, best first.
    ///
    /// The default implementation lists every family supporting the script's writing system,
    /// with those that have a style of the requested slant first.
    fn fallbacks_for_family(
        &self,
        store: &mut FontStore,
        family: &str,
        style: Style,
        style_hint: StyleHint,
        script: Script,
    ) -> Vec<String> {
        let _ = (family, style_hint);
        default_fallbacks_for_family(self, store, style, script)
    }

    /// Builds an engine for a matched description. `request` carries the final pixel size and
    /// stretch; `handle` is what was registered for the matched size.
    fn font_engine(&self, request: &FontRequest, handle: Option<&Handle>) -> Option<Engine>;

    /// Wraps `engine` in a multi engine for `script`.
    fn font_engine_multi(&self, engine: EngineRef, script: Script) -> Engine {
        Engine::multi(engine, script)
    }

    /// Gives back a handle the store no longer references.
    fn release_handle(&self, _handle: Handle) {}

    /// Maps an alias to the family it names.
    fn resolve_family_alias(&self, store: &FontStore, alias: &str) -> String {
        store.resolve_alias(alias)
    }

    /// Returns true if every registered face can be rendered at any size.
    fn fonts_always_scalable(&self) -> bool {
        false
    }

    /// Drops any state derived from the installed font set.
    fn invalidate(&self) {}
}

/// Lists every family that supports the writing system of `script`: families with a style of the
/// requested slant first, the rest after, each in store order.
pub fn default_fallbacks_for_family<S>(
    source: &S,
    store: &mut FontStore,
    style: Style,
    script: Script,
) -> Vec<String>
where
    S: Source + ?Sized,
{
    let writing_system = WritingSystem::for_script(script);
    let mut preferred = vec![];
    let mut others = vec![];

    let mut index = 0;
    while index < store.len() {
        index = store.ensure_populated(index, source);
        let family = store.family_at(index);
        index += 1;

        if !family.writing_systems.supports(writing_system) {
            continue;
        }

        let has_style = family
            .foundries()
            .iter()
            .flat_map(|foundry| foundry.styles())
            .any(|font_style| font_style.key.style == style);
        if has_style {
            preferred.push(family.name.clone());
        } else {
            others.push(family.name.clone());
        }
    }

    preferred.extend(others);
    preferred
}

/// Stably reorders `families` so that those supporting the writing system of `script` come first.
///
/// Entries may carry a foundry (`"Family [Foundry]"`). Families unknown to the store sort last.
/// Common scripts leave the list untouched.
pub fn sort_families_by_writing_system<S>(
    source: &S,
    store: &mut FontStore,
    script: Script,
    families: Vec<String>,
) -> Vec<String>
where
    S: Source + ?Sized,
{
    let writing_system = WritingSystem::for_script(script);
    if writing_system == WritingSystem::Any {
        return families;
    }

    let (mut supported, unsupported): (Vec<String>, Vec<String>) =
        families.into_iter().partition(|family| {
            let name = FamilyName::parse(family);
            let index = store
                .families()
                .iter()
                .position(|candidate| candidate.matches_name(&name.family));
            match index {
                Some(index) => {
                    let index = store.ensure_populated(index, source);
                    store
                        .family_at(index)
                        .writing_systems
                        .supports(writing_system)
                }
                None => false,
            }
        });
    supported.extend(unsupported);
    supported
}
