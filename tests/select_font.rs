// font-resolver/tests/select_font.rs
//
// Copyright © 2019 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// Resolution tests: which engine a request ends up with, including fallbacks.

#![cfg(feature = "source")]

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use font_resolver::cache::CacheKey;
use font_resolver::database::{DatabaseConfig, FontDatabase};
use font_resolver::engine::{Engine, EngineType};
use font_resolver::font::Font;
use font_resolver::handle::Handle;
use font_resolver::loader::Loader;
use font_resolver::properties::{Stretch, Style, StyleKey, Weight};
use font_resolver::request::{FontRequest, StyleHint, StyleStrategy};
use font_resolver::script::{Script, WritingSystems};
use font_resolver::source::{default_fallbacks_for_family, Source};
use font_resolver::sources::{MemFont, MemSource};
use font_resolver::store::FontStore;

static SANS_SERIF_FAMILY_NAME: &'static str = "Arial";
static MONOSPACE_FAMILY_NAME: &'static str = "Courier";

fn default_source() -> MemSource {
    MemSource::from_fonts(vec![
        MemFont::new(SANS_SERIF_FAMILY_NAME).clone(),
        MemFont::new(SANS_SERIF_FAMILY_NAME)
            .key(*StyleKey::new().weight(Weight::BOLD))
            .clone(),
        MemFont::new(MONOSPACE_FAMILY_NAME)
            .fixed_pitch(true)
            .clone(),
    ])
}

fn no_merging(family: &str) -> FontRequest {
    FontRequest::new(family)
        .pixel_size(16.0)
        .style_strategy(StyleStrategy::NO_FONT_MERGING)
        .clone()
}

// Serves the fonts of a `MemSource` and records the family of every engine it is asked for.
// With `late_family` set to (trigger, family), `family` stays out of the initial family list and
// is only registered while `trigger` is being populated.
struct TrackingSource {
    fonts: MemSource,
    late_family: Option<(String, String)>,
    engine_families: Mutex<Vec<String>>,
}

impl TrackingSource {
    fn new(fonts: MemSource) -> TrackingSource {
        TrackingSource {
            fonts,
            late_family: None,
            engine_families: Mutex::new(vec![]),
        }
    }

    fn engine_families(&self) -> Vec<String> {
        self.engine_families.lock().unwrap().clone()
    }
}

impl Source for TrackingSource {
    fn populate_font_database(&self, store: &mut FontStore) {
        for font in self.fonts.fonts() {
            match self.late_family {
                Some((_, ref late)) if *late == font.family => {}
                _ => store.register_family(&font.family),
            }
        }
    }

    fn populate_family(&self, store: &mut FontStore, family_name: &str) {
        self.fonts.populate_family(store, family_name);
        if let Some((ref trigger, ref late)) = self.late_family {
            if trigger == family_name {
                self.fonts.populate_family(store, late);
            }
        }
    }

    fn fallbacks_for_family(
        &self,
        store: &mut FontStore,
        _: &str,
        style: Style,
        _: StyleHint,
        script: Script,
    ) -> Vec<String> {
        default_fallbacks_for_family(self, store, style, script)
    }

    fn font_engine(&self, request: &FontRequest, handle: Option<&Handle>) -> Option<Engine> {
        self.engine_families
            .lock()
            .unwrap()
            .push(request.family.clone());
        self.fonts.font_engine(request, handle)
    }
}

#[test]
fn resolve_unknown_family_through_provider_fallbacks() {
    let mut source = default_source();
    source.set_fallbacks("NoSuchFamily", &["Helvetica", SANS_SERIF_FAMILY_NAME]);
    let database = FontDatabase::new(source);
    let request = FontRequest::new("NoSuchFamily").pixel_size(16.0).clone();

    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.engine_type(), EngineType::Multi);
    let primary = engine.as_multi().unwrap().primary();
    assert_eq!(primary.engine_type(), EngineType::Native);
    assert_eq!(primary.def().family, SANS_SERIF_FAMILY_NAME);
    assert_eq!(engine.def().family, SANS_SERIF_FAMILY_NAME);

    let again = database.resolve(&request, Script::Latin);
    assert!(Arc::ptr_eq(&engine, &again));
    assert_eq!(database.source().engines_built(), 1);
}

#[test]
fn resolve_nothing_to_box_placeholder() {
    let database = FontDatabase::new(MemSource::new());
    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME).pixel_size(20.0).clone();

    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.engine_type(), EngineType::Box);
    assert_eq!(engine.box_pixel_size(), Some(20));

    let again = database.resolve(&request, Script::Latin);
    assert!(Arc::ptr_eq(&engine, &again));
}

#[test]
fn resolve_skips_family_whose_engine_cannot_be_built() {
    let database = FontDatabase::new(MemSource::from_fonts(vec![
        MemFont::new("Broken").unloadable().clone(),
        MemFont::new(SANS_SERIF_FAMILY_NAME).clone(),
    ]));
    let request = FontRequest::new("Broken").pixel_size(16.0).clone();

    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.engine_type(), EngineType::Multi);
    assert_eq!(engine.def().family, SANS_SERIF_FAMILY_NAME);
    assert_eq!(database.source().engines_built(), 1);
}

#[test]
fn resolve_falls_back_when_script_is_unsupported() {
    let database = FontDatabase::new(MemSource::from_fonts(vec![
        MemFont::new(SANS_SERIF_FAMILY_NAME)
            .unsupported_script(Script::Arabic)
            .clone(),
        MemFont::new("Noto Naskh")
            .writing_systems(WritingSystems::ARABIC)
            .clone(),
    ]));
    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME).pixel_size(16.0).clone();

    let engine = database.resolve(&request, Script::Arabic);
    assert_eq!(engine.def().family, "Noto Naskh");
    assert!(engine.supports_script(Script::Arabic));

    // Latin text still gets the requested family.
    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.def().family, SANS_SERIF_FAMILY_NAME);
}

#[test]
fn resolve_complex_script_to_first_supporting_family() {
    let mut source = MemSource::from_fonts(vec![
        MemFont::new(SANS_SERIF_FAMILY_NAME).clone(),
        MemFont::new("Thai Font")
            .writing_systems(WritingSystems::THAI)
            .clone(),
    ]);
    source.set_fallbacks(SANS_SERIF_FAMILY_NAME, &[]);
    let database = FontDatabase::new(source);

    let engine = database.resolve(&no_merging(SANS_SERIF_FAMILY_NAME), Script::Thai);
    assert_eq!(engine.engine_type(), EngineType::Native);
    assert_eq!(engine.def().family, "Thai Font");
}

#[test]
fn resolve_first_family_in_script_once() {
    let mut source = MemSource::from_fonts(vec![MemFont::new("Arabic Sans")
        .writing_systems(WritingSystems::LATIN | WritingSystems::ARABIC)
        .clone()]);
    source.set_fallbacks("NoSuchFamily", &[]);
    let database = FontDatabase::new(source);
    let request = FontRequest::new("NoSuchFamily").pixel_size(16.0).clone();

    let engine = database.resolve(&request, Script::Arabic);
    assert_eq!(engine.engine_type(), EngineType::Multi);
    assert_eq!(engine.def().family, "Arabic Sans");

    let again = database.resolve(&request, Script::Arabic);
    assert!(Arc::ptr_eq(&engine, &again));
    assert_eq!(database.source().engines_built(), 1);
}

#[test]
fn resolve_empty_family_asks_source_for_matched_family() {
    let database = FontDatabase::new(TrackingSource::new(default_source()));
    let request = no_merging("");

    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.def().family, SANS_SERIF_FAMILY_NAME);
    assert_eq!(
        database.source().engine_families(),
        vec![SANS_SERIF_FAMILY_NAME.to_owned()]
    );

    let again = database.resolve(&request, Script::Latin);
    assert!(Arc::ptr_eq(&engine, &again));
    assert_eq!(database.source().engine_families().len(), 1);
}

#[test]
fn resolve_matched_family_after_fallbacks_register_new_families() {
    let fonts = MemSource::from_fonts(vec![
        MemFont::new("Beta").clone(),
        MemFont::new("Beta")
            .key(*StyleKey::new().weight(Weight::BOLD))
            .clone(),
        MemFont::new("Zeta").clone(),
        MemFont::new("Aaa").clone(),
    ]);
    let mut source = TrackingSource::new(fonts);
    source.late_family = Some(("Zeta".to_owned(), "Aaa".to_owned()));
    let database = FontDatabase::new(source);
    assert!(!database.has_family("Aaa"));

    let request = FontRequest::new("Beta")
        .pixel_size(16.0)
        .weight(Weight::BOLD)
        .clone();
    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.engine_type(), EngineType::Multi);
    assert_eq!(engine.def().family, "Beta");
    assert_eq!(engine.as_multi().unwrap().primary().def().weight, Weight::BOLD);

    // Listing the fallbacks populated "Zeta", which brought in "Aaa".
    assert!(database.has_family("Aaa"));
}

#[test]
fn resolve_stretch_relative_to_matched_style() {
    let database = FontDatabase::new(MemSource::from_fonts(vec![
        MemFont::new("Plain").clone(),
        MemFont::new("Narrow")
            .key(*StyleKey::new().stretch(Stretch::CONDENSED))
            .clone(),
        MemFont::new("Wide")
            .key(*StyleKey::new().stretch(Stretch::SEMI_EXPANDED))
            .clone(),
        MemFont::new("Squeezed")
            .key(*StyleKey::new().stretch(Stretch(5)))
            .clone(),
        MemFont::new("Named")
            .style_name("Condensed")
            .key(*StyleKey::new().stretch(Stretch::CONDENSED))
            .clone(),
    ]));
    let stretch_of = |request: &FontRequest| {
        let engine = database.resolve(request, Script::Latin);
        engine.def().stretch
    };

    // A style without a stretch of its own is rendered unstretched.
    assert_eq!(
        stretch_of(no_merging("Plain").stretch(Stretch::CONDENSED)),
        Stretch::NORMAL
    );
    assert_eq!(
        stretch_of(no_merging("Narrow").stretch(Stretch::CONDENSED)),
        Stretch::NORMAL
    );
    assert_eq!(
        stretch_of(no_merging("Wide").stretch(Stretch::CONDENSED)),
        Stretch(67)
    );
    assert_eq!(
        stretch_of(no_merging("Squeezed").stretch(Stretch::MAX)),
        Stretch::MAX
    );
    assert_eq!(
        stretch_of(
            no_merging("Named")
                .style_name("Condensed")
                .stretch(Stretch::SEMI_CONDENSED)
        ),
        Stretch::NORMAL
    );
}

#[test]
fn resolve_symbol_font_without_merging() {
    let database = FontDatabase::new(MemSource::from_fonts(vec![MemFont::new("Symbol")
        .symbol()
        .clone()]));
    let request = FontRequest::new("Symbol").pixel_size(16.0).clone();

    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.engine_type(), EngineType::Native);
    assert!(engine.is_symbol());
}

#[test]
fn resolve_fills_in_matched_style() {
    let database = FontDatabase::new(default_source());
    let request = no_merging(SANS_SERIF_FAMILY_NAME)
        .weight(Weight::BOLD)
        .point_size(12.0)
        .clone();

    let engine = database.resolve(&request, Script::Latin);
    let def = engine.def();
    assert_eq!(def.family, SANS_SERIF_FAMILY_NAME);
    assert_eq!(def.weight, Weight::BOLD);
    assert_eq!(def.pixel_size, 16.0);
    assert_eq!(def.point_size, 12.0);
    assert!(!def.fixed_pitch);
    assert!(!def.ignore_pitch);
    assert!(engine.is_smoothly_scalable());

    let face = engine.loader().unwrap();
    assert_eq!(face.family_name(), SANS_SERIF_FAMILY_NAME);
}

#[test]
fn resolve_bitmap_font_at_registered_size() {
    let database = FontDatabase::new(MemSource::from_fonts(vec![MemFont::new(
        MONOSPACE_FAMILY_NAME,
    )
    .pixel_size(12)
    .clone()]));
    let request = no_merging(MONOSPACE_FAMILY_NAME).pixel_size(13.0).clone();

    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.def().pixel_size, 12.0);
    assert!(!engine.is_smoothly_scalable());
}

#[test]
fn load_multi_engine_fallbacks_on_demand() {
    let mut source = default_source();
    source.set_fallbacks(SANS_SERIF_FAMILY_NAME, &[MONOSPACE_FAMILY_NAME]);
    let database = FontDatabase::new(source);
    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME).pixel_size(16.0).clone();

    let engine = database.resolve(&request, Script::Latin);
    let multi = engine.as_multi().unwrap();
    assert_eq!(multi.fallback_families(), &[MONOSPACE_FAMILY_NAME.to_owned()]);
    assert!(multi.loaded_fallback(0).is_none());

    let fallback = database.fallback_engine(&engine, 0).unwrap();
    assert_eq!(fallback.engine_type(), EngineType::Native);
    assert_eq!(fallback.def().family, MONOSPACE_FAMILY_NAME);
    assert!(Arc::ptr_eq(&fallback, &multi.loaded_fallback(0).unwrap()));

    let again = database.fallback_engine(&engine, 0).unwrap();
    assert!(Arc::ptr_eq(&fallback, &again));
    assert!(database.fallback_engine(&engine, 1).is_none());
    assert!(database.fallback_engine(&fallback, 0).is_none());
}

#[test]
fn load_request_fallback_families_first() {
    let database = FontDatabase::new(default_source());
    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME)
        .pixel_size(16.0)
        .fallback_families(&[MONOSPACE_FAMILY_NAME])
        .clone();

    let engine = database.resolve(&request, Script::Latin);
    let fallbacks = engine.as_multi().unwrap().fallback_families();
    assert_eq!(fallbacks[0], MONOSPACE_FAMILY_NAME);
}

#[test]
fn load_font_converts_point_size() {
    let database = FontDatabase::new(default_source());
    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME).point_size(12.0).clone();

    let mut font = Font::new(request.clone());
    let engine = font.engine_for_script(&database, Script::Latin);
    assert_eq!(engine.def().pixel_size, 16.0);

    let mut other = Font::new(request);
    let other_engine = other.engine_for_script(&database, Script::Latin);
    assert!(Arc::ptr_eq(&engine, &other_engine));
    assert!(Arc::ptr_eq(
        font.engine_data().unwrap(),
        other.engine_data().unwrap()
    ));

    let mut hidpi = Font::with_dpi(
        FontRequest::new(SANS_SERIF_FAMILY_NAME).point_size(12.0).clone(),
        192.0,
    );
    let engine = hidpi.engine_for_script(&database, Script::Latin);
    assert_eq!(engine.def().pixel_size, 32.0);
}

#[test]
fn load_font_reports_point_size_of_engine() {
    let database = FontDatabase::new(MemSource::from_fonts(vec![MemFont::new(
        MONOSPACE_FAMILY_NAME,
    )
    .pixel_size(12)
    .clone()]));
    let mut font = Font::new(no_merging(MONOSPACE_FAMILY_NAME).pixel_size(13.0).clone());

    let engine = font.engine_for_script(&database, Script::Latin);
    assert_eq!(engine.def().pixel_size, 12.0);
    assert_eq!(engine.def().point_size, 9.0);
}

#[test]
fn load_font_tries_requested_fallbacks_with_first_family_only() {
    let mut source = MemSource::from_fonts(vec![MemFont::new("Aardvark").clone()]);
    source.set_default_fallbacks(&[]);
    let database = FontDatabase::new(source);
    let mut font = Font::new(no_merging("Nope, Missing"));

    let engine = font.engine_for_script(&database, Script::Latin);
    assert_eq!(engine.def().family, "Aardvark");

    // The last-chance lookup for any family runs without the fallbacks of the family list.
    database.with_cache(|cache| {
        let key = CacheKey::new(no_merging("").normalized(96.0), Script::Common, false);
        let entries = cache.entries(&key);
        assert_eq!(entries.len(), 1);
        assert!(Arc::ptr_eq(&entries[0].engine, &engine));
    });
}

#[test]
fn load_font_without_merging_serves_every_script() {
    let database = FontDatabase::new(default_source());
    let mut font = Font::new(no_merging(SANS_SERIF_FAMILY_NAME));

    let latin = font.engine_for_script(&database, Script::Latin);
    let greek = font.engine_for_script(&database, Script::Greek);
    assert_eq!(latin.engine_type(), EngineType::Native);
    assert!(Arc::ptr_eq(&latin, &greek));
}

#[test]
fn load_font_tries_default_family_before_any_family() {
    let fonts = || {
        let mut source = MemSource::from_fonts(vec![
            MemFont::new("Aardvark").clone(),
            MemFont::new("Zebra").clone(),
        ]);
        source.set_default_fallbacks(&[]);
        source
    };

    let database = FontDatabase::new(fonts());
    let mut font = Font::new(no_merging("Nope"));
    let engine = font.engine_for_script(&database, Script::Latin);
    assert_eq!(engine.def().family, "Aardvark");

    let database =
        FontDatabase::with_config(fonts(), DatabaseConfig::new().default_family("Zebra").clone());
    let mut font = Font::new(no_merging("Nope"));
    let engine = font.engine_for_script(&database, Script::Latin);
    assert_eq!(engine.def().family, "Zebra");
}

#[test]
fn load_font_tries_substitutes() {
    let mut source = MemSource::from_fonts(vec![
        MemFont::new("Aardvark").clone(),
        MemFont::new("Zebra").clone(),
    ]);
    source.set_default_fallbacks(&[]);
    let database = FontDatabase::new(source);
    database.insert_substitution("Nope", "Zebra");
    database.insert_substitution("nope", "zebra");
    assert_eq!(database.substitutes("NOPE"), vec!["Zebra".to_owned()]);

    let request = no_merging("Nope");
    assert_eq!(
        database.family_list(&request),
        vec!["Nope".to_owned(), "Zebra".to_owned()]
    );

    let mut font = Font::new(request);
    let engine = font.engine_for_script(&database, Script::Latin);
    assert_eq!(engine.def().family, "Zebra");
}

#[test]
fn load_font_from_family_list() {
    let database = FontDatabase::new(default_source());
    let mut font = Font::new(no_merging("'Missing', Courier, Arial"));

    let engine = font.engine_for_script(&database, Script::Latin);
    assert_eq!(engine.def().family, MONOSPACE_FAMILY_NAME);
    assert!(engine.def().fixed_pitch);
}

#[test]
fn resolve_per_thread() {
    let database = Arc::new(FontDatabase::new(default_source()));
    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME).pixel_size(16.0).clone();
    let engine = database.resolve(&request, Script::Latin);

    let (sender, receiver) = mpsc::channel();
    let thread_database = database.clone();
    let thread_request = request.clone();
    thread::spawn(move || {
        let engine = thread_database.resolve(&thread_request, Script::Latin);
        sender.send(engine).unwrap();
    })
    .join()
    .unwrap();

    let other = receiver.recv().unwrap();
    assert!(!Arc::ptr_eq(&engine, &other));
    assert_eq!(other.def().family, SANS_SERIF_FAMILY_NAME);
    assert_eq!(database.source().engines_built(), 2);
}
