// font-resolver/tests/select_best_match.rs
//
// Copyright © 2019 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// Matching tests: which registered description a request ends up with, and at what score.

#![cfg(feature = "source")]

use font_resolver::database::{DatabaseConfig, FontDatabase};
use font_resolver::matching::{FontMatch, STYLE_MISMATCH};
use font_resolver::properties::{Style, StyleKey, Weight};
use font_resolver::request::{FontRequest, StyleStrategy};
use font_resolver::script::{Script, WritingSystems};
use font_resolver::sources::{MemFont, MemSource};

static SANS_SERIF_FAMILY_NAME: &'static str = "Arial";
static MONOSPACE_FAMILY_NAME: &'static str = "Courier";

fn bitmap_source(family: &str, sizes: &[u16]) -> MemSource {
    MemSource::from_fonts(
        sizes
            .iter()
            .map(|&size| MemFont::new(family).pixel_size(size).clone()),
    )
}

// Returns (family, foundry, style key, pixel size) for a match.
fn describe(
    database: &FontDatabase<MemSource>,
    found: &FontMatch,
) -> (String, String, StyleKey, u16) {
    database.with_store(|store| {
        let family = store.family_at(found.desc.family);
        let foundry = &family.foundries()[found.desc.foundry];
        let style = &foundry.styles()[found.desc.style];
        (
            family.name.clone(),
            foundry.name.clone(),
            style.key,
            style.pixel_sizes()[found.desc.size].pixel_size,
        )
    })
}

#[test]
fn select_nearest_bitmap_size_biased_against_smaller_sizes() {
    let database = FontDatabase::new(bitmap_source(SANS_SERIF_FAMILY_NAME, &[12, 16, 24]));
    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME).pixel_size(18.0).clone();

    let found = database.match_font(&request, Script::Latin).unwrap();
    let (family, _, _, pixel_size) = describe(&database, &found);
    assert_eq!(family, SANS_SERIF_FAMILY_NAME);
    assert_eq!(pixel_size, 16);
    assert_eq!(found.pixel_size, 16);
    assert_eq!(found.score, 2);
}

#[test]
fn select_every_registered_description_exactly() {
    let fonts = vec![
        MemFont::new(SANS_SERIF_FAMILY_NAME).clone(),
        MemFont::new(SANS_SERIF_FAMILY_NAME)
            .key(*StyleKey::new().weight(Weight::BOLD))
            .clone(),
        MemFont::new(SANS_SERIF_FAMILY_NAME)
            .key(*StyleKey::new().style(Style::Italic))
            .clone(),
        MemFont::new(MONOSPACE_FAMILY_NAME)
            .pixel_size(12)
            .fixed_pitch(true)
            .clone(),
        MemFont::new(MONOSPACE_FAMILY_NAME)
            .pixel_size(14)
            .fixed_pitch(true)
            .clone(),
    ];
    let database = FontDatabase::new(MemSource::from_fonts(fonts.clone()));

    for font in &fonts {
        let pixel_size = if font.pixel_size == 0 { 20 } else { font.pixel_size };
        let request = FontRequest::new(&font.family)
            .weight(font.key.weight)
            .style(font.key.style)
            .pixel_size(f32::from(pixel_size))
            .clone();

        let found = database.match_font(&request, Script::Latin).unwrap();
        assert_eq!(found.score, 0, "{:?}", font);
        assert_eq!(found.pixel_size, u32::from(pixel_size));

        let (family, _, key, _) = describe(&database, &found);
        assert_eq!(family, font.family);
        assert!(key.matches(&font.key));
    }
}

#[test]
fn select_first_inserted_style_on_ties() {
    let source = MemSource::from_fonts(vec![
        MemFont::new(SANS_SERIF_FAMILY_NAME)
            .key(*StyleKey::new().weight(Weight(40)))
            .clone(),
        MemFont::new(SANS_SERIF_FAMILY_NAME)
            .key(*StyleKey::new().weight(Weight(60)))
            .clone(),
    ]);
    let database = FontDatabase::new(source);
    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME)
        .pixel_size(16.0)
        .style_strategy(StyleStrategy::NO_FONT_MERGING)
        .clone();

    let found = database.match_font(&request, Script::Latin).unwrap();
    assert_eq!(found.desc.style, 0);

    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.def().weight, Weight(40));
}

#[test]
fn select_style_by_name_before_distance() {
    let source = MemSource::from_fonts(vec![
        MemFont::new(SANS_SERIF_FAMILY_NAME)
            .style_name("Regular")
            .clone(),
        MemFont::new(SANS_SERIF_FAMILY_NAME)
            .style_name("Poster")
            .key(*StyleKey::new().weight(Weight::BLACK).style(Style::Italic))
            .clone(),
    ]);
    let database = FontDatabase::new(source);
    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME)
        .style_name("Poster")
        .pixel_size(16.0)
        .clone();

    let found = database.match_font(&request, Script::Latin).unwrap();
    let (_, _, key, _) = describe(&database, &found);
    assert_eq!(key.weight, Weight::BLACK);
    assert_eq!(found.score, STYLE_MISMATCH);
}

#[test]
fn select_requested_foundry() {
    let source = MemSource::from_fonts(vec![
        MemFont::new(SANS_SERIF_FAMILY_NAME).foundry("Agfa").clone(),
        MemFont::new(SANS_SERIF_FAMILY_NAME)
            .foundry("Monotype")
            .clone(),
    ]);
    let database = FontDatabase::new(source);

    let request = FontRequest::new("arial [monotype]").pixel_size(16.0).clone();
    let found = database.match_font(&request, Script::Latin).unwrap();
    let (_, foundry, _, _) = describe(&database, &found);
    assert_eq!(foundry, "Monotype");

    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.def().family, "Arial [Monotype]");

    // An unknown foundry falls back to any foundry.
    let request = FontRequest::new("Arial [Nobody]").pixel_size(16.0).clone();
    let found = database.match_font(&request, Script::Latin).unwrap();
    let (_, foundry, _, _) = describe(&database, &found);
    assert_eq!(foundry, "Agfa");
}

#[test]
fn select_stops_at_first_good_enough_family() {
    let source = || {
        MemSource::from_fonts(vec![
            MemFont::new("Alpha").pixel_size(16).clone(),
            MemFont::new("Beta").pixel_size(18).clone(),
        ])
    };
    let request = FontRequest::new("").pixel_size(18.0).clone();

    let database = FontDatabase::new(source());
    let found = database.match_font(&request, Script::Latin).unwrap();
    assert_eq!(describe(&database, &found).0, "Alpha");
    assert_eq!(found.score, 2);

    let database =
        FontDatabase::with_config(source(), DatabaseConfig::new().short_circuit_score(0).clone());
    let found = database.match_font(&request, Script::Latin).unwrap();
    assert_eq!(describe(&database, &found).0, "Beta");
    assert_eq!(found.score, 0);
}

#[test]
fn select_first_family_supporting_script() {
    let source = MemSource::from_fonts(vec![
        MemFont::new("Alpha").clone(),
        MemFont::new("Greek Sans")
            .writing_systems(WritingSystems::LATIN | WritingSystems::GREEK)
            .clone(),
    ]);
    let database = FontDatabase::new(source);
    let request = FontRequest::new("").pixel_size(16.0).clone();

    let found = database.match_font(&request, Script::Greek).unwrap();
    assert_eq!(describe(&database, &found).0, "Greek Sans");
    assert!(database.match_font(&request, Script::Hebrew).is_none());
}

#[test]
fn select_family_with_requested_pitch() {
    let source = MemSource::from_fonts(vec![
        MemFont::new(SANS_SERIF_FAMILY_NAME).clone(),
        MemFont::new(MONOSPACE_FAMILY_NAME)
            .fixed_pitch(true)
            .clone(),
    ]);
    let database = FontDatabase::new(source);
    let request = FontRequest::new("").pixel_size(16.0).fixed_pitch(true).clone();

    let found = database.match_font(&request, Script::Latin).unwrap();
    assert_eq!(describe(&database, &found).0, MONOSPACE_FAMILY_NAME);
    assert_eq!(found.score, 0);
}

#[test]
fn select_family_by_alias() {
    let mut source = MemSource::from_fonts(vec![MemFont::new("Liberation Sans").clone()]);
    source.add_alias("Liberation Sans", SANS_SERIF_FAMILY_NAME);
    source.add_late_alias("Liberation Sans", "Helvetica");
    let database = FontDatabase::new(source);

    let request = FontRequest::new(SANS_SERIF_FAMILY_NAME).pixel_size(16.0).clone();
    let found = database.match_font(&request, Script::Latin).unwrap();
    assert_eq!(describe(&database, &found).0, "Liberation Sans");
    assert!(database.has_family("arial"));

    // Late aliases are only registered after a failed match.
    let request = FontRequest::new("Helvetica")
        .pixel_size(16.0)
        .style_strategy(StyleStrategy::NO_FONT_MERGING)
        .clone();
    assert!(database.match_font(&request, Script::Latin).is_none());
    let engine = database.resolve(&request, Script::Latin);
    assert_eq!(engine.def().family, "Liberation Sans");
}
