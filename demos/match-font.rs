// font-resolver/demos/match-font.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Resolves a family list against a small in-memory font set and shows what was picked.

extern crate clap;
extern crate font_resolver;
extern crate prettytable;

use clap::{App, Arg, ArgMatches};
use font_resolver::database::FontDatabase;
use font_resolver::engine::{Engine, EngineType};
use font_resolver::properties::{Style, StyleKey, Weight};
use font_resolver::request::FontRequest;
use font_resolver::script::{Script, WritingSystems};
use font_resolver::sources::{MemFont, MemSource};
use prettytable::{Attr, Cell, Row, Table};

fn get_args() -> ArgMatches<'static> {
    let families_arg = Arg::with_name("FAMILIES")
        .help("Comma-separated family list")
        .default_value("Times New Roman, Arial")
        .index(1);
    let size_arg = Arg::with_name("size")
        .help("Pixel size")
        .short("s")
        .long("size")
        .value_name("PIXELS")
        .default_value("16");
    let weight_arg = Arg::with_name("weight")
        .help("Weight, from 0 to 99")
        .short("w")
        .long("weight")
        .value_name("WEIGHT")
        .default_value("50");
    let italic_arg = Arg::with_name("italic")
        .help("Ask for an italic style")
        .short("i")
        .long("italic");
    let script_arg = Arg::with_name("script")
        .help("Script of the text to render")
        .long("script")
        .possible_values(&["common", "latin", "greek", "arabic", "thai"])
        .default_value("latin");
    App::new("match-font")
        .version("0.1")
        .author("The Pathfinder Project Developers")
        .about("Simple example tool to resolve fonts with `font-resolver`")
        .arg(families_arg)
        .arg(size_arg)
        .arg(weight_arg)
        .arg(italic_arg)
        .arg(script_arg)
        .get_matches()
}

fn sample_source() -> MemSource {
    let mut source = MemSource::from_fonts(vec![
        MemFont::new("Arial").foundry("Monotype").clone(),
        MemFont::new("Arial")
            .foundry("Monotype")
            .key(*StyleKey::new().weight(Weight::BOLD))
            .clone(),
        MemFont::new("Arial")
            .foundry("Monotype")
            .key(*StyleKey::new().style(Style::Italic))
            .clone(),
        MemFont::new("Courier").pixel_size(12).fixed_pitch(true).clone(),
        MemFont::new("Courier").pixel_size(14).fixed_pitch(true).clone(),
        MemFont::new("Courier").pixel_size(18).fixed_pitch(true).clone(),
        MemFont::new("Liberation Serif")
            .writing_systems(WritingSystems::LATIN | WritingSystems::GREEK)
            .clone(),
        MemFont::new("Noto Naskh Arabic")
            .writing_systems(WritingSystems::ARABIC)
            .clone(),
        MemFont::new("Noto Sans Thai")
            .writing_systems(WritingSystems::THAI)
            .clone(),
    ]);
    source.add_alias("Liberation Serif", "Times New Roman");
    source
}

fn parse_script(name: &str) -> Script {
    match name {
        "common" => Script::Common,
        "greek" => Script::Greek,
        "arabic" => Script::Arabic,
        "thai" => Script::Thai,
        _ => Script::Latin,
    }
}

fn add_engine_row(table: &mut Table, role: &str, engine: &Engine) {
    let def = engine.def();
    table.add_row(Row::new(vec![
        Cell::new(role),
        Cell::new(&format!("{:?}", engine.engine_type())),
        Cell::new(&def.family),
        Cell::new(&def.style.to_string()),
        Cell::new(&def.weight.0.to_string()),
        Cell::new(&def.pixel_size.to_string()),
        Cell::new(&(engine.cache_cost() / 1024).to_string()),
    ]));
}

fn main() {
    let matches = get_args();

    let families = matches.value_of("FAMILIES").unwrap_or("");
    let pixel_size: f32 = matches
        .value_of("size")
        .and_then(|size| size.parse().ok())
        .unwrap_or(16.0);
    let weight: u8 = matches
        .value_of("weight")
        .and_then(|weight| weight.parse().ok())
        .unwrap_or(Weight::NORMAL.0);
    let style = if matches.is_present("italic") {
        Style::Italic
    } else {
        Style::Normal
    };
    let script = parse_script(matches.value_of("script").unwrap_or("latin"));

    let database = FontDatabase::new(sample_source());
    let request = FontRequest::new(families)
        .pixel_size(pixel_size)
        .weight(Weight(weight))
        .style(style)
        .clone();
    let engine = database.resolve(&request, script);

    let mut table = Table::new();
    table.set_format(*prettytable::format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(Row::new(vec![
        Cell::new("Role").with_style(Attr::Bold),
        Cell::new("Type").with_style(Attr::Bold),
        Cell::new("Family").with_style(Attr::Bold),
        Cell::new("Style").with_style(Attr::Bold),
        Cell::new("Weight").with_style(Attr::Bold),
        Cell::new("Pixel Size").with_style(Attr::Bold),
        Cell::new("Cost (kb)").with_style(Attr::Bold),
    ]));

    add_engine_row(&mut table, "resolved", &engine);
    if engine.engine_type() == EngineType::Multi {
        if let Some(multi) = engine.as_multi() {
            add_engine_row(&mut table, "primary", multi.primary());
            for index in 0..multi.fallback_families().len() {
                if let Some(fallback) = database.fallback_engine(&engine, index) {
                    add_engine_row(&mut table, &format!("fallback {}", index), &fallback);
                }
            }
        }
    }
    table.printstd();

    database.with_cache(|cache| {
        println!();
        println!(
            "Cache: {} entries, {} engines, {} kb in use, ceiling {} kb, timer {:?}",
            cache.len(),
            cache.engine_count(),
            cache.total_cost(),
            cache.max_cost(),
            cache.timer_state()
        );
    });
}
