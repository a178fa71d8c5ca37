// font-resolver/src/family_name.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Family names: comparison, `"Family [Foundry]"` parsing, and comma-separated family lists.

use std::cmp::Ordering;

/// A family name split into its family and (possibly empty) foundry parts.
///
/// `"Arial [Monotype]"` parses as family `Arial`, foundry `Monotype`. Both parts are capitalized
/// word by word, so `"times new roman"` becomes `Times New Roman`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FamilyName {
    /// The family part.
    pub family: String,
    /// The foundry part; empty means any foundry.
    pub foundry: String,
}

impl FamilyName {
    /// Splits `name` into family and foundry.
    pub fn parse(name: &str) -> FamilyName {
        let (family, foundry) = match (name.find('['), name.rfind(']')) {
            (Some(open), Some(close)) if open < close => {
                let foundry = &name[open + 1..close];
                let family = name[..open].strip_suffix(' ').unwrap_or(&name[..open]);
                (family, foundry)
            }
            _ => (name, ""),
        };
        FamilyName {
            family: capitalize(family),
            foundry: capitalize(foundry),
        }
    }
}

fn capitalize(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut after_space = true;
    for c in name.chars() {
        if after_space {
            result.extend(c.to_uppercase());
        } else {
            result.push(c);
        }
        after_space = c.is_whitespace();
    }
    result
}

/// Compares two names the way the store orders families: case-insensitively.
pub fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Case-insensitive name equality.
#[inline]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    compare_ignore_case(a, b) == Ordering::Equal
}

/// Splits a family list such as `"'Open Sans', Arial , \"Noto Sans\""` into its names.
///
/// Each entry is trimmed, and one level of matching single or double quotes is stripped.
pub fn split_family_list(families: &str) -> Vec<String> {
    if families.is_empty() {
        return vec![];
    }
    families
        .split(',')
        .map(|family| {
            let family = family.trim();
            let quoted = family.len() >= 2
                && ((family.starts_with('"') && family.ends_with('"'))
                    || (family.starts_with('\'') && family.ends_with('\'')));
            if quoted {
                family[1..family.len() - 1].to_owned()
            } else {
                family.to_owned()
            }
        })
        .collect()
}
