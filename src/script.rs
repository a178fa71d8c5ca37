// font-resolver/src/script.rs
//
// Copyright © 2019 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Scripts (what text is written in) and writing systems (what a font claims to cover).

/// A Unicode script, as far as font selection cares.
///
/// The declaration order is significant: everything after `Common` is a "complex" script that
/// gets a last-chance fallback to the first family supporting it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Script {
    /// Not assigned to any script.
    Unknown,
    /// Takes the script of the preceding character, e.g. combining marks.
    Inherited,
    /// Characters shared by several scripts, such as digits and punctuation.
    Common,
    /// Latin.
    Latin,
    /// Greek.
    Greek,
    /// Cyrillic.
    Cyrillic,
    /// Armenian.
    Armenian,
    /// Hebrew.
    Hebrew,
    /// Arabic.
    Arabic,
    /// Syriac.
    Syriac,
    /// Thaana.
    Thaana,
    /// Devanagari.
    Devanagari,
    /// Bengali.
    Bengali,
    /// Gurmukhi.
    Gurmukhi,
    /// Gujarati.
    Gujarati,
    /// Oriya.
    Oriya,
    /// Tamil.
    Tamil,
    /// Telugu.
    Telugu,
    /// Kannada.
    Kannada,
    /// Malayalam.
    Malayalam,
    /// Sinhala.
    Sinhala,
    /// Thai.
    Thai,
    /// Lao.
    Lao,
    /// Tibetan.
    Tibetan,
    /// Myanmar.
    Myanmar,
    /// Georgian.
    Georgian,
    /// Korean Hangul.
    Hangul,
    /// Ogham.
    Ogham,
    /// Runic.
    Runic,
    /// Khmer.
    Khmer,
    /// N'Ko.
    Nko,
    /// Han ideographs, shared by Chinese, Japanese and Korean.
    Han,
}

impl Default for Script {
    fn default() -> Script {
        Script::Common
    }
}

impl Script {
    /// Number of scripts.
    pub const COUNT: usize = Script::Han as usize + 1;

    /// Every script, in declaration order.
    pub const ALL: [Script; Script::COUNT] = [
        Script::Unknown,
        Script::Inherited,
        Script::Common,
        Script::Latin,
        Script::Greek,
        Script::Cyrillic,
        Script::Armenian,
        Script::Hebrew,
        Script::Arabic,
        Script::Syriac,
        Script::Thaana,
        Script::Devanagari,
        Script::Bengali,
        Script::Gurmukhi,
        Script::Gujarati,
        Script::Oriya,
        Script::Tamil,
        Script::Telugu,
        Script::Kannada,
        Script::Malayalam,
        Script::Sinhala,
        Script::Thai,
        Script::Lao,
        Script::Tibetan,
        Script::Myanmar,
        Script::Georgian,
        Script::Hangul,
        Script::Ogham,
        Script::Runic,
        Script::Khmer,
        Script::Nko,
        Script::Han,
    ];

    /// Index of this script in `Script::ALL`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// True for scripts that need more than the common repertoire.
    #[inline]
    pub fn is_complex(self) -> bool {
        self > Script::Common
    }
}

/// A writing system a font can declare support for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WritingSystem {
    /// No particular writing system; every family supports it.
    Any,
    /// Latin.
    Latin,
    /// Greek.
    Greek,
    /// Cyrillic.
    Cyrillic,
    /// Armenian.
    Armenian,
    /// Hebrew.
    Hebrew,
    /// Arabic.
    Arabic,
    /// Syriac.
    Syriac,
    /// Thaana.
    Thaana,
    /// Devanagari.
    Devanagari,
    /// Bengali.
    Bengali,
    /// Gurmukhi.
    Gurmukhi,
    /// Gujarati.
    Gujarati,
    /// Oriya.
    Oriya,
    /// Tamil.
    Tamil,
    /// Telugu.
    Telugu,
    /// Kannada.
    Kannada,
    /// Malayalam.
    Malayalam,
    /// Sinhala.
    Sinhala,
    /// Thai.
    Thai,
    /// Lao.
    Lao,
    /// Tibetan.
    Tibetan,
    /// Myanmar.
    Myanmar,
    /// Georgian.
    Georgian,
    /// Khmer.
    Khmer,
    /// Simplified Chinese (Han).
    SimplifiedChinese,
    /// Traditional Chinese (Han).
    TraditionalChinese,
    /// Japanese (Han and kana).
    Japanese,
    /// Korean (Hangul and Han).
    Korean,
    /// Vietnamese (Latin with extra diacritics).
    Vietnamese,
    /// Symbol fonts, which map their own glyphs onto code points.
    Symbol,
    /// Ogham.
    Ogham,
    /// Runic.
    Runic,
    /// N'Ko.
    Nko,
}

// Indexed by `WritingSystem as usize`.
const SCRIPT_FOR_WRITING_SYSTEM: [Script; WritingSystem::COUNT] = [
    Script::Common,   // Any
    Script::Latin,    // Latin
    Script::Greek,    // Greek
    Script::Cyrillic, // Cyrillic
    Script::Armenian, // Armenian
    Script::Hebrew,   // Hebrew
    Script::Arabic,   // Arabic
    Script::Syriac,   // Syriac
    Script::Thaana,   // Thaana
    Script::Devanagari,
    Script::Bengali,
    Script::Gurmukhi,
    Script::Gujarati,
    Script::Oriya,
    Script::Tamil,
    Script::Telugu,
    Script::Kannada,
    Script::Malayalam,
    Script::Sinhala,
    Script::Thai,
    Script::Lao,
    Script::Tibetan,
    Script::Myanmar,
    Script::Georgian,
    Script::Khmer,
    Script::Han,    // SimplifiedChinese
    Script::Han,    // TraditionalChinese
    Script::Han,    // Japanese
    Script::Hangul, // Korean
    Script::Latin,  // Vietnamese
    Script::Common, // Symbol
    Script::Ogham,
    Script::Runic,
    Script::Nko,
];

impl WritingSystem {
    /// Number of writing systems, `Any` included.
    pub const COUNT: usize = WritingSystem::Nko as usize + 1;

    /// Every writing system, in declaration order.
    pub const ALL: [WritingSystem; WritingSystem::COUNT] = [
        WritingSystem::Any,
        WritingSystem::Latin,
        WritingSystem::Greek,
        WritingSystem::Cyrillic,
        WritingSystem::Armenian,
        WritingSystem::Hebrew,
        WritingSystem::Arabic,
        WritingSystem::Syriac,
        WritingSystem::Thaana,
        WritingSystem::Devanagari,
        WritingSystem::Bengali,
        WritingSystem::Gurmukhi,
        WritingSystem::Gujarati,
        WritingSystem::Oriya,
        WritingSystem::Tamil,
        WritingSystem::Telugu,
        WritingSystem::Kannada,
        WritingSystem::Malayalam,
        WritingSystem::Sinhala,
        WritingSystem::Thai,
        WritingSystem::Lao,
        WritingSystem::Tibetan,
        WritingSystem::Myanmar,
        WritingSystem::Georgian,
        WritingSystem::Khmer,
        WritingSystem::SimplifiedChinese,
        WritingSystem::TraditionalChinese,
        WritingSystem::Japanese,
        WritingSystem::Korean,
        WritingSystem::Vietnamese,
        WritingSystem::Symbol,
        WritingSystem::Ogham,
        WritingSystem::Runic,
        WritingSystem::Nko,
    ];

    /// The script a font of this writing system is expected to cover.
    #[inline]
    pub fn script(self) -> Script {
        SCRIPT_FOR_WRITING_SYSTEM[self as usize]
    }

    /// The first writing system whose script is `script`, or `Any` if there is none.
    ///
    /// `Script::Common` maps to `Any`, which every family passes.
    pub fn for_script(script: Script) -> WritingSystem {
        WritingSystem::ALL
            .iter()
            .cloned()
            .find(|writing_system| writing_system.script() == script)
            .unwrap_or(WritingSystem::Any)
    }
}

bitflags! {
    /// The set of writing systems a family supports.
    pub struct WritingSystems: u64 {
        const ANY = 1 << 0;
        const LATIN = 1 << 1;
        const GREEK = 1 << 2;
        const CYRILLIC = 1 << 3;
        const ARMENIAN = 1 << 4;
        const HEBREW = 1 << 5;
        const ARABIC = 1 << 6;
        const SYRIAC = 1 << 7;
        const THAANA = 1 << 8;
        const DEVANAGARI = 1 << 9;
        const BENGALI = 1 << 10;
        const GURMUKHI = 1 << 11;
        const GUJARATI = 1 << 12;
        const ORIYA = 1 << 13;
        const TAMIL = 1 << 14;
        const TELUGU = 1 << 15;
        const KANNADA = 1 << 16;
        const MALAYALAM = 1 << 17;
        const SINHALA = 1 << 18;
        const THAI = 1 << 19;
        const LAO = 1 << 20;
        const TIBETAN = 1 << 21;
        const MYANMAR = 1 << 22;
        const GEORGIAN = 1 << 23;
        const KHMER = 1 << 24;
        const SIMPLIFIED_CHINESE = 1 << 25;
        const TRADITIONAL_CHINESE = 1 << 26;
        const JAPANESE = 1 << 27;
        const KOREAN = 1 << 28;
        const VIETNAMESE = 1 << 29;
        const SYMBOL = 1 << 30;
        const OGHAM = 1 << 31;
        const RUNIC = 1 << 32;
        const NKO = 1 << 33;
    }
}

impl Default for WritingSystems {
    fn default() -> WritingSystems {
        WritingSystems::empty()
    }
}

impl From<WritingSystem> for WritingSystems {
    #[inline]
    fn from(writing_system: WritingSystem) -> WritingSystems {
        WritingSystems::from_bits_truncate(1 << writing_system as u64)
    }
}

impl WritingSystems {
    /// Returns true if `writing_system` is in the set. `Any` is always supported.
    #[inline]
    pub fn supports(&self, writing_system: WritingSystem) -> bool {
        writing_system == WritingSystem::Any || self.contains(writing_system.into())
    }

    /// Returns true if this set covers what `script` needs.
    #[inline]
    pub fn supports_script(&self, script: Script) -> bool {
        self.supports(WritingSystem::for_script(script))
    }

    /// Lists the writing systems in the set, `Any` excluded.
    pub fn iter(&self) -> impl Iterator<Item = WritingSystem> + '_ {
        WritingSystem::ALL[1..]
            .iter()
            .cloned()
            .filter(move |&writing_system| self.contains(writing_system.into()))
    }
}
