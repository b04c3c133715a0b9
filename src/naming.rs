//! Deterministic artifact naming.
//!
//! `name_for(title, composer, lyricist)` is a pure function: the same metadata
//! always yields the same file name, so re-processing a record after a crash
//! overwrites its artifact instead of creating a second one.

use crate::utils::truncate_to_boundary;

/// Extension of every artifact file
pub const ARTIFACT_EXTENSION: &str = "md";

/// Attribution label: `"composer / lyricist"`, a single name, or empty
pub fn display_label(composer: &str, lyricist: &str) -> String {
    match (composer.trim(), lyricist.trim()) {
        ("", "") => String::new(),
        (composer, "") => composer.to_string(),
        ("", lyricist) => lyricist.to_string(),
        (composer, lyricist) => format!("{composer} / {lyricist}"),
    }
}

/// Human-readable heading: `"{label} - {title}"`, or the title alone
pub fn display_heading(title: &str, composer: &str, lyricist: &str) -> String {
    let label = display_label(composer, lyricist);
    let title = title.trim();
    if label.is_empty() {
        title.to_string()
    } else {
        format!("{label} - {title}")
    }
}

/// Longest stem in bytes; leaves room for the extension under the usual 255-byte name limit
pub const MAX_STEM_BYTES: usize = 200;

/// Filesystem-safe stem for an item, possibly empty, at most [`MAX_STEM_BYTES`] long
pub fn stem_for(title: &str, composer: &str, lyricist: &str) -> String {
    let slug = slugify(&display_heading(title, composer, lyricist));
    truncate_to_boundary(&slug, MAX_STEM_BYTES)
        .trim_end_matches('_')
        .to_string()
}

/// Artifact file name for an item
///
/// ```
/// use lyrics_harvest::naming::name_for;
///
/// assert_eq!(name_for("Сагыну", "Радик", ""), "radik_-_saginu.md");
/// ```
pub fn name_for(title: &str, composer: &str, lyricist: &str) -> String {
    with_extension(&stem_for(title, composer, lyricist))
}

/// Append the artifact extension to a stem
pub fn with_extension(stem: &str) -> String {
    format!("{stem}.{ARTIFACT_EXTENSION}")
}

/// Transliterate, lowercase, drop unsafe characters, and turn whitespace runs into `_`
pub fn slugify(text: &str) -> String {
    let lowered = transliterate(text).to_lowercase();

    let mut out = String::with_capacity(lowered.len());
    let mut in_space = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            in_space = true;
        } else if ch.is_alphanumeric() || ch == '_' || ch == '-' {
            if in_space {
                out.push('_');
                in_space = false;
            }
            out.push(ch);
        }
        // anything else is dropped without breaking a whitespace run
    }
    out.trim_matches('_').to_string()
}

/// Map Tatar and Russian Cyrillic letters to Latin; other characters pass through
pub fn transliterate(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match latin_for(ch) {
            Some(latin) => out.push_str(latin),
            None => out.push(ch),
        }
    }
    out
}

fn latin_for(ch: char) -> Option<&'static str> {
    let latin = match ch {
        'А' => "A",
        'Б' => "B",
        'В' => "V",
        'Г' => "G",
        'Д' => "D",
        'Е' => "E",
        'Ё' => "Yo",
        'Ж' => "Zh",
        'Җ' => "C",
        'З' => "Z",
        'И' => "I",
        'Й' => "Y",
        'К' => "K",
        'Л' => "L",
        'М' => "M",
        'Н' | 'Ң' => "N",
        'О' | 'Ө' => "O",
        'П' => "P",
        'Р' => "R",
        'С' => "S",
        'Т' => "T",
        'У' | 'Ү' => "U",
        'Ф' => "F",
        'Х' | 'Һ' => "H",
        'Ц' => "Ts",
        'Ч' => "Ch",
        'Ш' => "Sh",
        'Щ' => "Shch",
        'Ъ' | 'Ь' => "",
        'Ы' => "I",
        'Ә' => "A",
        'Э' => "E",
        'Ю' => "Yu",
        'Я' => "Ya",
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'җ' => "c",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' | 'ң' => "n",
        'о' | 'ө' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' | 'ү' => "u",
        'ф' => "f",
        'х' | 'һ' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' | 'ь' => "",
        'ы' => "i",
        'ә' => "a",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(latin)
}
