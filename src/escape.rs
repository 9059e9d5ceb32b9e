//! Whitespace visualisation and markup escaping.
//!
//! The report uses `**` to mark changed words, so literal `*`, `_` and `\`
//! in diff content are backslash-escaped. Modification pairs that differ only
//! in whitespace skip word diffing and are shown with visible glyphs.

use std::borrow::Cow;

/// Glyph substituted for a space in whitespace-only changes.
pub const SPACE_GLYPH: char = '·';
/// Glyph substituted for a tab in whitespace-only changes.
pub const TAB_GLYPH: char = '→';
/// Glyph substituted for a carriage return, in all rendered text.
pub const CR_GLYPH: char = '␍';

/// Columns a tab expands to in ordinary content.
const TAB_STOP: &str = "    ";

/// True if the two lines are identical once all whitespace is removed.
pub fn is_whitespace_only_change(old: &str, new: &str) -> bool {
    let strip = |s: &str| s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    strip(old) == strip(new)
}

/// Replace every whitespace character with a visible glyph. Characters
/// other than tab map to the space glyph.
pub fn visualize_whitespace(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\t' => TAB_GLYPH,
            '\r' => CR_GLYPH,
            c if c.is_whitespace() => SPACE_GLYPH,
            c if c.is_control() => char::REPLACEMENT_CHARACTER,
            c => c,
        })
        .collect()
}

/// Make text safe for fixed-width display: tabs expand to spaces, carriage
/// returns become [`CR_GLYPH`] and other control characters become U+FFFD.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\t' => out.push_str(TAB_STOP),
            '\r' => out.push(CR_GLYPH),
            c if c.is_control() => out.push(char::REPLACEMENT_CHARACTER),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// True if `c` would be read as markup by the report's consumer.
pub fn is_markup_char(c: char) -> bool {
    matches!(c, '*' | '_' | '\\')
}

/// Backslash-escape markup characters so they display literally.
pub fn escape_markup(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_markup_char) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 4);
    for c in text.chars() {
        if is_markup_char(c) {
            out.push('\\');
        }
        out.push(c);
    }
    Cow::Owned(out)
}
