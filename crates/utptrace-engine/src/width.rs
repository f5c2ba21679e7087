//! Terminal display width.
//!
//! Text is measured per grapheme cluster. A cluster whose base is a wide
//! emoji stays two columns no matter what follows it (skin-tone modifiers,
//! ZWJ continuations), a regional-indicator pair is one two-column flag, and a
//! text-presentation base followed by VS16 renders as emoji and takes two
//! columns.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

const EMOJI_PRESENTATION: char = '\u{fe0f}';

/// Single-column marker appended to truncated text
pub const ELLIPSIS: &str = "…";

fn is_zero_width(c: char) -> bool {
    matches!(
        c,
        '\u{200b}'..='\u{200f}'
            | '\u{2060}'
            | '\u{feff}'
            | '\u{fe00}'..='\u{fe0f}'
            | '\u{e0100}'..='\u{e01ef}'
    )
}

fn is_regional_indicator(c: char) -> bool {
    matches!(c, '\u{1f1e6}'..='\u{1f1ff}')
}

/// Columns a single character occupies on its own
pub fn char_width(c: char) -> usize {
    if is_zero_width(c) {
        return 0;
    }
    c.width().unwrap_or(0)
}

/// Split text into grapheme clusters, which must never be separated
pub fn glyphs(text: &str) -> Vec<&str> {
    text.graphemes(true).collect()
}

/// Columns one glyph (as produced by [`glyphs`]) occupies
pub fn glyph_width(glyph: &str) -> usize {
    let Some(base) = glyph.chars().next() else {
        return 0;
    };
    if glyph.is_ascii() {
        return glyph.chars().map(char_width).sum();
    }

    let base_width = char_width(base);
    if base_width == 2 || is_regional_indicator(base) {
        return 2;
    }
    if base_width == 1 && glyph.contains(EMOJI_PRESENTATION) {
        return 2;
    }

    let rest: usize = glyph
        .chars()
        .skip(1)
        .map(char_width)
        .sum();
    (base_width + rest).min(2)
}

/// Number of terminal columns `text` occupies
pub fn display_width(text: &str) -> usize {
    glyphs(text).into_iter().map(glyph_width).sum()
}

/// Cut `text` to at most `max_width` columns, ending in [`ELLIPSIS`] when shortened
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }

    let budget = max_width - display_width(ELLIPSIS);
    let mut used = 0;
    let mut result = String::new();
    for glyph in glyphs(text) {
        let width = glyph_width(glyph);
        if used + width > budget {
            break;
        }
        used += width;
        result.push_str(glyph);
    }
    result.push_str(ELLIPSIS);
    result
}

/// Truncate and pad so the result is exactly `width` columns
pub fn fit_to_width(text: &str, width: usize, align_right: bool) -> String {
    let truncated = truncate_to_width(text, width);
    let padding = " ".repeat(width.saturating_sub(display_width(&truncated)));
    if align_right {
        format!("{}{}", padding, truncated)
    } else {
        format!("{}{}", truncated, padding)
    }
}

/// Hard-wrap `text` into chunks of at most `width` columns
pub fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for glyph in glyphs(text) {
        let glyph_cols = glyph_width(glyph);
        if used + glyph_cols > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push_str(glyph);
        used += glyph_cols;
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
