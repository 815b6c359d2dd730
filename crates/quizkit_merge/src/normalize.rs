//! Text canonicalization shared by naming, deduplication and merge runs.

use unicode_normalization::UnicodeNormalization;

const TUP_CHARS_SINGLE_QUOTE: [char; 5] =
    ['\u{2018}', '\u{2019}', '\u{201A}', '\u{201B}', '\u{2032}'];
const TUP_CHARS_DOUBLE_QUOTE: [char; 7] = [
    '\u{201C}', '\u{201D}', '\u{201E}', '\u{201F}', '\u{2033}', '\u{00AB}', '\u{00BB}',
];
const TUP_CHARS_DASH: [char; 7] = [
    '\u{2010}', '\u{2011}', '\u{2012}', '\u{2013}', '\u{2014}', '\u{2015}', '\u{2212}',
];
const TUP_CHARS_NBSP: [char; 3] = ['\u{00A0}', '\u{202F}', '\u{2007}'];

fn map_typographic_char(ch: char) -> char {
    if TUP_CHARS_SINGLE_QUOTE.contains(&ch) {
        '\''
    } else if TUP_CHARS_DOUBLE_QUOTE.contains(&ch) {
        '"'
    } else if TUP_CHARS_DASH.contains(&ch) {
        '-'
    } else if TUP_CHARS_NBSP.contains(&ch) {
        ' '
    } else {
        ch
    }
}

/// Canonicalize `text` for comparison.
///
/// Applies NFC, maps typographic quotes/dashes and non-breaking spaces to ASCII,
/// collapses whitespace runs to one space and trims.
pub fn normalize_text(text: &str) -> String {
    let c_mapped: String = text.nfc().map(map_typographic_char).collect();
    c_mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// [`normalize_text`] followed by lowercasing; used for dedup keys.
pub fn normalize_text_folded(text: &str) -> String {
    normalize_text(text).to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_maps_typography() {
        assert_eq!(
            normalize_text("l\u{2019}aorte \u{2014} \u{00AB}x\u{00BB}"),
            "l'aorte - \"x\""
        );
        assert_eq!(normalize_text("a\u{00A0}b\u{202F}c"), "a b c");
    }

    #[test]
    fn normalize_text_collapses_whitespace() {
        assert_eq!(normalize_text("  a \t\n b  "), "a b");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn normalize_text_composes_accents() {
        assert_eq!(normalize_text("e\u{0301}"), "\u{00E9}");
    }

    #[test]
    fn normalize_text_is_idempotent() {
        let c_once = normalize_text(" \u{201C}Réponse\u{201D}\u{2013}  B ");
        assert_eq!(normalize_text(&c_once), c_once);
    }

    #[test]
    fn normalize_text_folded_lowercases() {
        assert_eq!(normalize_text_folded(" Éta  CARDIO "), "éta cardio");
    }
}
