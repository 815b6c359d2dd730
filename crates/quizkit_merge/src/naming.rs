//! Content-derived output naming: `<code>_<title>_biblio_<year>`.

use std::sync::LazyLock;

use quizkit_io_csv::SpecTable;
use regex::Regex;

use crate::conf::{C_CODE_FALLBACK, C_TITLE_FALLBACK};
use crate::normalize::normalize_text;

static RE_CODE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})").expect("valid code regex"));
static RE_TITLE_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s()\-]").expect("valid title regex"));
static RE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

const TUP_CHARS_RESERVED: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// First value of column `col_name` that is non-empty after normalization.
pub fn derive_first_non_empty(table: &SpecTable, col_name: &str) -> Option<String> {
    table
        .column_values(col_name)?
        .into_iter()
        .map(normalize_text)
        .find(|value| !value.is_empty())
}

/// Code component: the first four digits when the value starts with four or more, else the value.
pub fn derive_code(value: Option<&str>) -> String {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return C_CODE_FALLBACK.to_string();
    };
    match RE_CODE_PREFIX.captures(value) {
        Some(caps) => caps[1].to_string(),
        None => value.trim().to_string(),
    }
}

/// Keep letters, digits, whitespace, parentheses, underscore and hyphen; re-collapse spaces.
pub fn sanitize_title(title: &str) -> String {
    let c_replaced = RE_TITLE_DISALLOWED.replace_all(title, " ");
    RE_WHITESPACE.replace_all(&c_replaced, " ").trim().to_string()
}

/// Title component, falling back when absent or empty after sanitizing.
pub fn derive_title(value: Option<&str>) -> String {
    let c_title = value.map(sanitize_title).unwrap_or_default();
    if c_title.is_empty() {
        C_TITLE_FALLBACK.to_string()
    } else {
        c_title
    }
}

/// Replace filesystem-reserved characters with a space.
pub fn sanitize_file_stem(stem: &str) -> String {
    stem.chars()
        .map(|ch| if TUP_CHARS_RESERVED.contains(&ch) { ' ' } else { ch })
        .collect()
}

/// Output stem from the first source table.
pub fn derive_output_stem(
    table_first: &SpecTable,
    col_code: &str,
    col_title: &str,
    year: &str,
) -> String {
    let c_code = derive_code(derive_first_non_empty(table_first, col_code).as_deref());
    let c_title = derive_title(derive_first_non_empty(table_first, col_title).as_deref());
    sanitize_file_stem(&format!("{c_code}_{c_title}_biblio_{year}"))
}

#[cfg(test)]
mod tests {
    use quizkit_io_csv::SpecTable;

    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> SpecTable {
        SpecTable::from_rows(s(columns), rows.iter().map(|row| s(row)).collect()).unwrap()
    }

    #[test]
    fn derive_output_stem_uses_first_non_empty_values() {
        let table_first = table(
            &["Numéro", "Nom"],
            &[&["  ", ""], &["300125", "Antirétroviraux (1)"]],
        );
        assert_eq!(
            derive_output_stem(&table_first, "Numéro", "Nom", "2025"),
            "3001_Antirétroviraux (1)_biblio_2025"
        );
    }

    #[test]
    fn derive_code_keeps_non_numeric_text() {
        assert_eq!(derive_code(Some("30xx-extra")), "30xx-extra");
        assert_eq!(derive_code(Some("007")), "007");
        assert_eq!(derive_code(Some("1001")), "1001");
        assert_eq!(derive_code(None), "0000");
    }

    #[test]
    fn derive_title_sanitizes_and_falls_back() {
        assert_eq!(derive_title(Some("Cardio: l'aorte / AVC")), "Cardio l aorte AVC");
        assert_eq!(derive_title(Some("Pédiatrie_2 (base)")), "Pédiatrie_2 (base)");
        assert_eq!(derive_title(Some("???")), "quiz");
        assert_eq!(derive_title(None), "quiz");
    }

    #[test]
    fn derive_output_stem_falls_back_when_columns_absent() {
        let table_first = table(&["Question"], &[&["Q1"]]);
        assert_eq!(
            derive_output_stem(&table_first, "Numéro", "Nom", "2030"),
            "0000_quiz_biblio_2030"
        );
    }

    #[test]
    fn derive_output_stem_replaces_reserved_characters() {
        let table_first = table(&["Numéro", "Nom"], &[&["12/ab", "Cardio"]]);
        assert_eq!(
            derive_output_stem(&table_first, "Numéro", "Nom", "2025"),
            "12 ab_Cardio_biblio_2025"
        );
    }
}
