//! Quiz layout constants and default option factory.

use std::collections::BTreeMap;

use quizkit_io_csv::derive_default_csv_read_options;

use crate::spec::SpecQuizMergeOptions;

/// Column holding the numeric quiz code.
pub const C_COL_CODE: &str = "Numéro";
/// Column holding the quiz title.
pub const C_COL_TITLE: &str = "Nom";
/// Provenance column prepended when source tracking is enabled.
pub const C_COL_SOURCE_FILE: &str = "source_fichier";
/// Long-text column measured by the length formula.
pub const C_COL_LONG_TEXT: &str = "Feedback";
/// Derived length column.
pub const C_COL_LONG_TEXT_LEN: &str = "NbCar Feedback";

/// Columns used only for naming/bookkeeping.
pub const TUP_COLS_ADMINISTRATIVE: [&str; 4] =
    [C_COL_CODE, C_COL_TITLE, "Importante", C_COL_SOURCE_FILE];
/// Columns whose repeated values are merged vertically.
pub const TUP_COLS_MERGEABLE: [&str; 2] = ["Question", C_COL_LONG_TEXT];
/// Columns placed first, in this order, when present.
pub const TUP_COLS_PREFERRED_ORDER: [&str; 6] = [
    "Question",
    "Type de question",
    "Réponse",
    "Valide",
    C_COL_LONG_TEXT,
    C_COL_LONG_TEXT_LEN,
];
/// Wrapped, top-aligned columns.
pub const TUP_COLS_WRAP: [&str; 3] = ["Question", "Réponse", C_COL_LONG_TEXT];
/// Fixed widths in Excel character units.
pub const TUP_WIDTHS_BY_COL: [(&str, f64); 6] = [
    ("Question", 140.0),
    ("Type de question", 24.0),
    ("Réponse", 70.0),
    ("Valide", 10.0),
    (C_COL_LONG_TEXT, 140.0),
    (C_COL_LONG_TEXT_LEN, 16.0),
];

/// Data sheet name.
pub const C_SHEET_NAME_DATA: &str = "QUIZ";
/// Empty companion sheet name.
pub const C_SHEET_NAME_COMPANION: &str = "BIBLIOGRAPHIE";
/// Year suffix used in output names.
pub const C_YEAR_OUTPUT_DEFAULT: &str = "2025";
/// Data row height in points.
pub const N_HEIGHT_DATA_ROW: f64 = 45.0;

/// Fallback code when no code value exists.
pub const C_CODE_FALLBACK: &str = "0000";
/// Fallback title when no title value exists.
pub const C_TITLE_FALLBACK: &str = "quiz";
/// Output file extension.
pub const C_EXT_OUTPUT: &str = "xlsx";

/// Separator between normalized values in a dedup key.
///
/// Normalization collapses every whitespace run, so it never survives inside a value.
pub const C_KEY_DELIMITER: char = '\n';

/// Glob selecting input files (matched case-insensitively).
pub const C_GLOB_INPUT: &str = "*.csv";
/// Glob selecting stale outputs (matched case-insensitively).
pub const C_GLOB_STALE_OUTPUT: &str = "*.xlsx";

fn derive_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|c_name| c_name.to_string()).collect()
}

/// Build the default pipeline options.
pub fn derive_default_quiz_merge_options() -> SpecQuizMergeOptions {
    SpecQuizMergeOptions {
        year_output: C_YEAR_OUTPUT_DEFAULT.to_string(),
        cols_administrative: derive_owned(&TUP_COLS_ADMINISTRATIVE),
        cols_mergeable: derive_owned(&TUP_COLS_MERGEABLE),
        cols_preferred_order: derive_owned(&TUP_COLS_PREFERRED_ORDER),
        widths_by_col: TUP_WIDTHS_BY_COL
            .iter()
            .map(|(c_name, n_width)| (c_name.to_string(), *n_width))
            .collect::<BTreeMap<_, _>>(),
        cols_wrap: derive_owned(&TUP_COLS_WRAP),
        col_long_text: Some(C_COL_LONG_TEXT.to_string()),
        col_long_text_len: C_COL_LONG_TEXT_LEN.to_string(),
        col_code: C_COL_CODE.to_string(),
        col_title: C_COL_TITLE.to_string(),
        sheet_name_data: C_SHEET_NAME_DATA.to_string(),
        sheet_name_companion: Some(C_SHEET_NAME_COMPANION.to_string()),
        height_data_row: Some(N_HEIGHT_DATA_ROW),
        if_track_source_file: false,
        if_clear_stale_outputs: false,
        name_output_override: None,
        csv_read_options: derive_default_csv_read_options(),
    }
}
