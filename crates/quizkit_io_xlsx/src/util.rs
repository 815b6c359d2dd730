//! Stateless helper utilities used by the XLSX writer kernel.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{SpecColumnFormula, SpecSheetVerticalMerge};

////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter(|(_, l_pos)| l_pos.len() > 1)
        .map(|(c_name, l_pos)| format!("{c_name:?} x{} at indices {:?}", l_pos.len(), l_pos))
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Validate body + one header row against Excel sheet limits.
pub fn validate_sheet_dimensions(height_body: usize, width: usize) -> Result<(), String> {
    if height_body + 1 > N_NROWS_EXCEL_MAX {
        return Err(format!(
            "Too many rows for one sheet: {height_body} body rows + header exceeds {N_NROWS_EXCEL_MAX}."
        ));
    }
    if width > N_NCOLS_EXCEL_MAX {
        return Err(format!(
            "Too many columns for one sheet: {width} exceeds {N_NCOLS_EXCEL_MAX}."
        ));
    }
    Ok(())
}

/// Convert zero-based column index to its letter name (`0 -> A`, `27 -> AB`).
pub fn derive_column_letter(n_idx_col: usize) -> String {
    let mut l_chars = Vec::new();
    let mut n_rest = n_idx_col + 1;
    while n_rest > 0 {
        let n_rem = (n_rest - 1) % 26;
        l_chars.push((b'A' + n_rem as u8) as char);
        n_rest = (n_rest - 1) / 26;
    }
    l_chars.iter().rev().collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Create suffixed sheet name (`base__2`, `base__3`, ...), respecting length cap.
pub fn create_sheet_identifier(base_name: &str, n_idx_suffix: usize) -> String {
    let c_sheet_name_suffix = format!("__{n_idx_suffix}");
    let n_len_base_name_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_sheet_name_suffix.len());

    let c_sheet_name_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_name_max))
        .collect();

    format!("{c_sheet_name_base}{c_sheet_name_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region VerticalMergeUtils

/// Validate a vertical merge plan against the sheet columns and body height.
///
/// Every merge must target a known column, span at least two rows inside the
/// body, and not overlap another merge of the same column.
pub fn validate_vertical_merges(
    merges: &[SpecSheetVerticalMerge],
    columns: &[String],
    height_body: usize,
) -> Result<(), String> {
    let mut dict_spans_by_col: BTreeMap<&str, Vec<(usize, usize)>> = BTreeMap::new();
    for merge in merges {
        if !columns.iter().any(|c_name| *c_name == merge.col_name) {
            return Err(format!("Merge column not found: {:?}", merge.col_name));
        }
        if merge.row_idx_end <= merge.row_idx_start {
            return Err(format!(
                "Merge on {:?} must span >= 2 rows (got {}..={}).",
                merge.col_name, merge.row_idx_start, merge.row_idx_end
            ));
        }
        if merge.row_idx_end >= height_body {
            return Err(format!(
                "Merge on {:?} ends at body row {} but body has {height_body} rows.",
                merge.col_name, merge.row_idx_end
            ));
        }
        dict_spans_by_col
            .entry(merge.col_name.as_str())
            .or_default()
            .push((merge.row_idx_start, merge.row_idx_end));
    }

    for (c_name, l_spans) in &mut dict_spans_by_col {
        l_spans.sort_unstable();
        for pair in l_spans.windows(2) {
            if pair[1].0 <= pair[0].1 {
                return Err(format!(
                    "Overlapping merges on {c_name:?}: {:?} and {:?}.",
                    pair[0], pair[1]
                ));
            }
        }
    }
    Ok(())
}

/// Build lookup `(col_name, body_row) -> anchor body_row` for cells covered by
/// a vertical merge (anchor included).
pub fn derive_vertical_merge_anchors(
    merges: &[SpecSheetVerticalMerge],
) -> BTreeMap<(String, usize), usize> {
    let mut dict_anchor_by_cell = BTreeMap::new();
    for merge in merges {
        for n_row_idx in merge.row_idx_start..=merge.row_idx_end {
            dict_anchor_by_cell.insert((merge.col_name.clone(), n_row_idx), merge.row_idx_start);
        }
    }
    dict_anchor_by_cell
}

/// Validate formula columns: both the formula column and its source must exist
/// and the function name must be a plain identifier.
pub fn validate_formula_columns(
    formulas_by_col: &BTreeMap<String, SpecColumnFormula>,
    columns: &[String],
) -> Result<(), String> {
    for (c_name, formula) in formulas_by_col {
        if !columns.contains(c_name) {
            return Err(format!("Formula column not found: {c_name:?}"));
        }
        if !columns.contains(&formula.col_source) {
            return Err(format!(
                "Formula source column not found: {:?} (for {c_name:?})",
                formula.col_source
            ));
        }
        if formula.col_source == *c_name {
            return Err(format!("Formula column {c_name:?} cannot reference itself."));
        }
        let if_valid_function = !formula.function.is_empty()
            && formula
                .function
                .chars()
                .all(|chr| chr.is_ascii_alphanumeric() || chr == '.' || chr == '_');
        if !if_valid_function {
            return Err(format!(
                "Invalid formula function for {c_name:?}: {:?}",
                formula.function
            ));
        }
    }
    Ok(())
}

/// Render formula text `=FUNC(<col><row>)` for a zero-based sheet row/column.
pub fn derive_formula_text(function: &str, n_idx_col_source: usize, n_row_sheet: usize) -> String {
    format!(
        "={function}({}{})",
        derive_column_letter(n_idx_col_source),
        n_row_sheet + 1
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(col_name: &str, row_idx_start: usize, row_idx_end: usize) -> SpecSheetVerticalMerge {
        SpecSheetVerticalMerge {
            col_name: col_name.to_string(),
            row_idx_start,
            row_idx_end,
            text: "x".to_string(),
            fmt: None,
        }
    }

    #[test]
    fn test_derive_column_letter() {
        assert_eq!(derive_column_letter(0), "A");
        assert_eq!(derive_column_letter(4), "E");
        assert_eq!(derive_column_letter(25), "Z");
        assert_eq!(derive_column_letter(26), "AA");
        assert_eq!(derive_column_letter(27), "AB");
        assert_eq!(derive_column_letter(16_383), "XFD");
    }

    #[test]
    fn test_sanitize_sheet_name() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_create_sheet_identifier_respects_length_cap() {
        let c_name = create_sheet_identifier(&"q".repeat(31), 2);
        assert_eq!(c_name.chars().count(), 31);
        assert!(c_name.ends_with("__2"));
    }

    #[test]
    fn test_validate_unique_columns_reports_duplicates() {
        let columns = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let err = validate_unique_columns(&columns).unwrap_err();
        assert!(err.contains("\"a\" x2 at indices [0, 2]"));
    }

    #[test]
    fn test_validate_vertical_merges() {
        let columns = vec!["Question".to_string(), "Feedback".to_string()];
        assert!(validate_vertical_merges(&[merge("Question", 0, 1)], &columns, 3).is_ok());
        assert!(validate_vertical_merges(&[merge("Missing", 0, 1)], &columns, 3).is_err());
        assert!(validate_vertical_merges(&[merge("Question", 1, 1)], &columns, 3).is_err());
        assert!(validate_vertical_merges(&[merge("Question", 1, 3)], &columns, 3).is_err());
        assert!(
            validate_vertical_merges(
                &[merge("Question", 0, 1), merge("Question", 1, 2)],
                &columns,
                3
            )
            .is_err()
        );
        assert!(
            validate_vertical_merges(
                &[merge("Question", 0, 1), merge("Feedback", 0, 2)],
                &columns,
                3
            )
            .is_ok()
        );
    }

    #[test]
    fn test_derive_vertical_merge_anchors() {
        let dict_anchor = derive_vertical_merge_anchors(&[merge("Feedback", 2, 4)]);
        assert_eq!(dict_anchor.get(&("Feedback".to_string(), 2)), Some(&2));
        assert_eq!(dict_anchor.get(&("Feedback".to_string(), 4)), Some(&2));
        assert_eq!(dict_anchor.get(&("Feedback".to_string(), 5)), None);
    }

    #[test]
    fn test_derive_formula_text() {
        assert_eq!(derive_formula_text("LEN", 4, 1), "=LEN(E2)");
    }

    #[test]
    fn test_validate_formula_columns() {
        let columns = vec!["Feedback".to_string(), "NbCar".to_string()];
        let mut dict_formulas = BTreeMap::new();
        dict_formulas.insert(
            "NbCar".to_string(),
            SpecColumnFormula {
                col_source: "Feedback".to_string(),
                function: "LEN".to_string(),
            },
        );
        assert!(validate_formula_columns(&dict_formulas, &columns).is_ok());

        dict_formulas.insert(
            "NbCar".to_string(),
            SpecColumnFormula {
                col_source: "Feedback".to_string(),
                function: "LEN)+1".to_string(),
            },
        );
        assert!(validate_formula_columns(&dict_formulas, &columns).is_err());
    }

    #[test]
    fn test_validate_sheet_dimensions() {
        assert!(validate_sheet_dimensions(10, 5).is_ok());
        assert!(validate_sheet_dimensions(N_NROWS_EXCEL_MAX, 1).is_err());
        assert!(validate_sheet_dimensions(1, N_NCOLS_EXCEL_MAX + 1).is_err());
    }
}
