//! Quiz sheet layout: column order, length formula column, merges and styles.

use std::collections::BTreeMap;
use std::path::Path;

use polars::prelude::{Column, DataFrame};
use quizkit_io_csv::SpecTable;
use quizkit_io_xlsx::{
    EnumFmtKey, SpecColumnFormula, SpecSheetVerticalMerge, SpecXlsxSheetWriteOptions,
    XlsxWriteError, XlsxWriter, derive_default_xlsx_format,
};
use tracing::debug;

use crate::runs::calculate_merge_runs_for_columns;
use crate::spec::{QuizMergeError, SpecMergeRun, SpecQuizMergeOptions};

/// Spreadsheet function used by the derived length column.
pub const C_FUNCTION_LEN: &str = "LEN";

/// Table ready for rendering plus the merge runs computed over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecQuizLayout {
    pub table: SpecTable,
    pub runs: Vec<SpecMergeRun>,
}

/// What rendering produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecRenderOutcome {
    pub n_rows: usize,
    pub n_merge_runs: usize,
    pub warnings: Vec<String>,
}

/// Preferred columns that are present, in preferred order, then the rest in table order.
pub fn derive_column_order(columns: &[String], cols_preferred: &[String]) -> Vec<String> {
    let mut l_order: Vec<String> = cols_preferred
        .iter()
        .filter(|c_name| columns.contains(c_name))
        .cloned()
        .collect();
    l_order.extend(
        columns
            .iter()
            .filter(|c_name| !cols_preferred.contains(c_name))
            .cloned(),
    );
    l_order
}

/// Character count shown by the length column.
pub fn derive_text_length(text: &str) -> usize {
    text.chars().count()
}

/// Order columns, add the length column and compute merge runs.
///
/// The cached length of a row inside a long-text merge run is the length of
/// the run anchor, which is the text the merged cell displays.
pub fn prepare_quiz_layout(
    mut table: SpecTable,
    options: &SpecQuizMergeOptions,
) -> Result<SpecQuizLayout, XlsxWriteError> {
    let col_long_text = options
        .col_long_text
        .as_deref()
        .filter(|c_name| table.position(c_name).is_some());
    if col_long_text.is_some() {
        table.ensure_column(&options.col_long_text_len);
    }

    let l_order = derive_column_order(table.columns(), &options.cols_preferred_order);
    let mut table = table.select_columns(&l_order);
    let runs = calculate_merge_runs_for_columns(&table, &options.cols_mergeable);

    if let Some(col_long_text) = col_long_text {
        let l_runs_long: Vec<&SpecMergeRun> = runs
            .iter()
            .filter(|run| run.col_name == col_long_text)
            .collect();
        for n_idx_row in 0..table.height() {
            let n_row = n_idx_row + 1;
            let n_idx_anchor = l_runs_long
                .iter()
                .find(|run| run.contains(n_row))
                .map(|run| run.row_start - 1)
                .unwrap_or(n_idx_row);
            let n_len = table
                .get(n_idx_anchor, col_long_text)
                .map(derive_text_length)
                .unwrap_or(0);
            table
                .set_value(n_idx_row, &options.col_long_text_len, n_len.to_string())
                .map_err(XlsxWriteError::InvalidInput)?;
        }
    }

    Ok(SpecQuizLayout { table, runs })
}

/// Build a string-column dataframe from `table`.
pub fn build_dataframe(table: &SpecTable) -> Result<DataFrame, XlsxWriteError> {
    let l_cols: Vec<Column> = table
        .columns()
        .iter()
        .enumerate()
        .map(|(n_idx_col, c_name)| {
            let l_values: Vec<&str> = table
                .rows()
                .iter()
                .map(|row| row[n_idx_col].as_str())
                .collect();
            Column::new(c_name.as_str().into(), l_values)
        })
        .collect();
    DataFrame::new(l_cols)
        .map_err(|err| XlsxWriteError::InvalidInput(format!("Cannot build dataframe: {err}")))
}

/// Sheet options for the quiz data sheet.
pub fn derive_quiz_sheet_options(
    layout: &SpecQuizLayout,
    options: &SpecQuizMergeOptions,
) -> SpecXlsxSheetWriteOptions {
    let columns = layout.table.columns();
    let if_present = |c_name: &String| columns.contains(c_name);
    let fmt_wrap = derive_default_xlsx_format(EnumFmtKey::Wrap);

    let widths_by_col: BTreeMap<String, f64> = options
        .widths_by_col
        .iter()
        .filter(|(c_name, _)| if_present(c_name))
        .map(|(c_name, n_width)| (c_name.clone(), *n_width))
        .collect();
    let fmts_by_col = options
        .cols_wrap
        .iter()
        .filter(|c_name| if_present(c_name))
        .map(|c_name| (c_name.clone(), fmt_wrap.clone()))
        .collect();
    let merges_vertical = layout
        .runs
        .iter()
        .map(|run| SpecSheetVerticalMerge {
            col_name: run.col_name.clone(),
            row_idx_start: run.row_start - 1,
            row_idx_end: run.row_end - 1,
            text: layout
                .table
                .get(run.row_start - 1, &run.col_name)
                .unwrap_or_default()
                .to_string(),
            fmt: Some(fmt_wrap.clone()),
        })
        .collect();

    let mut formulas_by_col = BTreeMap::new();
    if let Some(col_long_text) = &options.col_long_text
        && if_present(col_long_text)
        && if_present(&options.col_long_text_len)
    {
        formulas_by_col.insert(
            options.col_long_text_len.clone(),
            SpecColumnFormula {
                col_source: col_long_text.clone(),
                function: C_FUNCTION_LEN.to_string(),
            },
        );
    }

    SpecXlsxSheetWriteOptions {
        col_freeze: 0,
        row_freeze: Some(1),
        if_autofilter: true,
        widths_by_col,
        fmts_by_col,
        height_body_row: options.height_data_row,
        merges_vertical,
        formulas_by_col,
    }
}

/// Render `table` into a two-sheet workbook at `path_file_out`, replacing any existing file.
pub fn render_quiz_workbook(
    table: SpecTable,
    path_file_out: &Path,
    options: &SpecQuizMergeOptions,
) -> Result<SpecRenderOutcome, QuizMergeError> {
    let derive_render_error = |err: XlsxWriteError| QuizMergeError::Render {
        path: path_file_out.to_path_buf(),
        source: err,
    };

    let layout = prepare_quiz_layout(table, options).map_err(derive_render_error)?;
    let df_data = build_dataframe(&layout.table).map_err(derive_render_error)?;
    let sheet_options = derive_quiz_sheet_options(&layout, options);

    let mut writer = XlsxWriter::with_defaults(path_file_out.to_path_buf());
    writer
        .write_sheet_from_dataframe(&df_data, &options.sheet_name_data, &sheet_options)
        .map_err(derive_render_error)?;
    if let Some(sheet_name_companion) = &options.sheet_name_companion {
        writer
            .add_empty_sheet(sheet_name_companion)
            .map_err(derive_render_error)?;
    }
    writer.close().map_err(derive_render_error)?;

    let warnings: Vec<String> = writer
        .report()
        .into_iter()
        .flat_map(|report| report.warnings)
        .collect();
    debug!(
        n_rows = layout.table.height(),
        n_merge_runs = layout.runs.len(),
        path = %path_file_out.display(),
        "quiz workbook rendered"
    );
    Ok(SpecRenderOutcome {
        n_rows: layout.table.height(),
        n_merge_runs: layout.runs.len(),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use quizkit_io_csv::SpecTable;

    use super::*;

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> SpecTable {
        SpecTable::from_rows(s(columns), rows.iter().map(|row| s(row)).collect()).unwrap()
    }

    #[test]
    fn derive_column_order_puts_preferred_first() {
        let l_order = derive_column_order(
            &s(&["Extra", "Feedback", "Question", "Valide"]),
            &s(&["Question", "Type de question", "Réponse", "Valide", "Feedback"]),
        );
        assert_eq!(l_order, s(&["Question", "Valide", "Feedback", "Extra"]));
    }

    #[test]
    fn prepare_quiz_layout_adds_length_column_after_feedback() {
        let layout = prepare_quiz_layout(
            table(&["Feedback", "Question", "Extra"], &[&["abc", "Q1", "x"]]),
            &SpecQuizMergeOptions::default(),
        )
        .unwrap();
        assert_eq!(
            layout.table.columns(),
            s(&["Question", "Feedback", "NbCar Feedback", "Extra"]).as_slice()
        );
        assert_eq!(layout.table.get(0, "NbCar Feedback"), Some("3"));
        assert!(layout.runs.is_empty());
    }

    #[test]
    fn prepare_quiz_layout_uses_anchor_length_inside_runs() {
        let layout = prepare_quiz_layout(
            table(
                &["Question", "Feedback"],
                &[&["q1", "é é"], &["q1", " é  é "], &["q2", ""]],
            ),
            &SpecQuizMergeOptions::default(),
        )
        .unwrap();
        assert_eq!(
            layout.table.column_values("NbCar Feedback").unwrap(),
            vec!["3", "3", "0"]
        );
        assert_eq!(layout.runs.len(), 2);
    }

    #[test]
    fn prepare_quiz_layout_without_long_text_adds_nothing() {
        let layout = prepare_quiz_layout(
            table(&["Question"], &[&["q1"]]),
            &SpecQuizMergeOptions::default(),
        )
        .unwrap();
        assert_eq!(layout.table.columns(), s(&["Question"]).as_slice());
    }

    #[test]
    fn derive_quiz_sheet_options_plans_merges_widths_and_formula() {
        let options = SpecQuizMergeOptions::default();
        let layout = prepare_quiz_layout(
            table(
                &["Question", "Réponse", "Feedback"],
                &[&["q1", "A", "f"], &["q1", "B", "f"], &["q2", "C", "g"]],
            ),
            &options,
        )
        .unwrap();
        let sheet_options = derive_quiz_sheet_options(&layout, &options);

        assert_eq!(sheet_options.row_freeze, Some(1));
        assert_eq!(sheet_options.height_body_row, Some(45.0));
        assert_eq!(sheet_options.widths_by_col.len(), 4);
        assert!(!sheet_options.widths_by_col.contains_key("Valide"));
        assert!(sheet_options.fmts_by_col.contains_key("Réponse"));
        assert_eq!(sheet_options.merges_vertical.len(), 2);
        assert_eq!(sheet_options.merges_vertical[0].col_name, "Question");
        assert_eq!(
            (
                sheet_options.merges_vertical[0].row_idx_start,
                sheet_options.merges_vertical[0].row_idx_end
            ),
            (0, 1)
        );
        assert_eq!(sheet_options.merges_vertical[0].text, "q1");
        assert_eq!(
            sheet_options.formulas_by_col["NbCar Feedback"].col_source,
            "Feedback"
        );
    }

    #[test]
    fn build_dataframe_keeps_text_values() {
        let df = build_dataframe(&table(&["Numéro", "Question"], &[&["007", "Q"]])).unwrap();
        assert_eq!(df.height(), 1);
        assert_eq!(df.width(), 2);
        assert_eq!(df.get_column_names_str(), vec!["Numéro", "Question"]);
    }
}
