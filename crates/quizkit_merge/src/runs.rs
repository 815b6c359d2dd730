//! Run-length detection of repeated values for vertical merging.

use quizkit_io_csv::SpecTable;

use crate::normalize::normalize_text;
use crate::spec::SpecMergeRun;

/// Maximal runs of contiguous rows sharing one non-empty normalized value in `col_name`.
///
/// Rows are 1-based over the data region. Empty values never start or extend
/// a run and single rows are not reported. An unknown column yields no runs.
pub fn calculate_merge_runs(table: &SpecTable, col_name: &str) -> Vec<SpecMergeRun> {
    let Some(l_values) = table.column_values(col_name) else {
        return Vec::new();
    };

    let mut l_runs = Vec::new();
    let mut run_open: Option<(String, usize)> = None;
    let mut close_run = |run: Option<(String, usize)>, n_row_end: usize| {
        if let Some((_, n_row_start)) = run
            && n_row_end > n_row_start
        {
            l_runs.push(SpecMergeRun {
                col_name: col_name.to_string(),
                row_start: n_row_start,
                row_end: n_row_end,
            });
        }
    };

    for (n_idx, value) in l_values.into_iter().enumerate() {
        let n_row = n_idx + 1;
        let c_norm = normalize_text(value);
        if c_norm.is_empty() {
            close_run(run_open.take(), n_row - 1);
            continue;
        }
        let if_extends = matches!(&run_open, Some((c_norm_open, _)) if *c_norm_open == c_norm);
        if !if_extends {
            close_run(run_open.take(), n_row - 1);
            run_open = Some((c_norm, n_row));
        }
    }
    close_run(run_open.take(), table.height());

    l_runs
}

/// Runs for every column in `cols_mergeable`, in that column order.
pub fn calculate_merge_runs_for_columns(
    table: &SpecTable,
    cols_mergeable: &[String],
) -> Vec<SpecMergeRun> {
    cols_mergeable
        .iter()
        .flat_map(|col_name| calculate_merge_runs(table, col_name))
        .collect()
}
