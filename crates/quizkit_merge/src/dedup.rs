//! Administrative column removal and normalized-key deduplication.

use std::collections::HashSet;

use quizkit_io_csv::SpecTable;
use tracing::debug;

use crate::conf::C_KEY_DELIMITER;
use crate::normalize::normalize_text_folded;

/// Drop every column named in `cols_administrative`, preserving the order of the rest.
pub fn drop_administrative_columns(table: SpecTable, cols_administrative: &[String]) -> SpecTable {
    table.retain_columns(|c_name| !cols_administrative.iter().any(|c_admin| c_admin == c_name))
}

/// Comparison key of one row over the columns at `l_idx_key`.
///
/// Each value is normalized and lowercased, then joined with a delimiter
/// that normalization never leaves inside a value.
pub fn derive_normalized_key(row: &[String], l_idx_key: &[usize]) -> String {
    let l_parts: Vec<String> = l_idx_key
        .iter()
        .map(|n_idx| normalize_text_folded(&row[*n_idx]))
        .collect();
    l_parts.join(&C_KEY_DELIMITER.to_string())
}

/// Keep only the first row of each normalized key, in original order.
///
/// Columns named in `cols_key_ignored` still travel with the row but take no
/// part in the key. Returns the deduplicated table and the number of rows removed.
pub fn deduplicate_rows(table: SpecTable, cols_key_ignored: &[String]) -> (SpecTable, usize) {
    let l_idx_key: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c_name)| !cols_key_ignored.contains(c_name))
        .map(|(n_idx, _)| n_idx)
        .collect();

    let n_rows_before = table.height();
    let mut table_out = table;
    let mut set_keys_seen: HashSet<String> = HashSet::with_capacity(n_rows_before);
    table_out.retain_rows(|row| set_keys_seen.insert(derive_normalized_key(row, &l_idx_key)));

    let n_removed = n_rows_before - table_out.height();
    debug!(n_rows_before, n_removed, "rows deduplicated");
    (table_out, n_removed)
}
