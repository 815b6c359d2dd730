//! Table model, reader options and error types.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::conf::{
    N_RECORDS_SNIFF_MAX, N_SIZE_SAMPLE_BYTES, TUP_DELIMITERS_DEFAULT, TUP_ENCODINGS_DEFAULT,
};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Text encoding candidate used while decoding raw source bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumTextEncoding {
    /// UTF-8, stripping a leading byte-order mark when present.
    Utf8Sig,
    /// Plain UTF-8.
    Utf8,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
    /// Windows-1252 (CP-1252).
    Windows1252,
}

impl EnumTextEncoding {
    /// Conventional label (`utf-8-sig`, `utf-8`, `latin-1`, `cp1252`).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8Sig => "utf-8-sig",
            Self::Utf8 => "utf-8",
            Self::Latin1 => "latin-1",
            Self::Windows1252 => "cp1252",
        }
    }
}

impl fmt::Display for EnumTextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Field delimiter candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCsvDelimiter {
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `\t`
    Tab,
}

impl EnumCsvDelimiter {
    /// Delimiter byte for the CSV parser.
    pub fn as_byte(&self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Semicolon => b';',
            Self::Tab => b'\t',
        }
    }
}

impl fmt::Display for EnumCsvDelimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comma => f.write_str("comma"),
            Self::Semicolon => f.write_str("semicolon"),
            Self::Tab => f.write_str("tab"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Reader options controlling the encoding/delimiter search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCsvReadOptions {
    /// Encodings tried in order until one decodes and parses.
    pub encodings: Vec<EnumTextEncoding>,
    /// Delimiters considered, in preference order.
    pub delimiters: Vec<EnumCsvDelimiter>,
    /// Leading sample size (bytes of decoded text) used for delimiter detection.
    pub size_sample_bytes: usize,
    /// Max records inspected while sniffing.
    pub n_records_sniff_max: usize,
}

impl Default for SpecCsvReadOptions {
    fn default() -> Self {
        Self {
            encodings: TUP_ENCODINGS_DEFAULT.to_vec(),
            delimiters: TUP_DELIMITERS_DEFAULT.to_vec(),
            size_sample_bytes: N_SIZE_SAMPLE_BYTES,
            n_records_sniff_max: N_RECORDS_SNIFF_MAX,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableModel

/// One delimited source handed over by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSourceFile {
    /// File name; identity of the source.
    pub name_file: String,
    /// Raw undecoded content.
    pub v_bytes: Vec<u8>,
}

impl SpecSourceFile {
    pub fn new(name_file: impl Into<String>, v_bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name_file: name_file.into(),
            v_bytes: v_bytes.into(),
        }
    }

    /// Read a source from disk; its name is the path's file name.
    pub fn from_path<P>(path: P) -> Result<Self, CsvReadError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let v_bytes = fs::read(path).map_err(|err| CsvReadError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        let name_file = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name_file, v_bytes))
    }
}

/// Ordered all-text table.
///
/// Every row holds exactly one value per column, aligned with `columns`.
/// Absent values are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SpecTable {
    /// Empty table with the given schema.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, validating that every row matches the schema width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, String> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Zero-based position of column `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c_name| c_name == name)
    }

    /// Cell text at (`row_idx`, column `name`).
    pub fn get(&self, row_idx: usize, name: &str) -> Option<&str> {
        let n_idx_col = self.position(name)?;
        self.rows.get(row_idx).map(|row| row[n_idx_col].as_str())
    }

    /// All values of column `name`, in row order.
    pub fn column_values(&self, name: &str) -> Option<Vec<&str>> {
        let n_idx_col = self.position(name)?;
        Some(self.rows.iter().map(|row| row[n_idx_col].as_str()).collect())
    }

    /// Append one row; its width must equal the schema width.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), String> {
        if row.len() != self.columns.len() {
            return Err(format!(
                "Row width mismatch: got {} values, schema has {} columns.",
                row.len(),
                self.columns.len()
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Overwrite the cell at (`row_idx`, column `name`).
    pub fn set_value(&mut self, row_idx: usize, name: &str, value: String) -> Result<(), String> {
        let n_idx_col = self
            .position(name)
            .ok_or_else(|| format!("Unknown column: {name:?}"))?;
        let row = self
            .rows
            .get_mut(row_idx)
            .ok_or_else(|| format!("Row index out of range: {row_idx}"))?;
        row[n_idx_col] = value;
        Ok(())
    }

    /// Append the rows of `other`, extending the schema in first-seen order.
    ///
    /// Rows missing a column of the extended schema are padded with "".
    pub fn append_table(&mut self, other: SpecTable) {
        let l_idx_target: Vec<usize> = other
            .columns
            .iter()
            .map(|c_name| self.ensure_column(c_name))
            .collect();
        let n_width = self.width();

        self.rows.reserve(other.rows.len());
        for row in other.rows {
            let mut row_out = vec![String::new(); n_width];
            for (value, n_idx_target) in row.into_iter().zip(&l_idx_target) {
                row_out[*n_idx_target] = value;
            }
            self.rows.push(row_out);
        }
    }

    /// Keep only rows for which `predicate` returns true, preserving order.
    pub fn retain_rows<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| predicate(row));
    }

    /// Return position of column `name`, appending it (padded with "") if absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(n_idx_col) = self.position(name) {
            return n_idx_col;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.columns.len() - 1
    }

    /// Insert column `name` at position 0 with the same `value` in every row.
    ///
    /// Returns `Err` when the column already exists.
    pub fn prepend_constant_column(&mut self, name: &str, value: &str) -> Result<(), String> {
        if self.position(name).is_some() {
            return Err(format!("Column already exists: {name:?}"));
        }
        self.columns.insert(0, name.to_string());
        for row in &mut self.rows {
            row.insert(0, value.to_string());
        }
        Ok(())
    }

    /// Keep only columns for which `predicate` returns true, preserving order.
    pub fn retain_columns<F>(self, predicate: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        let l_idx_keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter_map(|(n_idx, c_name)| predicate(c_name).then_some(n_idx))
            .collect();
        self.select_indices(&l_idx_keep)
    }

    /// Reorder/subset columns by name; unknown names are ignored.
    pub fn select_columns(self, names: &[String]) -> Self {
        let l_idx_keep: Vec<usize> = names
            .iter()
            .filter_map(|c_name| self.position(c_name))
            .collect();
        self.select_indices(&l_idx_keep)
    }

    fn select_indices(self, indices: &[usize]) -> Self {
        let columns = indices.iter().map(|n_idx| self.columns[*n_idx].clone()).collect();
        let rows = self
            .rows
            .into_iter()
            .map(|row| indices.iter().map(|n_idx| row[*n_idx].clone()).collect())
            .collect();
        Self { columns, rows }
    }

    /// Split into `(columns, rows)`.
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<String>>) {
        (self.columns, self.rows)
    }
}

/// Parsed source together with the resolved decoding parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCsvTable {
    /// Source file name.
    pub name_file: String,
    /// Encoding accepted by the fallback search.
    pub encoding: EnumTextEncoding,
    /// Delimiter accepted by detection.
    pub delimiter: EnumCsvDelimiter,
    /// Parsed content.
    pub table: SpecTable,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Reader failures.
///
/// `Decode` and `Structure` describe one failed attempt; `ParseFailure` is the
/// terminal error once every candidate encoding has been exhausted.
#[derive(Debug, thiserror::Error)]
pub enum CsvReadError {
    /// Bytes are not valid under the attempted encoding.
    #[error("bytes are not valid {encoding}")]
    Decode {
        /// Attempted encoding.
        encoding: EnumTextEncoding,
    },
    /// Decoded text is not a structurally valid table.
    #[error("{0}")]
    Structure(String),
    /// Source could not be read from disk.
    #[error("Cannot read {}: {message}", path.display())]
    Io {
        /// Source path.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
    /// No candidate encoding produced a table.
    #[error("Cannot read CSV {file_name:?}: {message}")]
    ParseFailure {
        /// Source file name.
        file_name: String,
        /// Last underlying error text.
        message: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{CsvReadError, SpecSourceFile, SpecTable};

    fn s(v: &[&str]) -> Vec<String> {
        v.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn ensure_column_pads_existing_rows() {
        let mut table = SpecTable::from_rows(s(&["a"]), vec![s(&["1"]), s(&["2"])]).unwrap();
        assert_eq!(table.ensure_column("a"), 0);
        assert_eq!(table.ensure_column("b"), 1);
        assert_eq!(table.rows(), &[s(&["1", ""]), s(&["2", ""])]);
    }

    #[test]
    fn push_row_rejects_width_mismatch() {
        let mut table = SpecTable::new(s(&["a", "b"]));
        assert!(table.push_row(s(&["1"])).is_err());
        assert!(table.push_row(s(&["1", "2"])).is_ok());
        assert_eq!(table.height(), 1);
    }

    #[test]
    fn select_and_retain_columns_keep_row_alignment() {
        let table = SpecTable::from_rows(s(&["a", "b", "c"]), vec![s(&["1", "2", "3"])]).unwrap();
        let table = table.retain_columns(|c_name| c_name != "b");
        assert_eq!(table.columns(), &s(&["a", "c"]));
        let table = table.select_columns(&s(&["c", "missing", "a"]));
        assert_eq!(table.columns(), &s(&["c", "a"]));
        assert_eq!(table.rows(), &[s(&["3", "1"])]);
    }

    #[test]
    fn set_value_overwrites_one_cell() {
        let mut table = SpecTable::from_rows(s(&["a", "b"]), vec![s(&["1", "2"])]).unwrap();
        table.set_value(0, "b", "9".to_string()).unwrap();
        assert_eq!(table.rows(), &[s(&["1", "9"])]);
        assert!(table.set_value(1, "b", "x".to_string()).is_err());
        assert!(table.set_value(0, "z", "x".to_string()).is_err());
    }

    #[test]
    fn prepend_constant_column_rejects_duplicates() {
        let mut table = SpecTable::from_rows(s(&["a"]), vec![s(&["1"])]).unwrap();
        table.prepend_constant_column("src", "x.csv").unwrap();
        assert_eq!(table.get(0, "src"), Some("x.csv"));
        assert!(table.prepend_constant_column("src", "y.csv").is_err());
    }

    #[test]
    fn append_table_extends_schema_and_pads_rows() {
        let mut table = SpecTable::from_rows(s(&["a", "b"]), vec![s(&["1", "2"])]).unwrap();
        let other = SpecTable::from_rows(s(&["c", "a"]), vec![s(&["3", "4"])]).unwrap();
        table.append_table(other);
        assert_eq!(table.columns(), &s(&["a", "b", "c"]));
        assert_eq!(table.rows(), &[s(&["1", "2", ""]), s(&["4", "", "3"])]);
    }

    #[test]
    fn retain_rows_keeps_order() {
        let mut table =
            SpecTable::from_rows(s(&["a"]), vec![s(&["1"]), s(&["2"]), s(&["3"])]).unwrap();
        table.retain_rows(|row| row[0] != "2");
        assert_eq!(table.rows(), &[s(&["1"]), s(&["3"])]);
    }

    #[test]
    fn source_file_from_path_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiz.csv");
        std::fs::write(&path, b"a\n1\n").unwrap();

        let source = SpecSourceFile::from_path(&path).unwrap();
        assert_eq!(source.name_file, "quiz.csv");
        assert_eq!(source.v_bytes, b"a\n1\n");

        let err = SpecSourceFile::from_path(dir.path().join("missing.csv")).unwrap_err();
        assert!(matches!(err, CsvReadError::Io { .. }));
    }
}
