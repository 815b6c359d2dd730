//! Shared XLSX specification models.

use std::collections::BTreeMap;
use std::path::PathBuf;

use rust_xlsxwriter::XlsxError;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Border style applied to all four sides of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCellBorder {
    None,
    Thin,
    Medium,
}

/// Horizontal alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCellAlign {
    Left,
    Center,
    Right,
}

/// Vertical alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumCellValign {
    Top,
    Center,
    Bottom,
}

/// Declarative cell format, converted to `rust_xlsxwriter::Format` at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,

    pub align: Option<EnumCellAlign>,
    pub valign: Option<EnumCellValign>,
    pub border: Option<EnumCellBorder>,
    /// Border color for all sides (`#RRGGBB`).
    pub border_color: Option<String>,
    pub text_wrap: Option<bool>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            align: other.align.or(self.align),
            valign: other.valign.or(self.valign),
            border: other.border.or(self.border),
            border_color: other
                .border_color
                .clone()
                .or_else(|| self.border_color.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetLayoutSpecification

/// Vertical merge plan item over body rows of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetVerticalMerge {
    /// Column name the merge applies to.
    pub col_name: String,
    /// Zero-based body row where the merge starts (inclusive).
    pub row_idx_start: usize,
    /// Zero-based body row where the merge ends (inclusive).
    pub row_idx_end: usize,
    /// Merge display text.
    pub text: String,
    /// Format overlay for the merged cell, on top of the column body format.
    pub fmt: Option<SpecCellFormat>,
}

/// Column whose body cells are written as a one-argument formula over another column.
///
/// The dataframe values of the formula column are used as cached results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecColumnFormula {
    /// Source column whose same-row cell is the formula argument.
    pub col_source: String,
    /// Spreadsheet function name, e.g. `LEN`.
    pub function: String,
}

/// Per-sheet write options.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecXlsxSheetWriteOptions {
    /// Number of frozen columns.
    pub col_freeze: usize,
    /// Frozen row index; defaults to the header height when `None`.
    pub row_freeze: Option<usize>,
    /// Add an autofilter spanning the header row.
    pub if_autofilter: bool,
    /// Fixed column widths (Excel character units) by column name.
    pub widths_by_col: BTreeMap<String, f64>,
    /// Body format overrides by column name.
    pub fmts_by_col: BTreeMap<String, SpecCellFormat>,
    /// Fixed height (points) applied to body rows.
    pub height_body_row: Option<f64>,
    /// Vertical merges applied after body cells are written.
    pub merges_vertical: Vec<SpecSheetVerticalMerge>,
    /// Formula columns by column name.
    pub formulas_by_col: BTreeMap<String, SpecColumnFormula>,
}

impl Default for SpecXlsxSheetWriteOptions {
    fn default() -> Self {
        Self {
            col_freeze: 0,
            row_freeze: None,
            if_autofilter: true,
            widths_by_col: BTreeMap::new(),
            fmts_by_col: BTreeMap::new(),
            height_body_row: None,
            merges_vertical: Vec::new(),
            formulas_by_col: BTreeMap::new(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// What one sheet write produced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetReport {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Body rows written (header excluded).
    pub n_rows_body: usize,
    /// Columns written.
    pub n_cols: usize,
    /// Vertical merges applied.
    pub n_merges_vertical: usize,
    /// Formula cells written.
    pub n_formulas: usize,
}

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheets produced by the write call.
    pub sheets: Vec<SpecSheetReport>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Writer failures.
#[derive(Debug, thiserror::Error)]
pub enum XlsxWriteError {
    /// Input table or layout plan is not writable.
    #[error("{0}")]
    InvalidInput(String),
    /// Writer was already closed.
    #[error("Cannot write after close().")]
    Closed,
    /// Error raised by the xlsx backend.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] XlsxError),
    /// Workbook could not be saved to its destination.
    #[error("Failed to save workbook {}: {message}", path.display())]
    Save {
        /// Destination path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
