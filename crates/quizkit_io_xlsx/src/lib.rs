//! `quizkit_io_xlsx`:
//! XLSX writer kernel for text-only worksheets.
//!
//! Modules:
//! - `conf`   : Excel limits and default format presets
//! - `spec`   : formats, sheet layout options, reports, errors
//! - `util`   : pure validation and addressing helpers
//! - `writer` : `rust_xlsxwriter`-backed workbook writer
pub mod conf;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_BORDER_COLOR_DEFAULT, EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX,
    N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL, derive_default_xlsx_format,
};
pub use spec::{
    EnumCellAlign, EnumCellBorder, EnumCellValign, SpecCellFormat, SpecColumnFormula,
    SpecSheetReport, SpecSheetVerticalMerge, SpecXlsxReport, SpecXlsxSheetWriteOptions,
    XlsxWriteError,
};
pub use util::{derive_column_letter, derive_formula_text, sanitize_sheet_name};
pub use writer::XlsxWriter;
