//! XLSX constants and default preset factories.

use crate::spec::{EnumCellBorder, EnumCellValign, SpecCellFormat};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Uniform light-grey border color.
pub const C_BORDER_COLOR_DEFAULT: &str = "#CCCCCC";

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFmtKey {
    /// Generic text body cell.
    Text,
    /// Header cell.
    Header,
    /// Wrapped, top-aligned long-text body cell.
    Wrap,
}

/// Build one default format preset used by [`crate::writer::XlsxWriter`].
pub fn derive_default_xlsx_format(key: EnumFmtKey) -> SpecCellFormat {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Calibri".to_string()),
        font_size: Some(11),
        border: Some(EnumCellBorder::Thin),
        border_color: Some(C_BORDER_COLOR_DEFAULT.to_string()),
        ..Default::default()
    };

    match key {
        EnumFmtKey::Text => cfg_base_fmt_spec,
        EnumFmtKey::Header => cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        }),
        EnumFmtKey::Wrap => cfg_base_fmt_spec.with_(SpecCellFormat {
            text_wrap: Some(true),
            valign: Some(EnumCellValign::Top),
            ..Default::default()
        }),
    }
}
