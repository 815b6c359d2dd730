//! XLSX writer kernel that renders string dataframes into styled worksheets.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Formula, Workbook, Worksheet};
use tracing::{debug, info};

use crate::conf::{EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, derive_default_xlsx_format};
use crate::spec::{
    EnumCellAlign, EnumCellBorder, EnumCellValign, SpecCellFormat, SpecSheetReport,
    SpecXlsxReport, SpecXlsxSheetWriteOptions, XlsxWriteError,
};
use crate::util::{
    create_sheet_identifier, derive_formula_text, derive_vertical_merge_anchors,
    sanitize_sheet_name, validate_formula_columns, validate_sheet_dimensions,
    validate_unique_columns, validate_vertical_merges,
};

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    fmt_text: SpecCellFormat,
    fmt_header: SpecCellFormat,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path and body/header format presets.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(
        path_file_out: PathBuf,
        fmt_text: SpecCellFormat,
        fmt_header: SpecCellFormat,
    ) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            fmt_text,
            fmt_header,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Create writer with the default text/header presets.
    pub fn with_defaults(path_file_out: PathBuf) -> Self {
        Self::new(
            path_file_out,
            derive_default_xlsx_format(EnumFmtKey::Text),
            derive_default_xlsx_format(EnumFmtKey::Header),
        )
    }

    /// Return output file path.
    pub fn file_out(&self) -> &Path {
        &self.path_file_out
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    ///
    /// The workbook is written to a temporary file next to the destination and
    /// renamed into place, so a failed save never leaves a partial file at
    /// `file_out`. An existing destination file is replaced and keeps its
    /// permissions; a new file gets the usual `0o644` on unix.
    pub fn close(&mut self) -> Result<(), XlsxWriteError> {
        if self.if_closed {
            return Ok(());
        }

        let path_dir_out = self
            .path_file_out
            .parent()
            .filter(|path| !path.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let derive_save_error = |message: String| XlsxWriteError::Save {
            path: self.path_file_out.clone(),
            message,
        };

        let mut file_tmp = tempfile::Builder::new()
            .prefix(".quizkit-")
            .suffix(".xlsx.tmp")
            .tempfile_in(path_dir_out)
            .map_err(|err| derive_save_error(err.to_string()))?;
        self.workbook
            .save_to_writer(file_tmp.as_file_mut())
            .map_err(|err| derive_save_error(err.to_string()))?;
        if let Some(permissions) = derive_output_permissions(&self.path_file_out) {
            file_tmp
                .as_file()
                .set_permissions(permissions)
                .map_err(|err| derive_save_error(err.to_string()))?;
        }
        file_tmp
            .persist(&self.path_file_out)
            .map_err(|err| derive_save_error(err.error.to_string()))?;

        self.if_closed = true;
        info!(path = %self.path_file_out.display(), "workbook saved");
        Ok(())
    }

    /// Append an empty worksheet; returns the unique sheet name used.
    pub fn add_empty_sheet(&mut self, sheet_name: &str) -> Result<String, XlsxWriteError> {
        if self.if_closed {
            return Err(XlsxWriteError::Closed);
        }
        let sheet_name_unique = self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        self.l_reports.push(SpecXlsxReport {
            sheets: vec![SpecSheetReport {
                sheet_name: sheet_name_unique.clone(),
                ..Default::default()
            }],
            warnings: vec![],
        });
        Ok(sheet_name_unique)
    }

    /// Write one sheet from an in-memory dataframe.
    ///
    /// The header row is the dataframe's column names; every value is written
    /// as text (or as a formula for columns listed in `formulas_by_col`).
    pub fn write_sheet_from_dataframe(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), XlsxWriteError> {
        if self.if_closed {
            return Err(XlsxWriteError::Closed);
        }
        self.write_sheet(df_data, sheet_name, options)
    }

    fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        sheet_name: &str,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), XlsxWriteError> {
        let l_colnames_df: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let n_width_df = l_colnames_df.len();
        let n_height_df = df_data.height();

        validate_unique_columns(&l_colnames_df).map_err(XlsxWriteError::InvalidInput)?;
        validate_sheet_dimensions(n_height_df, n_width_df).map_err(XlsxWriteError::InvalidInput)?;
        validate_vertical_merges(&options.merges_vertical, &l_colnames_df, n_height_df)
            .map_err(XlsxWriteError::InvalidInput)?;
        validate_formula_columns(&options.formulas_by_col, &l_colnames_df)
            .map_err(XlsxWriteError::InvalidInput)?;

        let mut report = SpecXlsxReport::default();
        for c_name in options.widths_by_col.keys() {
            if !l_colnames_df.contains(c_name) {
                report.warn(format!("Width configured for absent column: {c_name:?}"));
            }
        }

        let dict_idx_by_col: BTreeMap<&str, usize> = l_colnames_df
            .iter()
            .enumerate()
            .map(|(n_idx, c_name)| (c_name.as_str(), n_idx))
            .collect();
        let l_spec_fmt_data_by_col: Vec<SpecCellFormat> = l_colnames_df
            .iter()
            .map(|c_name| match options.fmts_by_col.get(c_name) {
                Some(fmt_override) => self.fmt_text.merge(fmt_override),
                None => self.fmt_text.clone(),
            })
            .collect();
        let l_fmt_data_by_col: Vec<Format> = l_spec_fmt_data_by_col
            .iter()
            .map(derive_rust_xlsx_format)
            .collect();
        let fmt_header = derive_rust_xlsx_format(&self.fmt_header);
        let dict_anchor_by_cell = derive_vertical_merge_anchors(&options.merges_vertical);

        let sheet_name_unique = self.derive_unique_sheet_name(&sanitize_sheet_name(sheet_name, "_"));
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        write_header(worksheet, &l_colnames_df, &fmt_header)?;

        let mut n_formulas = 0usize;
        let l_cols = df_data.get_columns();
        for n_row_local in 0..n_height_df {
            let n_row_sheet = n_row_local + 1;
            for (n_idx_col, col) in l_cols.iter().enumerate() {
                let value = col.get(n_row_local).map_err(|err| {
                    XlsxWriteError::InvalidInput(format!("Failed to access cell value: {err}"))
                })?;
                let c_text = derive_text_from_any_value(value);
                let fmt_cell = &l_fmt_data_by_col[n_idx_col];

                if let Some(formula) = options.formulas_by_col.get(&l_colnames_df[n_idx_col]) {
                    let n_idx_col_source = dict_idx_by_col
                        .get(formula.col_source.as_str())
                        .copied()
                        .ok_or_else(|| {
                            XlsxWriteError::InvalidInput(format!(
                                "Formula source column not found: {:?}",
                                formula.col_source
                            ))
                        })?;
                    let n_row_local_ref = dict_anchor_by_cell
                        .get(&(formula.col_source.clone(), n_row_local))
                        .copied()
                        .unwrap_or(n_row_local);
                    let formula_cell = Formula::new(derive_formula_text(
                        &formula.function,
                        n_idx_col_source,
                        n_row_local_ref + 1,
                    ))
                    .set_result(c_text);
                    worksheet.write_formula_with_format(
                        cast_row_num(n_row_sheet)?,
                        cast_col_num(n_idx_col)?,
                        formula_cell,
                        fmt_cell,
                    )?;
                    n_formulas += 1;
                    continue;
                }

                write_text_cell(worksheet, n_row_sheet, n_idx_col, &c_text, fmt_cell)?;
            }

            if let Some(n_height) = options.height_body_row {
                worksheet.set_row_height(cast_row_num(n_row_sheet)?, n_height)?;
            }
        }

        for merge in &options.merges_vertical {
            let n_idx_col = dict_idx_by_col
                .get(merge.col_name.as_str())
                .copied()
                .ok_or_else(|| {
                    XlsxWriteError::InvalidInput(format!(
                        "Merge column not found: {:?}",
                        merge.col_name
                    ))
                })?;
            let fmt_merge = match &merge.fmt {
                Some(fmt_overlay) => {
                    derive_rust_xlsx_format(&l_spec_fmt_data_by_col[n_idx_col].merge(fmt_overlay))
                }
                None => l_fmt_data_by_col[n_idx_col].clone(),
            };
            worksheet.merge_range(
                cast_row_num(merge.row_idx_start + 1)?,
                cast_col_num(n_idx_col)?,
                cast_row_num(merge.row_idx_end + 1)?,
                cast_col_num(n_idx_col)?,
                &merge.text,
                &fmt_merge,
            )?;
        }

        for (c_name, n_width) in &options.widths_by_col {
            if let Some(n_idx_col) = dict_idx_by_col.get(c_name.as_str()) {
                worksheet.set_column_width(cast_col_num(*n_idx_col)?, *n_width)?;
            }
        }

        if options.if_autofilter && n_width_df > 0 {
            worksheet.autofilter(0, 0, 0, cast_col_num(n_width_df - 1)?)?;
        }

        worksheet.set_freeze_panes(
            cast_row_num(options.row_freeze.unwrap_or(1))?,
            cast_col_num(options.col_freeze)?,
        )?;

        debug!(
            sheet = %sheet_name_unique,
            n_rows = n_height_df,
            n_cols = n_width_df,
            n_merges = options.merges_vertical.len(),
            n_formulas,
            "sheet written"
        );
        report.sheets.push(SpecSheetReport {
            sheet_name: sheet_name_unique,
            n_rows_body: n_height_df,
            n_cols: n_width_df,
            n_merges_vertical: options.merges_vertical.len(),
            n_formulas,
        });
        self.l_reports.push(report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate = create_sheet_identifier(&base_name, n_idx);
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Missing values are written as blank cells.
fn derive_text_from_any_value(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(val) => val.to_string(),
        AnyValue::StringOwned(val) => val.to_string(),
        _ => value.to_string(),
    }
}

fn derive_output_permissions(path: &Path) -> Option<fs::Permissions> {
    match fs::metadata(path) {
        Ok(metadata) => Some(metadata.permissions()),
        Err(_) => derive_default_permissions(),
    }
}

#[cfg(unix)]
fn derive_default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn derive_default_permissions() -> Option<fs::Permissions> {
    None
}

fn write_header(
    worksheet: &mut Worksheet,
    columns: &[String],
    fmt_header: &Format,
) -> Result<(), XlsxWriteError> {
    for (col_idx, cell_value) in columns.iter().enumerate() {
        write_text_cell(worksheet, 0, col_idx, cell_value, fmt_header)?;
    }
    Ok(())
}

fn write_text_cell(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &str,
    format: &Format,
) -> Result<(), XlsxWriteError> {
    if value.is_empty() {
        worksheet.write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)?;
    } else {
        worksheet.write_string_with_format(
            cast_row_num(row_idx)?,
            cast_col_num(col_idx)?,
            value,
            format,
        )?;
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = spec.align {
        format = format.set_align(derive_format_align(val));
    }
    if let Some(val) = spec.valign {
        format = format.set_align(derive_format_valign(val));
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if let Some(val) = &spec.border_color {
        format = format.set_border_color(val.as_str());
    }

    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: EnumCellBorder) -> FormatBorder {
    match border {
        EnumCellBorder::None => FormatBorder::None,
        EnumCellBorder::Thin => FormatBorder::Thin,
        EnumCellBorder::Medium => FormatBorder::Medium,
    }
}

fn derive_format_align(align: EnumCellAlign) -> FormatAlign {
    match align {
        EnumCellAlign::Left => FormatAlign::Left,
        EnumCellAlign::Center => FormatAlign::Center,
        EnumCellAlign::Right => FormatAlign::Right,
    }
}

fn derive_format_valign(valign: EnumCellValign) -> FormatAlign {
    match valign {
        EnumCellValign::Top => FormatAlign::Top,
        EnumCellValign::Center => FormatAlign::VerticalCenter,
        EnumCellValign::Bottom => FormatAlign::Bottom,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxWriteError> {
    u32::try_from(value)
        .map_err(|_| XlsxWriteError::InvalidInput(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxWriteError> {
    u16::try_from(value)
        .map_err(|_| XlsxWriteError::InvalidInput(format!("column index overflow: {value}")))
}
