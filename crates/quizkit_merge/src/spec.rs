//! Pipeline options, merge-run model, run report and errors.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use quizkit_io_csv::{CsvReadError, SpecCsvReadOptions};
use quizkit_io_xlsx::XlsxWriteError;

use crate::conf::derive_default_quiz_merge_options;

////////////////////////////////////////////////////////////////////////////////
// #region OptionsSpecification

/// Options consumed by the consolidation pipeline.
///
/// Column names are matched exactly against the consolidated header.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecQuizMergeOptions {
    /// Year suffix of the derived output name.
    pub year_output: String,
    /// Columns removed before deduplication and rendering.
    pub cols_administrative: Vec<String>,
    /// Columns whose runs of repeated values are merged vertically.
    pub cols_mergeable: Vec<String>,
    /// Columns placed first, in this order, when present.
    pub cols_preferred_order: Vec<String>,
    /// Fixed widths (Excel character units) by column name.
    pub widths_by_col: BTreeMap<String, f64>,
    /// Wrapped, top-aligned columns.
    pub cols_wrap: Vec<String>,
    /// Long-text column measured by the length formula; `None` disables it.
    pub col_long_text: Option<String>,
    /// Name of the derived length column.
    pub col_long_text_len: String,
    /// Column holding the quiz code.
    pub col_code: String,
    /// Column holding the quiz title.
    pub col_title: String,
    /// Data sheet name.
    pub sheet_name_data: String,
    /// Empty companion sheet name; `None` skips it.
    pub sheet_name_companion: Option<String>,
    /// Data row height in points; `None` keeps the default height.
    pub height_data_row: Option<f64>,
    /// Prepend a provenance column holding each row's source file name.
    pub if_track_source_file: bool,
    /// Remove existing `*.xlsx` files from the output directory first.
    pub if_clear_stale_outputs: bool,
    /// Output stem used instead of the derived one.
    pub name_output_override: Option<String>,
    /// Reader fallback candidates.
    pub csv_read_options: SpecCsvReadOptions,
}

impl Default for SpecQuizMergeOptions {
    fn default() -> Self {
        derive_default_quiz_merge_options()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region MergeRunSpecification

/// Maximal block of contiguous data rows sharing one non-empty normalized value.
///
/// Row numbers are 1-based over the data region and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMergeRun {
    pub col_name: String,
    pub row_start: usize,
    pub row_end: usize,
}

impl SpecMergeRun {
    /// Number of rows covered.
    pub fn n_rows(&self) -> usize {
        self.row_end + 1 - self.row_start
    }

    /// Whether `row` (1-based) lies inside the run.
    pub fn contains(&self, row: usize) -> bool {
        (self.row_start..=self.row_end).contains(&row)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Counters and diagnostics for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecQuizMergeReport {
    /// Source files consolidated.
    pub cnt_files: usize,
    /// Data rows read across all sources.
    pub cnt_rows_read: usize,
    /// Data rows written after deduplication.
    pub cnt_rows_kept: usize,
    /// Rows dropped as duplicates.
    pub cnt_duplicates_removed: usize,
    /// Vertical merges applied.
    pub cnt_merge_runs: usize,
    /// Output file name, extension included.
    pub name_output: String,
    /// Written workbook path.
    pub path_output: PathBuf,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecQuizMergeReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} files={} rows_read={} rows_kept={} duplicates={} merge_runs={} warnings={} output={}",
            self.cnt_files,
            self.cnt_rows_read,
            self.cnt_rows_kept,
            self.cnt_duplicates_removed,
            self.cnt_merge_runs,
            self.warnings.len(),
            self.path_output.display()
        )
    }
}

impl fmt::Display for SpecQuizMergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[QUIZ-MERGE]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Pipeline stage an error originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumPipelineStage {
    /// Listing input sources.
    Discover,
    /// Reading source bytes or preparing the output location.
    Io,
    /// Decoding and parsing one source.
    Parse,
    /// Building and saving the workbook.
    Render,
}

impl fmt::Display for EnumPipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c_label = match self {
            EnumPipelineStage::Discover => "discover",
            EnumPipelineStage::Io => "io",
            EnumPipelineStage::Parse => "parse",
            EnumPipelineStage::Render => "render",
        };
        f.write_str(c_label)
    }
}

/// Pipeline failures. Every variant is fatal to the run.
#[derive(Debug, thiserror::Error)]
pub enum QuizMergeError {
    /// No source to consolidate.
    #[error("No CSV input found in {}", path.display())]
    EmptyInput {
        /// Searched directory (or `<memory>` for in-memory sources).
        path: PathBuf,
    },
    /// Input or output location not accessible.
    #[error("I/O failure on {}: {message}", path.display())]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// A source could not be decoded or parsed.
    #[error("{source}")]
    Parse {
        /// Offending source file name.
        file_name: String,
        /// Reader error.
        #[source]
        source: CsvReadError,
    },
    /// Workbook could not be built or saved.
    #[error("Cannot write workbook {}: {source}", path.display())]
    Render {
        /// Destination path.
        path: PathBuf,
        /// Writer error.
        #[source]
        source: XlsxWriteError,
    },
}

impl QuizMergeError {
    /// Stage the failure belongs to.
    pub fn stage(&self) -> EnumPipelineStage {
        match self {
            QuizMergeError::EmptyInput { .. } => EnumPipelineStage::Discover,
            QuizMergeError::Io { .. } => EnumPipelineStage::Io,
            QuizMergeError::Parse { .. } => EnumPipelineStage::Parse,
            QuizMergeError::Render { .. } => EnumPipelineStage::Render,
        }
    }

    /// File name or path the failure is about.
    pub fn subject(&self) -> String {
        match self {
            QuizMergeError::EmptyInput { path }
            | QuizMergeError::Io { path, .. }
            | QuizMergeError::Render { path, .. } => path.display().to_string(),
            QuizMergeError::Parse { file_name, .. } => file_name.clone(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use quizkit_io_csv::CsvReadError;

    use super::*;

    #[test]
    fn merge_run_n_rows_and_contains() {
        let run = SpecMergeRun {
            col_name: "Question".to_string(),
            row_start: 2,
            row_end: 4,
        };
        assert_eq!(run.n_rows(), 3);
        assert!(run.contains(2));
        assert!(run.contains(4));
        assert!(!run.contains(5));
    }

    #[test]
    fn error_stage_and_subject() {
        let err = QuizMergeError::Parse {
            file_name: "bad.csv".to_string(),
            source: CsvReadError::ParseFailure {
                file_name: "bad.csv".to_string(),
                message: "boom".to_string(),
            },
        };
        assert_eq!(err.stage(), EnumPipelineStage::Parse);
        assert_eq!(err.subject(), "bad.csv");
        assert!(err.to_string().contains("bad.csv"));

        let err = QuizMergeError::EmptyInput {
            path: PathBuf::from("in"),
        };
        assert_eq!(err.stage(), EnumPipelineStage::Discover);
    }

    #[test]
    fn report_display_summarizes_counts() {
        let report = SpecQuizMergeReport {
            cnt_files: 2,
            cnt_rows_read: 5,
            cnt_rows_kept: 4,
            cnt_duplicates_removed: 1,
            path_output: PathBuf::from("out/x.xlsx"),
            ..Default::default()
        };
        assert_eq!(
            report.to_string(),
            "[QUIZ-MERGE] files=2 rows_read=5 rows_kept=4 duplicates=1 merge_runs=0 warnings=0 output=out/x.xlsx"
        );
    }

    #[test]
    fn default_options_carry_layout_presets() {
        let options = SpecQuizMergeOptions::default();
        assert_eq!(options.year_output, "2025");
        assert_eq!(options.sheet_name_data, "QUIZ");
        assert_eq!(options.widths_by_col.get("Question"), Some(&140.0));
        assert_eq!(options.widths_by_col.get("NbCar Feedback"), Some(&16.0));
        assert!(options.cols_administrative.iter().any(|c| c == "Numéro"));
    }
}
