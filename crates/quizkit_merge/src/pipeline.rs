//! Pipeline entry points: sources or a directory in, one workbook out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use quizkit_io_csv::{CsvReadError, SpecSourceFile, SpecTable};
use tracing::{debug, info, warn};

use crate::conf::{C_COL_SOURCE_FILE, C_EXT_OUTPUT, C_GLOB_INPUT, C_GLOB_STALE_OUTPUT};
use crate::consolidate::consolidate_sources;
use crate::dedup::{deduplicate_rows, drop_administrative_columns};
use crate::naming::{derive_output_stem, sanitize_file_stem};
use crate::render::render_quiz_workbook;
use crate::spec::{QuizMergeError, SpecQuizMergeOptions, SpecQuizMergeReport};

////////////////////////////////////////////////////////////////////////////////
// #region Helpers

fn build_glob_matcher(pattern: &str, path: &Path) -> Result<GlobMatcher, QuizMergeError> {
    GlobBuilder::new(pattern)
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|err| QuizMergeError::Io {
            path: path.to_path_buf(),
            message: format!("Invalid pattern {pattern:?}: {err}"),
        })
}

fn derive_io_error(path: &Path, err: io::Error) -> QuizMergeError {
    QuizMergeError::Io {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Output file name, extension included.
pub fn derive_output_name(stem: &str) -> String {
    let c_suffix = format!(".{C_EXT_OUTPUT}");
    let c_stem = sanitize_file_stem(stem);
    if c_stem.to_lowercase().ends_with(&c_suffix) {
        c_stem
    } else {
        format!("{c_stem}{c_suffix}")
    }
}

/// Regular files in `dir_in` whose name matches `*.csv` case-insensitively, sorted by name.
pub fn list_csv_files(dir_in: &Path) -> Result<Vec<PathBuf>, QuizMergeError> {
    let matcher = build_glob_matcher(C_GLOB_INPUT, dir_in)?;
    let mut l_paths = Vec::new();
    for entry in fs::read_dir(dir_in).map_err(|err| derive_io_error(dir_in, err))? {
        let entry = entry.map_err(|err| derive_io_error(dir_in, err))?;
        let path_entry = entry.path();
        if path_entry.is_file() && matcher.is_match(entry.file_name()) {
            l_paths.push(path_entry);
        }
    }
    l_paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(l_paths)
}

/// Load every path as an in-memory source named by its file name.
pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<SpecSourceFile>, QuizMergeError> {
    paths
        .iter()
        .map(|path| {
            SpecSourceFile::from_path(path).map_err(|err| match err {
                CsvReadError::Io { path, message } => QuizMergeError::Io { path, message },
                err => QuizMergeError::Parse {
                    file_name: path.display().to_string(),
                    source: err,
                },
            })
        })
        .collect()
}

/// Remove `*.xlsx` files from `dir_out`, best effort.
///
/// Returns one warning per file or listing that could not be handled.
pub fn clear_stale_outputs(dir_out: &Path) -> Vec<String> {
    let mut l_warnings = Vec::new();
    let matcher = match build_glob_matcher(C_GLOB_STALE_OUTPUT, dir_out) {
        Ok(matcher) => matcher,
        Err(err) => {
            l_warnings.push(err.to_string());
            return l_warnings;
        }
    };
    let entries = match fs::read_dir(dir_out) {
        Ok(entries) => entries,
        Err(err) => {
            l_warnings.push(format!("Cannot list {}: {err}", dir_out.display()));
            return l_warnings;
        }
    };

    let entries = entries.map(|entry| entry.map(|entry| entry.path()));
    l_warnings.extend(remove_matching_files(entries, &matcher, dir_out));
    l_warnings
}

/// Remove every listed regular file whose name matches `matcher`.
///
/// Listing errors and failed removals are skipped with one warning each.
fn remove_matching_files<I>(entries: I, matcher: &GlobMatcher, dir: &Path) -> Vec<String>
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut l_warnings = Vec::new();
    for entry in entries {
        let path_entry = match entry {
            Ok(path_entry) => path_entry,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "cannot read directory entry");
                l_warnings.push(format!("Cannot read entry of {}: {err}", dir.display()));
                continue;
            }
        };
        let if_match = path_entry
            .file_name()
            .is_some_and(|name| matcher.is_match(name));
        if !if_match || !path_entry.is_file() {
            continue;
        }
        match fs::remove_file(&path_entry) {
            Ok(()) => debug!(path = %path_entry.display(), "stale output removed"),
            Err(err) => {
                warn!(path = %path_entry.display(), error = %err, "cannot remove stale output");
                l_warnings.push(format!("Cannot remove {}: {err}", path_entry.display()));
            }
        }
    }
    l_warnings
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Pipeline

/// Consolidated, deduplicated table with its output stem and counters.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecMergedQuiz {
    /// Rows to render, administrative columns removed.
    pub table: SpecTable,
    /// Output stem (derived or overridden).
    pub stem_output: String,
    /// Counters filled so far; output fields are still empty.
    pub report: SpecQuizMergeReport,
}

/// Consolidate, name and deduplicate `sources` without writing anything.
pub fn merge_quiz_sources(
    sources: &[SpecSourceFile],
    options: &SpecQuizMergeOptions,
) -> Result<SpecMergedQuiz, QuizMergeError> {
    let consolidation = consolidate_sources(
        sources,
        &options.csv_read_options,
        options.if_track_source_file,
    )?;
    let n_rows_read = consolidation.n_rows_read();
    let cnt_files = consolidation.sources.len();

    let stem_output = match &options.name_output_override {
        Some(name) => name.clone(),
        None => derive_output_stem(
            &consolidation.table_first,
            &options.col_code,
            &options.col_title,
            &options.year_output,
        ),
    };
    info!(stem = %stem_output, "output name derived");

    let table = drop_administrative_columns(consolidation.table, &options.cols_administrative);
    let l_cols_key_ignored: Vec<String> = if options.if_track_source_file {
        vec![C_COL_SOURCE_FILE.to_string()]
    } else {
        Vec::new()
    };
    let (table, n_removed) = deduplicate_rows(table, &l_cols_key_ignored);
    info!(n_rows_read, n_rows_kept = table.height(), n_removed, "rows deduplicated");

    let report = SpecQuizMergeReport {
        cnt_files,
        cnt_rows_read: n_rows_read,
        cnt_rows_kept: table.height(),
        cnt_duplicates_removed: n_removed,
        ..Default::default()
    };
    Ok(SpecMergedQuiz {
        table,
        stem_output,
        report,
    })
}

/// Run the pipeline over in-memory sources and write exactly `path_file_out`.
pub fn run_quiz_merge_to_file(
    sources: &[SpecSourceFile],
    path_file_out: &Path,
    options: &SpecQuizMergeOptions,
) -> Result<SpecQuizMergeReport, QuizMergeError> {
    let merged = merge_quiz_sources(sources, options)?;
    write_merged_quiz(merged, path_file_out, Vec::new(), options)
}

/// Run the pipeline over in-memory sources, writing `<stem>.xlsx` into `dir_out`.
///
/// `dir_out` is created when missing. With `if_clear_stale_outputs`, existing
/// `*.xlsx` files there are removed once the sources have been parsed.
pub fn run_quiz_merge(
    sources: &[SpecSourceFile],
    dir_out: &Path,
    options: &SpecQuizMergeOptions,
) -> Result<SpecQuizMergeReport, QuizMergeError> {
    let merged = merge_quiz_sources(sources, options)?;

    fs::create_dir_all(dir_out).map_err(|err| derive_io_error(dir_out, err))?;
    let l_warnings = if options.if_clear_stale_outputs {
        clear_stale_outputs(dir_out)
    } else {
        Vec::new()
    };

    let path_file_out = dir_out.join(derive_output_name(&merged.stem_output));
    write_merged_quiz(merged, &path_file_out, l_warnings, options)
}

/// Run the pipeline over every `*.csv` file of `dir_in`, writing into `dir_out`.
pub fn run_quiz_merge_dir(
    dir_in: &Path,
    dir_out: &Path,
    options: &SpecQuizMergeOptions,
) -> Result<SpecQuizMergeReport, QuizMergeError> {
    let l_paths = list_csv_files(dir_in)?;
    if l_paths.is_empty() {
        return Err(QuizMergeError::EmptyInput {
            path: dir_in.to_path_buf(),
        });
    }
    debug!(dir = %dir_in.display(), n_files = l_paths.len(), "input files listed");

    let sources = load_sources(&l_paths)?;
    run_quiz_merge(&sources, dir_out, options)
}

fn write_merged_quiz(
    merged: SpecMergedQuiz,
    path_file_out: &Path,
    warnings: Vec<String>,
    options: &SpecQuizMergeOptions,
) -> Result<SpecQuizMergeReport, QuizMergeError> {
    let SpecMergedQuiz { table, mut report, .. } = merged;
    let outcome = render_quiz_workbook(table, path_file_out, options)?;

    report.cnt_merge_runs = outcome.n_merge_runs;
    report.name_output = path_file_out
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    report.path_output = path_file_out.to_path_buf();
    for c_warning in warnings.iter().chain(&outcome.warnings) {
        report.warn(c_warning);
    }

    info!("{report}");
    Ok(report)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::fs;

    use quizkit_io_csv::SpecSourceFile;

    use super::*;
    use crate::spec::EnumPipelineStage;

    #[test]
    fn derive_output_name_appends_extension_once() {
        assert_eq!(
            derive_output_name("1001_Cardio_biblio_2025"),
            "1001_Cardio_biblio_2025.xlsx"
        );
        assert_eq!(derive_output_name("custom.XLSX"), "custom.XLSX");
        assert_eq!(derive_output_name("a/b"), "a b.xlsx");
    }

    #[test]
    fn list_csv_files_matches_extension_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.CSV"), "Q\n1\n").unwrap();
        fs::write(dir.path().join("a.csv"), "Q\n1\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("sub.csv")).unwrap();

        let l_names: Vec<String> = list_csv_files(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(l_names, vec!["a.csv", "b.CSV"]);
    }

    #[test]
    fn clear_stale_outputs_removes_only_workbooks() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.xlsx"), "x").unwrap();
        fs::write(dir.path().join("OLD2.XLSX"), "x").unwrap();
        fs::write(dir.path().join("keep.csv"), "x").unwrap();

        let l_warnings = clear_stale_outputs(dir.path());
        assert!(l_warnings.is_empty());
        assert!(!dir.path().join("old.xlsx").exists());
        assert!(!dir.path().join("OLD2.XLSX").exists());
        assert!(dir.path().join("keep.csv").exists());
    }

    #[test]
    fn unreadable_directory_entries_are_reported_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path_old = dir.path().join("old.xlsx");
        fs::write(&path_old, "x").unwrap();
        let matcher = build_glob_matcher(C_GLOB_STALE_OUTPUT, dir.path()).unwrap();

        let entries = vec![
            Err(io::Error::other("entry vanished")),
            Ok(path_old.clone()),
            Ok(dir.path().join("keep.csv")),
        ];
        let l_warnings = remove_matching_files(entries, &matcher, dir.path());
        assert_eq!(l_warnings.len(), 1);
        assert!(l_warnings[0].contains("entry vanished"));
        assert!(!path_old.exists());
    }

    #[test]
    fn load_sources_names_by_file_and_reports_missing_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path_csv = dir.path().join("quiz.csv");
        fs::write(&path_csv, "Q\n1\n").unwrap();

        let sources = load_sources(std::slice::from_ref(&path_csv)).unwrap();
        assert_eq!(sources[0].name_file, "quiz.csv");
        assert_eq!(sources[0].v_bytes, b"Q\n1\n");

        let err = load_sources(&[dir.path().join("missing.csv")]).unwrap_err();
        assert_eq!(err.stage(), EnumPipelineStage::Io);
    }

    #[test]
    fn merge_quiz_sources_names_before_dropping_columns() {
        let sources = vec![
            SpecSourceFile::new("a.csv", "Numéro,Nom,Question\n1001,Cardio,Q1\n".as_bytes()),
            SpecSourceFile::new("b.csv", "Numéro,Nom,Question\n2002,Autre,Q1\n".as_bytes()),
        ];
        let merged = merge_quiz_sources(&sources, &SpecQuizMergeOptions::default()).unwrap();
        assert_eq!(merged.stem_output, "1001_Cardio_biblio_2025");
        assert_eq!(merged.table.columns(), &["Question".to_string()]);
        assert_eq!(merged.report.cnt_rows_read, 2);
        assert_eq!(merged.report.cnt_duplicates_removed, 1);
    }

    #[test]
    fn merge_quiz_sources_honors_name_override() {
        let sources = vec![SpecSourceFile::new("a.csv", "Question\nQ1\n".as_bytes())];
        let options = SpecQuizMergeOptions {
            name_output_override: Some("custom".to_string()),
            ..Default::default()
        };
        let merged = merge_quiz_sources(&sources, &options).unwrap();
        assert_eq!(merged.stem_output, "custom");
    }

    #[test]
    fn run_quiz_merge_dir_rejects_directory_without_csv() {
        let dir_in = tempfile::tempdir().unwrap();
        let dir_out = tempfile::tempdir().unwrap();
        fs::write(dir_in.path().join("readme.txt"), "x").unwrap();

        let options = SpecQuizMergeOptions::default();
        let err = run_quiz_merge_dir(dir_in.path(), dir_out.path(), &options).unwrap_err();
        assert_eq!(err.stage(), EnumPipelineStage::Discover);
        assert_eq!(fs::read_dir(dir_out.path()).unwrap().count(), 0);
    }

    #[test]
    fn run_quiz_merge_dir_reports_missing_input_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_quiz_merge_dir(
            &dir.path().join("missing"),
            dir.path(),
            &SpecQuizMergeOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.stage(), EnumPipelineStage::Io);
    }
}
