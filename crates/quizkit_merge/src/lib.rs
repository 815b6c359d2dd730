//! `quizkit_merge`:
//! Consolidate quiz CSV exports into one styled XLSX workbook.
//!
//! Modules:
//! - `conf`        : column names, layout presets and default options
//! - `spec`        : options, merge runs, run report and errors
//! - `normalize`   : text canonicalization
//! - `consolidate` : schema-union concatenation of parsed sources
//! - `dedup`       : administrative column removal and normalized-key dedup
//! - `naming`      : content-derived output name
//! - `runs`        : repeated-value runs for vertical merges
//! - `render`      : quiz sheet layout and workbook rendering
//! - `pipeline`    : entry points over sources or a directory
pub mod conf;
pub mod consolidate;
pub mod dedup;
pub mod naming;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod runs;
pub mod spec;

pub use conf::derive_default_quiz_merge_options;
pub use consolidate::{SpecConsolidation, SpecSourceSummary, consolidate_sources, union_tables};
pub use dedup::{deduplicate_rows, derive_normalized_key, drop_administrative_columns};
pub use naming::derive_output_stem;
pub use normalize::{normalize_text, normalize_text_folded};
pub use pipeline::{
    SpecMergedQuiz, clear_stale_outputs, list_csv_files, merge_quiz_sources, run_quiz_merge,
    run_quiz_merge_dir, run_quiz_merge_to_file,
};
pub use render::{SpecQuizLayout, SpecRenderOutcome, prepare_quiz_layout, render_quiz_workbook};
pub use runs::{calculate_merge_runs, calculate_merge_runs_for_columns};
pub use spec::{
    EnumPipelineStage, QuizMergeError, SpecMergeRun, SpecQuizMergeOptions, SpecQuizMergeReport,
};
