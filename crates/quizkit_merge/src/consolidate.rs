//! Schema-union concatenation of parsed sources.

use std::path::PathBuf;

use quizkit_io_csv::{
    EnumCsvDelimiter, EnumTextEncoding, SpecCsvReadOptions, SpecSourceFile, SpecTable,
    read_csv_robust,
};
use tracing::{debug, info};

use crate::conf::C_COL_SOURCE_FILE;
use crate::spec::QuizMergeError;

/// How one source was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSourceSummary {
    pub name_file: String,
    pub encoding: EnumTextEncoding,
    pub delimiter: EnumCsvDelimiter,
    pub n_rows: usize,
}

/// Consolidated table plus what naming needs from the first source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecConsolidation {
    /// Union table: file order, then record order.
    pub table: SpecTable,
    /// First source (by file name) as parsed, before any column removal.
    pub table_first: SpecTable,
    /// Per-source read summaries, in processing order.
    pub sources: Vec<SpecSourceSummary>,
}

impl SpecConsolidation {
    /// Data rows read across all sources.
    pub fn n_rows_read(&self) -> usize {
        self.sources.iter().map(|source| source.n_rows).sum()
    }
}

/// Concatenate tables in the given order under one schema union.
pub fn union_tables<I>(tables: I) -> SpecTable
where
    I: IntoIterator<Item = SpecTable>,
{
    let mut table_union = SpecTable::default();
    for table in tables {
        table_union.append_table(table);
    }
    table_union
}

/// Parse every source (sorted by file name) and concatenate them.
///
/// With `if_track_source_file`, each table first gets a leading
/// `source_fichier` column holding its file name, unless it already has one.
pub fn consolidate_sources(
    sources: &[SpecSourceFile],
    read_options: &SpecCsvReadOptions,
    if_track_source_file: bool,
) -> Result<SpecConsolidation, QuizMergeError> {
    let mut l_sources_sorted: Vec<&SpecSourceFile> = sources.iter().collect();
    l_sources_sorted.sort_by(|a, b| a.name_file.cmp(&b.name_file));

    let mut table_union = SpecTable::default();
    let mut table_first: Option<SpecTable> = None;
    let mut l_summaries = Vec::with_capacity(l_sources_sorted.len());

    for source in l_sources_sorted {
        let parsed = read_csv_robust(source, read_options).map_err(|err| QuizMergeError::Parse {
            file_name: source.name_file.clone(),
            source: err,
        })?;
        info!(
            file = %parsed.name_file,
            encoding = %parsed.encoding,
            delimiter = %parsed.delimiter,
            n_rows = parsed.table.height(),
            "source read"
        );
        l_summaries.push(SpecSourceSummary {
            name_file: parsed.name_file.clone(),
            encoding: parsed.encoding,
            delimiter: parsed.delimiter,
            n_rows: parsed.table.height(),
        });

        let mut table = parsed.table;
        if table_first.is_none() {
            table_first = Some(table.clone());
        }
        if if_track_source_file
            && let Err(err) = table.prepend_constant_column(C_COL_SOURCE_FILE, &parsed.name_file)
        {
            debug!(file = %parsed.name_file, error = %err, "provenance column kept from source");
        }
        table_union.append_table(table);
    }

    let Some(table_first) = table_first else {
        return Err(QuizMergeError::EmptyInput {
            path: PathBuf::from("<memory>"),
        });
    };
    debug!(
        n_files = l_summaries.len(),
        n_rows = table_union.height(),
        n_cols = table_union.width(),
        "sources consolidated"
    );

    Ok(SpecConsolidation {
        table: table_union,
        table_first,
        sources: l_summaries,
    })
}
