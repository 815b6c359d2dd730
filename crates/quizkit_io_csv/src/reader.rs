//! Encoding/delimiter fallback search over one delimited source.

use std::path::Path;

use tracing::{debug, warn};

use crate::spec::{CsvReadError, SpecCsvReadOptions, SpecCsvTable, SpecSourceFile};
use crate::util::{decode_bytes, parse_table, resolve_delimiter};

/// Parse one source into an all-text table.
///
/// Candidate encodings are tried in `options.encodings` order. For each one the
/// bytes are strictly decoded, the delimiter is resolved on a leading sample,
/// and the whole text is parsed. The first attempt that succeeds end to end is
/// returned. When every attempt fails, [`CsvReadError::ParseFailure`] carries
/// the file name and the last underlying error.
pub fn read_csv_robust(
    source: &SpecSourceFile,
    options: &SpecCsvReadOptions,
) -> Result<SpecCsvTable, CsvReadError> {
    let mut err_last: Option<CsvReadError> = None;

    for encoding in &options.encodings {
        let text = match decode_bytes(&source.v_bytes, *encoding) {
            Ok(text) => text,
            Err(err) => {
                debug!(file = %source.name_file, %encoding, "decode attempt failed");
                err_last = Some(err);
                continue;
            }
        };

        let delimiter = resolve_delimiter(
            &text,
            &options.delimiters,
            options.size_sample_bytes,
            options.n_records_sniff_max,
        );

        match parse_table(&text, delimiter) {
            Ok(table) => {
                debug!(
                    file = %source.name_file,
                    %encoding,
                    %delimiter,
                    n_rows = table.height(),
                    n_cols = table.width(),
                    "parsed delimited source"
                );
                return Ok(SpecCsvTable {
                    name_file: source.name_file.clone(),
                    encoding: *encoding,
                    delimiter,
                    table,
                });
            }
            Err(err) => {
                debug!(file = %source.name_file, %encoding, %delimiter, error = %err, "parse attempt failed");
                err_last = Some(err);
            }
        }
    }

    let c_message = err_last
        .map(|err| err.to_string())
        .unwrap_or_else(|| "no candidate encoding configured".to_string());
    warn!(file = %source.name_file, error = %c_message, "all decoding attempts failed");
    Err(CsvReadError::ParseFailure {
        file_name: source.name_file.clone(),
        message: c_message,
    })
}

/// Read `path` from disk and parse it with [`read_csv_robust`].
pub fn read_csv_file<P>(path: P, options: &SpecCsvReadOptions) -> Result<SpecCsvTable, CsvReadError>
where
    P: AsRef<Path>,
{
    read_csv_robust(&SpecSourceFile::from_path(path)?, options)
}
