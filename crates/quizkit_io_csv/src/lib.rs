//! `quizkit_io_csv` v1:
//! Robust delimited-text reader producing all-text tables.
//!
//! Modules:
//! - `conf`   : constants and default presets
//! - `spec`   : table model, options and errors
//! - `util`   : decoding, delimiter sniffing and structure parsing helpers
//! - `reader` : encoding/delimiter fallback search
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;

pub use conf::{
    N_RECORDS_SNIFF_MAX, N_SIZE_SAMPLE_BYTES, TUP_DELIMITERS_DEFAULT, TUP_ENCODINGS_DEFAULT,
    derive_default_csv_read_options,
};
pub use reader::{read_csv_file, read_csv_robust};
pub use spec::{
    CsvReadError, EnumCsvDelimiter, EnumTextEncoding, SpecCsvReadOptions, SpecCsvTable,
    SpecSourceFile, SpecTable,
};
