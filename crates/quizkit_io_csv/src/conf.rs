//! CSV reader constants and default preset factories.

use crate::spec::{EnumCsvDelimiter, EnumTextEncoding, SpecCsvReadOptions};

/// Candidate encodings, most signature-rich first.
pub const TUP_ENCODINGS_DEFAULT: [EnumTextEncoding; 4] = [
    EnumTextEncoding::Utf8Sig,
    EnumTextEncoding::Utf8,
    EnumTextEncoding::Latin1,
    EnumTextEncoding::Windows1252,
];
/// Candidate delimiters in preference order.
pub const TUP_DELIMITERS_DEFAULT: [EnumCsvDelimiter; 3] = [
    EnumCsvDelimiter::Comma,
    EnumCsvDelimiter::Semicolon,
    EnumCsvDelimiter::Tab,
];
/// Leading sample size inspected by delimiter detection.
pub const N_SIZE_SAMPLE_BYTES: usize = 64 * 1024;
/// Max records inspected by delimiter sniffing.
pub const N_RECORDS_SNIFF_MAX: usize = 20;
/// UTF-8 byte-order mark.
pub const V_BOM_UTF8: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Build default reader options.
pub fn derive_default_csv_read_options() -> SpecCsvReadOptions {
    SpecCsvReadOptions::default()
}
