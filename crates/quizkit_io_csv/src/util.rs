//! Stateless helpers used by the reader: decoding, sniffing and parsing.

use std::borrow::Cow;
use std::collections::BTreeMap;

use csv::ReaderBuilder;
use encoding_rs::{UTF_8, WINDOWS_1252};

use crate::conf::V_BOM_UTF8;
use crate::spec::{CsvReadError, EnumCsvDelimiter, EnumTextEncoding, SpecTable};

////////////////////////////////////////////////////////////////////////////////
// #region Decoding

/// Strictly decode `v_bytes` under `encoding`.
pub fn decode_bytes(
    v_bytes: &[u8],
    encoding: EnumTextEncoding,
) -> Result<Cow<'_, str>, CsvReadError> {
    let res_decoded = match encoding {
        EnumTextEncoding::Utf8Sig => {
            let v_body = v_bytes.strip_prefix(&V_BOM_UTF8[..]).unwrap_or(v_bytes);
            UTF_8.decode_without_bom_handling_and_without_replacement(v_body)
        }
        EnumTextEncoding::Utf8 => UTF_8.decode_without_bom_handling_and_without_replacement(v_bytes),
        EnumTextEncoding::Latin1 => Some(encoding_rs::mem::decode_latin1(v_bytes)),
        EnumTextEncoding::Windows1252 => {
            WINDOWS_1252.decode_without_bom_handling_and_without_replacement(v_bytes)
        }
    };
    res_decoded.ok_or(CsvReadError::Decode { encoding })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DelimiterDetection

/// Take at most `size_bytes` of `text`, cut at a char boundary.
///
/// Returns the sample and whether it was truncated.
pub fn derive_text_sample(text: &str, size_bytes: usize) -> (&str, bool) {
    if text.len() <= size_bytes {
        return (text, false);
    }
    let mut n_end = size_bytes;
    while !text.is_char_boundary(n_end) {
        n_end -= 1;
    }
    (&text[..n_end], true)
}

/// Field counts of the leading records of `text_sample` under `delimiter`.
///
/// When the sample is truncated the last (possibly partial) record is dropped.
pub fn derive_record_widths(
    text_sample: &str,
    delimiter: EnumCsvDelimiter,
    n_records_max: usize,
    if_truncated: bool,
) -> Vec<usize> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(text_sample.as_bytes());

    let mut l_widths = Vec::new();
    for res_record in reader.records() {
        let Ok(record) = res_record else {
            break;
        };
        if is_blank_record(&record) {
            continue;
        }
        l_widths.push(record.len());
        if l_widths.len() > n_records_max {
            break;
        }
    }
    if if_truncated || l_widths.len() > n_records_max {
        l_widths.pop();
    }
    l_widths
}

/// Sniff the delimiter: among candidates whose sampled records all share the
/// same field count (> 1), pick the widest; ties keep preference order.
pub fn sniff_delimiter(
    text_sample: &str,
    delimiters: &[EnumCsvDelimiter],
    n_records_max: usize,
    if_truncated: bool,
) -> Option<EnumCsvDelimiter> {
    let mut best: Option<(EnumCsvDelimiter, usize)> = None;
    for delimiter in delimiters {
        let l_widths = derive_record_widths(text_sample, *delimiter, n_records_max, if_truncated);
        let Some(n_width_first) = l_widths.first().copied() else {
            continue;
        };
        if n_width_first < 2 || l_widths.iter().any(|n_width| *n_width != n_width_first) {
            continue;
        }
        if best.is_none_or(|(_, n_width_best)| n_width_first > n_width_best) {
            best = Some((*delimiter, n_width_first));
        }
    }
    best.map(|(delimiter, _)| delimiter)
}

/// Fallback rule: delimiter producing the most fields on the first line.
pub fn derive_first_line_delimiter(
    text: &str,
    delimiters: &[EnumCsvDelimiter],
) -> EnumCsvDelimiter {
    let c_line_first = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");

    let mut delimiter_best = delimiters.first().copied().unwrap_or(EnumCsvDelimiter::Comma);
    let mut n_fields_best = 1usize;
    for delimiter in delimiters {
        let n_fields = c_line_first
            .bytes()
            .filter(|byte| *byte == delimiter.as_byte())
            .count()
            + 1;
        if n_fields > n_fields_best {
            n_fields_best = n_fields;
            delimiter_best = *delimiter;
        }
    }
    delimiter_best
}

/// Resolve the delimiter of `text`: sniffing first, first-line count otherwise.
pub fn resolve_delimiter(
    text: &str,
    delimiters: &[EnumCsvDelimiter],
    size_sample_bytes: usize,
    n_records_max: usize,
) -> EnumCsvDelimiter {
    let (text_sample, if_truncated) = derive_text_sample(text, size_sample_bytes);
    sniff_delimiter(text_sample, delimiters, n_records_max, if_truncated)
        .unwrap_or_else(|| derive_first_line_delimiter(text_sample, delimiters))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructureParsing

fn is_blank_record(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.is_empty())
}

/// Make header names unique and non-empty.
///
/// Empty names become `Unnamed: <idx>`; repeats get `.1`, `.2`, ... suffixes.
pub fn derive_unique_headers(headers: &[String]) -> Vec<String> {
    let mut dict_seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut l_headers = Vec::with_capacity(headers.len());
    for (n_idx, c_name_raw) in headers.iter().enumerate() {
        let c_name_base = if c_name_raw.trim().is_empty() {
            format!("Unnamed: {n_idx}")
        } else {
            c_name_raw.clone()
        };
        let mut c_name = c_name_base.clone();
        while let Some(n_count) = dict_seen.get(&c_name).copied() {
            dict_seen.insert(c_name.clone(), n_count + 1);
            c_name = format!("{c_name_base}.{}", n_count);
        }
        dict_seen.insert(c_name.clone(), 1);
        l_headers.push(c_name);
    }
    l_headers
}

/// Parse decoded `text` as a header + records table under `delimiter`.
///
/// Short records are padded with "", records wider than the header fail.
pub fn parse_table(text: &str, delimiter: EnumCsvDelimiter) -> Result<SpecTable, CsvReadError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let record_header = reader
        .headers()
        .map_err(|err| CsvReadError::Structure(format!("Failed to read header: {err}")))?
        .clone();
    if record_header.is_empty() || is_blank_record(&record_header) {
        return Err(CsvReadError::Structure(
            "No columns to parse from file.".to_string(),
        ));
    }

    let l_headers_raw: Vec<String> = record_header.iter().map(ToString::to_string).collect();
    let mut table = SpecTable::new(derive_unique_headers(&l_headers_raw));
    let n_width = table.width();

    for (n_idx_record, res_record) in reader.records().enumerate() {
        let record = res_record.map_err(|err| {
            CsvReadError::Structure(format!("Failed to parse record {}: {err}", n_idx_record + 1))
        })?;
        if is_blank_record(&record) {
            continue;
        }
        if record.len() > n_width {
            return Err(CsvReadError::Structure(format!(
                "Expected {n_width} fields in record {}, saw {}.",
                n_idx_record + 1,
                record.len()
            )));
        }

        let mut row: Vec<String> = record.iter().map(ToString::to_string).collect();
        row.resize(n_width, String::new());
        table.push_row(row).map_err(CsvReadError::Structure)?;
    }

    Ok(table)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    const DELIMS: [EnumCsvDelimiter; 3] = [
        EnumCsvDelimiter::Comma,
        EnumCsvDelimiter::Semicolon,
        EnumCsvDelimiter::Tab,
    ];

    #[test]
    fn test_decode_bytes_utf8_sig_strips_bom() {
        let v_bytes = b"\xEF\xBB\xBFa,b\n1,2\n";
        let text = decode_bytes(v_bytes, EnumTextEncoding::Utf8Sig).unwrap();
        assert!(text.starts_with("a,b"));
    }

    #[test]
    fn test_decode_bytes_rejects_invalid_utf8_but_latin1_accepts() {
        let v_bytes = b"Num\xe9ro;Nom\n";
        assert!(decode_bytes(v_bytes, EnumTextEncoding::Utf8Sig).is_err());
        assert!(decode_bytes(v_bytes, EnumTextEncoding::Utf8).is_err());
        let text = decode_bytes(v_bytes, EnumTextEncoding::Latin1).unwrap();
        assert!(text.starts_with("Numéro;Nom"));
    }

    #[test]
    fn test_sniff_delimiter_prefers_consistent_widest_candidate() {
        let text = "a;b;c\n1;2,5;3\n4;5;6\n";
        assert_eq!(
            sniff_delimiter(text, &DELIMS, 20, false),
            Some(EnumCsvDelimiter::Semicolon)
        );
    }

    #[test]
    fn test_sniff_delimiter_handles_quoted_multiline_fields() {
        let text = "Question,Feedback\n\"line 1\nline 2, with comma\",F1\nQ2,F2\n";
        assert_eq!(
            sniff_delimiter(text, &DELIMS, 20, false),
            Some(EnumCsvDelimiter::Comma)
        );
    }

    #[test]
    fn test_first_line_fallback_when_sniffing_is_inconclusive() {
        let text = "a\tb\tc\n1\t2\n";
        assert_eq!(sniff_delimiter(text, &DELIMS, 20, false), None);
        assert_eq!(derive_first_line_delimiter(text, &DELIMS), EnumCsvDelimiter::Tab);
        assert_eq!(resolve_delimiter(text, &DELIMS, 1024, 20), EnumCsvDelimiter::Tab);
    }

    #[test]
    fn test_first_line_fallback_defaults_to_first_candidate() {
        assert_eq!(
            derive_first_line_delimiter("single\n", &DELIMS),
            EnumCsvDelimiter::Comma
        );
    }

    #[test]
    fn test_derive_text_sample_respects_char_boundary() {
        let (text_sample, if_truncated) = derive_text_sample("aé", 2);
        assert_eq!(text_sample, "a");
        assert!(if_truncated);
    }

    #[test]
    fn test_parse_table_pads_short_records_and_keeps_text() {
        let table = parse_table("id,name,score\n007,Bond\n", EnumCsvDelimiter::Comma).unwrap();
        assert_eq!(table.columns(), &["id", "name", "score"]);
        assert_eq!(table.rows()[0], vec!["007", "Bond", ""]);
    }

    #[test]
    fn test_parse_table_rejects_wide_records_and_empty_input() {
        assert!(parse_table("a,b\n1,2,3\n", EnumCsvDelimiter::Comma).is_err());
        assert!(parse_table("", EnumCsvDelimiter::Comma).is_err());
    }

    #[test]
    fn test_derive_unique_headers() {
        let headers = vec!["a".to_string(), "".to_string(), "a".to_string(), "a".to_string()];
        assert_eq!(
            derive_unique_headers(&headers),
            vec!["a", "Unnamed: 1", "a.1", "a.2"]
        );
    }
}
