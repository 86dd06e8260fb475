//! I/O helpers for reading source CSV files and opening the output script.
//!
//! - **Encoding**: input decoding via `encoding_rs`, defaulting to UTF-8.
//!   Decoding failures surface as errors so the caller can skip the file.
//! - **BOM**: a leading byte-order mark is removed from the first header cell.
//! - **Reader construction**: comma-delimited, first record is the header,
//!   `flexible` so short or long rows reach the caller instead of aborting.
//! - **stdout**: the `-` path convention routes the script to standard output.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::{Encoding, UTF_8};

pub const CSV_DELIMITER: u8 = b',';

const BYTE_ORDER_MARK: char = '\u{feff}';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn open_csv_reader<R>(reader: R) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(CSV_DELIMITER)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path) -> Result<csv::Reader<BufReader<File>>> {
    let file = File::open(path).with_context(|| format!("Opening input file {path:?}"))?;
    Ok(open_csv_reader(BufReader::new(file)))
}

pub fn open_output_writer(path: &Path) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = if is_dash(path) {
        Box::new(std::io::stdout().lock())
    } else {
        Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Creating output file {path:?}"))?,
        ))
    };
    Ok(writer)
}

/// Decodes one field with exactly `encoding`; BOM sniffing would reinterpret
/// cells starting with `FF FE` or `FE FF` as UTF-16.
pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            anyhow!(
                "Failed to decode text with encoding {}",
                encoding.name()
            )
        })
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Reads and decodes the header record.
///
/// Returns `None` when the input has no records at all. A leading BOM is
/// stripped and every name is trimmed.
pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Option<Vec<String>>>
where
    R: Read,
{
    let raw = reader.byte_headers().context("Reading header record")?.clone();
    let mut headers = decode_record(&raw, encoding).context("Decoding header record")?;
    if let Some(first) = headers.first_mut()
        && first.starts_with(BYTE_ORDER_MARK)
    {
        *first = first.trim_start_matches(BYTE_ORDER_MARK).to_string();
    }
    if headers.is_empty() || (headers.len() == 1 && headers[0].trim().is_empty()) {
        return Ok(None);
    }
    Ok(Some(
        headers
            .into_iter()
            .map(|name| name.trim().to_string())
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_of(input: &[u8]) -> Option<Vec<String>> {
        let mut reader = open_csv_reader(input);
        reader_headers(&mut reader, UTF_8).expect("headers decode")
    }

    #[test]
    fn headers_strip_bom_and_padding() {
        let headers = headers_of(b"\xEF\xBB\xBF address , userDist\n12 Oak St,3.5\n");
        assert_eq!(
            headers,
            Some(vec!["address".to_string(), "userDist".to_string()])
        );
    }

    #[test]
    fn empty_and_bom_only_inputs_have_no_header() {
        assert_eq!(headers_of(b""), None);
        assert_eq!(headers_of(b"\xEF\xBB\xBF"), None);
    }

    #[test]
    fn flexible_reader_yields_ragged_rows() {
        let mut reader = open_csv_reader(&b"a,b\n1,2,3\n4\n"[..]);
        let lengths = reader
            .byte_records()
            .map(|record| record.expect("record").len())
            .collect::<Vec<_>>();
        assert_eq!(lengths, vec![3, 1]);
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        let err = decode_bytes(b"caf\xE9", UTF_8).unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
        let latin1 = resolve_encoding(Some("latin1")).expect("known label");
        assert_eq!(decode_bytes(b"caf\xE9", latin1).unwrap(), "café");
    }

    #[test]
    fn decode_does_not_sniff_byte_order_marks() {
        assert!(decode_bytes(b"\xFF\xFEab", UTF_8).is_err());
        let latin1 = resolve_encoding(Some("latin1")).expect("known label");
        assert_eq!(decode_bytes(b"\xEF\xBB\xBFx", latin1).unwrap(), "\u{ef}\u{bb}\u{bf}x");
    }

    #[test]
    fn unknown_encoding_label_is_an_error() {
        assert!(resolve_encoding(Some("klingon")).is_err());
        assert_eq!(resolve_encoding(None).unwrap(), UTF_8);
    }
}
