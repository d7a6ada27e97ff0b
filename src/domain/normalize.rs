//! Raw response export text into ordered flat records.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use csv::{ReaderBuilder, Trim};
use tracing::{debug, instrument, warn};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::record::FlatRecord;

const BOM: char = '\u{feff}';
const ID_HEADER: &str = "\"id\"";

/// Decode a base64 transport envelope into raw export bytes.
pub fn decode_envelope(encoded: &str) -> DomainResult<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| DomainError::malformed(format!("invalid base64 envelope: {}", e)))
}

/// Normalize raw export bytes. Invalid UTF-8 sequences are replaced.
pub fn normalize_bytes(raw: &[u8], delimiter: Option<u8>) -> DomainResult<Vec<FlatRecord>> {
    match std::str::from_utf8(raw) {
        Ok(text) => normalize(text, delimiter),
        Err(e) => {
            warn!(error = %e, "export is not valid UTF-8, replacing invalid sequences");
            normalize(&String::from_utf8_lossy(raw), delimiter)
        }
    }
}

/// Parse delimited export text into records keyed by header column names.
///
/// Leading byte-order marks are stripped. Without an explicit `delimiter` the
/// text must start with the quoted `"id"` header and the character after it is
/// used. A final row with a missing or empty `id` is dropped.
///
/// # Errors
/// `DelimiterNotDetected` when auto-detection fails, `MalformedInput` when the
/// text is not structurally valid. No partial result is returned.
#[instrument(level = "debug", skip(text), fields(len = text.len()))]
pub fn normalize(text: &str, delimiter: Option<u8>) -> DomainResult<Vec<FlatRecord>> {
    let text = text.trim_start_matches(BOM);
    let delimiter = match delimiter {
        Some(d) => d,
        None => detect_delimiter(text)?,
    };
    debug!(delimiter = %(delimiter as char), "parsing export");

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| DomainError::malformed(format!("failed to read header: {}", e)))?
        .clone();

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let fields =
            result.map_err(|e| DomainError::malformed(format!("row {}: {}", row + 1, e)))?;
        if fields.len() > headers.len() {
            debug!(row = row + 1, extra = fields.len() - headers.len(), "ignoring fields beyond header");
        }
        let record: FlatRecord = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name, fields.get(i).unwrap_or("")))
            .collect();
        records.push(record);
    }

    if records.last().is_some_and(|last| last.id().is_none()) {
        debug!("dropping trailing record without id");
        records.pop();
    }

    debug!(records = records.len(), "export normalized");
    Ok(records)
}

/// The character following a leading `"id"` header.
pub fn detect_delimiter(text: &str) -> DomainResult<u8> {
    let rest = text
        .strip_prefix(ID_HEADER)
        .ok_or(DomainError::DelimiterNotDetected)?;
    let delimiter = rest.chars().next().ok_or(DomainError::DelimiterNotDetected)?;
    if !delimiter.is_ascii() {
        return Err(DomainError::malformed(format!(
            "delimiter '{}' is not a single-byte character",
            delimiter
        )));
    }
    Ok(delimiter as u8)
}
