use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::catalog::{Printer, PrinterConfig};
use crate::error::InstallError;

/// Bytes kept as-is in a path segment: unreserved characters plus the
/// sub-delimiters that are legal inside a segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b':')
    .remove(b'=')
    .remove(b'@');

/// Look up the driver URL for the printer's model, with the filename encoded.
pub fn resolve_driver_url(config: &PrinterConfig, printer: &Printer) -> Result<Url, InstallError> {
    let raw = config
        .printer_models
        .get(&printer.model)
        .and_then(|info| info.ppd_url.as_deref())
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| InstallError::ConfigurationGap {
            model: printer.model.clone(),
        })?;

    let encoded = encode_last_segment(raw);
    let url = Url::parse(&encoded).map_err(|e| InstallError::InvalidDriverUrl {
        model: printer.model.clone(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(InstallError::InvalidDriverUrl {
            model: printer.model.clone(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

/// Percent-encode the part after the last `/`, leaving everything before it untouched.
///
/// Existing escapes are decoded first so an already-encoded filename stays the same.
pub fn encode_last_segment(url: &str) -> String {
    let Some(idx) = url.rfind('/') else {
        return url.to_string();
    };
    let (base, filename) = url.split_at(idx + 1);
    let decoded = percent_decode_str(filename).decode_utf8_lossy();
    format!("{base}{}", utf8_percent_encode(&decoded, SEGMENT))
}
