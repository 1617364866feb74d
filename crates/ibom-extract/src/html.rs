use crate::error::ExtractError;
use crate::lzstring::decompress_from_base64;
use log::{debug, info};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static COMPRESSED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"LZString\.decompressFromBase64\(\s*["']([^"']+)["']\s*\)"#).unwrap()
});
static INLINE_VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)var\s+pcbdata\s*=\s*(\{.*?\});").unwrap());
static INLINE_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)pcbdata\s*=\s*(\{.*?\})\s*[;\n]").unwrap());
static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",(\s*[}\]])").unwrap());

/// Where an export keeps its pcbdata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcbSource<'a> {
    /// Base64 LZ-String payload handed to `LZString.decompressFromBase64`.
    Compressed(&'a str),
    /// JSON object literal assigned to `pcbdata` (older exports).
    Inline(&'a str),
}

/// Locate the pcbdata in an InteractiveHtmlBom page.
///
/// A compressed payload wins over an inline literal when both are present.
pub fn find_pcbdata(html: &str) -> Result<PcbSource<'_>, ExtractError> {
    if let Some(caps) = COMPRESSED_RE.captures(html) {
        if let Some(m) = caps.get(1) {
            return Ok(PcbSource::Compressed(m.as_str()));
        }
    }
    for re in [&*INLINE_VAR_RE, &*INLINE_BARE_RE] {
        if let Some(m) = re.captures(html).and_then(|caps| caps.get(1)) {
            return Ok(PcbSource::Inline(m.as_str()));
        }
    }
    Err(ExtractError::PayloadNotFound)
}

/// Extract and parse the pcbdata JSON tree from an HTML page.
pub fn parse_pcbdata(html: &str) -> Result<Value, ExtractError> {
    match find_pcbdata(html)? {
        PcbSource::Compressed(payload) => {
            info!("Found compressed pcbdata ({} chars)", payload.len());
            let json = decompress_from_base64(payload)?;
            debug!("Decompressed pcbdata to {} chars", json.len());
            serde_json::from_str(&json).map_err(ExtractError::CorruptPayload)
        }
        PcbSource::Inline(literal) => {
            info!("Found inline pcbdata ({} chars)", literal.len());
            Ok(parse_lenient(literal)?)
        }
    }
}

/// Parse a JSON literal, retrying once with trailing commas removed.
pub fn parse_lenient(literal: &str) -> Result<Value, serde_json::Error> {
    match serde_json::from_str(literal) {
        Ok(value) => Ok(value),
        Err(e) => {
            debug!("Strict parse failed ({e}), retrying without trailing commas");
            let cleaned = TRAILING_COMMA_RE.replace_all(literal, "$1");
            serde_json::from_str(&cleaned)
        }
    }
}
