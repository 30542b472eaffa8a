//! Destination filename resolution.
//!
//! Precedence: explicit override, then the Content-Disposition `filename`
//! parameter, then the final path segment of the effective URL.

use crate::errors::DownloadError;
use url::Url;

/// Resolves the destination filename for a download.
///
/// `content_disposition` is the raw header value from the response, if any;
/// `effective_url` is the URL after redirects. Fails with
/// [`DownloadError::FilenameUndeterminable`] when no source yields a
/// non-empty name (for example a URL ending in `/`).
pub fn resolve_file_name(
    override_name: &str,
    content_disposition: Option<&str>,
    effective_url: &Url,
) -> Result<String, DownloadError> {
    if !override_name.is_empty() {
        return Ok(override_name.to_string());
    }

    if let Some(name) = content_disposition.and_then(content_disposition_file_name) {
        return Ok(name);
    }

    // The final segment must itself be non-empty: "…/a/b/" names a
    // directory, not a file.
    let segment = effective_url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    if segment.is_empty() {
        return Err(DownloadError::FilenameUndeterminable);
    }
    Ok(segment.to_string())
}

/// Extracts the `filename` parameter from a Content-Disposition value,
/// stripping surrounding quotes. Typical input:
/// `attachment; filename="example.txt"`.
fn content_disposition_file_name(value: &str) -> Option<String> {
    for param in value.split(';') {
        let Some((name, raw)) = param.trim().split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("filename") {
            continue;
        }
        let unquoted = raw.trim().trim_matches('"');
        if !unquoted.is_empty() {
            return Some(percent_decode(unquoted));
        }
    }
    None
}

/// Decodes %XX escapes; malformed escapes are passed through untouched.
fn percent_decode(input: &str) -> String {
    let mut out = Vec::with_capacity(input.len());
    let mut bytes = input.bytes();
    while let Some(b) = bytes.next() {
        if b != b'%' {
            out.push(b);
            continue;
        }
        let mut rest = bytes.clone();
        match (rest.next().and_then(hex_digit), rest.next().and_then(hex_digit)) {
            (Some(high), Some(low)) => {
                out.push(high << 4 | low);
                bytes.next();
                bytes.next();
            }
            _ => out.push(b),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
