//! HTTP HEAD / metadata probing.
//!
//! Uses the curl crate (libcurl) to fetch response headers and capture
//! `Content-Length` and `Last-Modified`, which decide whether a local copy
//! is still current.

mod parse;

pub(crate) use parse::parse_headers;

use crate::error::{JkbError, Result};
use chrono::{DateTime, Utc};
use std::str;
use std::time::Duration;

/// Result of a HEAD request (final response after redirects).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// `Last-Modified` value if present.
    pub last_modified: Option<String>,
}

impl HeadResult {
    /// `Last-Modified` as a timestamp, if present and well-formed.
    pub fn last_modified_time(&self) -> Option<DateTime<Utc>> {
        parse_http_date(self.last_modified.as_deref()?)
    }
}

/// Parse an RFC 7231 IMF-fixdate such as `Wed, 21 Oct 2015 07:28:00 GMT`.
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

pub(crate) fn curl_error(url: &str) -> impl Fn(curl::Error) -> JkbError + '_ {
    move |e| JkbError::Download {
        url: url.to_string(),
        reason: e.to_string(),
    }
}

/// Performs a HEAD request and returns parsed metadata. Follows redirects.
pub fn probe(url: &str) -> Result<HeadResult> {
    let mut headers: Vec<String> = Vec::new();
    let err = curl_error(url);

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(&err)?;
    easy.nobody(true).map_err(&err)?; // HEAD request
    easy.follow_location(true).map_err(&err)?;
    easy.connect_timeout(Duration::from_secs(15)).map_err(&err)?;
    easy.timeout(Duration::from_secs(30)).map_err(&err)?;

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(&err)?;
        transfer.perform().map_err(&err)?;
    }

    let code = easy.response_code().map_err(&err)?;
    if !(200..300).contains(&code) {
        return Err(JkbError::Download {
            url: url.to_string(),
            reason: format!("HEAD returned HTTP {}", code),
        });
    }

    Ok(parse_headers(&headers))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_date_parses_gmt() {
        let t = parse_http_date("Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        assert_eq!(t.timestamp(), 1_445_412_480);
        assert!(parse_http_date("yesterday").is_none());
    }

    #[test]
    fn last_modified_time_absent() {
        let head = HeadResult::default();
        assert!(head.last_modified_time().is_none());
    }
}
