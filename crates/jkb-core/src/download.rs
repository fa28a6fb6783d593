//! Single-stream HTTP GET with timestamp-based conditional re-fetch.
//!
//! A local copy is reused when the server reports the same size and a
//! `Last-Modified` no newer than the local mtime. Otherwise the body is
//! streamed to `<file>.part` and renamed into place, and the local mtime is
//! set from `Last-Modified` so the next run can skip it.

use crate::error::{JkbError, Result};
use crate::fetch_head::{self, curl_error, parse_headers, HeadResult};
use filetime::FileTime;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// What `fetch` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was downloaded; number of bytes written.
    Downloaded(u64),
    /// The local copy matches the remote one.
    UpToDate,
}

/// Path for the temp file: appends `.part` to the final path.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(".part");
    PathBuf::from(o)
}

/// True when a local file of `local_len` bytes modified at `local_mtime` can
/// stand in for the remote resource described by `head`.
pub fn is_up_to_date(local_len: u64, local_mtime: SystemTime, head: &HeadResult) -> bool {
    let Some(remote_time) = head.last_modified_time() else {
        return false;
    };
    if head.content_length != Some(local_len) {
        return false;
    }
    let local_secs = local_mtime
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0);
    remote_time.timestamp() <= local_secs
}

/// Fetch `url` to `dest` unless an up-to-date copy is already there.
pub fn fetch(url: &str, dest: &Path) -> Result<FetchOutcome> {
    if let Ok(meta) = fs::metadata(dest) {
        let head = fetch_head::probe(url)?;
        tracing::debug!(?head, "probed {}", url);
        if let Ok(mtime) = meta.modified() {
            if is_up_to_date(meta.len(), mtime, &head) {
                tracing::info!("{} is up to date, not downloading", dest.display());
                return Ok(FetchOutcome::UpToDate);
            }
        }
        tracing::info!("{} is out of date, downloading again", dest.display());
    }

    tracing::info!("downloading {} to {}", url, dest.display());
    let (written, head) = download_single(url, dest)?;
    if let Some(t) = head.last_modified_time() {
        let ft = FileTime::from_unix_time(t.timestamp(), 0);
        if let Err(e) = filetime::set_file_mtime(dest, ft) {
            tracing::warn!("could not set mtime of {}: {}", dest.display(), e);
        }
    }
    tracing::info!("downloaded {} ({} bytes)", dest.display(), written);
    Ok(FetchOutcome::Downloaded(written))
}

/// Downloads `url` with a single GET, writing to `dest` via a `.part` file.
/// Returns the bytes written and the final response's headers.
fn download_single(url: &str, dest: &Path) -> Result<(u64, HeadResult)> {
    let part = temp_path(dest);
    let mut file =
        File::create(&part).map_err(|e| JkbError::io(format!("create {}", part.display()), e))?;

    let result = transfer(url, &mut file);
    drop(file);

    match result {
        Ok(done) => {
            fs::rename(&part, dest).map_err(|e| {
                JkbError::io(format!("rename {} to {}", part.display(), dest.display()), e)
            })?;
            Ok(done)
        }
        Err(e) => {
            if let Err(rm) = fs::remove_file(&part) {
                tracing::debug!("could not remove {}: {}", part.display(), rm);
            }
            Err(e)
        }
    }
}

fn transfer(url: &str, file: &mut File) -> Result<(u64, HeadResult)> {
    let err = curl_error(url);
    let mut headers: Vec<String> = Vec::new();
    let mut written: u64 = 0;
    let mut write_error: Option<io::Error> = None;

    let mut easy = curl::easy::Easy::new();
    easy.url(url).map_err(&err)?;
    easy.follow_location(true).map_err(&err)?;
    easy.max_redirections(10).map_err(&err)?;
    easy.fail_on_error(true).map_err(&err)?;
    easy.connect_timeout(Duration::from_secs(30)).map_err(&err)?;
    easy.low_speed_limit(1024).map_err(&err)?;
    easy.low_speed_time(Duration::from_secs(60)).map_err(&err)?;

    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(&err)?;
        transfer
            .write_function(|data| match file.write_all(data) {
                Ok(()) => {
                    written += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    write_error = Some(e);
                    Ok(0) // abort transfer
                }
            })
            .map_err(&err)?;
        transfer.perform()
    };

    if let Some(e) = write_error {
        return Err(JkbError::io("write download", e));
    }
    if let Err(e) = performed {
        let code = easy.response_code().unwrap_or(0);
        let reason = if code >= 400 {
            format!("HTTP {}", code)
        } else {
            e.to_string()
        };
        return Err(JkbError::Download {
            url: url.to_string(),
            reason,
        });
    }

    let code = easy.response_code().map_err(&err)?;
    if !(200..300).contains(&code) {
        return Err(JkbError::Download {
            url: url.to_string(),
            reason: format!("HTTP {}", code),
        });
    }

    let head = parse_headers(&headers);
    if let Some(expected) = head.content_length {
        if written != expected {
            return Err(JkbError::Download {
                url: url.to_string(),
                reason: format!("partial transfer: wrote {} of {}", written, expected),
            });
        }
    }
    file.flush()
        .map_err(|e| JkbError::io("flush download", e))?;
    Ok((written, head))
}
