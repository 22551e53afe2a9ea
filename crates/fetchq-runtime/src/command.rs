//! `yt-dlp` command line contract.
//!
//! Three invocations are used:
//!
//! - probe: print filename and size for one format selector, download nothing
//! - transfer: download to a file template, progress lines on stdout
//! - stream: write the media itself to stdout

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use fetchq_core::ProbeOutput;

use crate::error::RuntimeError;

/// Output name used for probes; only the title and extension matter.
const PROBE_OUTPUT: &str = "%(title)s.%(ext)s";

/// Worker-side retry counts for queued transfers.
const TRANSFER_RETRIES: &str = "3";

/// Locate the worker binary.
///
/// A bare name is searched on `PATH`; anything with a separator is checked
/// as given.
pub fn resolve_worker_binary(binary: &Path) -> Result<PathBuf, RuntimeError> {
    which::which(binary).map_err(|source| RuntimeError::BinaryNotFound {
        binary: binary.to_path_buf(),
        source,
    })
}

pub fn probe_args(url: &str, selector: &str, user_agent: &str) -> Vec<OsString> {
    to_os([
        "--print",
        "filename",
        "--print",
        "filesize",
        "--format",
        selector,
        "--output",
        PROBE_OUTPUT,
        "--no-warnings",
        "--extractor-retries",
        "2",
        "--retry-sleep",
        "1",
        "--user-agent",
        user_agent,
        url,
    ])
}

/// Arguments for a queued transfer writing to `template`.
pub fn transfer_args(url: &str, selector: &str, template: &Path) -> Vec<OsString> {
    let mut args = to_os([
        "--newline",
        "--progress",
        "--no-part",
        "--no-playlist",
        "--retries",
        TRANSFER_RETRIES,
        "--fragment-retries",
        TRANSFER_RETRIES,
        "--output",
    ]);
    args.push(template.as_os_str().to_owned());
    args.extend(to_os([
        "--format",
        selector,
        "--no-warnings",
        "--http-chunk-size",
        "1M",
        url,
    ]));
    args
}

/// Arguments for a transfer whose media goes to stdout.
pub fn stream_args(url: &str, selector: &str) -> Vec<OsString> {
    to_os([
        "--format",
        selector,
        "--output",
        "-",
        "--no-playlist",
        "--no-warnings",
        url,
    ])
}

/// Read the two `--print` lines of a probe.
///
/// Line one is the filename, line two the size in bytes. `NA`, zero and
/// anything unparsable count as unknown size.
pub fn parse_probe_output(stdout: &str) -> ProbeOutput {
    let mut lines = stdout.lines().map(str::trim);
    let filename = lines.next().unwrap_or_default().to_string();
    let size_bytes = lines
        .next()
        .and_then(|line| line.parse::<u64>().ok())
        .filter(|&n| n > 0);
    ProbeOutput {
        filename,
        size_bytes,
    }
}

fn to_os<const N: usize>(args: [&str; N]) -> Vec<OsString> {
    args.into_iter().map(OsString::from).collect()
}
