//! Pattern matching over single worker output lines.
//!
//! Expected shape, every field but the percentage optional:
//!
//! ```text
//! [download]  45.2% of 162.3MiB at 2.5MiB/s ETA 01:23
//! [download]   3.1% of ~ 80.00MiB at 950.00KiB/s ETA 01:21 (frag 2/40)
//! [download] 100% of 162.3MiB in 00:01:05 at 2.48MiB/s
//! ```

use std::sync::LazyLock;

use fetchq_core::ProgressUpdate;
use fetchq_core::job::UNKNOWN_ETA;
use regex::Regex;

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[download\]\s*(\d+\.?\d*)%").unwrap());
static TOTAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"of\s+~?\s*([\d.]+\w+)").unwrap());
static SPEED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"at\s+([\d.]+\w+/s)").unwrap());
static ETA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ETA\s+([\d:]+)").unwrap());

/// Extract a progress update from one line.
///
/// Returns `None` for anything without a `[download] N%` marker. Other
/// fields are filled when present; a missing ETA becomes the placeholder
/// rather than leaving stale data behind.
pub fn parse_line(line: &str) -> Option<ProgressUpdate> {
    let caps = PERCENT_RE.captures(line)?;
    let percent = caps[1].parse::<f64>().ok()?.clamp(0.0, 100.0);

    let total_size = capture(&TOTAL_RE, line);
    let downloaded_size = total_size
        .as_deref()
        .and_then(|total| downloaded_of(total, percent));

    Some(ProgressUpdate {
        percent,
        total_size,
        downloaded_size,
        speed: capture(&SPEED_RE, line),
        eta: capture(&ETA_RE, line).unwrap_or_else(|| UNKNOWN_ETA.to_string()),
    })
}

fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line).map(|c| c[1].to_string())
}

/// `total * percent / 100`, keeping the unit suffix of `total`.
fn downloaded_of(total: &str, percent: f64) -> Option<String> {
    let split = total
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(total.len());
    let (number, unit) = total.split_at(split);
    let amount = number.parse::<f64>().ok()?;
    Some(format!("{:.1}{unit}", amount * percent / 100.0))
}
