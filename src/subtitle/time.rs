use crate::error::{Result, SubconvError};
use serde::Serialize;

/// A start/end pair in milliseconds, plus the SSA layer.
///
/// `start == 0 && end == 0` is the "unset" sentinel that parsers return when a
/// timestamp line does not match; it is not a real zero-length cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Time {
    pub layer: u32,
    pub start: u64,
    pub end: u64,
}

impl Time {
    pub fn new(layer: u32, start: u64, end: u64) -> Self {
        Self { layer, start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.start == 0 && self.end == 0
    }

    pub fn shift_start(&mut self, delta_ms: i64) {
        self.start = shift_millis(self.start, delta_ms);
    }

    pub fn shift_end(&mut self, delta_ms: i64) {
        self.end = shift_millis(self.end, delta_ms);
    }

    /// Move both ends by the same offset.
    pub fn shift(&mut self, delta_ms: i64) {
        self.shift_start(delta_ms);
        self.shift_end(delta_ms);
    }

    /// Interval intersection shared by SRT, SSA and TTML.
    pub fn overlaps(&self, other: &Time) -> bool {
        self.start < other.end && other.start < self.end
    }
}

fn shift_millis(value: u64, delta_ms: i64) -> u64 {
    if delta_ms >= 0 {
        value.saturating_add(delta_ms.unsigned_abs())
    } else {
        value.saturating_sub(delta_ms.unsigned_abs())
    }
}

/// Convert a fixed-width `HH:MM:SS.CC` (or `HH:MM:SS,CC`) timestamp to milliseconds.
///
/// Only the first two digits after the separator are read, as centiseconds, so
/// `00:00:01,500` and `00:00:01.50` both give 1500.
pub fn time_converter(text: &str) -> Result<u64> {
    let field = |from: usize| -> Result<u64> {
        text.get(from..from + 2)
            .filter(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|digits| digits.parse().ok())
            .ok_or_else(|| SubconvError::InvalidTimestamp(text.to_string()))
    };

    let hours = field(0)?;
    let minutes = field(3)?;
    let seconds = field(6)?;
    let centiseconds = field(9)?;

    Ok(((hours * 60 + minutes) * 60 + seconds) * 1000 + centiseconds * 10)
}

/// Build the canonical fixed-width text from captured timestamp parts and convert it.
///
/// Hours are zero-padded so `1:02:03.04` style SSA stamps convert correctly.
pub(crate) fn convert_parts(hours: &str, minutes: &str, seconds: &str, fraction: &str) -> Result<u64> {
    time_converter(&format!("{:0>2}:{}:{}.{}", hours, minutes, seconds, fraction))
}

/// Render milliseconds as `HH:MM:SS<sep>mmm`.
pub fn format_timestamp(total_ms: u64, separator: char) -> String {
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!(
        "{:02}:{:02}:{:02}{}{:03}",
        hours, minutes, seconds, separator, millis
    )
}
