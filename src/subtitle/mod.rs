pub mod detect;
pub mod sami;
pub mod srt;
pub mod ssa;
pub mod time;
pub mod ttml;

pub use time::{format_timestamp, time_converter, Time};

use crate::config::SubtitleFormat;
use crate::error::{Result, SubconvError};
use regex::Regex;
use serde::Serialize;
use std::io::BufRead;
use std::sync::LazyLock;

/// One dialogue unit: a time range plus its (possibly multi-line) text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub time: Time,
    pub dialogue: String,
}

impl Entry {
    pub fn new(time: Time, dialogue: impl Into<String>) -> Self {
        Self {
            time,
            dialogue: dialogue.into(),
        }
    }
}

/// The capability set every format variant provides.
///
/// A variant owns its entries exclusively; they stay in file order.
pub trait SubtitleParser {
    /// Extract one time range from a line; the empty sentinel if it does not match.
    fn time_parse(&self, line: &str) -> Time;

    /// Extract the dialogue payload from one raw fragment.
    fn dialogue_parse(&self, fragment: &str) -> String;

    /// Read the whole stream and append its records to the contents.
    fn file_parse(&mut self, reader: &mut dyn BufRead) -> Result<()>;

    /// Every colliding pair, both members emitted in index order.
    fn collisions(&self) -> Vec<Entry>;

    /// Wrap every dialogue in this format's emphasis markup.
    fn apply_emphasis(&mut self);

    /// Remove this format's markup from every dialogue.
    fn strip_emphasis(&mut self);

    fn contents(&self) -> &[Entry];

    fn contents_mut(&mut self) -> &mut Vec<Entry>;

    fn clear(&mut self) {
        self.contents_mut().clear();
    }
}

/// Serializes a normalized entry sequence into one format's grammar.
pub trait SubtitleFormatter {
    fn format(&self, entries: &[Entry]) -> String;
    fn extension(&self) -> &'static str;

    /// Write the serialization; the caller owns flushing and closing.
    fn write(&self, entries: &[Entry], out: &mut dyn std::io::Write) -> Result<()> {
        out.write_all(self.format(entries).as_bytes())?;
        Ok(())
    }
}

/// Static format → writer table.
pub fn create_formatter(format: SubtitleFormat) -> &'static dyn SubtitleFormatter {
    match format {
        SubtitleFormat::Srt => &srt::SrtFormatter,
        SubtitleFormat::Sami => &sami::SamiFormatter,
        SubtitleFormat::Ssa => &ssa::SsaFormatter,
        SubtitleFormat::Ttml => &ttml::TtmlFormatter,
    }
}

/// A parsed document in one of the four supported formats.
#[derive(Debug, Clone)]
pub enum Subtitle {
    Srt(srt::SrtSubtitle),
    Sami(sami::SamiSubtitle),
    Ssa(ssa::SsaSubtitle),
    Ttml(ttml::TtmlSubtitle),
}

impl Subtitle {
    /// Select the variant for a format identifier such as `.srt` or `.smi`.
    ///
    /// Unknown identifiers are an `UnsupportedFormat` error.
    pub fn create(identifier: &str) -> Result<Self> {
        SubtitleFormat::from_extension(identifier)
            .map(Self::for_format)
            .ok_or_else(|| SubconvError::UnsupportedFormat(identifier.to_string()))
    }

    pub fn for_format(format: SubtitleFormat) -> Self {
        match format {
            SubtitleFormat::Srt => Subtitle::Srt(srt::SrtSubtitle::default()),
            SubtitleFormat::Sami => Subtitle::Sami(sami::SamiSubtitle::default()),
            SubtitleFormat::Ssa => Subtitle::Ssa(ssa::SsaSubtitle::default()),
            SubtitleFormat::Ttml => Subtitle::Ttml(ttml::TtmlSubtitle::default()),
        }
    }

    pub fn format(&self) -> SubtitleFormat {
        match self {
            Subtitle::Srt(_) => SubtitleFormat::Srt,
            Subtitle::Sami(_) => SubtitleFormat::Sami,
            Subtitle::Ssa(_) => SubtitleFormat::Ssa,
            Subtitle::Ttml(_) => SubtitleFormat::Ttml,
        }
    }

    /// The writer this variant is naturally bound to.
    pub fn formatter(&self) -> &'static dyn SubtitleFormatter {
        create_formatter(self.format())
    }

    /// Parse a complete in-memory document.
    pub fn parse_str(&mut self, text: &str) -> Result<()> {
        let mut reader = text.as_bytes();
        self.file_parse(&mut reader)
    }

    /// Move every entry by `delta_ms`, clamping at zero.
    pub fn shift_all(&mut self, delta_ms: i64) {
        for entry in self.contents_mut().iter_mut() {
            entry.time.shift(delta_ms);
        }
    }

    fn as_parser(&self) -> &dyn SubtitleParser {
        match self {
            Subtitle::Srt(s) => s,
            Subtitle::Sami(s) => s,
            Subtitle::Ssa(s) => s,
            Subtitle::Ttml(s) => s,
        }
    }

    fn as_parser_mut(&mut self) -> &mut dyn SubtitleParser {
        match self {
            Subtitle::Srt(s) => s,
            Subtitle::Sami(s) => s,
            Subtitle::Ssa(s) => s,
            Subtitle::Ttml(s) => s,
        }
    }
}

impl SubtitleParser for Subtitle {
    fn time_parse(&self, line: &str) -> Time {
        self.as_parser().time_parse(line)
    }

    fn dialogue_parse(&self, fragment: &str) -> String {
        self.as_parser().dialogue_parse(fragment)
    }

    fn file_parse(&mut self, reader: &mut dyn BufRead) -> Result<()> {
        self.as_parser_mut().file_parse(reader)
    }

    fn collisions(&self) -> Vec<Entry> {
        self.as_parser().collisions()
    }

    fn apply_emphasis(&mut self) {
        self.as_parser_mut().apply_emphasis()
    }

    fn strip_emphasis(&mut self) {
        self.as_parser_mut().strip_emphasis()
    }

    fn contents(&self) -> &[Entry] {
        self.as_parser().contents()
    }

    fn contents_mut(&mut self) -> &mut Vec<Entry> {
        self.as_parser_mut().contents_mut()
    }

    fn clear(&mut self) {
        self.as_parser_mut().clear()
    }
}

/// Pairwise scan over all index pairs `i < j`, emitting both members of each hit.
pub(crate) fn collect_collisions<F>(entries: &[Entry], collides: F) -> Vec<Entry>
where
    F: Fn(&Entry, &Entry) -> bool,
{
    let mut collisions = Vec::new();

    for (i, first) in entries.iter().enumerate() {
        for second in &entries[i + 1..] {
            if collides(first, second) {
                collisions.push(first.clone());
                collisions.push(second.clone());
            }
        }
    }

    collisions
}

static BRACE_OR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{.*?\}|<.*?>").expect("Invalid regex"));

/// Remove `{...}` override blocks and `<...>` tags from one dialogue.
pub(crate) fn strip_markup(dialogue: &str) -> String {
    BRACE_OR_TAG.replace_all(dialogue, "").into_owned()
}

/// Wrap every dialogue between `open` and `close`.
pub(crate) fn wrap_all(entries: &mut [Entry], open: &str, close: &str) {
    for entry in entries.iter_mut() {
        entry.dialogue = format!("{}{}{}", open, entry.dialogue, close);
    }
}

/// Read the stream line by line, dropping the terminator (`\n` or `\r\n`).
pub(crate) fn read_lines(reader: &mut dyn BufRead) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    let mut buf = String::new();

    loop {
        buf.clear();
        if reader.read_line(&mut buf)? == 0 {
            break;
        }
        if buf.ends_with('\n') {
            buf.pop();
            if buf.ends_with('\r') {
                buf.pop();
            }
        }
        lines.push(buf.clone());
    }

    Ok(lines)
}
