// TTML subtitle format
use super::time::{convert_parts, format_timestamp, Time};
use super::{collect_collisions, wrap_all, Entry, SubtitleFormatter, SubtitleParser};
use crate::error::Result;
use regex::Regex;
use std::io::{BufRead, Read};
use std::sync::LazyLock;
use tracing::debug;

static TIMING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<p begin="(\d{2}):(\d{2}):(\d{2})\.(\d{2,3})" end="(\d{2}):(\d{2}):(\d{2})\.(\d{2,3})""#,
    )
    .expect("Invalid regex")
});

static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<p begin="([^"]+)" end="([^"]+)">(.*?)</p>"#).expect("Invalid regex")
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("Invalid regex"));

#[derive(Debug, Clone, Default)]
pub struct TtmlSubtitle {
    contents: Vec<Entry>,
}

impl SubtitleParser for TtmlSubtitle {
    /// Both `.CC` and `.CCC` fractions are read as centiseconds.
    fn time_parse(&self, line: &str) -> Time {
        let Some(cap) = TIMING_RE.captures(line) else {
            return Time::default();
        };

        let start = convert_parts(&cap[1], &cap[2], &cap[3], &cap[4]);
        let end = convert_parts(&cap[5], &cap[6], &cap[7], &cap[8]);
        match (start, end) {
            (Ok(start), Ok(end)) => Time::new(0, start, end),
            _ => Time::default(),
        }
    }

    /// The paragraph body is used verbatim, entities and nested tags included.
    fn dialogue_parse(&self, fragment: &str) -> String {
        fragment.to_string()
    }

    fn file_parse(&mut self, reader: &mut dyn BufRead) -> Result<()> {
        let mut document = String::new();
        reader.read_to_string(&mut document)?;

        let before = self.contents.len();
        let mut dropped = 0usize;

        for cap in PARAGRAPH_RE.captures_iter(&document) {
            let time = self.time_parse(&cap[0]);
            let dialogue = self.dialogue_parse(&cap[3]);

            if !time.is_empty() && !dialogue.is_empty() {
                self.contents.push(Entry::new(time, dialogue));
            } else {
                dropped += 1;
            }
        }

        debug!(
            "Parsed {} TTML entries ({} dropped)",
            self.contents.len() - before,
            dropped
        );
        Ok(())
    }

    fn collisions(&self) -> Vec<Entry> {
        collect_collisions(&self.contents, |a, b| a.time.overlaps(&b.time))
    }

    fn apply_emphasis(&mut self) {
        wrap_all(&mut self.contents, "<span style=\"italic\">", "</span>");
    }

    fn strip_emphasis(&mut self) {
        for entry in self.contents.iter_mut() {
            entry.dialogue = TAG_RE.replace_all(&entry.dialogue, "").into_owned();
        }
    }

    fn contents(&self) -> &[Entry] {
        &self.contents
    }

    fn contents_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.contents
    }
}

pub struct TtmlFormatter;

impl SubtitleFormatter for TtmlFormatter {
    fn format(&self, entries: &[Entry]) -> String {
        let mut output = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <tt xmlns=\"http://www.w3.org/ns/ttml\">\n\
             <body>\n\
             <div>\n",
        );

        for entry in entries {
            output.push_str(&format!(
                "<p begin=\"{}\" end=\"{}\">{}</p>\n",
                format_timestamp(entry.time.start, '.'),
                format_timestamp(entry.time.end, '.'),
                entry.dialogue
            ));
        }

        output.push_str("</div>\n</body>\n</tt>\n");
        output
    }

    fn extension(&self) -> &'static str {
        "ttml"
    }
}
