// SRT subtitle format
use super::time::{convert_parts, format_timestamp, Time};
use super::{
    collect_collisions, read_lines, strip_markup, wrap_all, Entry, SubtitleFormatter,
    SubtitleParser,
};
use crate::error::Result;
use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;
use tracing::debug;

static TIMING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{2}):(\d{2}):(\d{2}),(\d{3}) --> (\d{2}):(\d{2}):(\d{2}),(\d{3})")
        .expect("Invalid regex")
});

static UPPERCASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]").expect("Invalid regex"));

#[derive(Debug, Clone, Default)]
pub struct SrtSubtitle {
    contents: Vec<Entry>,
}

impl SubtitleParser for SrtSubtitle {
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

    /// A line counts as dialogue only if it has an uppercase ASCII letter.
    fn dialogue_parse(&self, fragment: &str) -> String {
        if UPPERCASE_RE.is_match(fragment) {
            fragment.to_string()
        } else {
            String::new()
        }
    }

    fn file_parse(&mut self, reader: &mut dyn BufRead) -> Result<()> {
        let lines = read_lines(reader)?;
        let mut lines = lines.iter();
        let mut dropped = 0usize;

        // index line, timing line, dialogue lines up to a blank line
        while let Some(index_line) = lines.next() {
            if index_line.is_empty() {
                continue;
            }

            let Some(timing_line) = lines.next() else {
                break;
            };
            let time = self.time_parse(timing_line);

            let mut dialogue = String::new();
            for line in lines.by_ref() {
                if line.is_empty() {
                    break;
                }
                let text = self.dialogue_parse(line);
                if text.is_empty() {
                    continue;
                }
                if !dialogue.is_empty() {
                    dialogue.push('\n');
                }
                dialogue.push_str(&text);
            }

            if !time.is_empty() && !dialogue.is_empty() {
                self.contents.push(Entry::new(time, dialogue));
            } else {
                dropped += 1;
            }
        }

        debug!(
            "Parsed {} SRT entries ({} dropped)",
            self.contents.len(),
            dropped
        );
        Ok(())
    }

    fn collisions(&self) -> Vec<Entry> {
        collect_collisions(&self.contents, |a, b| a.time.overlaps(&b.time))
    }

    fn apply_emphasis(&mut self) {
        wrap_all(&mut self.contents, "<i>", "</i>");
    }

    fn strip_emphasis(&mut self) {
        for entry in self.contents.iter_mut() {
            entry.dialogue = strip_markup(&entry.dialogue);
        }
    }

    fn contents(&self) -> &[Entry] {
        &self.contents
    }

    fn contents_mut(&mut self) -> &mut Vec<Entry> {
        &mut self.contents
    }
}

pub struct SrtFormatter;

impl SubtitleFormatter for SrtFormatter {
    fn format(&self, entries: &[Entry]) -> String {
        entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                format!(
                    "{}\n{} --> {}\n{}\n\n",
                    i + 1,
                    format_timestamp(entry.time.start, ','),
                    format_timestamp(entry.time.end, ','),
                    entry.dialogue
                )
            })
            .collect()
    }

    fn extension(&self) -> &'static str {
        "srt"
    }
}
