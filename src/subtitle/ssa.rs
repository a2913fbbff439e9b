// SSA / ASS subtitle format
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

static DIALOGUE_TIMING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"Dialogue:\s*(?:Marked=)?(\d+),(\d+):(\d{2}):(\d{2})\.(\d{2})\d?,(\d+):(\d{2}):(\d{2})\.(\d{2})",
    )
    .expect("Invalid regex")
});

/// Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text.
const STANDARD_EVENT_FIELDS: usize = 10;

/// Returned when a line carries no dialogue field.
const MISSING_DIALOGUE: &str = " ";

#[derive(Debug, Clone, Default)]
pub struct SsaSubtitle {
    contents: Vec<Entry>,
    /// Field count declared by the `Format:` line of the `[Events]` section.
    event_fields: Option<usize>,
}

impl SsaSubtitle {
    fn text_field<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.strip_prefix("Dialogue:")?.trim_start();
        let fields = self.event_fields.unwrap_or(STANDARD_EVENT_FIELDS);
        let parts: Vec<&str> = rest.splitn(fields, ',').collect();

        if parts.len() == fields {
            return parts.last().copied();
        }
        // Without a Format line, also accept the short layout that omits Effect.
        if self.event_fields.is_none() && parts.len() == fields - 1 {
            return parts.last().copied();
        }
        None
    }
}

impl SubtitleParser for SsaSubtitle {
    fn time_parse(&self, line: &str) -> Time {
        let Some(cap) = DIALOGUE_TIMING_RE.captures(line) else {
            return Time::default();
        };

        let layer = cap[1].parse::<u32>().ok();
        let start = convert_parts(&cap[2], &cap[3], &cap[4], &cap[5]);
        let end = convert_parts(&cap[6], &cap[7], &cap[8], &cap[9]);
        match (layer, start, end) {
            (Some(layer), Ok(start), Ok(end)) => Time::new(layer, start, end),
            _ => Time::default(),
        }
    }

    fn dialogue_parse(&self, fragment: &str) -> String {
        self.text_field(fragment)
            .unwrap_or(MISSING_DIALOGUE)
            .to_string()
    }

    fn file_parse(&mut self, reader: &mut dyn BufRead) -> Result<()> {
        let lines = read_lines(reader)?;
        let before = self.contents.len();
        let mut in_events = false;

        for line in &lines {
            let trimmed = line.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                in_events = trimmed.eq_ignore_ascii_case("[Events]");
                continue;
            }

            if in_events {
                if let Some(format) = trimmed.strip_prefix("Format:") {
                    let fields = format.split(',').count();
                    debug!("SSA events declare {} fields", fields);
                    self.event_fields = Some(fields);
                    continue;
                }
            }

            // every Dialogue line is kept, even when its timing does not parse
            let event = line.trim_start();
            if event.starts_with("Dialogue:") {
                let time = self.time_parse(event);
                let dialogue = self.dialogue_parse(event);
                self.contents.push(Entry::new(time, dialogue));
            }
        }

        debug!("Parsed {} SSA entries", self.contents.len() - before);
        Ok(())
    }

    /// Overlapping ranges collide only on the same layer.
    fn collisions(&self) -> Vec<Entry> {
        collect_collisions(&self.contents, |a, b| {
            a.time.layer == b.time.layer && a.time.overlaps(&b.time)
        })
    }

    fn apply_emphasis(&mut self) {
        wrap_all(&mut self.contents, "{\\b1}", "{\\b0}");
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

    fn clear(&mut self) {
        self.contents.clear();
        self.event_fields = None;
    }
}

pub struct SsaFormatter;

impl SubtitleFormatter for SsaFormatter {
    fn format(&self, entries: &[Entry]) -> String {
        let mut output = String::from(
            "[Script Info]\n\
             Title: Converted Subtitle\n\
             ScriptType: v4.00+\n\
             Collisions: Normal\n\n\
             [V4+ Styles]\n\
             Format: Name, Fontname, Fontsize, PrimaryColour, BackColour, Bold, Italic, Alignment, MarginL, MarginR, MarginV, Encoding\n\
             Style: Default,Arial,20,&H00FFFFFF,&H00000000,0,0,2,10,10,10,0\n\n\
             [Events]\n\
             Format: Marked, Start, End, Style, Name, MarginL, MarginR, MarginV, Text\n",
        );

        for entry in entries {
            output.push_str(&format!(
                "Dialogue: Marked=0,{},{},Default,,0,0,0,{}\n",
                format_timestamp(entry.time.start, '.'),
                format_timestamp(entry.time.end, '.'),
                entry.dialogue
            ));
        }

        output
    }

    fn extension(&self) -> &'static str {
        "ass"
    }
}
