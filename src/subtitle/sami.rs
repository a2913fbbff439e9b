// SAMI subtitle format
use super::time::Time;
use super::{
    collect_collisions, read_lines, strip_markup, wrap_all, Entry, SubtitleFormatter,
    SubtitleParser,
};
use crate::error::Result;
use regex::Regex;
use std::io::BufRead;
use std::sync::LazyLock;
use tracing::debug;

static SYNC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<SYNC\s+Start=(\d+)[^>]*>").expect("Invalid regex"));

static SYNC_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<SYNC\s+Start=").expect("Invalid regex"));

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<P[^>]*>(.*?)</P>").expect("Invalid regex"));

static PARAGRAPH_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<P[\s>]").expect("Invalid regex"));

static PARAGRAPH_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</P>").expect("Invalid regex"));

static CAPTION_CLASS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)Class\s*=\s*"?(ENUSCC|FRFRCC)\b"#).expect("Invalid regex")
});

static LINE_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").expect("Invalid regex"));

#[derive(Debug, Clone, Default)]
pub struct SamiSubtitle {
    contents: Vec<Entry>,
}

impl SamiSubtitle {
    /// Parse a buffered paragraph and append it as a new line of `dialogue`.
    fn flush_paragraph(&self, dialogue: &mut String, buffer: &mut String) {
        let text = self.dialogue_parse(buffer);
        if !dialogue.is_empty() {
            dialogue.push('\n');
        }
        dialogue.push_str(&text);
        buffer.clear();
    }
}

impl SubtitleParser for SamiSubtitle {
    /// SAMI carries no end time, so `end` mirrors `start`.
    fn time_parse(&self, line: &str) -> Time {
        SYNC_RE
            .captures(line)
            .and_then(|cap| cap[1].parse::<u64>().ok())
            .map(|start| Time::new(0, start, start))
            .unwrap_or_default()
    }

    fn dialogue_parse(&self, fragment: &str) -> String {
        match PARAGRAPH_RE.captures(fragment) {
            Some(cap) => LINE_BREAK_RE.replace_all(&cap[1], "\n").into_owned(),
            None => String::new(),
        }
    }

    fn file_parse(&mut self, reader: &mut dyn BufRead) -> Result<()> {
        let lines = read_lines(reader)?;
        let before = self.contents.len();

        let mut current: Option<Entry> = None;
        let mut in_paragraph = false;
        let mut buffer = String::new();

        for line in &lines {
            if SYNC_OPEN_RE.is_match(line) {
                if let Some(mut entry) = current.take() {
                    if !buffer.is_empty() {
                        self.flush_paragraph(&mut entry.dialogue, &mut buffer);
                    }
                    self.contents.push(entry);
                }
                buffer.clear();
                in_paragraph = false;
                current = Some(Entry::new(self.time_parse(line), String::new()));
                continue;
            }

            if PARAGRAPH_OPEN_RE.is_match(line) {
                // only caption paragraphs are buffered, other languages are skipped
                if !CAPTION_CLASS_RE.is_match(line) {
                    continue;
                }
                buffer = line.clone();
                in_paragraph = true;
            } else if in_paragraph {
                buffer.push_str(line);
            } else {
                continue;
            }

            if PARAGRAPH_CLOSE_RE.is_match(line) {
                match current.as_mut() {
                    Some(entry) => self.flush_paragraph(&mut entry.dialogue, &mut buffer),
                    None => buffer.clear(),
                }
                in_paragraph = false;
            }
        }

        if let Some(mut entry) = current.take() {
            if !buffer.is_empty() {
                self.flush_paragraph(&mut entry.dialogue, &mut buffer);
            }
            self.contents.push(entry);
        }

        debug!("Parsed {} SAMI entries", self.contents.len() - before);
        Ok(())
    }

    /// Flags every pair whose later entry starts no later than the earlier one.
    fn collisions(&self) -> Vec<Entry> {
        collect_collisions(&self.contents, |a, b| a.time.start >= b.time.start)
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

pub struct SamiFormatter;

impl SubtitleFormatter for SamiFormatter {
    fn format(&self, entries: &[Entry]) -> String {
        let mut output = String::from("<SAMI>\n<BODY>\n");

        for entry in entries {
            output.push_str(&format!(
                "<SYNC Start={} End={}>\n",
                entry.time.start, entry.time.end
            ));
            if entry.dialogue.contains("<P") {
                output.push_str(&format!("{}\n", entry.dialogue));
            } else {
                output.push_str(&format!("<P>{}</P>\n", entry.dialogue));
            }
        }

        output.push_str("</BODY>\n</SAMI>\n");
        output
    }

    fn extension(&self) -> &'static str {
        "smi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> SamiSubtitle {
        let mut sami = SamiSubtitle::default();
        let mut reader = text.as_bytes();
        sami.file_parse(&mut reader).unwrap();
        sami
    }

    fn entry(start: u64, text: &str) -> Entry {
        Entry::new(Time::new(0, start, start), text)
    }

    #[test]
    fn test_time_parse() {
        let sami = SamiSubtitle::default();
        let time = sami.time_parse("<SYNC Start=8500>");
        assert_eq!(time.start, 8500);
        assert_eq!(time.end, 8500);

        assert_eq!(sami.time_parse("<SYNC Start=100 End=200>").start, 100);
        assert!(sami.time_parse("<P>nothing</P>").is_empty());
    }

    #[test]
    fn test_dialogue_parse_converts_br_to_newline() {
        let sami = SamiSubtitle::default();
        let input = "<P Class=ENUSCC>Subtitle line one.<br>Subtitle line two.</P>";
        assert_eq!(
            sami.dialogue_parse(input),
            "Subtitle line one.\nSubtitle line two."
        );
        assert_eq!(sami.dialogue_parse("<p class=enuscc>lower</p>"), "lower");
        assert_eq!(sami.dialogue_parse("no paragraph"), "");
    }

    #[test]
    fn test_parses_single_record() {
        let sami = parse("<SYNC Start=5000>\n<P Class=ENUSCC>Hi<br>Bye</P>\n");

        assert_eq!(sami.contents().len(), 1);
        let entry = &sami.contents()[0];
        assert_eq!(entry.time.start, 5000);
        assert_eq!(entry.time.end, 5000);
        assert_eq!(entry.dialogue, "Hi\nBye");
    }

    #[test]
    fn test_buffers_multiline_paragraph() {
        let sami = parse(
            "<SAMI>\n<BODY>\n\
             <SYNC Start=1000>\n\
             <P Class=FRFRCC>Bonjour\n\
             <br>tout le monde</P>\n\
             <SYNC Start=2000>\n\
             <P Class=ENUSCC>Next</P>\n\
             </BODY>\n</SAMI>\n",
        );

        assert_eq!(sami.contents().len(), 2);
        assert_eq!(sami.contents()[0].dialogue, "Bonjour\ntout le monde");
        assert_eq!(sami.contents()[1].time.start, 2000);
        assert_eq!(sami.contents()[1].dialogue, "Next");
    }

    #[test]
    fn test_skips_other_caption_classes() {
        let sami = parse(
            "<SYNC Start=1000>\n\
             <P Class=KRCC>Skipped</P>\n\
             <P Class=ENUSCC>Kept</P>\n",
        );

        assert_eq!(sami.contents().len(), 1);
        assert_eq!(sami.contents()[0].dialogue, "Kept");
    }

    #[test]
    fn test_joins_several_paragraphs_in_one_sync() {
        let sami = parse(
            "<SYNC Start=1000>\n\
             <P Class=ENUSCC>One</P>\n\
             <P Class=ENUSCC>Two</P>\n",
        );

        assert_eq!(sami.contents()[0].dialogue, "One\nTwo");
    }

    #[test]
    fn test_keeps_sync_without_text() {
        let sami = parse("<SYNC Start=1000>\n&nbsp;\n<SYNC Start=2000>\n<P Class=ENUSCC>Hi</P>");

        assert_eq!(sami.contents().len(), 2);
        assert_eq!(sami.contents()[0].dialogue, "");
        assert_eq!(sami.contents()[1].dialogue, "Hi");
    }

    #[test]
    fn test_unclosed_paragraph_flushed_at_end() {
        let sami = parse("<SYNC Start=1000>\n<P Class=ENUSCC>Never closed\n");

        assert_eq!(sami.contents().len(), 1);
        assert_eq!(sami.contents()[0].dialogue, "");
    }

    #[test]
    fn test_collisions_flag_out_of_order_starts() {
        let mut sami = SamiSubtitle::default();
        sami.contents_mut()
            .extend([entry(6000, "Node1"), entry(5000, "Node2"), entry(7000, "Node3")]);

        let collisions = sami.collisions();

        assert_eq!(collisions.len(), 2);
        assert_eq!(collisions[0].dialogue, "Node1");
        assert_eq!(collisions[1].dialogue, "Node2");
    }

    #[test]
    fn test_collisions_flag_equal_starts() {
        let mut sami = SamiSubtitle::default();
        sami.contents_mut()
            .extend([entry(5000, "First"), entry(5000, "Second")]);

        let collisions = sami.collisions();

        assert_eq!(collisions.len(), 2);
        assert_eq!(collisions[0].dialogue, "First");
        assert_eq!(collisions[1].dialogue, "Second");
    }

    #[test]
    fn test_collisions_ignore_overlapping_ranges_in_order() {
        let mut sami = SamiSubtitle::default();
        sami.contents_mut().extend([
            Entry::new(Time::new(0, 1000, 5000), "Long"),
            Entry::new(Time::new(0, 2000, 3000), "Inside"),
        ]);

        assert!(sami.contents()[0].time.overlaps(&sami.contents()[1].time));
        assert!(sami.collisions().is_empty());
    }

    #[test]
    fn test_emphasis() {
        let mut sami = SamiSubtitle::default();
        sami.contents_mut().push(entry(0, "Test SAMI"));

        sami.apply_emphasis();
        assert_eq!(sami.contents()[0].dialogue, "<i>Test SAMI</i>");

        sami.strip_emphasis();
        assert_eq!(sami.contents()[0].dialogue, "Test SAMI");
    }

    #[test]
    fn test_sami_format() {
        let entries = vec![Entry::new(Time::new(2, 5000, 10000), "Sample of SAMI")];

        let output = SamiFormatter.format(&entries);

        assert_eq!(
            output,
            "<SAMI>\n<BODY>\n<SYNC Start=5000 End=10000>\n<P>Sample of SAMI</P>\n</BODY>\n</SAMI>\n"
        );
    }

    #[test]
    fn test_sami_format_keeps_existing_paragraph() {
        let entries = vec![entry(1000, "<P Class=ENUSCC>Tagged</P>")];

        let output = SamiFormatter.format(&entries);

        assert!(output.contains("<SYNC Start=1000 End=1000>\n<P Class=ENUSCC>Tagged</P>\n"));
    }
}
