// Format sniffing from file content and file names
use crate::config::SubtitleFormat;
use std::path::Path;

/// Guess the format from the first line of a document.
///
/// Only the first line is inspected; leading/trailing whitespace and a UTF-8
/// byte order mark are ignored.
pub fn detect_format(text: &str) -> Option<SubtitleFormat> {
    let first_line = text.lines().next().unwrap_or_default();
    let first_line = first_line.trim_start_matches('\u{feff}').trim();

    match first_line {
        "0" | "1" => Some(SubtitleFormat::Srt),
        "<SAMI>" => Some(SubtitleFormat::Sami),
        "[Script Info]" => Some(SubtitleFormat::Ssa),
        line if line.starts_with("<?xml") || line.starts_with("<tt") => Some(SubtitleFormat::Ttml),
        _ => None,
    }
}

/// Look the format up by the path's extension.
pub fn format_from_path(path: &Path) -> Option<SubtitleFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(SubtitleFormat::from_extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format("1\n00:00:01,000 --> 00:00:02,000\n"), Some(SubtitleFormat::Srt));
        assert_eq!(detect_format("0\r\n"), Some(SubtitleFormat::Srt));
        assert_eq!(detect_format("  <SAMI>  \n<BODY>"), Some(SubtitleFormat::Sami));
        assert_eq!(detect_format("\u{feff}[Script Info]\n"), Some(SubtitleFormat::Ssa));
        assert_eq!(
            detect_format("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<tt>"),
            Some(SubtitleFormat::Ttml)
        );
    }

    #[test]
    fn test_detect_format_unknown() {
        assert_eq!(detect_format("2\n"), None);
        assert_eq!(detect_format("WEBVTT\n"), None);
        assert_eq!(detect_format(""), None);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            format_from_path(&PathBuf::from("/path/to/movie.ass")),
            Some(SubtitleFormat::Ssa)
        );
        assert_eq!(
            format_from_path(&PathBuf::from("captions.TTML")),
            Some(SubtitleFormat::Ttml)
        );
        assert_eq!(format_from_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(format_from_path(&PathBuf::from("noext")), None);
    }
}
