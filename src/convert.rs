use crate::config::{Config, EmphasisMode, SubtitleFormat};
use crate::error::{Result, SubconvError};
use crate::subtitle::detect::{detect_format, format_from_path};
use crate::subtitle::{create_formatter, Entry, Subtitle, SubtitleParser};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Options for one conversion run.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Input format; sniffed from the first line when `None`.
    pub input_format: Option<SubtitleFormat>,
    /// Output format; taken from the output extension when `None`.
    pub output_format: Option<SubtitleFormat>,
    /// Emphasis pass applied between parsing and writing.
    pub emphasis: EmphasisMode,
    /// Offset added to every start and end time, in milliseconds.
    pub shift_ms: i64,
    /// Log every colliding pair.
    pub report_collisions: bool,
}

impl ConvertOptions {
    /// Options seeded from the persisted configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            output_format: config.default_output_format,
            emphasis: config.emphasis,
            report_collisions: config.report_collisions,
            ..Default::default()
        }
    }
}

/// Result of a conversion.
#[derive(Debug)]
pub struct ConvertResult {
    /// Path of the written file (empty for in-memory conversions).
    pub output_path: PathBuf,
    pub input_format: SubtitleFormat,
    pub output_format: SubtitleFormat,
    /// Entries as they were written.
    pub entries: Vec<Entry>,
    /// Colliding pairs under the input format's rule, flattened.
    pub collisions: Vec<Entry>,
    /// Serialized output.
    pub output: String,
    pub elapsed: Duration,
}

#[derive(Serialize)]
struct CollisionPair<'a> {
    first: &'a Entry,
    second: &'a Entry,
}

#[derive(Serialize)]
struct CollisionReport<'a> {
    format: SubtitleFormat,
    pair_count: usize,
    pairs: Vec<CollisionPair<'a>>,
}

impl ConvertResult {
    pub fn collision_pairs(&self) -> impl Iterator<Item = (&Entry, &Entry)> {
        self.collisions
            .chunks_exact(2)
            .map(|pair| (&pair[0], &pair[1]))
    }

    /// Render the collision pairs as pretty JSON.
    pub fn collision_report_json(&self) -> Result<String> {
        let report = CollisionReport {
            format: self.input_format,
            pair_count: self.collisions.len() / 2,
            pairs: self
                .collision_pairs()
                .map(|(first, second)| CollisionPair { first, second })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&report)?)
    }
}

/// Convert an in-memory document from one format to another.
pub fn convert_str(
    text: &str,
    input_format: SubtitleFormat,
    output_format: SubtitleFormat,
    options: &ConvertOptions,
) -> Result<ConvertResult> {
    let start_time = Instant::now();

    let mut subtitle = Subtitle::create(input_format.identifier())?;
    subtitle.parse_str(text)?;
    info!(
        "Parsed {} {} entries",
        subtitle.contents().len(),
        input_format
    );

    if options.shift_ms != 0 {
        debug!("Shifting all entries by {} ms", options.shift_ms);
        subtitle.shift_all(options.shift_ms);
    }

    match options.emphasis {
        EmphasisMode::None => {}
        EmphasisMode::Apply => subtitle.apply_emphasis(),
        EmphasisMode::Strip => subtitle.strip_emphasis(),
    }

    let collisions = subtitle.collisions();
    if !collisions.is_empty() {
        warn!("Found {} colliding pairs", collisions.len() / 2);
        if options.report_collisions {
            for pair in collisions.chunks_exact(2) {
                warn!(
                    "Collision: [{}-{}] {:?} / [{}-{}] {:?}",
                    pair[0].time.start,
                    pair[0].time.end,
                    pair[0].dialogue,
                    pair[1].time.start,
                    pair[1].time.end,
                    pair[1].dialogue
                );
            }
        }
    }

    let formatter = create_formatter(output_format);
    let output = formatter.format(subtitle.contents());

    Ok(ConvertResult {
        output_path: PathBuf::new(),
        input_format,
        output_format,
        entries: subtitle.contents().to_vec(),
        collisions,
        output,
        elapsed: start_time.elapsed(),
    })
}

/// Convert `input` into `output`.
///
/// The input format is taken from the options, else sniffed from the first
/// line; the input extension is never consulted. The output format is taken
/// from the options, else from the output extension.
pub fn convert_file(input: &Path, output: &Path, options: &ConvertOptions) -> Result<ConvertResult> {
    let start_time = Instant::now();

    if !input.exists() {
        return Err(SubconvError::FileNotFound(input.display().to_string()));
    }

    let bytes = fs::read(input)?;
    let text = String::from_utf8_lossy(&bytes);
    debug!("Read {} bytes from {:?}", bytes.len(), input);

    let input_format = match options.input_format {
        Some(format) => format,
        None => resolve_input_format(&text, input)?,
    };

    // explicit option first, then the output extension
    let output_format = options
        .output_format
        .or_else(|| format_from_path(output))
        .ok_or_else(|| SubconvError::UnsupportedFormat(output.display().to_string()))?;

    info!("Converting {} -> {}", input_format, output_format);
    let mut result = convert_str(&text, input_format, output_format, options)?;

    let mut file = BufWriter::new(File::create(output)?);
    create_formatter(output_format).write(&result.entries, &mut file)?;
    file.flush()?;
    info!("Wrote {} entries to {:?}", result.entries.len(), output);

    result.output_path = output.to_path_buf();
    result.elapsed = start_time.elapsed();
    Ok(result)
}

fn resolve_input_format(text: &str, input: &Path) -> Result<SubtitleFormat> {
    match detect_format(text) {
        Some(format) => {
            debug!("Detected {} from first line", format);
            Ok(format)
        }
        None => Err(SubconvError::UndetectedFormat(input.display().to_string())),
    }
}

/// Print a summary of the conversion.
pub fn print_summary(result: &ConvertResult) {
    println!();
    println!("  Output:     {}", result.output_path.display());
    println!("  Formats:    {} -> {}", result.input_format, result.output_format);
    println!("  Entries:    {}", result.entries.len());
    println!("  Collisions: {}", result.collisions.len() / 2);
    println!("  Time:       {:.3}s", result.elapsed.as_secs_f64());
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRT: &str = "1\n00:00:01,000 --> 00:00:05,000\nFirst\n\n\
                       2\n00:00:04,000 --> 00:00:06,000\nSecond\n\n";

    #[test]
    fn test_convert_options_default() {
        let options = ConvertOptions::default();
        assert_eq!(options.input_format, None);
        assert_eq!(options.output_format, None);
        assert_eq!(options.emphasis, EmphasisMode::None);
        assert_eq!(options.shift_ms, 0);
    }

    #[test]
    fn test_options_from_config() {
        let config = Config {
            default_output_format: Some(SubtitleFormat::Ttml),
            emphasis: EmphasisMode::Strip,
            report_collisions: false,
        };
        let options = ConvertOptions::from_config(&config);
        assert_eq!(options.output_format, Some(SubtitleFormat::Ttml));
        assert_eq!(options.emphasis, EmphasisMode::Strip);
        assert!(!options.report_collisions);
    }

    #[test]
    fn test_convert_str_srt_to_ttml() {
        let result = convert_str(
            SRT,
            SubtitleFormat::Srt,
            SubtitleFormat::Ttml,
            &ConvertOptions::default(),
        )
        .unwrap();

        assert_eq!(result.entries.len(), 2);
        assert!(result
            .output
            .contains("<p begin=\"00:00:01.000\" end=\"00:00:05.000\">First</p>\n"));
        assert_eq!(result.collisions.len(), 2);
    }

    #[test]
    fn test_convert_str_applies_shift_and_emphasis() {
        let options = ConvertOptions {
            emphasis: EmphasisMode::Apply,
            shift_ms: 500,
            ..Default::default()
        };

        let result = convert_str(SRT, SubtitleFormat::Srt, SubtitleFormat::Srt, &options).unwrap();

        assert_eq!(result.entries[0].time.start, 1500);
        assert_eq!(result.entries[0].dialogue, "<i>First</i>");
        assert!(result.output.starts_with("1\n00:00:01,500 --> 00:00:05,500\n<i>First</i>\n\n"));
    }

    #[test]
    fn test_collision_report_json() {
        let result = convert_str(
            SRT,
            SubtitleFormat::Srt,
            SubtitleFormat::Srt,
            &ConvertOptions::default(),
        )
        .unwrap();

        let json = result.collision_report_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["format"], "srt");
        assert_eq!(value["pair_count"], 1);
        assert_eq!(value["pairs"][0]["first"]["dialogue"], "First");
        assert_eq!(value["pairs"][0]["second"]["time"]["start"], 4000);
    }

    #[test]
    fn test_resolve_input_format_ignores_input_extension() {
        let err = resolve_input_format("2\n00:00:01,000 --> 00:00:02,000\n", Path::new("episode.srt"))
            .unwrap_err();
        assert!(matches!(err, SubconvError::UndetectedFormat(_)));

        let format = resolve_input_format("[Script Info]\n", Path::new("captions.txt")).unwrap();
        assert_eq!(format, SubtitleFormat::Ssa);
    }
}
