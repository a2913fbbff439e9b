use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use subconv::config::{Config, EmphasisMode, SubtitleFormat};
use subconv::convert::{convert_file, print_summary, ConvertOptions};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "subconv")]
#[command(version, about = "Convert subtitles between SRT, SAMI, SSA and TTML")]
#[command(long_about = "Convert subtitle files between SubRip (.srt), SAMI (.smi), \
Sub Station Alpha (.ass) and TTML (.ttml). The input format is detected from the \
first line of the file, the output format from the output file extension.")]
struct Cli {
    /// Input subtitle file
    input: PathBuf,

    /// Output subtitle file
    output: PathBuf,

    /// Input format: srt, smi, ass, ttml (detected when omitted)
    #[arg(long)]
    from: Option<String>,

    /// Output format: srt, smi, ass, ttml (taken from the output extension when omitted)
    #[arg(long)]
    to: Option<String>,

    /// Emphasis pass: none, apply, strip
    #[arg(short, long)]
    emphasis: Option<String>,

    /// Shift every timestamp by this many milliseconds (may be negative)
    #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
    shift: i64,

    /// Log every colliding pair
    #[arg(short, long)]
    collisions: bool,

    /// Print the collision pairs as JSON to stdout
    #[arg(long)]
    collisions_json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn parse_format(value: Option<&str>) -> Result<Option<SubtitleFormat>> {
    value
        .map(|v| v.parse().map_err(|e: String| anyhow::anyhow!(e)))
        .transpose()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Validate input file exists
    if !cli.input.exists() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }

    let config = Config::load().context("Failed to load configuration")?;
    let mut options = ConvertOptions::from_config(&config);

    options.input_format = parse_format(cli.from.as_deref())?;
    if let Some(format) = parse_format(cli.to.as_deref())? {
        options.output_format = Some(format);
    } else if subconv::subtitle::detect::format_from_path(&cli.output).is_some() {
        // the output extension wins over the configured default
        options.output_format = None;
    }
    if let Some(ref emphasis) = cli.emphasis {
        options.emphasis = emphasis
            .parse::<EmphasisMode>()
            .map_err(|e| anyhow::anyhow!(e))?;
    }
    options.shift_ms = cli.shift;
    options.report_collisions |= cli.collisions;

    info!("Input:    {}", cli.input.display());
    info!("Output:   {}", cli.output.display());
    info!("Emphasis: {}", options.emphasis);

    let result = convert_file(&cli.input, &cli.output, &options).with_context(|| {
        format!(
            "Failed to convert {} to {}",
            cli.input.display(),
            cli.output.display()
        )
    })?;

    if cli.collisions_json {
        println!("{}", result.collision_report_json()?);
    } else {
        print_summary(&result);
    }

    Ok(())
}
