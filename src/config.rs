use crate::error::{Result, SubconvError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One of the four supported timed-text formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    #[default]
    Srt,
    Sami,
    Ssa,
    Ttml,
}

impl std::fmt::Display for SubtitleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubtitleFormat::Srt => write!(f, "srt"),
            SubtitleFormat::Sami => write!(f, "sami"),
            SubtitleFormat::Ssa => write!(f, "ssa"),
            SubtitleFormat::Ttml => write!(f, "ttml"),
        }
    }
}

impl std::str::FromStr for SubtitleFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_lowercase().as_str() {
            "srt" => Ok(SubtitleFormat::Srt),
            "smi" | "sami" => Ok(SubtitleFormat::Sami),
            "ass" | "ssa" => Ok(SubtitleFormat::Ssa),
            "ttml" => Ok(SubtitleFormat::Ttml),
            _ => Err(format!(
                "Unknown format: {}. Use 'srt', 'smi', 'ass', or 'ttml'",
                s
            )),
        }
    }
}

impl SubtitleFormat {
    pub const ALL: [SubtitleFormat; 4] = [
        SubtitleFormat::Srt,
        SubtitleFormat::Sami,
        SubtitleFormat::Ssa,
        SubtitleFormat::Ttml,
    ];

    /// File extension without the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => "srt",
            SubtitleFormat::Sami => "smi",
            SubtitleFormat::Ssa => "ass",
            SubtitleFormat::Ttml => "ttml",
        }
    }

    /// The dotted identifier (`.srt`, `.smi`, `.ass`, `.ttml`) used by the selector.
    pub fn identifier(&self) -> &'static str {
        match self {
            SubtitleFormat::Srt => ".srt",
            SubtitleFormat::Sami => ".smi",
            SubtitleFormat::Ssa => ".ass",
            SubtitleFormat::Ttml => ".ttml",
        }
    }

    /// Strict lookup by extension; only the four canonical extensions match.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(ext))
    }
}

/// Bulk markup pass applied between parsing and writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmphasisMode {
    #[default]
    None,
    Apply,
    Strip,
}

impl std::fmt::Display for EmphasisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmphasisMode::None => write!(f, "none"),
            EmphasisMode::Apply => write!(f, "apply"),
            EmphasisMode::Strip => write!(f, "strip"),
        }
    }
}

impl std::str::FromStr for EmphasisMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(EmphasisMode::None),
            "apply" => Ok(EmphasisMode::Apply),
            "strip" => Ok(EmphasisMode::Strip),
            _ => Err(format!(
                "Unknown emphasis mode: {}. Use 'none', 'apply', or 'strip'",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Used when the output path carries no recognised extension.
    pub default_output_format: Option<SubtitleFormat>,
    pub emphasis: EmphasisMode,
    pub report_collisions: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_output_format: None,
            emphasis: EmphasisMode::default(),
            report_collisions: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        // Load from config file if it exists
        if let Some(config_path) = Self::config_file_path() {
            if config_path.exists() {
                let contents = std::fs::read_to_string(&config_path)?;
                if let Ok(file_config) = toml::from_str::<Config>(&contents) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables
        if let Ok(format) = std::env::var("SUBCONV_DEFAULT_FORMAT") {
            let format = format.parse().map_err(SubconvError::Config)?;
            config.default_output_format = Some(format);
        }
        if let Ok(emphasis) = std::env::var("SUBCONV_EMPHASIS") {
            config.emphasis = emphasis.parse().map_err(SubconvError::Config)?;
        }
        if let Ok(report) = std::env::var("SUBCONV_REPORT_COLLISIONS") {
            config.report_collisions = report.parse().map_err(|_| {
                SubconvError::Config(format!(
                    "SUBCONV_REPORT_COLLISIONS must be 'true' or 'false', got '{}'",
                    report
                ))
            })?;
        }

        Ok(config)
    }

    fn config_file_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("subconv").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("srt".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Srt);
        assert_eq!(".smi".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Sami);
        assert_eq!("SAMI".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Sami);
        assert_eq!("ass".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Ssa);
        assert_eq!("ssa".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Ssa);
        assert_eq!(".TTML".parse::<SubtitleFormat>().unwrap(), SubtitleFormat::Ttml);
        assert!("vtt".parse::<SubtitleFormat>().is_err());
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(SubtitleFormat::Srt.extension(), "srt");
        assert_eq!(SubtitleFormat::Sami.extension(), "smi");
        assert_eq!(SubtitleFormat::Ssa.extension(), "ass");
        assert_eq!(SubtitleFormat::Ttml.extension(), "ttml");
        assert_eq!(SubtitleFormat::Sami.identifier(), ".smi");
    }

    #[test]
    fn test_from_extension_is_strict() {
        assert_eq!(SubtitleFormat::from_extension(".srt"), Some(SubtitleFormat::Srt));
        assert_eq!(SubtitleFormat::from_extension("ASS"), Some(SubtitleFormat::Ssa));
        assert_eq!(SubtitleFormat::from_extension("ssa"), None);
        assert_eq!(SubtitleFormat::from_extension(""), None);
    }

    #[test]
    fn test_emphasis_parsing() {
        assert_eq!("apply".parse::<EmphasisMode>().unwrap(), EmphasisMode::Apply);
        assert_eq!("STRIP".parse::<EmphasisMode>().unwrap(), EmphasisMode::Strip);
        assert!("bold".parse::<EmphasisMode>().is_err());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.default_output_format, None);
        assert_eq!(config.emphasis, EmphasisMode::None);
        assert!(!config.report_collisions);
    }

    #[test]
    fn test_config_from_toml() {
        let config: Config =
            toml::from_str("default_output_format = \"ttml\"\nemphasis = \"strip\"\n").unwrap();
        assert_eq!(config.default_output_format, Some(SubtitleFormat::Ttml));
        assert_eq!(config.emphasis, EmphasisMode::Strip);
        assert!(!config.report_collisions);

        let config: Config = toml::from_str("report_collisions = true\n").unwrap();
        assert!(config.report_collisions);
    }
}
