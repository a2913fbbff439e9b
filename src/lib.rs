pub mod config;
pub mod convert;
pub mod error;
pub mod subtitle;

pub use config::{Config, EmphasisMode, SubtitleFormat};
pub use convert::{convert_file, convert_str, print_summary, ConvertOptions, ConvertResult};
pub use error::{Result, SubconvError};
pub use subtitle::{create_formatter, Entry, Subtitle, SubtitleFormatter, SubtitleParser, Time};
