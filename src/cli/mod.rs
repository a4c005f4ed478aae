use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "transcript",
    about = "Transcript Cascade - fetch caption transcripts for video URLs",
    version,
    long_about = "Fetches the caption transcript of a video by trying a built-in cache, the primary caption service, a list of HTTP mirrors and finally the public video page, returning the first usable result."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Configuration file (defaults to ./transcript-cascade.yaml or the user config dir)
    #[arg(short, long, global = true, env = "TRANSCRIPT_CASCADE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the transcript for a video URL
    Fetch {
        /// Video URL (watch, short-link or embed form)
        #[arg(value_name = "URL")]
        url: String,

        /// Output file path (prints to console if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the video id found in a URL
    Extract {
        #[arg(value_name = "URL")]
        url: String,
    },

    /// Check which video ids currently yield a transcript
    Probe {
        /// Video ids to check (defaults to the built-in demonstration ids)
        #[arg(value_name = "VIDEO_ID")]
        ids: Vec<String>,
    },

    /// List the source tiers in the order they are tried
    Sources,

    /// Show or initialise the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,

        /// Write the default configuration to the user config dir
        #[arg(long, conflicts_with = "show")]
        init: bool,
    },
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON with the video id and source tier
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_fetch() {
        let cli = Cli::parse_from(["transcript", "fetch", "https://youtu.be/dQw4w9WgXcQ", "-f", "json"]);
        match cli.command {
            Commands::Fetch { url, format, output } => {
                assert_eq!(url, "https://youtu.be/dQw4w9WgXcQ");
                assert!(matches!(format, OutputFormat::Json));
                assert!(output.is_none());
            }
            _ => panic!("expected fetch command"),
        }
    }
}
