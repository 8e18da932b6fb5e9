use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        /// Address to bind (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the video id for a YouTube URL
    Resolve {
        /// Video URL
        #[arg(short, long)]
        url: String,
    },

    /// Fetch and print the caption track of a video
    Captions {
        /// Video URL
        #[arg(short, long)]
        url: String,

        /// Caption language
        #[arg(short, long)]
        lang: Option<String>,

        /// Print the track as JSON
        #[arg(long)]
        json: bool,
    },

    /// Translate texts in one batch
    Translate {
        /// Target language
        #[arg(short, long)]
        target: Option<String>,

        /// Source language ("auto" to detect)
        #[arg(short, long)]
        source: Option<String>,

        /// Texts to translate
        #[arg(required = true)]
        texts: Vec<String>,
    },

    /// Show captions and translations in time with a simulated player
    Play {
        /// Video URL
        #[arg(short, long)]
        url: String,

        /// Caption language
        #[arg(short, long)]
        lang: Option<String>,

        /// Target language
        #[arg(short, long)]
        target: Option<String>,

        /// Start position in seconds
        #[arg(long, default_value = "0")]
        start: f64,

        /// Playback rate
        #[arg(long, default_value = "1")]
        rate: f64,

        /// Clock sampling interval in milliseconds (overrides config)
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Write a bilingual SRT file for a video
    Export {
        /// Video URL
        #[arg(short, long)]
        url: String,

        /// Caption language
        #[arg(short, long)]
        lang: Option<String>,

        /// Target language
        #[arg(short, long)]
        target: Option<String>,

        /// Output SRT file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write the default configuration as TOML
    Init {
        /// Output file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}
