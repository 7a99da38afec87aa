//! Command-line interface for voicserve
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Speech-to-text server backed by whisper.cpp
#[derive(Parser, Debug)]
#[command(
    name = "voicserve",
    version,
    about = "Speech-to-text over HTTP and WebSocket, backed by whisper.cpp"
)]
pub struct Cli {
    /// Subcommand to execute (default: serve)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Run the HTTP and WebSocket server
    Serve {
        /// Listen address (overrides config)
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(long, short = 'p', value_name = "PORT")]
        port: Option<u16>,
    },

    /// List models found in the model directory
    Models,

    /// Check the whisper.cpp installation and directories
    Check,

    /// Transcribe a 16kHz WAV file with the single-shot engine
    Transcribe {
        /// WAV file to transcribe
        #[arg(value_name = "WAV")]
        file: PathBuf,

        /// Model name or file (default from config)
        #[arg(long, short = 'm', value_name = "MODEL")]
        model: Option<String>,
    },
}
