//! Command line argument parsing

use crate::core::DownloadKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// vdl - managed video downloads over a yt-dlp compatible tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video URL
    pub url: String,

    /// Download kind
    #[arg(short, long, value_enum, default_value = "video")]
    pub kind: KindArg,

    /// Format id to download (defaults to the first listed format)
    #[arg(short, long, value_name = "ID")]
    pub format: Option<String>,

    /// Output directory (defaults to the user's Downloads directory)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// List available formats and exit
    #[arg(short = 'F', long)]
    pub list_formats: bool,

    /// Save the video thumbnail next to the download
    #[arg(long)]
    pub save_thumbnail: bool,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Timeout for metadata and listing fetches (e.g. 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Explicit path to the external tool binary
    #[arg(long, value_name = "PATH")]
    pub tool_path: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Download kind flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Muxed video+audio
    Video,
    /// Audio-only extraction
    Audio,
}

impl From<KindArg> for DownloadKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Video => DownloadKind::Video,
            KindArg::Audio => DownloadKind::Audio,
        }
    }
}

impl Args {
    /// Get the fetch timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    /// Get the selected download kind
    pub fn download_kind(&self) -> DownloadKind {
        self.kind.into()
    }

    /// Resolve the output directory, defaulting to the Downloads folder
    pub fn output_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
        })
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}
