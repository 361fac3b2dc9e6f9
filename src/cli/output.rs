//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::{DownloadKind, FormatRecord, VideoMetadata};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

/// The bar tracks a 0.0..=1.0 fraction; scale it for smooth movement.
const BAR_SCALE: u64 = 1000;

/// Output formatter for vdl
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    progress_bar: Option<ProgressBar>,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: None,
        }
    }

    /// Create a fraction-driven progress bar for the download
    pub fn create_progress_bar(&mut self) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")
            .unwrap()
            .progress_chars("#>-");

        let progress_bar = ProgressBar::new(BAR_SCALE);
        progress_bar.set_style(style);
        progress_bar.set_message("Starting download...");
        self.progress_bar = Some(progress_bar);
    }

    /// Move the progress bar to a new fraction with its status line
    pub fn update_progress(&self, fraction: f32, status: &str) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.set_position((fraction * BAR_SCALE as f32) as u64);
            progress_bar.set_message(status.trim().to_string());
        }
    }

    /// Finish the progress bar
    pub fn finish_progress(&self, message: &str) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.finish_with_message(message.to_string());
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("✅ {}", message.green());
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("⚠️  {}", message.yellow());
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ {}", message.red());
    }

    /// Print debug message
    pub fn debug(&self, message: &str) {
        if self.verbosity == VerbosityLevel::Verbose {
            println!("   {}", message.dimmed());
        }
    }

    /// Print video metadata
    pub fn print_metadata(&self, metadata: &VideoMetadata) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!("📹 {}", metadata.title.bold());
        println!("⏱️  {}", metadata.duration_string());
        if let Some(uploader) = &metadata.uploader {
            println!("📺 {}", uploader);
        }
        println!();
    }

    /// Print the format records for one download kind
    pub fn print_formats(&self, kind: DownloadKind, records: &[FormatRecord]) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        if records.is_empty() {
            println!("❌ No {} formats found", kind.as_str());
            return;
        }

        println!("⚙️  Available {} formats:", kind.as_str());
        for record in records {
            println!(
                "  📋 {} ({}) | {}",
                record.id.cyan(),
                record.extension,
                record.summary(kind)
            );
        }
        println!();
    }

    /// Print download start message
    pub fn print_download_start(&self, url: &str, format_id: &str) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!("🚀 Starting download - Format: {}", format_id.bold());
        println!("🔗 URL: {}", url);
        println!();
    }
}
