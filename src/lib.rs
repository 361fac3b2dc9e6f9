//! # vdl - Managed Video Downloads
//!
//! Core library for browsing and downloading remote videos through a
//! yt-dlp compatible command-line tool.
//!
//! ## Features
//!
//! - Format-listing parsing into typed, sorted video/audio records
//! - One-shot metadata fetch (title, duration, uploader, thumbnail)
//! - Supervised downloads with live progress events
//! - Cooperative cancellation with bounded graceful shutdown
//! - Single-flight download contract
//!
//! ## Example
//!
//! ```rust,no_run
//! use vdl::{DownloadJob, DownloadKind, DownloadSupervisor, ToolRunner};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runner = ToolRunner::discover();
//!     let metadata = runner.fetch_metadata("VIDEO_URL").await?;
//!     let catalog = runner.fetch_listing("VIDEO_URL").await?;
//!
//!     let supervisor = DownloadSupervisor::new(runner.tool_path().to_path_buf());
//!     let job = DownloadJob {
//!         url: "VIDEO_URL".to_string(),
//!         kind: DownloadKind::Video,
//!         format_id: catalog.video[0].id.clone(),
//!         output_dir: "./downloads".into(),
//!     };
//!     let mut events = supervisor.start(job)?;
//!     while let Some(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!     println!("Downloaded: {}", metadata.title);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod download;
pub mod error;
pub mod tool;
pub mod utils;

// Re-export main types
pub use crate::core::{DownloadKind, FormatCatalog, FormatRecord, FormatStore, VideoMetadata};
pub use crate::download::{DownloadEvent, DownloadJob, DownloadOutcome, DownloadSupervisor};
pub use crate::error::VdlError;
pub use crate::tool::ToolRunner;

/// Result type alias for vdl operations
pub type Result<T> = std::result::Result<T, VdlError>;
