//! Utility functions for vdl

pub mod filename;
pub mod url;

pub use filename::*;
pub use url::*;
