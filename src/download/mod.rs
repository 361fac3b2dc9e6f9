//! Download system for vdl

pub mod supervisor;

pub use supervisor::*;
