//! Terminal helpers for the orval-forge binary
//!
//! Provides shared CLI functionality:
//! - Status messages and coded error output
//! - Spinners for the generator run

#![warn(missing_docs)]

pub mod output;
pub mod progress;

pub use output::{format_count, format_duration, print_error, Status};
