//! Core utilities for orval-forge
//!
//! This crate provides shared functionality used across the workspace:
//!
//! - **Error handling**: Coded errors with context and recovery suggestions
//! - **Retry policy**: Fixed or exponential backoff for flaky operations
//! - **Process execution**: Locating and running the external code generator
//!
//! # Example
//!
//! ```rust,no_run
//! use forge_core::{process, Error};
//!
//! if !process::command_exists("orval") {
//!     eprintln!("{}", Error::command_not_found("orval"));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod process;
pub mod retry;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::{retry, RetryConfig, RetryResult};
}
