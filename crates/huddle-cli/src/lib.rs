//! Command-line client for Huddle chat.
//!
//! A thin shell over [`huddle_app::Driver`] that provides line-based terminal
//! I/O. All orchestration logic lives in the generic [`huddle_app::Runtime`];
//! this crate only parses input, prints transcripts and loads settings.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod commands;
pub mod error;
pub mod line;
pub mod settings;

pub use error::CliError;
pub use line::{Input, LineDriver, parse_line};
pub use settings::{FileConfig, Settings};
