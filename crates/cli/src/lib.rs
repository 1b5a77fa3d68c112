//! Terminal helpers for the portmatch command line
//!
//! Provides shared CLI functionality:
//! - Status messages
//! - Port and score formatting
//! - Progress indicators for batch runs

#![warn(missing_docs)]

pub mod output;
pub mod progress;
