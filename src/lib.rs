//! genfast: cached, concurrent execution of go:generate directives
//!
//! Scans a source tree for `//<family>:generate` directives, asks a plugin
//! which files each directive depends on and where it writes, and runs only
//! the directives whose fingerprint or output patterns changed since their
//! last successful run.

pub mod cache;
pub mod cli;
pub mod config;
pub mod directive;
pub mod error;
pub mod fingerprint;
pub mod generation;
pub mod logging;
pub mod plugin;
pub mod scan;
pub mod types;
