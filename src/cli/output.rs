//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::RunError;
use std::error::Error;

/// Map a fatal error to the message printed before exiting.
///
/// Includes the source chain so cache and configuration failures show
/// their underlying cause.
pub fn map_error(e: &RunError) -> String {
    let mut message = format!("error: {}", e);
    let mut source = e.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(&format!("\n  caused by: {}", cause_text));
        }
        source = cause.source();
    }
    message
}
