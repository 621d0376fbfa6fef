//! Error interfaces for this crate.
//!
//! Every diagnostic raised by the assembler pipeline implements the
//! [`Error`] trait, which extends [`std::error::Error`] with the location
//! information and help messages a reporting frontend needs.

use std::borrow::Cow;

/// A crate error, with accessors for the information a reporter would
/// want to surface alongside the message.
pub trait Error: std::error::Error {
    /// The line of the (expanded) source this error occurred at,
    /// if it is known.
    fn line(&self) -> Option<usize> {
        None
    }

    /// A possible help message to guide the user in fixing the error.
    fn help(&self) -> Option<Cow<str>> {
        None
    }
}

/// Formats an error in the `line N: message (help)` shape used by
/// diagnostic output.
pub fn report<E: Error + ?Sized>(err: &E) -> String {
    let mut out = String::new();
    if let Some(line) = err.line() {
        out.push_str(&format!("line {line}: "));
    }
    out.push_str(&err.to_string());
    if let Some(help) = err.help() {
        out.push_str(&format!(" ({help})"));
    }
    out
}
