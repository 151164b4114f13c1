//! Errors raised while interpreting a printer stream
//!
//! Only two conditions abort a run: a parameter block cut short by the
//! end of the stream, and an unknown encoding named at startup. Every
//! other malformed input is clamped, truncated or skipped so that any
//! plausible printer stream still yields a document.

use std::io;

use displaydoc::Display;
use thiserror::Error;

/// Fatal interpreter errors
#[derive(Debug, Display, Error)]
pub enum Error {
    /// end of stream inside `{0}` parameter block
    Truncated(&'static str),
    /// failed to read from the printer stream
    Io(#[from] io::Error),
    /// encoding `{0}` is not installed in the registry
    UnknownEncoding(String),
}

/// Per-command outcome inside the dispatcher.
///
/// Recoverable conditions are logged at `warn` and never leave
/// [`Interpreter::run`](crate::interp::Interpreter::run); only
/// [`Error`] values propagate to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Command executed (or deliberately had no effect)
    Ok,
    /// Unknown selector skipped
    Skipped,
}
