//! Release checking for relcheck.
//!
//! This crate holds everything below the UI toolkit:
//! - An incremental JSON parser fed straight from the HTTP body stream.
//! - Release manifest filtering against the running build's revision.
//! - The check orchestrator with its non-blocking lock and next-check
//!   scheduling.
//! - Background/foreground hand-off and the result dialog state machine.

pub mod build_info;
mod checker;
pub mod dialog;
pub mod dispatch;
mod error;
mod fetch;
mod foreground;
pub mod json_stream;
mod lock;
mod manifest;
pub mod options;

pub use build_info::BuildInfo;
/// Orchestrator entry point and user-facing messages.
pub use checker::{
    CheckOutcome, DEFAULT_APP_NAME, VersionChecker, error_message, result_headline,
    unknown_error_message,
};
pub use dialog::{CloseReason, DialogElement, DialogEvent, DialogRenderer, ResultDialog};
pub use dispatch::{Background, Foreground, UiCommand, foreground_queue};
pub use error::CheckError;
/// Manifest transport.
pub use fetch::{HttpReleaseFeed, ReleaseFeed, UPDATE_ENDPOINT, USER_AGENT};
pub use foreground::ForegroundLoop;
pub use json_stream::{JsonStreamError, JsonStreamParser};
pub use lock::{CheckGuard, CheckLock};
pub use manifest::{ReleaseRecord, UpdateDescription, filter_releases, parse_manifest};
pub use options::{AUTO_CHECK_KEY, MemoryOptions, NEXT_CHECK_KEY, OptionsStore};
