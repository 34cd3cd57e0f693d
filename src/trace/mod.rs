//! Captured exceptions and their stack traces
//!
//! [`ExceptionInfo`] is an immutable value describing an exception after the
//! stack has unwound: a type tag, a message and the ordered frame list
//! (outermost call first, innermost last). It can be built from a panic,
//! from any [`std::error::Error`], or by hand.

pub mod filter;
pub mod inspector;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};

pub use filter::{FilterPolicy, is_important};
pub use inspector::{DiagnosticFields, TracebackInspector};

/// Type tag given to exceptions captured from panics
pub const PANIC_TYPE: &str = "panic";

static FRAME_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\d+:\s+(?P<function>.+?)\s*$").expect("valid regex"));
static FRAME_LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s+at\s+(?P<file>.+?):(?P<line>\d+)(?::\d+)?\s*$").expect("valid regex")
});

/// Frames from these paths are runtime plumbing, not user code
const INTERNAL_PREFIXES: [&str; 10] = [
    "std::",
    "core::",
    "alloc::",
    "test::",
    "backtrace::",
    "rust_begin_unwind",
    "__rust",
    "__libc_start",
    "pipeline_tickets::trace::",
    "pipeline_tickets::excepthook::",
];

/// A single stack frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub file: PathBuf,
    pub line: u32,
    pub function: String,
}

impl Frame {
    pub fn new(file: impl Into<PathBuf>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }
}

/// Thread and process that raised an exception
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Origin {
    /// Opaque thread identifier, unique within the process
    pub thread_id: String,
    pub thread_name: String,
    pub process_id: u32,
    pub process_name: String,
}

impl Origin {
    /// Identity of the calling thread and process
    pub fn current() -> Self {
        let thread = std::thread::current();
        let process_name = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "<unknown>".to_string());

        Self {
            thread_id: format!("{:?}", thread.id()),
            thread_name: thread.name().unwrap_or("<unnamed>").to_string(),
            process_id: std::process::id(),
            process_name,
        }
    }
}

/// An exception captured as an explicit value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionInfo {
    type_name: String,
    message: String,
    frames: Vec<Frame>,
    origin: Origin,
}

impl ExceptionInfo {
    /// Build an exception from parts, raised on the calling thread
    pub fn new(type_name: impl Into<String>, message: impl Into<String>, frames: Vec<Frame>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
            frames,
            origin: Origin::current(),
        }
    }

    /// Replace the recorded origin
    #[must_use]
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Capture a panic as reported to a panic hook
    pub fn from_panic(info: &PanicHookInfo<'_>, backtrace: &Backtrace) -> Self {
        let payload = info.payload();
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Box<dyn Any>".to_string()
        };

        let mut frames = parse_backtrace(&backtrace.to_string());
        if let Some(location) = info.location() {
            let at_location = frames.last().is_some_and(|frame| {
                frame.line == location.line() && frame.file.ends_with(location.file())
            });
            if !at_location {
                frames.push(Frame::new(location.file(), location.line(), "<unknown>"));
            }
        }

        Self::new(PANIC_TYPE, message, frames)
    }

    /// Capture an error value together with the current call stack
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + ?Sized,
    {
        let frames = parse_backtrace(&Backtrace::force_capture().to_string());
        Self::new(short_type_name::<E>(), error.to_string(), frames)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Frames ordered outermost first
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub const fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Format as a single multi-line string: the `type: message` header
    /// followed by every frame, outermost first.
    ///
    /// The output only depends on type, message and frames, so it is used
    /// verbatim as the deduplication key.
    pub fn format(&self) -> String {
        let mut out = format!("{}: {}", self.type_name, self.message);
        if !self.frames.is_empty() {
            out.push_str("\nTraceback (most recent call last):");
            for frame in &self.frames {
                out.push_str(&format!(
                    "\n  File \"{}\", line {}, in {}",
                    display_path(&frame.file),
                    frame.line,
                    frame.function
                ));
            }
        }
        out.trim_end_matches('\n').to_string()
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Last path segment of a type name, without generic arguments
fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn is_internal(function: &str) -> bool {
    let function = function.trim_start_matches('<');
    INTERNAL_PREFIXES.iter().any(|p| function.starts_with(p))
}

/// Parse the display form of a [`Backtrace`] into user frames, outermost first
///
/// Frames without a source location and runtime frames are dropped.
pub fn parse_backtrace(text: &str) -> Vec<Frame> {
    let mut frames = Vec::new();
    let mut function: Option<String> = None;

    for line in text.lines() {
        if let Some(caps) = FRAME_LOCATION.captures(line) {
            let Some(name) = function.take() else {
                continue;
            };
            if is_internal(&name) {
                continue;
            }
            let line_no = caps["line"].parse().unwrap_or_default();
            frames.push(Frame::new(&caps["file"], line_no, name));
        } else if let Some(caps) = FRAME_FUNCTION.captures(line) {
            function = Some(caps["function"].to_string());
        }
    }

    frames.reverse();
    frames
}
