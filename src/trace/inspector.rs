//! Diagnostic extraction from captured stack traces

use super::{ExceptionInfo, Frame, display_path};
use crate::error::{Result, TicketsError};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Marker files that make a directory part of a dotted module path
pub const DEFAULT_PACKAGE_MARKERS: [&str; 2] = ["__init__.py", "mod.rs"];

const UNKNOWN_MODULE: &str = "<unknown>";

/// Diagnostic fields describing where an exception was raised
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticFields {
    pub file: String,
    pub module: Option<String>,
    pub thread_id: String,
    pub thread_name: String,
    pub process_id: u32,
    pub process_name: String,
    pub line: u32,
    pub function: String,
    pub culprit: String,
}

impl DiagnosticFields {
    /// Key/value pairs merged into a ticket's context
    pub fn context_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("file", self.file.clone()),
            (
                "module",
                self.module.clone().unwrap_or_else(|| UNKNOWN_MODULE.to_string()),
            ),
            ("thread_id", self.thread_id.clone()),
            ("thread_name", self.thread_name.clone()),
            ("process_id", self.process_id.to_string()),
            ("process_name", self.process_name.clone()),
            ("line", self.line.to_string()),
            ("function", self.function.clone()),
            ("culprit", self.culprit.clone()),
        ]
    }
}

/// Reads frames and resolves module names against the filesystem
#[derive(Debug, Clone)]
pub struct TracebackInspector {
    markers: Vec<String>,
}

impl Default for TracebackInspector {
    fn default() -> Self {
        Self::new(DEFAULT_PACKAGE_MARKERS.iter().map(ToString::to_string).collect())
    }
}

impl TracebackInspector {
    pub const fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }

    /// The innermost (last) frame of a trace
    pub fn innermost_frame<'a>(&self, frames: &'a [Frame]) -> Result<&'a Frame> {
        frames.last().ok_or(TicketsError::EmptyTraceback)
    }

    /// Dotted module path of a source file
    ///
    /// Starts from the file stem and prepends each parent directory for as
    /// long as that directory holds a package marker. Returns `None` when a
    /// directory cannot be listed.
    pub fn module_name(&self, path: &Path) -> Option<String> {
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        let path = std::path::absolute(path).ok()?;

        let mut parts = vec![stem];
        let mut dir = path.parent();
        while let Some(current) = dir {
            if !self.has_marker(current).ok()? {
                break;
            }
            let Some(name) = current.file_name() else {
                break;
            };
            parts.push(name.to_string_lossy().into_owned());
            dir = current.parent();
        }

        parts.reverse();
        Some(parts.join("."))
    }

    fn has_marker(&self, dir: &Path) -> std::io::Result<bool> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if self
                .markers
                .iter()
                .any(|marker| entry.file_name().to_str() == Some(marker.as_str()))
            {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Extract diagnostics from the innermost frame of an exception
    pub fn extract_details(&self, exc: &ExceptionInfo) -> Result<DiagnosticFields> {
        let frame = self.innermost_frame(exc.frames())?;
        let module = self.module_name(&frame.file);
        let origin = exc.origin();
        let culprit = format!(
            "{}.{}",
            module.as_deref().unwrap_or(UNKNOWN_MODULE),
            frame.function
        );

        Ok(DiagnosticFields {
            file: display_path(&frame.file),
            module,
            thread_id: origin.thread_id.clone(),
            thread_name: origin.thread_name.clone(),
            process_id: origin.process_id,
            process_name: origin.process_name.clone(),
            line: frame.line,
            function: frame.function.clone(),
            culprit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    #[test]
    fn test_innermost_frame() {
        let inspector = TracebackInspector::default();
        let frames = vec![Frame::new("a.py", 1, "outer"), Frame::new("b.py", 2, "inner")];
        assert_eq!(inspector.innermost_frame(&frames).unwrap().function, "inner");
        assert!(matches!(
            inspector.innermost_frame(&[]),
            Err(TicketsError::EmptyTraceback)
        ));
    }

    #[test]
    fn test_module_name_walks_package_markers() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("pkg/sub/file.py"));
        touch(&root.join("pkg/sub/__init__.py"));
        touch(&root.join("pkg/__init__.py"));

        let inspector = TracebackInspector::default();
        assert_eq!(
            inspector.module_name(&root.join("pkg/sub/file.py")),
            Some("pkg.sub.file".to_string())
        );
    }

    #[test]
    fn test_module_name_stops_at_first_unmarked_dir() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("pkg/sub/file.py"));
        touch(&root.join("pkg/sub/__init__.py"));

        let inspector = TracebackInspector::default();
        assert_eq!(
            inspector.module_name(&root.join("pkg/sub/file.py")),
            Some("sub.file".to_string())
        );
    }

    #[test]
    fn test_module_name_for_rust_modules() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        touch(&root.join("cli/handlers/submit.rs"));
        touch(&root.join("cli/handlers/mod.rs"));
        touch(&root.join("cli/mod.rs"));

        let inspector = TracebackInspector::default();
        assert_eq!(
            inspector.module_name(&root.join("cli/handlers/submit.rs")),
            Some("cli.handlers.submit".to_string())
        );
    }

    #[test]
    fn test_module_name_of_unreadable_dir_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("gone/file.py");
        assert_eq!(TracebackInspector::default().module_name(&missing), None);
    }

    #[test]
    fn test_extract_details() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        let file = root.join("tools/export.py");
        touch(&file);
        touch(&root.join("tools/__init__.py"));

        let exc = ExceptionInfo::new(
            "KeyError",
            "'frame'",
            vec![Frame::new("/bin/launch.py", 1, "<module>"), Frame::new(&file, 27, "write")],
        );
        let details = TracebackInspector::default().extract_details(&exc).unwrap();

        assert_eq!(details.module.as_deref(), Some("tools.export"));
        assert_eq!(details.line, 27);
        assert_eq!(details.function, "write");
        assert_eq!(details.culprit, "tools.export.write");
        assert_eq!(details.process_id, std::process::id());
        assert!(!details.file.contains('\\'));
    }

    #[test]
    fn test_extract_details_unknown_module() {
        let exc = ExceptionInfo::new(
            "panic",
            "boom",
            vec![Frame::new("/definitely/not/here.rs", 3, "run")],
        );
        let details = TracebackInspector::default().extract_details(&exc).unwrap();
        assert_eq!(details.module, None);
        assert_eq!(details.culprit, "<unknown>.run");
    }
}
