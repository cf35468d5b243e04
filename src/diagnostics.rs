//! Diagnostics: user-facing messages keyed to source locations
//!
//! The generator reports through a `Messager` rather than returning strings,
//! so a host build tool can route messages to its own console. Diagnostics
//! are separate from logging: `TracingMessager` bridges the two for hosts
//! that only want logs.

use serde::Serialize;
use std::cell::RefCell;
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Where a declaration lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceLocation {
    /// Declaration file, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Line within the file, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Qualified name of the type or method
    pub element: String,
}

impl SourceLocation {
    pub fn new(element: impl Into<String>) -> Self {
        Self {
            file: None,
            line: None,
            element: element.into(),
        }
    }

    pub fn with_line(mut self, line: Option<u32>) -> Self {
        self.line = line;
        self
    }

    pub fn with_file(mut self, file: Option<String>) -> Self {
        self.file = file;
        self
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.file, self.line) {
            (Some(file), Some(line)) => write!(f, "{}:{} ({})", file, line, self.element),
            (Some(file), None) => write!(f, "{} ({})", file, self.element),
            (None, Some(line)) => write!(f, "line {} ({})", line, self.element),
            (None, None) => write!(f, "{}", self.element),
        }
    }
}

/// A reported message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {}: {}", loc, self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Receives diagnostics
pub trait Messager {
    fn print_message(&self, severity: Severity, message: &str, location: Option<&SourceLocation>);

    fn error(&self, message: &str, location: &SourceLocation) {
        self.print_message(Severity::Error, message, Some(location));
    }

    fn warning(&self, message: &str, location: &SourceLocation) {
        self.print_message(Severity::Warning, message, Some(location));
    }
}

/// Records every diagnostic, in order
#[derive(Debug, Default)]
pub struct CollectingMessager {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl CollectingMessager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    pub fn errors(&self) -> Vec<Diagnostic> {
        self.of(Severity::Error)
    }

    pub fn warnings(&self) -> Vec<Diagnostic> {
        self.of(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .borrow()
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn of(&self, severity: Severity) -> Vec<Diagnostic> {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.severity == severity)
            .cloned()
            .collect()
    }
}

impl Messager for CollectingMessager {
    fn print_message(&self, severity: Severity, message: &str, location: Option<&SourceLocation>) {
        tracing::debug!(%severity, text = message, "diagnostic");
        self.diagnostics.borrow_mut().push(Diagnostic {
            severity,
            message: message.to_string(),
            location: location.cloned(),
        });
    }
}

/// Forwards diagnostics to `tracing` events
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMessager;

impl Messager for TracingMessager {
    fn print_message(&self, severity: Severity, message: &str, location: Option<&SourceLocation>) {
        let location = location.map(|l| l.to_string()).unwrap_or_default();
        match severity {
            Severity::Error => tracing::error!(%location, "{}", message),
            Severity::Warning => tracing::warn!(%location, "{}", message),
            Severity::Note => tracing::info!(%location, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collecting_messager_filters_by_severity() {
        let messager = CollectingMessager::new();
        let loc = SourceLocation::new("foo.bar.Baz").with_line(Some(3));
        messager.warning("careful", &loc);
        messager.error("broken", &loc);
        messager.print_message(Severity::Note, "fyi", None);

        assert!(messager.has_errors());
        assert_eq!(messager.errors().len(), 1);
        assert_eq!(messager.warnings()[0].message, "careful");
        assert_eq!(messager.diagnostics().len(), 3);
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic {
            severity: Severity::Error,
            message: "bad".into(),
            location: Some(
                SourceLocation::new("foo.bar.Baz")
                    .with_file(Some("baz.yaml".into()))
                    .with_line(Some(5)),
            ),
        };
        assert_eq!(d.to_string(), "baz.yaml:5 (foo.bar.Baz): error: bad");
    }
}
