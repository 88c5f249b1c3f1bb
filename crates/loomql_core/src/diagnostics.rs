//! Diagnostic reporting for loomql.

use crate::span::Location;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// An error that prevents composition.
    Error,
    /// A warning that doesn't prevent composition.
    Warning,
    /// An informational message.
    Info,
}

/// A label attached to a diagnostic.
#[derive(Debug, Clone)]
pub struct Label {
    /// The location this label points to.
    pub location: Location,
    /// The label message.
    pub message: String,
}

impl Label {
    /// Creates a new label.
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

/// A diagnostic message.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Severity level.
    pub severity: DiagnosticSeverity,
    /// Error code.
    pub code: String,
    /// Short title.
    pub title: String,
    /// Detailed message.
    pub message: Option<String>,
    /// Labels pointing to source locations.
    pub labels: Vec<Label>,
}

impl Diagnostic {
    /// Creates a new error diagnostic.
    pub fn error(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Error,
            code: code.into(),
            title: title.into(),
            message: None,
            labels: Vec::new(),
        }
    }

    /// Creates a new warning diagnostic.
    pub fn warning(code: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            severity: DiagnosticSeverity::Warning,
            code: code.into(),
            title: title.into(),
            message: None,
            labels: Vec::new(),
        }
    }

    /// Adds a message to the diagnostic.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a label to the diagnostic.
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Adds a primary label at a location.
    pub fn with_location(mut self, location: Location, message: impl Into<String>) -> Self {
        self.labels.push(Label::new(location, message));
        self
    }

    /// Returns the primary location, if any.
    pub fn primary_location(&self) -> Option<Location> {
        self.labels.first().map(|l| l.location)
    }
}

/// A collection of diagnostics.
#[derive(Debug, Default)]
pub struct DiagnosticBag {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticBag {
    /// Creates a new empty diagnostic bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Adds an error diagnostic.
    pub fn error(
        &mut self,
        code: impl Into<String>,
        title: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) {
        self.add(Diagnostic::error(code, title).with_location(location, message));
    }

    /// Adds a warning diagnostic.
    pub fn warning(
        &mut self,
        code: impl Into<String>,
        title: impl Into<String>,
        location: Location,
        message: impl Into<String>,
    ) {
        self.add(Diagnostic::warning(code, title).with_location(location, message));
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns the number of errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
            .count()
    }

    /// Returns an iterator over all diagnostics.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    /// Returns an iterator over errors.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Returns true if there are no diagnostics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Returns the number of diagnostics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }
}

/// Diagnostic codes for the syntax layer. Composition violations carry
/// their own codes in the `E02xx` range.
pub mod codes {
    pub const UNEXPECTED_TOKEN: &str = "E0101";
    pub const UNEXPECTED_EOF: &str = "E0102";
    pub const INVALID_SYNTAX: &str = "E0103";
    pub const UNSUPPORTED: &str = "E0104";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::{FragmentId, Span};

    fn loc(start: u32, end: u32) -> Location {
        Location::new(FragmentId::new(0), Span::new(start, end))
    }

    #[test]
    fn test_diagnostic_bag() {
        let mut bag = DiagnosticBag::new();
        bag.error("E0103", "test error", loc(0, 10), "details");

        assert!(bag.has_errors());
        assert_eq!(bag.error_count(), 1);
    }

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::error("E0101", "Test")
            .with_message("Details")
            .with_location(loc(0, 5), "here");

        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert_eq!(diag.primary_location(), Some(loc(0, 5)));
    }

    #[test]
    fn test_warning_does_not_count_as_error() {
        let mut bag = DiagnosticBag::new();
        bag.warning("W0001", "heads up", loc(0, 3), "just a note");

        assert!(!bag.has_errors());
        assert_eq!(bag.len(), 1);
    }
}
