//! Diagnostics for document trees
//!
//! Reports what a document still lacks before it can be written: missing
//! required children and missing required attributes. Each mark names the
//! element by its path from the root (`score-partwise/part[0]/measure[2]`).

pub mod content;

use serde::{Deserialize, Serialize};

pub use content::analyze_element;

/// Severity level for diagnostic marks
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// A diagnostic mark pointing at one element
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DiagnosticMark {
    /// Element path from the root, with sibling indexes
    pub path: String,
    pub severity: DiagnosticSeverity,
    /// Kind identifier (e.g. "missing_children", "missing_attributes")
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// Names the mark is about (tags or attribute names)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
}

impl DiagnosticMark {
    pub fn new(
        path: impl Into<String>,
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            severity,
            kind: kind.into(),
            message: message.into(),
            names: Vec::new(),
        }
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }
}

/// Collection of diagnostic marks for a whole document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Diagnostics {
    pub marks: Vec<DiagnosticMark>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    pub fn add(&mut self, mark: DiagnosticMark) {
        self.marks.push(mark);
    }

    pub fn extend(&mut self, marks: impl IntoIterator<Item = DiagnosticMark>) {
        self.marks.extend(marks);
    }

    /// Check if there are any errors
    pub fn has_errors(&self) -> bool {
        self.marks
            .iter()
            .any(|m| m.severity == DiagnosticSeverity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    /// Marks for one element path
    pub fn at(&self, path: &str) -> Vec<&DiagnosticMark> {
        self.marks.iter().filter(|m| m.path == path).collect()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_mark_creation() {
        let mark = DiagnosticMark::new(
            "note",
            DiagnosticSeverity::Error,
            "missing_children",
            "Missing pitch",
        )
        .with_names(vec!["pitch".to_string()]);

        assert_eq!(mark.path, "note");
        assert_eq!(mark.severity, DiagnosticSeverity::Error);
        assert_eq!(mark.names, vec!["pitch"]);
    }

    #[test]
    fn test_diagnostics_has_errors() {
        let mut diags = Diagnostics::new();
        assert!(!diags.has_errors());

        diags.add(DiagnosticMark::new("a", DiagnosticSeverity::Warning, "warn", "Warning"));
        assert!(!diags.has_errors());

        diags.add(DiagnosticMark::new("a/b[0]", DiagnosticSeverity::Error, "err", "Error"));
        assert!(diags.has_errors());
        assert_eq!(diags.at("a").len(), 1);
    }

    #[test]
    fn test_json_skips_empty_names() {
        let mut diags = Diagnostics::new();
        diags.add(DiagnosticMark::new("a", DiagnosticSeverity::Info, "info", "Note"));
        let json = diags.to_json().unwrap();
        assert!(json.contains("\"severity\": \"info\""));
        assert!(!json.contains("names"));
    }
}
