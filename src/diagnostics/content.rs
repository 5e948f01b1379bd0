//! Content diagnostics: walks a document and reports incomplete elements
//!
//! - Missing children that no choice re-layout can supply: error
//! - Missing children that another choice alternative would avoid: warning
//!   (the writer fixes these itself)
//! - Missing required attributes: error when the registry enforces them,
//!   warning otherwise

use std::collections::HashMap;

use crate::document::XmlElement;

use super::{DiagnosticMark, DiagnosticSeverity, Diagnostics};

/// Analyze `root` and its whole subtree
pub fn analyze_element(root: &XmlElement) -> Diagnostics {
    let mut diagnostics = Diagnostics::new();
    visit(root, root.tag().to_string(), &mut diagnostics);
    diagnostics
}

fn visit(element: &XmlElement, path: String, diagnostics: &mut Diagnostics) {
    let greedy = element.required_child_names(false);
    if !greedy.is_empty() {
        let backtracked = element.required_child_names(true);
        if backtracked.is_empty() {
            diagnostics.add(
                DiagnosticMark::new(
                    path.as_str(),
                    DiagnosticSeverity::Warning,
                    "unresolved_choice",
                    format!(
                        "<{}> children sit in a choice branch that still needs {}; another branch is complete",
                        element.tag(),
                        greedy.join(", ")
                    ),
                )
                .with_names(greedy),
            );
        } else {
            diagnostics.add(
                DiagnosticMark::new(
                    path.as_str(),
                    DiagnosticSeverity::Error,
                    "missing_children",
                    format!("<{}> is missing {}", element.tag(), backtracked.join(", ")),
                )
                .with_names(backtracked),
            );
        }
    }

    let attributes = element.missing_required_attributes();
    if !attributes.is_empty() {
        let severity = if element.registry().settings().check_required_attributes {
            DiagnosticSeverity::Error
        } else {
            DiagnosticSeverity::Warning
        };
        diagnostics.add(
            DiagnosticMark::new(
                path.as_str(),
                severity,
                "missing_attributes",
                format!("<{}> lacks required attributes: {}", element.tag(), attributes.join(", ")),
            )
            .with_names(attributes),
        );
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for child in element.children() {
        let index = seen.entry(child.tag()).or_insert(0);
        visit(child, format!("{}/{}[{}]", path, child.tag(), index), diagnostics);
        *index += 1;
    }
}
