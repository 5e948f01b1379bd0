//! Engine settings
//!
//! Plain serde struct with defaults; can be read from YAML or JSON.

use serde::{Deserialize, Serialize};

/// Configuration for the attachment engine and the XML writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Re-layout the children of a node when a greedy choice blocks an
    /// attachment or leaves required content missing at write time
    pub intelligent_choice: bool,

    /// Maximum number of placement attempts per re-layout search
    pub reflow_budget: usize,

    /// Spaces per indentation level in written XML (0 = no line breaks)
    pub indent: usize,

    /// Refuse to write elements whose required attributes are missing
    pub check_required_attributes: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            intelligent_choice: true,
            reflow_budget: 10_000,
            indent: 2,
            check_required_attributes: false,
        }
    }
}

impl EngineSettings {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Settings with the re-layout search switched off
    pub fn strict() -> Self {
        Self {
            intelligent_choice: false,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert!(settings.intelligent_choice);
        assert_eq!(settings.indent, 2);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let settings = EngineSettings::from_yaml("intelligent_choice: false\nindent: 4\n").unwrap();
        assert!(!settings.intelligent_choice);
        assert_eq!(settings.indent, 4);
        assert_eq!(settings.reflow_budget, 10_000);
    }

    #[test]
    fn test_json() {
        let settings = EngineSettings::from_json(r#"{"reflow_budget": 50}"#).unwrap();
        assert_eq!(settings.reflow_budget, 50);
        assert!(settings.intelligent_choice);
        assert!(EngineSettings::from_json("{").is_err());
    }
}
