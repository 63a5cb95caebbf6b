use clap::ValueEnum;
use serde::Serialize;
use std::fmt;

/// Supported target languages. Each variant carries its file-extension
/// mapping, expected test framework, and toolchain requirements as data,
/// so callers never dispatch on raw language strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Javascript,
    Java,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::Javascript, Language::Java];

    /// Maps a source-file extension to its language, if supported.
    pub fn from_extension(extension: &str) -> Option<Language> {
        match extension {
            "py" => Some(Language::Python),
            "js" => Some(Language::Javascript),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Javascript => "js",
            Language::Java => "java",
        }
    }

    /// Extension used for generated test artifacts. Identical to the
    /// source extension for every currently supported language.
    pub fn artifact_extension(&self) -> &'static str {
        self.extension()
    }

    pub fn test_framework(&self) -> &'static str {
        match self {
            Language::Python => "pytest",
            Language::Javascript => "node:test",
            Language::Java => "JUnit 4",
        }
    }

    /// Whether the language needs auxiliary execution dependencies fetched
    /// before its artifacts can be compiled and run.
    pub fn requires_provisioning(&self) -> bool {
        matches!(self, Language::Java)
    }

    /// Whether running an artifact requires an explicit compile step first.
    pub fn requires_compilation(&self) -> bool {
        matches!(self, Language::Java)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Java => "java",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping_round_trips() {
        for language in Language::ALL {
            assert_eq!(Language::from_extension(language.extension()), Some(language));
        }
    }

    #[test]
    fn test_unsupported_extensions() {
        assert_eq!(Language::from_extension("rb"), None);
        assert_eq!(Language::from_extension("rs"), None);
        assert_eq!(Language::from_extension(""), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Language::Python.to_string(), "python");
        assert_eq!(Language::Javascript.to_string(), "javascript");
        assert_eq!(Language::Java.to_string(), "java");
    }

    #[test]
    fn test_only_java_needs_provisioning_and_compilation() {
        assert!(Language::Java.requires_provisioning());
        assert!(Language::Java.requires_compilation());
        assert!(!Language::Python.requires_provisioning());
        assert!(!Language::Python.requires_compilation());
        assert!(!Language::Javascript.requires_provisioning());
        assert!(!Language::Javascript.requires_compilation());
    }
}
