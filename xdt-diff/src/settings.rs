//! Settings document controlling subtree handling in generated patches.
//!
//! ```json
//! {
//!   "remove_node_path": ["/configuration/runtime/assemblyBinding"],
//!   "reset_node_path": ["/configuration/runtime"]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::Result;

/// Paths that receive special treatment when writing a patch.
///
/// Paths are absolute plain element paths such as `/configuration/runtime`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Elements whose content is removed from the finished patch.
    pub remove_node_path: Vec<String>,
    /// Containers whose changed children are emitted as `RemoveAll` plus
    /// a fresh `Insert` instead of finer-grained operations.
    pub reset_node_path: Vec<String>,
}

impl Settings {
    /// Parses settings from a JSON string. Unknown keys are ignored.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads settings from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Self::from_json_str(&fs::read_to_string(path)?)?;
        debug!(
            path = %path.display(),
            strip = settings.remove_node_path.len(),
            reset = settings.reset_node_path.len(),
            "loaded settings"
        );
        Ok(settings)
    }

    /// Returns true if `path` is a configured reset container.
    pub fn is_reset_path(&self, path: &str) -> bool {
        self.reset_node_path.iter().any(|p| p == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_defaults_when_missing() {
        let settings = Settings::from_json_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_parse_paths_and_ignore_unknown() {
        let settings = Settings::from_json_str(
            r#"{
                "remove_node_path": ["/configuration/a", "/configuration/b"],
                "reset_node_path": ["/configuration/runtime"],
                "comment": "ignored"
            }"#,
        )
        .unwrap();
        assert_eq!(settings.remove_node_path, vec!["/configuration/a", "/configuration/b"]);
        assert!(settings.is_reset_path("/configuration/runtime"));
        assert!(!settings.is_reset_path("/configuration"));
    }

    #[test]
    fn test_malformed_json() {
        let err = Settings::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Settings(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::from_file("/nonexistent/settings.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
