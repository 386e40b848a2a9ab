//! Build configuration.

use std::path::Path;

use serde::Deserialize;

use crate::Result;

/// Options for [`Component::build_with`](crate::Component::build_with).
///
/// ```
/// use joinery::BuildConfig;
///
/// let config = BuildConfig::from_toml_str("max_rounds = 4").unwrap();
/// assert_eq!(config.max_rounds, 4);
/// assert!(config.recursive);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Upper bound on rounds per assembly.
    pub max_rounds: usize,
    /// Build child assemblies as soon as they are placed.
    pub recursive: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_rounds: 64,
            recursive: true,
        }
    }
}

impl BuildConfig {
    /// Parse from TOML; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Read a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(BuildConfig::from_toml_str("").unwrap(), BuildConfig::default());
    }

    #[test]
    fn reads_both_keys() {
        let c = BuildConfig::from_toml_str("max_rounds = 2\nrecursive = false").unwrap();
        assert_eq!(
            c,
            BuildConfig {
                max_rounds: 2,
                recursive: false
            }
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(matches!(
            BuildConfig::from_toml_str("max_round = 2"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        assert!(matches!(
            BuildConfig::load("/nonexistent/joinery.toml"),
            Err(Error::Io(_))
        ));
    }
}
