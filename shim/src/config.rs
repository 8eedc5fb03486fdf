//! Configuration of the build-time-bound launcher.

use crate::metadata::{MetadataError, ShimMetadata};

/// Target used when none was supplied at build time.
pub const DEFAULT_TARGET: &str = if cfg!(windows) { "cmd" } else { "sh" };

/// Fixed target of a launcher that never reads a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticConfig {
    pub target: String,
    pub working_dir: Option<String>,
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_owned(),
            working_dir: None,
        }
    }
}

impl StaticConfig {
    /// Builds the config from build-time values. Missing or empty values fall
    /// back to the defaults.
    pub fn from_build(target: Option<&str>, working_dir: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            target: target
                .filter(|t| !t.is_empty())
                .map_or(defaults.target, str::to_owned),
            working_dir: working_dir
                .filter(|d| !d.is_empty())
                .map(str::to_owned)
                .or(defaults.working_dir),
        }
    }

    pub fn to_metadata(&self) -> Result<ShimMetadata, MetadataError> {
        ShimMetadata::new(self.target.as_str(), self.working_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_targets_shell() {
        let config = StaticConfig::default();
        assert_eq!(config.target, DEFAULT_TARGET);
        assert_eq!(config.working_dir, None);
    }

    #[test]
    fn test_from_build_uses_given_values() {
        let config = StaticConfig::from_build(Some("/opt/tool/bin/tool"), Some("/opt/tool"));
        assert_eq!(config.target, "/opt/tool/bin/tool");
        assert_eq!(config.working_dir.as_deref(), Some("/opt/tool"));
    }

    #[test]
    fn test_from_build_empty_values_fall_back() {
        assert_eq!(StaticConfig::from_build(Some(""), Some("")), StaticConfig::default());
        assert_eq!(StaticConfig::from_build(None, None), StaticConfig::default());
    }

    #[test]
    fn test_to_metadata_validates() {
        let meta = StaticConfig::from_build(Some("tool"), Some("/work"))
            .to_metadata()
            .unwrap();
        assert_eq!(meta.target(), "tool");
        assert_eq!(meta.working_dir(), Some("/work"));

        let bad = StaticConfig::from_build(Some("a|b"), None);
        assert!(bad.to_metadata().is_err());
    }
}
