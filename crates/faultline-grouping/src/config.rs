//! Resolved grouping configuration.
//!
//! The registry that maps config names (like `"newstyle:2023-01-11"`) to
//! option sets lives in the surrounding application; this crate only deals
//! in the resolved options. The struct deserializes from the same mapping
//! the registry stores, with every field defaulting so partial configs
//! work.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The resolved option set driving every grouping heuristic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// The config name this option set was resolved from, carried along
    /// for diagnostics only.
    pub id: String,
    /// Emit an ordered list of depth-truncated hashes next to the flat
    /// ones.
    pub hierarchical_grouping: bool,
    /// Prefer `raw_function` over `function` and skip trimming, matching
    /// the pre-symbolicator behavior. Kept for config compatibility; the
    /// modern path is the default.
    pub legacy_function_logic: bool,
    /// JavaScript-specific frame quality heuristics (anonymous markers,
    /// URL origins, `/<` suffixes).
    pub javascript_fuzzing: bool,
    /// Native symbol trimming (argument lists, const qualifiers).
    pub native_fuzzing: bool,
    /// Reproduces a historical bug where file-origin stack frames kept
    /// their context line. Off everywhere but kept so old configs resolve.
    pub with_context_line_file_origin_bug: bool,
    /// Collapse PHP `class@anonymous` names to a stable prefix.
    pub php_detect_anonymous_classes: bool,
    /// On native platforms, drop the filename when a function contributes;
    /// function names already carry the namespace and filenames churn
    /// across builds.
    pub discard_native_filename: bool,
    /// Fall back to the package name when no other frame component
    /// contributes.
    pub use_package_fallback: bool,
    /// Fall back to the exception value when the stacktrace does not
    /// contribute.
    pub with_exception_value_fallback: bool,
    /// Scrub event-specific tokens out of messages before hashing.
    pub normalize_message: bool,
    /// Platforms whose context line participates in frame hashing.
    pub contextline_platforms: BTreeSet<String>,
}

impl GroupingConfig {
    /// The current default config.
    pub fn newstyle_2023_01_11() -> GroupingConfig {
        GroupingConfig {
            id: "newstyle:2023-01-11".to_string(),
            hierarchical_grouping: false,
            legacy_function_logic: false,
            javascript_fuzzing: true,
            native_fuzzing: true,
            with_context_line_file_origin_bug: false,
            php_detect_anonymous_classes: true,
            discard_native_filename: true,
            use_package_fallback: true,
            with_exception_value_fallback: true,
            normalize_message: true,
            contextline_platforms: ["javascript", "node", "python", "php", "ruby"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }

    /// The mobile config: identical heuristics plus hierarchical hashing.
    pub fn mobile_2021_02_12() -> GroupingConfig {
        GroupingConfig {
            id: "mobile:2021-02-12".to_string(),
            hierarchical_grouping: true,
            ..GroupingConfig::newstyle_2023_01_11()
        }
    }

    pub fn is_contextline_platform(&self, platform: Option<&str>) -> bool {
        platform.is_some_and(|p| self.contextline_platforms.contains(p))
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        GroupingConfig::newstyle_2023_01_11()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_deserializes_with_defaults() {
        let config: GroupingConfig =
            serde_json::from_value(serde_json::json!({"hierarchical_grouping": true})).unwrap();
        assert!(config.hierarchical_grouping);
        assert!(config.javascript_fuzzing);
        assert!(config.contextline_platforms.contains("python"));
    }

    #[test]
    fn test_mobile_config_is_hierarchical() {
        assert!(GroupingConfig::mobile_2021_02_12().hierarchical_grouping);
        assert!(!GroupingConfig::newstyle_2023_01_11().hierarchical_grouping);
    }
}
