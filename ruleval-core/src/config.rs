// Engine configuration

use once_cell::sync::Lazy;
use serde::Deserialize;
use std::env;

static GLOBAL_CONFIG: Lazy<EngineConfig> = Lazy::new(EngineConfig::from_env);

/// Settings for a validation walk.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tag holding the rule annotation
    pub rule_tag: String,
    /// Tag holding the display name, `None` to always use declared names
    pub display_tag: Option<String>,
    /// Maximum record nesting depth
    pub max_depth: usize,
    /// Whether to report records reached again on their own path
    pub detect_cycles: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rule_tag: "validate".to_string(),
            display_tag: Some("label".to_string()),
            max_depth: 128,
            detect_cycles: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from environment variables.
    ///
    /// `RULEVAL_DISPLAY_TAG` set to an empty string disables display names.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let rule_tag = env::var("RULEVAL_RULE_TAG")
            .ok()
            .filter(|tag| !tag.is_empty())
            .unwrap_or(defaults.rule_tag);

        let display_tag = match env::var("RULEVAL_DISPLAY_TAG") {
            Ok(tag) if tag.is_empty() => None,
            Ok(tag) => Some(tag),
            Err(_) => defaults.display_tag,
        };

        let max_depth = env::var("RULEVAL_MAX_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_depth);

        let detect_cycles = env::var("RULEVAL_DETECT_CYCLES")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(defaults.detect_cycles);

        Self {
            rule_tag,
            display_tag,
            max_depth,
            detect_cycles,
        }
    }

    /// Process-wide configuration, read from the environment once.
    pub fn global() -> &'static EngineConfig {
        &GLOBAL_CONFIG
    }

    pub fn with_rule_tag(mut self, tag: impl Into<String>) -> Self {
        self.rule_tag = tag.into();
        self
    }

    pub fn with_display_tag(mut self, tag: Option<impl Into<String>>) -> Self {
        self.display_tag = tag.map(Into::into);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_cycle_detection(mut self, enabled: bool) -> Self {
        self.detect_cycles = enabled;
        self
    }
}
