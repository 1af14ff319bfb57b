//! Configuration handling for name-analyzer

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = ".nameanalyzer.json";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Naming thresholds and word lists
    #[serde(default)]
    pub general: GeneralConfig,

    /// Redundant comment detection
    #[serde(default)]
    pub comments: CommentsConfig,

    /// Hard-coded design value detection
    #[serde(default)]
    pub theme: ThemeConfig,

    /// Rule enable/disable lists
    #[serde(default)]
    pub rules: RulesConfig,

    /// Remote name suggestion service
    #[serde(default)]
    pub suggestions: SuggestionConfig,

    /// File patterns to exclude
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Casing convention enforced on declared names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NamingConvention {
    #[default]
    CamelCase,
    SnakeCase,
    PascalCase,
    /// No casing check
    Any,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralConfig {
    /// Only report violations on lines changed since the last commit
    pub only_check_new_code: bool,
    pub name_length_limit: usize,
    /// Maximum number of lines in a function body
    pub function_length_limit: usize,
    pub boolean_prefixes: Vec<String>,
    /// Function names never checked
    pub ignored_functions: Vec<String>,
    /// Variable and property names never checked
    pub ignored_names: Vec<String>,
    pub naming_convention: NamingConvention,
    /// Accept `UPPER_SNAKE_CASE` names regardless of convention
    pub allow_constant_case: bool,
    /// Skip the action word check for functions with short bodies
    pub exempt_short_functions: bool,
    pub short_function_line_limit: usize,
    /// Synthesize function renames locally instead of asking the service
    pub development_mode: bool,
    /// Idle window before re-analyzing an edited document
    pub debounce_ms: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            only_check_new_code: false,
            name_length_limit: 3,
            function_length_limit: 50,
            boolean_prefixes: ["is", "has", "should", "can", "did", "was", "will"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            ignored_functions: vec!["main".to_string(), "constructor".to_string()],
            ignored_names: Vec::new(),
            naming_convention: NamingConvention::CamelCase,
            allow_constant_case: true,
            exempt_short_functions: true,
            short_function_line_limit: 3,
            development_mode: false,
            debounce_ms: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentsConfig {
    pub flag_redundant: bool,
    /// Longer comments are never considered redundant
    pub max_words: usize,
    /// Share of comment words that must appear in the code (0.0 - 1.0)
    pub redundancy_threshold: f64,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            flag_redundant: false,
            max_words: 8,
            redundancy_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemeConfig {
    pub enabled: bool,
    /// Regular expressions matched against string and template literals
    pub patterns: Vec<String>,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: vec![
                r"#(?:[0-9a-fA-F]{8}|[0-9a-fA-F]{6}|[0-9a-fA-F]{3,4})\b".to_string(),
                r"\b(?:rgba?|hsla?)\([^)]*\)".to_string(),
                r"\b\d+(?:\.\d+)?px\b".to_string(),
            ],
        }
    }
}

impl ThemeConfig {
    /// Compile the configured patterns, skipping invalid ones
    pub fn compiled_patterns(&self) -> Vec<regex::Regex> {
        self.patterns
            .iter()
            .filter_map(|p| match regex::Regex::new(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!("Ignoring invalid theme pattern '{}': {}", p, e);
                    None
                }
            })
            .collect()
    }
}

/// Rule-specific configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    /// Rules to enable (supports wildcards like "BOOL-*")
    #[serde(default)]
    pub enable: Vec<String>,

    /// Rules to disable (supports wildcards)
    #[serde(default)]
    pub disable: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuggestionConfig {
    /// Endpoint receiving `{ name, violationReason }` requests
    pub endpoint: Option<String>,
    /// Bearer token for the endpoint
    pub session_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            session_token: None,
            timeout_secs: 10,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
    }

    /// Build configuration from an editor-supplied JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::InvalidSettings(e.to_string()))
    }

    /// Find and load configuration from the current directory or parents
    pub fn find_and_load(start_dir: &Path) -> Option<Self> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("{}", e);
                        None
                    }
                };
            }

            if !current.pop() {
                break;
            }
        }

        None
    }

    /// Check if a rule should be enabled
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        // Check explicit disable first
        if matches_pattern(rule_id, &self.rules.disable) {
            return false;
        }

        // If enable list is empty, all rules are enabled by default
        if self.rules.enable.is_empty() {
            return true;
        }

        matches_pattern(rule_id, &self.rules.enable)
    }

    /// Check if a file should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|pattern| {
            glob::Pattern::new(pattern)
                .map(|glob| glob.matches(&path_str))
                .unwrap_or(false)
        })
    }

    pub fn is_ignored_name(&self, name: &str) -> bool {
        self.general.ignored_names.iter().any(|n| n == name)
    }

    pub fn is_ignored_function(&self, name: &str) -> bool {
        self.general.ignored_functions.iter().any(|n| n == name)
    }
}

fn matches_pattern(rule_id: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| match pattern.strip_suffix('*') {
        Some(prefix) => rule_id.starts_with(prefix),
        None => pattern == rule_id,
    })
}

/// Configuration error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {}", .0.display(), .1)]
    ReadError(PathBuf, String),
    #[error("Failed to parse config file '{}': {}", .0.display(), .1)]
    ParseError(PathBuf, String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}
