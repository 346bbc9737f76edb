use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env_opt(key).as_deref().map(str::to_ascii_lowercase).as_deref() {
        Some("1" | "true" | "yes" | "on") => true,
        Some("0" | "false" | "no" | "off") => false,
        _ => default,
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

pub const DEFAULT_RULE_FILES_PATTERN: &str = "**/*.rul";
pub const DEFAULT_TRANSLATION_FILES_PATTERN: &str = "**/Language/*.yml";
pub const DEFAULT_LOCALE: &str = "en-US";

// ── Settings ──────────────────────────────────────────────────

/// Already-resolved settings the indexer runs with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Glob (relative to a project root) selecting ruleset files.
    pub rule_files_pattern: String,
    /// Glob (relative to a project root) selecting language files.
    pub translation_files_pattern: String,
    /// Locale used for translation lookups, e.g. `en-US`.
    pub locale: String,
    /// Shift definition ranges of CRLF files back to raw byte offsets.
    pub crlf_fix: bool,
    /// Worker threads for bulk loads; 0 lets rayon pick.
    pub max_parallel: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rule_files_pattern: DEFAULT_RULE_FILES_PATTERN.to_string(),
            translation_files_pattern: DEFAULT_TRANSLATION_FILES_PATTERN.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
            crlf_fix: false,
            max_parallel: 0,
        }
    }
}

impl Settings {
    /// Build settings from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            rule_files_pattern: env_or("RULEMAP_RULE_FILES_PATTERN", DEFAULT_RULE_FILES_PATTERN),
            translation_files_pattern: env_or(
                "RULEMAP_LANGUAGE_PATTERN",
                DEFAULT_TRANSLATION_FILES_PATTERN,
            ),
            locale: env_or("RULEMAP_LOCALE", DEFAULT_LOCALE),
            crlf_fix: env_bool("RULEMAP_CRLF_FIX", false),
            max_parallel: env_usize("RULEMAP_MAX_PARALLEL", 0),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_crlf_fix(mut self, enabled: bool) -> Self {
        self.crlf_fix = enabled;
        self
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Settings loaded:");
        tracing::info!("  rule files:    {}", self.rule_files_pattern);
        tracing::info!("  language:      {}", self.translation_files_pattern);
        tracing::info!("  locale:        {}", self.locale);
        tracing::info!("  crlf fix:      {}", self.crlf_fix);
        tracing::info!(
            "  parallelism:   {}",
            if self.max_parallel == 0 {
                "auto".to_string()
            } else {
                self.max_parallel.to_string()
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.rule_files_pattern, "**/*.rul");
        assert_eq!(settings.translation_files_pattern, "**/Language/*.yml");
        assert_eq!(settings.locale, "en-US");
        assert!(!settings.crlf_fix);
        assert_eq!(settings.max_parallel, 0);
    }

    #[test]
    fn env_values_override_defaults() {
        env::set_var("RULEMAP_LOCALE", "fr");
        env::set_var("RULEMAP_CRLF_FIX", "Yes");
        env::set_var("RULEMAP_MAX_PARALLEL", "not a number");
        let settings = Settings::from_env();
        env::remove_var("RULEMAP_LOCALE");
        env::remove_var("RULEMAP_CRLF_FIX");
        env::remove_var("RULEMAP_MAX_PARALLEL");

        assert_eq!(settings.locale, "fr");
        assert!(settings.crlf_fix);
        assert_eq!(settings.max_parallel, 0);
        assert_eq!(settings.rule_files_pattern, DEFAULT_RULE_FILES_PATTERN);
    }

    #[test]
    fn builder_overrides() {
        let settings = Settings::default().with_locale("de").with_crlf_fix(true);
        assert_eq!(settings.locale, "de");
        assert!(settings.crlf_fix);
    }
}
