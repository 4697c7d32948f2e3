//! Configuration validation.
//!
//! Checks value ranges and URL shapes that serde cannot express.

use crate::schema::SkilldeckConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "marketplace.base_url"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

const MAX_SEARCH_LIMIT: usize = 200;
const MAX_DEBOUNCE_MS: u64 = 5_000;

/// Validate a loaded configuration.
#[must_use]
pub fn validate(cfg: &SkilldeckConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    match url::Url::parse(&cfg.marketplace.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {},
        Ok(url) => result.push(
            Severity::Error,
            "marketplace.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        ),
        Err(e) => result.push(
            Severity::Error,
            "marketplace.base_url",
            format!("invalid URL: {e}"),
        ),
    }

    if cfg.marketplace.search_limit == 0 || cfg.marketplace.search_limit > MAX_SEARCH_LIMIT {
        result.push(
            Severity::Error,
            "marketplace.search_limit",
            format!("must be between 1 and {MAX_SEARCH_LIMIT}"),
        );
    }

    if cfg.marketplace.timeout_secs == 0 {
        result.push(
            Severity::Error,
            "marketplace.timeout_secs",
            "must be greater than zero",
        );
    }

    if cfg.sidebar.search_debounce_ms > MAX_DEBOUNCE_MS {
        result.push(
            Severity::Error,
            "sidebar.search_debounce_ms",
            format!("must be at most {MAX_DEBOUNCE_MS}"),
        );
    }

    if cfg.sidebar.cache_ttl_secs == 0 {
        result.push(
            Severity::Warning,
            "sidebar.cache_ttl_secs",
            "zero disables the marketplace cache",
        );
    }

    if cfg.installer.program.trim().is_empty() {
        result.push(Severity::Error, "installer.program", "must not be empty");
    }

    for (i, root) in cfg.workspace.roots.iter().enumerate() {
        if !root.is_absolute() {
            result.push(
                Severity::Warning,
                &format!("workspace.roots[{i}]"),
                format!("{} is relative to the launch directory", root.display()),
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let result = validate(&SkilldeckConfig::default());
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let mut cfg = SkilldeckConfig::default();
        cfg.marketplace.base_url = "ftp://skills.example".into();
        let result = validate(&cfg);
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].path, "marketplace.base_url");
    }

    #[test]
    fn rejects_out_of_range_limits() {
        let mut cfg = SkilldeckConfig::default();
        cfg.marketplace.search_limit = 0;
        cfg.sidebar.search_debounce_ms = 10_000;
        let paths: Vec<_> = validate(&cfg)
            .diagnostics
            .into_iter()
            .map(|d| d.path)
            .collect();
        assert!(paths.contains(&"marketplace.search_limit".to_string()));
        assert!(paths.contains(&"sidebar.search_debounce_ms".to_string()));
    }

    #[test]
    fn zero_ttl_is_only_a_warning() {
        let mut cfg = SkilldeckConfig::default();
        cfg.sidebar.cache_ttl_secs = 0;
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert_eq!(result.diagnostics.len(), 1);
    }
}
