//! Redaction of personal data in diagnostic output.
//!
//! Failures are logged with the draft that was being submitted. Drafts carry
//! names and email addresses, so log lines pass through a [`Redactor`] first.

use regex::Regex;

/// A named redaction pattern.
#[derive(Debug)]
pub struct RedactionPattern {
    /// Name of the pattern for identification.
    pub name: &'static str,

    regex: Regex,
}

impl RedactionPattern {
    /// Compile a redaction pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex is invalid.
    pub fn new(name: &'static str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            regex: Regex::new(pattern)?,
        })
    }

    /// Check if the content matches this pattern.
    #[must_use]
    pub fn matches(&self, content: &str) -> bool {
        self.regex.is_match(content)
    }

    /// Replace every match with `placeholder`.
    #[must_use]
    pub fn redact(&self, content: &str, placeholder: &str) -> String {
        self.regex.replace_all(content, placeholder).into_owned()
    }
}

/// Built-in patterns for personal data found in user records.
#[must_use]
pub fn builtin_patterns() -> Vec<RedactionPattern> {
    [
        ("email", r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}"),
        ("phone", r"\+?\d[\d ().-]{7,}\d"),
    ]
    .into_iter()
    .filter_map(|(name, pattern)| RedactionPattern::new(name, pattern).ok())
    .collect()
}

/// Masks personal data before it reaches the logs.
#[derive(Debug)]
pub struct Redactor {
    enabled: bool,
    placeholder: String,
    patterns: Vec<RedactionPattern>,
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Redactor {
    /// Create a redactor with the built-in patterns.
    ///
    /// A disabled redactor returns content unchanged.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            placeholder: "[REDACTED]".to_string(),
            patterns: builtin_patterns(),
        }
    }

    /// Whether redaction is applied.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Redact every built-in pattern in `content`.
    #[must_use]
    pub fn redact(&self, content: &str) -> String {
        if !self.enabled {
            return content.to_string();
        }
        self.patterns
            .iter()
            .fold(content.to_string(), |acc, pattern| {
                pattern.redact(&acc, &self.placeholder)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_compile() {
        let names: Vec<_> = builtin_patterns().iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["email", "phone"]);
    }

    #[test]
    fn test_email_is_redacted() {
        let redactor = Redactor::default();
        let out = redactor.redact("draft name=A email=a@x.com age=30");
        assert_eq!(out, "draft name=A email=[REDACTED] age=30");
    }

    #[test]
    fn test_phone_is_redacted() {
        let redactor = Redactor::default();
        let out = redactor.redact("call +84 912 345 678 now");
        assert!(!out.contains("912"));
        assert!(out.contains("[REDACTED]"));
    }

    #[test]
    fn test_short_numbers_are_kept() {
        let redactor = Redactor::default();
        assert_eq!(redactor.redact("age=30"), "age=30");
    }

    #[test]
    fn test_disabled_redactor_passes_through() {
        let redactor = Redactor::new(false);
        assert!(!redactor.is_enabled());
        assert_eq!(redactor.redact("a@x.com"), "a@x.com");
    }

    #[test]
    fn test_pattern_matches() {
        let pattern = RedactionPattern::new("email", r"\S+@\S+").unwrap();
        assert!(pattern.matches("a@b"));
        assert!(!pattern.matches("no at sign"));
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        assert!(RedactionPattern::new("bad", "[unclosed").is_err());
    }
}
