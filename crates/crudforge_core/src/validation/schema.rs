//! Typed validation schemas and field-level constraint checks.
//!
//! A schema is a plain struct decoded from an attribute map with serde. The
//! decode step covers presence and type; `Schema::check` covers everything
//! serde cannot express (lengths, enumerations, patterns, cross-field rules).

use regex::Regex;
use serde::de::DeserializeOwned;
use std::fmt::{Display, Formatter};

/// One failed constraint on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

impl Display for FieldIssue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Legal shape of attributes for one (entity, operation) pair.
pub trait Schema: DeserializeOwned + 'static {
    /// Records constraint violations that decoding alone does not catch.
    fn check(&self, _checks: &mut FieldChecks) {}
}

/// Accumulates field issues for one schema instance.
#[derive(Debug, Default)]
pub struct FieldChecks {
    issues: Vec<FieldIssue>,
}

impl FieldChecks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `message` against `field` unconditionally.
    pub fn fail(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.issues.push(FieldIssue {
            field: field.to_string(),
            message: message.into(),
        });
        self
    }

    /// Records `message` when `ok` is false.
    pub fn ensure(&mut self, field: &str, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.fail(field, message);
        }
        self
    }

    /// Character-count bounds, inclusive on both ends.
    pub fn length(&mut self, field: &str, value: &str, min: usize, max: usize) -> &mut Self {
        let count = value.chars().count();
        if count < min {
            self.fail(field, format!("must be at least {min} characters, got {count}"));
        } else if count > max {
            self.fail(field, format!("must be at most {max} characters, got {count}"));
        }
        self
    }

    /// Same as `length`, skipped when the value is absent.
    pub fn length_opt(
        &mut self,
        field: &str,
        value: Option<&str>,
        min: usize,
        max: usize,
    ) -> &mut Self {
        if let Some(value) = value {
            self.length(field, value, min, max);
        }
        self
    }

    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) -> &mut Self {
        if !allowed.contains(&value) {
            self.fail(field, format!("must be one of {}", allowed.join("|")));
        }
        self
    }

    pub fn one_of_opt(&mut self, field: &str, value: Option<&str>, allowed: &[&str]) -> &mut Self {
        if let Some(value) = value {
            self.one_of(field, value, allowed);
        }
        self
    }

    pub fn matches(
        &mut self,
        field: &str,
        value: &str,
        pattern: &Regex,
        message: &str,
    ) -> &mut Self {
        if !pattern.is_match(value) {
            self.fail(field, message);
        }
        self
    }

    pub fn at_least(&mut self, field: &str, value: Option<f64>, min: f64) -> &mut Self {
        if let Some(value) = value {
            if value < min {
                self.fail(field, format!("must be >= {min}, got {value}"));
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn into_issues(self) -> Vec<FieldIssue> {
        self.issues
    }
}

#[cfg(test)]
mod tests {
    use super::FieldChecks;
    use regex::Regex;

    #[test]
    fn length_counts_characters_not_bytes() {
        let mut checks = FieldChecks::new();
        checks.length("name", "ééé", 1, 3);
        assert!(checks.is_empty());

        checks.length("name", "", 1, 3);
        let issues = checks.into_issues();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "name");
    }

    #[test]
    fn optional_checks_skip_absent_values() {
        let mut checks = FieldChecks::new();
        checks
            .length_opt("title", None, 1, 10)
            .one_of_opt("status", None, &["draft"])
            .at_least("budget", None, 0.0);
        assert!(checks.is_empty());
    }

    #[test]
    fn collects_every_failed_constraint() {
        let pattern = Regex::new("^[a-z]+$").unwrap();
        let mut checks = FieldChecks::new();
        checks
            .one_of("status", "archived", &["draft", "active"])
            .matches("slug", "Not Valid", &pattern, "lowercase letters only")
            .at_least("budget", Some(-1.0), 0.0)
            .ensure("end_date", false, "must be after start_date");

        let fields: Vec<_> = checks.into_issues().into_iter().map(|i| i.field).collect();
        assert_eq!(fields, ["status", "slug", "budget", "end_date"]);
    }
}
