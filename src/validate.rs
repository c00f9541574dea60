//! Declarative per-field validation for form submissions.
//!
//! A failed rule is an expected outcome, so it is reported as data in a
//! [`ValidationResult`], never as an error.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

use crate::record::Record;
use crate::value::Value;

/// Permissive, not exhaustive: non-blank local part, `@`, and a domain
/// with at least one dot.
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern"));

/// Constraints for one field. Every constraint that is set must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRule {
    pub required: bool,
    #[serde(alias = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(alias = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    pub email: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl FieldRule {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn email(mut self) -> Self {
        self.email = true;
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        self.min = Some(n);
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        self.max = Some(n);
        self
    }
}

/// Field name to rule, as declared by a form.
pub type RuleSet = BTreeMap<String, FieldRule>;

/// The first rule a field failed.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleViolation {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Email,
    Min(f64),
    Max(f64),
    /// A numeric bound was set but the value does not read as a number.
    NotANumber,
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleViolation::Required => write!(f, "This field is required"),
            RuleViolation::MinLength(n) => write!(f, "Minimum of {n} characters"),
            RuleViolation::MaxLength(n) => write!(f, "Maximum of {n} characters"),
            RuleViolation::Email => write!(f, "Invalid email"),
            RuleViolation::Min(n) => write!(f, "Minimum value: {}", Value::Number(*n)),
            RuleViolation::Max(n) => write!(f, "Maximum value: {}", Value::Number(*n)),
            RuleViolation::NotANumber => write!(f, "Must be a number"),
        }
    }
}

impl Serialize for RuleViolation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of validating one record. `is_valid` holds exactly when
/// `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    is_valid: bool,
    errors: BTreeMap<String, RuleViolation>,
}

impl ValidationResult {
    fn from_errors(errors: BTreeMap<String, RuleViolation>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn errors(&self) -> &BTreeMap<String, RuleViolation> {
        &self.errors
    }

    pub fn error(&self, field: &str) -> Option<&RuleViolation> {
        self.errors.get(field)
    }

    /// Names of the fields that failed, in name order.
    pub fn failed_fields(&self) -> Vec<&str> {
        self.errors.keys().map(String::as_str).collect()
    }
}

/// Check `record` against `rules`. Fields without a rule are ignored.
pub fn validate(record: &Record, rules: &RuleSet) -> ValidationResult {
    let errors = rules
        .iter()
        .filter_map(|(field, rule)| {
            check_field(record.get(field), rule).map(|violation| (field.clone(), violation))
        })
        .collect();
    ValidationResult::from_errors(errors)
}

/// Permissive email shape check.
pub fn is_valid_email(s: &str) -> bool {
    EMAIL.is_match(s)
}

// Order: required, min_length, max_length, email, min, max.
fn check_field(value: Option<&Value>, rule: &FieldRule) -> Option<RuleViolation> {
    let Some(value) = value.filter(|v| !is_blank(v)) else {
        return rule.required.then_some(RuleViolation::Required);
    };

    let text = value.to_string();
    let len = text.chars().count();
    if let Some(min) = rule.min_length
        && len < min
    {
        return Some(RuleViolation::MinLength(min));
    }
    if let Some(max) = rule.max_length
        && len > max
    {
        return Some(RuleViolation::MaxLength(max));
    }
    if rule.email && !is_valid_email(&text) {
        return Some(RuleViolation::Email);
    }

    if rule.min.is_none() && rule.max.is_none() {
        return None;
    }
    let Some(n) = value.to_number() else {
        return Some(RuleViolation::NotANumber);
    };
    if let Some(min) = rule.min
        && n < min
    {
        return Some(RuleViolation::Min(min));
    }
    if let Some(max) = rule.max
        && n > max
    {
        return Some(RuleViolation::Max(max));
    }
    None
}

/// Null and whitespace-only text count as absent. Zero and `false` do not.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.trim().is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(entries: &[(&str, FieldRule)]) -> RuleSet {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_required_zero_is_valid() {
        let record = Record::new().with("age", 0);
        let result = validate(&record, &rules(&[("age", FieldRule::required())]));
        assert!(result.is_valid());
    }

    #[test]
    fn test_required_false_is_valid() {
        let record = Record::new().with("active", false);
        let result = validate(&record, &rules(&[("active", FieldRule::required())]));
        assert!(result.is_valid());
    }

    #[test]
    fn test_required_blank_text_fails() {
        let record = Record::new().with("name", "   ").with("notes", Value::Null);
        let result = validate(
            &record,
            &rules(&[
                ("name", FieldRule::required()),
                ("notes", FieldRule::required()),
                ("missing", FieldRule::required()),
            ]),
        );
        assert!(!result.is_valid());
        assert_eq!(result.failed_fields(), vec!["missing", "name", "notes"]);
        assert_eq!(result.error("name"), Some(&RuleViolation::Required));
    }

    #[test]
    fn test_missing_optional_skips_bounds() {
        let result = validate(&Record::new(), &rules(&[("age", FieldRule::default().min(5.0))]));
        assert!(result.is_valid());
    }

    #[test]
    fn test_email_shape() {
        let rule = rules(&[("email", FieldRule::default().email())]);
        let bad = validate(&Record::new().with("email", "a@b"), &rule);
        assert!(!bad.is_valid());
        assert_eq!(bad.error("email"), Some(&RuleViolation::Email));
        let good = validate(&Record::new().with("email", "a@b.com"), &rule);
        assert!(good.is_valid());
        assert!(!is_valid_email("a b@c.com"));
    }

    #[test]
    fn test_first_failure_wins_in_fixed_order() {
        // Too short and not an email: min_length is checked first.
        let rule = rules(&[("email", FieldRule::required().min_length(10).email())]);
        let result = validate(&Record::new().with("email", "x@y"), &rule);
        assert_eq!(result.error("email"), Some(&RuleViolation::MinLength(10)));

        let rule = rules(&[("qty", FieldRule::default().min(1.0).max(3.0).max_length(1))]);
        let result = validate(&Record::new().with("qty", 10), &rule);
        assert_eq!(result.error("qty"), Some(&RuleViolation::MaxLength(1)));
    }

    #[test]
    fn test_fields_are_independent() {
        let rule = rules(&[
            ("name", FieldRule::required().min_length(3)),
            ("price", FieldRule::required().min(0.0)),
        ]);
        let result = validate(&Record::new().with("name", "ab").with("price", 10), &rule);
        assert_eq!(result.failed_fields(), vec!["name"]);
    }

    #[test]
    fn test_length_uses_natural_string() {
        let rule = rules(&[("code", FieldRule::default().min_length(4))]);
        assert!(!validate(&Record::new().with("code", 123), &rule).is_valid());
        assert!(validate(&Record::new().with("code", 1234), &rule).is_valid());
        // Characters, not bytes.
        assert!(validate(&Record::new().with("code", "ação"), &rule).is_valid());
    }

    #[test]
    fn test_numeric_bounds() {
        let rule = rules(&[("stock", FieldRule::default().min(0.0).max(100.0))]);
        assert!(validate(&Record::new().with("stock", 0), &rule).is_valid());
        assert!(validate(&Record::new().with("stock", "55"), &rule).is_valid());
        assert_eq!(
            validate(&Record::new().with("stock", -1), &rule).error("stock"),
            Some(&RuleViolation::Min(0.0))
        );
        assert_eq!(
            validate(&Record::new().with("stock", 101.5), &rule).error("stock"),
            Some(&RuleViolation::Max(100.0))
        );
    }

    #[test]
    fn test_non_numeric_under_bound_is_reported() {
        let rule = rules(&[("price", FieldRule::default().min(1.0))]);
        let result = validate(&Record::new().with("price", "cheap"), &rule);
        assert_eq!(result.error("price"), Some(&RuleViolation::NotANumber));
        let result = validate(&Record::new().with("price", true), &rule);
        assert_eq!(result.error("price"), Some(&RuleViolation::NotANumber));
    }

    #[test]
    fn test_unruled_fields_ignored() {
        let record = Record::new().with("junk", "").with("name", "ok");
        let result = validate(&record, &rules(&[("name", FieldRule::required())]));
        assert!(result.is_valid());
        assert!(result.errors().is_empty());
    }

    #[test]
    fn test_messages_carry_bound() {
        assert_eq!(RuleViolation::MinLength(3).to_string(), "Minimum of 3 characters");
        assert_eq!(RuleViolation::Min(5.0).to_string(), "Minimum value: 5");
        assert_eq!(RuleViolation::Max(2.5).to_string(), "Maximum value: 2.5");
    }

    #[test]
    fn test_rules_deserialize_from_yaml_with_camel_aliases() {
        let yaml = "name:\n  required: true\n  minLength: 3\nemail:\n  email: true\nage:\n  min: 18\n";
        let rules: RuleSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules["name"], FieldRule::required().min_length(3));
        assert!(rules["email"].email);
        assert_eq!(rules["age"].min, Some(18.0));
    }

    #[test]
    fn test_result_serializes_messages() {
        let rule = rules(&[("name", FieldRule::required())]);
        let result = validate(&Record::new(), &rule);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["isValid"], false);
        assert_eq!(json["errors"]["name"], "This field is required");
    }
}
