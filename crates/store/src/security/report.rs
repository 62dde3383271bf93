use crate::security::classify::{Classified, FieldSpec};
use crate::security::level::SecurityLevel;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// Substrings that suggest a field holds a credential.
pub const SENSITIVE_KEYWORDS: [&str; 6] =
    ["password", "secret", "key", "token", "credential", "auth"];

/// Static review of a record type's field classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityReport {
    pub secure_field_count: usize,
    pub plaintext_field_count: usize,
    pub temporary_field_count: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SecurityReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

fn count(fields: &[FieldSpec], level: SecurityLevel) -> usize {
    fields.iter().filter(|spec| spec.level == level).count()
}

/// One warning per (plaintext field, matching keyword) pair.
fn sensitive_name_warnings(fields: &[FieldSpec]) -> Vec<String> {
    let mut warnings = Vec::new();
    for spec in fields.iter().filter(|spec| spec.level == SecurityLevel::Plaintext) {
        let lower = spec.name.to_lowercase();
        for keyword in SENSITIVE_KEYWORDS.iter().filter(|kw| lower.contains(**kw)) {
            warnings.push(format!(
                "Field '{}' contains sensitive keyword '{keyword}' but is stored in plaintext",
                spec.name
            ));
        }
    }
    warnings
}

/// Builds a [`SecurityReport`] for record type `R`.
///
/// Name-based findings are warnings only; false positives (e.g. `keyboard_layout`) are expected.
#[must_use]
pub fn generate_security_report<R: Classified>() -> SecurityReport {
    let fields = R::FIELDS;
    let mut report = SecurityReport {
        secure_field_count: count(fields, SecurityLevel::Secure),
        plaintext_field_count: count(fields, SecurityLevel::Plaintext),
        temporary_field_count: count(fields, SecurityLevel::Temporary),
        warnings: sensitive_name_warnings(fields),
        errors: Vec::new(),
    };

    if report.secure_field_count == 0 {
        report
            .warnings
            .push("Record contains no secure fields; all persisted data is plaintext".to_owned());
    }

    let mut seen = HashSet::new();
    for spec in fields {
        if !seen.insert(spec.name) {
            report.errors.push(format!("Field '{}' is classified more than once", spec.name));
        }
    }

    report
}

/// Compliance findings for `R`, logged at `warn` and returned to the caller.
///
/// With `require_secure`, a type without any secure field is reported as well.
pub fn check_security_compliance<R: Classified>(require_secure: bool) -> Vec<String> {
    let fields = R::FIELDS;
    let mut findings = Vec::new();

    if require_secure && count(fields, SecurityLevel::Secure) == 0 {
        findings.push("Record must contain at least one secure field".to_owned());
    }
    findings.extend(sensitive_name_warnings(fields));

    for finding in &findings {
        warn!(finding = %finding, "Security compliance warning");
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::classify::FieldAssignment;
    use serde_json::Value;

    struct Sample;

    impl Classified for Sample {
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::new("endpoint", SecurityLevel::Plaintext, "String"),
            FieldSpec::new("auth_token", SecurityLevel::Plaintext, "String"),
            FieldSpec::new("password", SecurityLevel::Secure, "String"),
            FieldSpec::new("nonce", SecurityLevel::Temporary, "u64"),
        ];

        fn field_value(&self, _name: &str) -> Option<Result<Value, serde_json::Error>> {
            None
        }

        fn assign_field(&mut self, _name: &str, _value: Value) -> FieldAssignment {
            FieldAssignment::Unknown
        }
    }

    struct PlainOnly;

    impl Classified for PlainOnly {
        const FIELDS: &'static [FieldSpec] = &[
            FieldSpec::new("name", SecurityLevel::Plaintext, "String"),
            FieldSpec::new("name", SecurityLevel::Temporary, "String"),
        ];

        fn field_value(&self, _name: &str) -> Option<Result<Value, serde_json::Error>> {
            None
        }

        fn assign_field(&mut self, _name: &str, _value: Value) -> FieldAssignment {
            FieldAssignment::Unknown
        }
    }

    #[test]
    fn test_report_counts_and_keyword_warnings() {
        let report = generate_security_report::<Sample>();
        assert_eq!(report.secure_field_count, 1);
        assert_eq!(report.plaintext_field_count, 2);
        assert_eq!(report.temporary_field_count, 1);
        // `auth_token` matches both `auth` and `token`.
        assert_eq!(report.warnings.len(), 2);
        assert!(report.warnings.iter().all(|w| w.contains("auth_token")));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_report_flags_missing_secure_fields_and_duplicates() {
        let report = generate_security_report::<PlainOnly>();
        assert!(report.warnings.iter().any(|w| w.contains("no secure fields")));
        assert_eq!(report.errors.len(), 1);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_compliance_is_advisory() {
        assert_eq!(check_security_compliance::<Sample>(true).len(), 2);
        let findings = check_security_compliance::<PlainOnly>(true);
        assert_eq!(findings, vec!["Record must contain at least one secure field".to_owned()]);
        assert!(check_security_compliance::<PlainOnly>(false).is_empty());
    }
}
