use crate::error::StoreError;
use crate::security::level::SecurityLevel;
use serde_json::Value;
use std::collections::HashSet;

/// Static description of one classified field, generated by `#[profile_model]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Serialized field name; also the key in split maps.
    pub name: &'static str,
    pub level: SecurityLevel,
    /// Rust type as written in the struct, for reports.
    pub type_name: &'static str,
}

impl FieldSpec {
    #[must_use]
    pub const fn new(name: &'static str, level: SecurityLevel, type_name: &'static str) -> Self {
        Self { name, level, type_name }
    }
}

/// Outcome of writing one merged value back into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAssignment {
    Assigned,
    /// The record has no field with that name.
    Unknown,
    /// The stored value does not deserialize into the field's type.
    Incompatible,
}

/// A record whose fields carry a [`SecurityLevel`].
///
/// Implemented by `#[profile_model]`; the field table is fixed at compile time, so
/// classification never inspects types at runtime.
pub trait Classified {
    const FIELDS: &'static [FieldSpec];

    /// Serializes the named field, or `None` if the record has no such field.
    fn field_value(&self, name: &str) -> Option<Result<Value, serde_json::Error>>;

    /// Deserializes `value` into the named field.
    fn assign_field(&mut self, name: &str, value: Value) -> FieldAssignment;

    /// Level of the named field, if the record declares it.
    #[must_use]
    fn level_of(name: &str) -> Option<SecurityLevel>
    where
        Self: Sized,
    {
        Self::FIELDS.iter().find(|spec| spec.name == name).map(|spec| spec.level)
    }

    #[must_use]
    fn declares(level: SecurityLevel) -> bool
    where
        Self: Sized,
    {
        Self::FIELDS.iter().any(|spec| spec.level == level)
    }
}

/// One field with its current value.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub level: SecurityLevel,
    pub value: Value,
    pub type_name: String,
}

/// Fields of a record grouped by security level, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub secure: Vec<FieldInfo>,
    pub plaintext: Vec<FieldInfo>,
    pub temporary: Vec<FieldInfo>,
}

impl Classification {
    #[must_use]
    pub fn fields(&self, level: SecurityLevel) -> &[FieldInfo] {
        match level {
            SecurityLevel::Secure => &self.secure,
            SecurityLevel::Plaintext => &self.plaintext,
            SecurityLevel::Temporary => &self.temporary,
        }
    }

    fn push(&mut self, info: FieldInfo) {
        match info.level {
            SecurityLevel::Secure => self.secure.push(info),
            SecurityLevel::Plaintext => self.plaintext.push(info),
            SecurityLevel::Temporary => self.temporary.push(info),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldInfo> {
        self.secure.iter().chain(&self.plaintext).chain(&self.temporary)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.secure.len() + self.plaintext.len() + self.temporary.len()
    }
}

/// Reads every classified field of `record`.
///
/// # Errors
/// [`StoreError::Classification`] if a field value cannot be represented as JSON
/// (for example a map with non-string keys).
pub fn classify<R: Classified>(record: &R) -> Result<Classification, StoreError> {
    let mut classification = Classification::default();

    for spec in R::FIELDS {
        let value = match record.field_value(spec.name) {
            Some(Ok(value)) => value,
            Some(Err(err)) => {
                return Err(StoreError::Classification {
                    message: err.to_string().into(),
                    context: Some(format!("field `{}`", spec.name).into()),
                });
            },
            None => {
                return Err(StoreError::Classification {
                    message: format!("field `{}` is declared but not readable", spec.name).into(),
                    context: None,
                });
            },
        };

        classification.push(FieldInfo {
            name: spec.name.to_owned(),
            level: spec.level,
            value,
            type_name: spec.type_name.to_owned(),
        });
    }

    Ok(classification)
}

/// Ensures no field name appears more than once across all levels.
///
/// # Errors
/// [`StoreError::DuplicateField`] naming the first repeated field.
pub fn validate_classification(classification: &Classification) -> Result<(), StoreError> {
    let mut seen = HashSet::with_capacity(classification.len());
    for info in classification.iter() {
        if !seen.insert(info.name.as_str()) {
            return Err(StoreError::DuplicateField {
                message: info.name.clone().into(),
                context: Some(format!("second occurrence at level {}", info.level).into()),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile_model;
    use std::collections::BTreeMap;

    #[profile_model]
    #[derive(Default)]
    struct Tagged {
        #[security = "secure"]
        password: String,
        #[security(plaintext)]
        host: String,
        port: u16,
        #[security(temporary)]
        otp: Option<String>,
    }

    #[profile_model]
    #[derive(Default)]
    struct BadKeys {
        lookup: BTreeMap<Vec<u8>, String>,
    }

    #[test]
    fn test_fields_table_follows_declaration() {
        let names: Vec<_> = Tagged::FIELDS.iter().map(|s| (s.name, s.level)).collect();
        assert_eq!(
            names,
            [
                ("password", SecurityLevel::Secure),
                ("host", SecurityLevel::Plaintext),
                ("port", SecurityLevel::Plaintext),
                ("otp", SecurityLevel::Temporary),
            ]
        );
        assert_eq!(Tagged::level_of("port"), Some(SecurityLevel::Plaintext));
        assert_eq!(Tagged::level_of("missing"), None);
        assert!(Tagged::declares(SecurityLevel::Temporary));
        assert_eq!(Tagged::FIELDS[3].type_name, "Option<String>");
    }

    #[test]
    fn test_classify_buckets_values() {
        let record = Tagged { password: "p".into(), host: "h".into(), port: 22, otp: None };
        let classification = classify(&record).unwrap();
        assert_eq!(classification.len(), 4);
        assert_eq!(classification.fields(SecurityLevel::Secure)[0].value, "p");
        assert_eq!(classification.plaintext.len(), 2);
        assert!(classification.temporary[0].value.is_null());
        validate_classification(&classification).unwrap();
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let info = |level| FieldInfo {
            name: "token".into(),
            level,
            value: Value::Null,
            type_name: "String".into(),
        };
        let classification = Classification {
            secure: vec![info(SecurityLevel::Secure)],
            plaintext: vec![info(SecurityLevel::Plaintext)],
            temporary: Vec::new(),
        };
        assert!(matches!(
            validate_classification(&classification),
            Err(StoreError::DuplicateField { .. })
        ));
    }

    #[test]
    fn test_unrepresentable_value_is_a_classification_error() {
        let mut record = BadKeys::default();
        record.lookup.insert(vec![1], "x".into());
        assert!(matches!(classify(&record), Err(StoreError::Classification { .. })));
    }
}
