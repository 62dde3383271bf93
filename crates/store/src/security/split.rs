use crate::error::{StoreError, StoreErrorExt};
use crate::security::classify::{Classified, FieldAssignment, classify, validate_classification};
use crate::security::level::SecurityLevel;
use serde_json::{Map, Value};
use tracing::debug;

/// Field maps of one record, one per security level.
///
/// `temporary` exists only in memory: nothing in this crate serializes it to a
/// persistent medium.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SplitData {
    pub secure: Map<String, Value>,
    pub plaintext: Map<String, Value>,
    pub temporary: Map<String, Value>,
}

impl SplitData {
    #[must_use]
    pub fn has_secure_data(&self) -> bool {
        !self.secure.is_empty()
    }

    #[must_use]
    pub fn has_plaintext_data(&self) -> bool {
        !self.plaintext.is_empty()
    }

    #[must_use]
    pub fn has_temporary_data(&self) -> bool {
        !self.temporary.is_empty()
    }

    /// Sets one temporary value, replacing any previous value for `field`.
    pub fn add_temporary(&mut self, field: impl Into<String>, value: Value) {
        self.temporary.insert(field.into(), value);
    }

    pub fn remove_temporary(&mut self, field: &str) -> Option<Value> {
        self.temporary.remove(field)
    }

    pub fn clear_temporary(&mut self) {
        self.temporary.clear();
    }

    /// JSON for the secure artifact; an empty map encodes as `{}`.
    ///
    /// # Errors
    /// [`StoreError::Serialization`] if encoding fails.
    pub fn serialize_secure(&self) -> Result<Vec<u8>, StoreError> {
        encode_map(&self.secure).context("Encoding secure fields")
    }

    /// JSON for the plaintext artifact; an empty map encodes as `{}`.
    ///
    /// # Errors
    /// [`StoreError::Serialization`] if encoding fails.
    pub fn serialize_plaintext(&self) -> Result<Vec<u8>, StoreError> {
        encode_map(&self.plaintext).context("Encoding plaintext fields")
    }

    /// Rebuilds persisted maps from artifact bytes; absent or empty input is an empty map.
    ///
    /// # Errors
    /// [`StoreError::Serialization`] if an artifact is not a JSON object.
    pub fn from_artifacts(
        secure: Option<&[u8]>,
        plaintext: Option<&[u8]>,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            secure: decode_map(secure).context("Decoding secure fields")?,
            plaintext: decode_map(plaintext).context("Decoding plaintext fields")?,
            temporary: Map::new(),
        })
    }

    /// Single map with later levels overriding earlier ones: secure, plaintext, then
    /// temporary when `include_temporary` is set.
    #[must_use]
    pub fn merged(&self, include_temporary: bool) -> Map<String, Value> {
        let mut merged = self.secure.clone();
        merged.extend(self.plaintext.iter().map(|(k, v)| (k.clone(), v.clone())));
        if include_temporary {
            merged.extend(self.temporary.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merged
    }

    /// Secure and plaintext fields only; what non-hybrid drivers persist.
    #[must_use]
    pub fn persistent(&self) -> Map<String, Value> {
        self.merged(false)
    }
}

fn encode_map(map: &Map<String, Value>) -> Result<Vec<u8>, serde_json::Error> {
    if map.is_empty() { Ok(b"{}".to_vec()) } else { serde_json::to_vec(map) }
}

fn decode_map(bytes: Option<&[u8]>) -> Result<Map<String, Value>, serde_json::Error> {
    match bytes {
        Some(bytes) if !bytes.is_empty() => serde_json::from_slice(bytes),
        _ => Ok(Map::new()),
    }
}

/// Classifies `record` and distributes its fields into per-level maps.
///
/// # Errors
/// [`StoreError::Classification`] or [`StoreError::DuplicateField`].
pub fn split_record<R: Classified>(record: &R) -> Result<SplitData, StoreError> {
    let classification = classify(record)?;
    validate_classification(&classification)?;

    let mut split = SplitData::default();
    for info in classification.iter() {
        let target = match info.level {
            SecurityLevel::Secure => &mut split.secure,
            SecurityLevel::Plaintext => &mut split.plaintext,
            SecurityLevel::Temporary => &mut split.temporary,
        };
        target.insert(info.name.clone(), info.value.clone());
    }

    Ok(split)
}

/// Writes every value of `fields` into `record`; unknown or mismatched fields are skipped.
pub fn assign_fields<R: Classified>(record: &mut R, fields: Map<String, Value>) {
    for (name, value) in fields {
        match record.assign_field(&name, value) {
            FieldAssignment::Assigned => {},
            FieldAssignment::Unknown => debug!(field = %name, "Skipping unknown field during merge"),
            FieldAssignment::Incompatible => {
                debug!(field = %name, "Skipping field with incompatible value during merge");
            },
        }
    }
}

/// Rebuilds a record from split maps, starting from the value returned by `factory`.
///
/// Fields absent from `split` keep the factory's value.
pub fn combine_split_data<R, F>(split: &SplitData, include_temporary: bool, factory: F) -> R
where
    R: Classified,
    F: FnOnce() -> R,
{
    let mut record = factory();
    assign_fields(&mut record, split.merged(include_temporary));
    record
}

/// Serializes only the persistent (secure and plaintext) fields of a record.
///
/// # Errors
/// Classification or encoding failures.
pub fn persistent_json<R: Classified>(record: &R) -> Result<Vec<u8>, StoreError> {
    let split = split_record(record)?;
    Ok(serde_json::to_vec(&Value::Object(split.persistent()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile_model;
    use serde_json::json;

    #[profile_model]
    #[derive(Clone, Default, PartialEq)]
    struct Connection {
        name: String,
        #[security(secure)]
        api_key: String,
        #[security(temporary)]
        session: String,
        #[serde(rename = "region_code")]
        region: Option<String>,
        #[serde(skip)]
        cache_hits: u32,
    }

    fn sample() -> Connection {
        Connection {
            name: "prod".into(),
            api_key: "sk-123".into(),
            session: "tmp".into(),
            region: Some("eu".into()),
            cache_hits: 7,
        }
    }

    #[test]
    fn test_split_distributes_by_level() {
        let split = split_record(&sample()).unwrap();
        assert_eq!(split.secure, json!({"api_key": "sk-123"}).as_object().unwrap().clone());
        assert_eq!(
            split.plaintext,
            json!({"name": "prod", "region_code": "eu"}).as_object().unwrap().clone()
        );
        assert_eq!(split.temporary.get("session"), Some(&json!("tmp")));
        assert!(!split.persistent().contains_key("cache_hits"));
    }

    #[test]
    fn test_merge_restores_declared_fields() {
        let original = sample();
        let split = split_record(&original).unwrap();
        let merged: Connection = combine_split_data(&split, true, Connection::default);

        assert_eq!(merged.name, original.name);
        assert_eq!(merged.api_key, original.api_key);
        assert_eq!(merged.session, original.session);
        assert_eq!(merged.region, original.region);
        assert_eq!(merged.cache_hits, 0, "skipped fields are not carried");

        let without_temp: Connection = combine_split_data(&split, false, Connection::default);
        assert!(without_temp.session.is_empty());
    }

    #[test]
    fn test_merge_tolerates_schema_drift() {
        let mut split = SplitData::default();
        split.plaintext.insert("name".into(), json!("dev"));
        split.plaintext.insert("removed_field".into(), json!(true));
        split.secure.insert("api_key".into(), json!(42));

        let merged: Connection = combine_split_data(&split, false, Connection::default);
        assert_eq!(merged.name, "dev");
        assert!(merged.api_key.is_empty(), "incompatible values are skipped");
    }

    #[test]
    fn test_empty_maps_serialize_to_empty_object() {
        let split = SplitData::default();
        assert_eq!(split.serialize_secure().unwrap(), b"{}");
        assert_eq!(split.serialize_plaintext().unwrap(), b"{}");

        let back = SplitData::from_artifacts(Some(b"{}"), None).unwrap();
        assert!(!back.has_secure_data() && !back.has_plaintext_data());
        assert!(SplitData::from_artifacts(Some(b"[1,2]"), None).is_err());
    }

    #[test]
    fn test_temporary_overrides_on_merge() {
        let mut split = SplitData::default();
        split.plaintext.insert("name".into(), json!("disk"));
        split.add_temporary("name", json!("memory"));
        assert_eq!(split.merged(true)["name"], "memory");
        assert_eq!(split.merged(false)["name"], "disk");

        split.remove_temporary("name");
        assert!(!split.has_temporary_data());
        split.add_temporary("x", json!(1));
        split.clear_temporary();
        assert!(split.temporary.is_empty());
    }

    #[test]
    fn test_debug_redacts_secure_fields() {
        let rendered = format!("{:?}", sample());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("sk-123"));
        assert!(rendered.contains("prod"));
    }
}
