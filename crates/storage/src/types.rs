//! Shared data structures for storage operations.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Configuration settings for storage backends.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    /// AWS region.
    pub region: String,
    /// AWS credentials (access key, secret key, session token).
    pub credentials: Option<AwsCredentials>,
    /// Expected bucket owner account, sent with every request when set.
    pub expected_bucket_owner: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            region: "us-west-2".into(),
            credentials: None,
            expected_bucket_owner: None,
        }
    }
}

impl StorageSettings {
    /// Set the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set explicit credentials instead of the default provider chain.
    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the expected bucket owner.
    pub fn with_expected_bucket_owner(mut self, owner: impl Into<String>) -> Self {
        self.expected_bucket_owner = Some(owner.into());
        self
    }
}

/// AWS credentials.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

/// Identifier of one immutable generation of a remote object.
///
/// Only equality is meaningful. Numeric generations (GCS style) and opaque
/// version ids (S3 style) share the same string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Generation(String);

impl Generation {
    /// Get the generation id as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u64> for Generation {
    fn from(generation: u64) -> Self {
        Self(generation.to_string())
    }
}

impl From<i64> for Generation {
    fn from(generation: i64) -> Self {
        Self(generation.to_string())
    }
}

impl From<&str> for Generation {
    fn from(generation: &str) -> Self {
        Self(generation.to_string())
    }
}

impl From<String> for Generation {
    fn from(generation: String) -> Self {
        Self(generation)
    }
}

/// Record describing one generation of a remote object.
///
/// Immutable once created by the backend. `size` is signed so that
/// malformed records from external sources can be represented and rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRecord {
    /// Object name within the bucket.
    pub name: String,
    /// Generation this record describes.
    pub generation: Generation,
    /// Content size in bytes.
    pub size: i64,
}

impl ObjectRecord {
    /// Create a new object record.
    ///
    /// # Arguments
    /// * `name` - Object name
    /// * `generation` - Generation id
    /// * `size` - Content size in bytes
    pub fn new(name: impl Into<String>, generation: impl Into<Generation>, size: i64) -> Self {
        Self {
            name: name.into(),
            generation: generation.into(),
            size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_numeric_and_string_forms_agree() {
        assert_eq!(Generation::from(42u64), Generation::from("42"));
        assert_eq!(Generation::from(42i64), Generation::from(String::from("42")));
        assert_ne!(Generation::from(42u64), Generation::from(43u64));
    }

    #[test]
    fn test_object_record_serializes_generation_as_string() {
        let record = ObjectRecord::new("logs/today.txt", 7u64, 128);
        let json: String = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"name":"logs/today.txt","generation":"7","size":128}"#
        );

        let parsed: ObjectRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_object_record_accepts_negative_size() {
        let parsed: ObjectRecord =
            serde_json::from_str(r#"{"name":"f","generation":"1","size":-1}"#).unwrap();
        assert_eq!(parsed.size, -1);
    }

    #[test]
    fn test_storage_settings_builders() {
        let settings = StorageSettings::default()
            .with_region("eu-central-1")
            .with_expected_bucket_owner("123456789012");
        assert_eq!(settings.region, "eu-central-1");
        assert_eq!(settings.expected_bucket_owner.as_deref(), Some("123456789012"));
        assert!(settings.credentials.is_none());
    }
}
