//! Errors raised by the versioned S3 bucket and their storage-level kinds.

use rusty_objproxy_storage::StorageError;
use thiserror::Error;

/// S3 error codes meaning the caller lacks permission for the request.
const ACCESS_DENIED_CODES: &[&str] = &[
    "AccessDenied",
    "AllAccessDisabled",
    "AccountProblem",
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
];

/// S3 error codes worth retrying, including some sent with a 4xx status.
const TRANSIENT_CODES: &[&str] = &[
    "RequestTimeout",
    "RequestTimeTooSkewed",
    "SlowDown",
    "Throttling",
    "ThrottlingException",
    "InternalError",
    "ServiceUnavailable",
];

/// Errors specific to the S3 bucket backend.
#[derive(Error, Debug)]
pub enum CrtError {
    /// A GetObject or PutObject request failed.
    ///
    /// `code` is the S3 error code and `status` the HTTP status, when a
    /// response arrived at all.
    #[error("S3 request for {key} failed: {message}")]
    Request {
        key: String,
        code: Option<String>,
        status: Option<u16>,
        message: String,
    },

    /// PutObject succeeded but returned no version id.
    #[error("bucket {bucket} returned no version id for {key}; object versioning must be enabled")]
    VersioningDisabled { bucket: String, key: String },

    /// Bucket name rejected before any request was made.
    #[error("invalid bucket name {0:?}")]
    InvalidBucketName(String),

    /// Reading the content to upload failed.
    #[error("failed to read upload body for {key}: {source}")]
    UploadBody {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

/// Map a failed S3 request onto a storage error kind.
///
/// Throttling, timeouts, 5xx responses and failures without any response are
/// retryable. Permission failures become `AccessDenied`. Every other 4xx is a
/// permanent `NetworkError`.
pub(crate) fn classify(
    key: &str,
    code: Option<&str>,
    status: Option<u16>,
    message: String,
) -> StorageError {
    if code.is_some_and(|code| TRANSIENT_CODES.contains(&code)) {
        return StorageError::NetworkError {
            message,
            retryable: true,
        };
    }

    if code.is_some_and(|code| ACCESS_DENIED_CODES.contains(&code)) || status == Some(403) {
        return StorageError::AccessDenied {
            name: key.to_string(),
            message,
        };
    }

    let retryable: bool = match status {
        Some(408 | 429) => true,
        Some(status) => !(400..500).contains(&status),
        None => code.is_none(),
    };

    StorageError::NetworkError { message, retryable }
}

impl From<CrtError> for StorageError {
    fn from(err: CrtError) -> Self {
        match err {
            CrtError::Request {
                key,
                code,
                status,
                message,
            } => classify(&key, code.as_deref(), status, message),
            err @ (CrtError::VersioningDisabled { .. } | CrtError::InvalidBucketName(_)) => {
                StorageError::InvalidConfig {
                    message: err.to_string(),
                }
            }
            err @ CrtError::UploadBody { .. } => StorageError::IoError {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(code: Option<&str>, status: Option<u16>) -> StorageError {
        CrtError::Request {
            key: "logs/today.txt".into(),
            code: code.map(str::to_owned),
            status,
            message: "request failed".into(),
        }
        .into()
    }

    #[test]
    fn test_access_denied_is_not_retryable() {
        let err: StorageError = request(Some("AccessDenied"), Some(403));
        assert!(
            matches!(err, StorageError::AccessDenied { ref name, .. } if name == "logs/today.txt")
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_forbidden_status_without_code_is_access_denied() {
        let err: StorageError = request(None, Some(403));
        assert!(matches!(err, StorageError::AccessDenied { .. }));
    }

    #[test]
    fn test_malformed_version_id_is_permanent() {
        let err: StorageError = request(Some("InvalidArgument"), Some(400));
        assert!(matches!(
            err,
            StorageError::NetworkError {
                retryable: false,
                ..
            }
        ));
    }

    #[test]
    fn test_throttling_and_server_errors_are_retryable() {
        assert!(request(Some("SlowDown"), Some(503)).is_retryable());
        assert!(request(Some("InternalError"), Some(500)).is_retryable());
        assert!(request(None, Some(502)).is_retryable());
        assert!(request(None, Some(429)).is_retryable());
    }

    #[test]
    fn test_request_timeout_is_retryable_despite_client_status() {
        assert!(request(Some("RequestTimeout"), Some(400)).is_retryable());
    }

    #[test]
    fn test_transport_failure_without_response_is_retryable() {
        assert!(request(None, None).is_retryable());
    }

    #[test]
    fn test_versioning_disabled_maps_to_invalid_config() {
        let err: StorageError = CrtError::VersioningDisabled {
            bucket: "plain".into(),
            key: "a".into(),
        }
        .into();
        assert!(
            matches!(err, StorageError::InvalidConfig { ref message } if message.contains("versioning"))
        );
    }

    #[test]
    fn test_upload_body_failure_maps_to_io_error() {
        let err: StorageError = CrtError::UploadBody {
            key: "a".into(),
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read"),
        }
        .into();
        assert!(matches!(err, StorageError::IoError { ref message } if message.contains("short read")));
    }
}
