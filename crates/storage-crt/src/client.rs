//! AWS SDK S3 bucket implementation.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::CrtError;
use rusty_objproxy_storage::{
    Bucket, Generation, ObjectReader, ObjectRecord, StorageError, StorageSettings,
};

/// Error code S3 returns when the key does not exist.
const NO_SUCH_KEY: &str = "NoSuchKey";

/// Error code S3 returns when a key exists but the requested version does not.
const NO_SUCH_VERSION: &str = "NoSuchVersion";

/// Capture the code, status and context of a failed request on `key`.
fn request_error<E>(key: &str, err: SdkError<E, HttpResponse>) -> CrtError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    CrtError::Request {
        key: key.to_string(),
        code: err.code().map(str::to_owned),
        status: err.raw_response().map(|response| response.status().as_u16()),
        message: DisplayErrorContext(&err).to_string(),
    }
}

/// Bucket implementation over a versioned S3 bucket.
///
/// Object generations are S3 version ids.
pub struct CrtBucket {
    /// The underlying S3 client.
    s3_client: S3Client,
    /// Name of the S3 bucket.
    bucket: String,
    /// Expected bucket owner for security validation.
    expected_bucket_owner: Option<String>,
}

impl CrtBucket {
    /// Create a new bucket handle with the default credential chain.
    ///
    /// # Arguments
    /// * `settings` - Storage settings including region and optional credentials
    /// * `bucket` - Name of a versioning-enabled S3 bucket
    ///
    /// # Returns
    /// A new CRT bucket.
    pub async fn new(
        settings: StorageSettings,
        bucket: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let bucket: String = bucket.into();
        if bucket.is_empty() {
            return Err(CrtError::InvalidBucketName(bucket).into());
        }

        let config_loader = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new(settings.region.clone()));

        let config_loader = if let Some(ref creds) = settings.credentials {
            let credentials = Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "rusty-objproxy",
            );
            config_loader.credentials_provider(credentials)
        } else {
            config_loader
        };

        let sdk_config = config_loader.load().await;
        let s3_client = S3Client::new(&sdk_config);

        log::debug!("Created S3 bucket handle for {} in {}", bucket, settings.region);

        Ok(Self {
            s3_client,
            bucket,
            expected_bucket_owner: settings.expected_bucket_owner,
        })
    }

    /// Create a bucket handle from an existing S3Client (for testing).
    ///
    /// # Arguments
    /// * `s3_client` - Pre-configured S3 client
    /// * `bucket` - Name of the S3 bucket
    /// * `expected_bucket_owner` - Optional expected bucket owner
    pub fn from_client(
        s3_client: S3Client,
        bucket: impl Into<String>,
        expected_bucket_owner: Option<String>,
    ) -> Self {
        Self {
            s3_client,
            bucket: bucket.into(),
            expected_bucket_owner,
        }
    }
}

#[async_trait]
impl Bucket for CrtBucket {
    fn name(&self) -> &str {
        &self.bucket
    }

    async fn fetch_object(
        &self,
        name: &str,
        generation: &Generation,
    ) -> Result<ObjectReader, StorageError> {
        let mut request = self
            .s3_client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .version_id(generation.as_str());

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        let response = request.send().await.map_err(|err| {
            if matches!(err.code(), Some(NO_SUCH_KEY | NO_SUCH_VERSION)) {
                StorageError::NotFound {
                    name: name.to_string(),
                    generation: generation.clone(),
                }
            } else {
                StorageError::from(request_error(name, err))
            }
        })?;

        Ok(Box::pin(response.body.into_async_read()))
    }

    async fn create_object(
        &self,
        name: &str,
        contents: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<ObjectRecord, StorageError> {
        let mut data: Vec<u8> = Vec::new();
        contents
            .read_to_end(&mut data)
            .await
            .map_err(|source| CrtError::UploadBody {
                key: name.to_string(),
                source,
            })?;
        let size: i64 = data.len() as i64;

        let mut request = self
            .s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(data));

        if let Some(ref owner) = self.expected_bucket_owner {
            request = request.expected_bucket_owner(owner);
        }

        let output = request
            .send()
            .await
            .map_err(|err| request_error(name, err))?;

        let version_id: &str = output
            .version_id()
            .ok_or_else(|| CrtError::VersioningDisabled {
                bucket: self.bucket.clone(),
                key: name.to_string(),
            })?;

        log::debug!(
            "Created s3://{}/{} version {} ({} bytes)",
            self.bucket,
            name,
            version_id,
            size
        );

        Ok(ObjectRecord::new(name, version_id, size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crt_bucket_implements_bucket() {
        // This is a compile-time test to ensure the trait is implemented correctly
        fn assert_bucket<T: Bucket>() {}
        assert_bucket::<CrtBucket>();
    }

    #[tokio::test]
    async fn test_new_rejects_empty_bucket_name() {
        let result = CrtBucket::new(StorageSettings::default(), "").await;
        assert!(
            matches!(result, Err(StorageError::InvalidConfig { ref message }) if message.contains("bucket name"))
        );
    }

    #[test]
    fn test_from_client_reports_bucket_name() {
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-west-2"))
            .build();
        let bucket = CrtBucket::from_client(S3Client::from_conf(config), "versioned", None);
        assert_eq!(bucket.name(), "versioned");
    }
}
