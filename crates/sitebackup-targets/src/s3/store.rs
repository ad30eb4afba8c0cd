//! Object storage access
//!
//! [`ObjectStore`] is the narrow surface the S3 target needs: bucket
//! existence, listing, upload and delete. [`AwsObjectStore`] implements it
//! with `aws-sdk-s3` against AWS or any S3-compatible service (MinIO,
//! Wasabi, Ceph RGW).

use crate::error::{StorageError, StorageErrorKind};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Minimal object storage operations used by [`super::S3Target`]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError>;

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// All object keys in the bucket
    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError>;

    /// Upload a local file; returns the number of bytes sent
    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64, StorageError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

/// Connection parameters of an S3-compatible service
#[derive(Clone, PartialEq, Eq)]
pub struct S3Endpoint {
    pub host: String,
    pub port: Option<u16>,
    pub secure: bool,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

impl S3Endpoint {
    /// Endpoint for `host` or `host:port`
    pub fn new(address: &str) -> Self {
        let (host, port) = match address.rsplit_once(':') {
            Some((host, port)) => match port.parse() {
                Ok(port) => (host.to_string(), Some(port)),
                Err(_) => (address.to_string(), None),
            },
            None => (address.to_string(), None),
        };
        Self {
            host,
            port,
            secure: true,
            region: sitebackup_core::config::DEFAULT_S3_REGION.to_string(),
            access_key: None,
            secret_key: None,
        }
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        if port.is_some() {
            self.port = port;
        }
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_credentials(mut self, access_key: Option<String>, secret_key: Option<String>) -> Self {
        self.access_key = access_key;
        self.secret_key = secret_key;
        self
    }

    /// `http(s)://host[:port]`
    pub fn url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{scheme}://{}:{port}", self.host),
            None => format!("{scheme}://{}", self.host),
        }
    }
}

impl fmt::Debug for S3Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("secure", &self.secure)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .finish_non_exhaustive()
    }
}

/// [`ObjectStore`] backed by `aws-sdk-s3`
pub struct AwsObjectStore {
    client: Client,
}

impl AwsObjectStore {
    /// Create a client for the endpoint
    ///
    /// Explicit keys take precedence; otherwise the default AWS credential
    /// chain (environment, profile) is used.
    pub async fn connect(endpoint: &S3Endpoint) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(endpoint.region.clone()));

        if let (Some(access_key), Some(secret_key)) = (&endpoint.access_key, &endpoint.secret_key) {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "sitebackup",
            ));
        }

        let sdk_config = loader.load().await;

        let url = endpoint.url();
        debug!("Using S3 endpoint: {}", url);
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(url)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl fmt::Debug for AwsObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsObjectStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl ObjectStore for AwsObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, StorageError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!("Bucket {} is accessible", bucket);
                Ok(true)
            }
            Err(SdkError::ServiceError(ctx)) if ctx.err().is_not_found() => {
                debug!("Bucket {} does not exist", bucket);
                Ok(false)
            }
            Err(e) => Err(classify("head_bucket", e)),
        }
    }

    async fn create_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.client
            .create_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| classify("create_bucket", e))?;
        Ok(())
    }

    async fn list_keys(&self, bucket: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let resp = request
                .send()
                .await
                .map_err(|e| classify("list_objects_v2", e))?;

            keys.extend(resp.contents().iter().filter_map(|o| o.key().map(str::to_string)));

            if resp.is_truncated() == Some(true) {
                continuation_token = resp.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        debug!("Found {} objects in bucket {}", keys.len(), bucket);
        Ok(keys)
    }

    async fn put_file(&self, bucket: &str, key: &str, path: &Path) -> Result<u64, StorageError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|e| StorageError::io("put_object", &e))?
            .len();
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::api("put_object", e.to_string()))?;

        debug!("Uploading {} ({} bytes) to s3://{}/{}", path.display(), size, bucket, key);
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("application/gzip")
            .body(body)
            .send()
            .await
            .map_err(|e| classify("put_object", e))?;
        Ok(size)
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify("delete_object", e))?;
        Ok(())
    }
}

const AUTHENTICATION_CODES: &[&str] = &[
    "InvalidAccessKeyId",
    "SignatureDoesNotMatch",
    "AccessDenied",
    "ExpiredToken",
    "InvalidToken",
];

/// Map an SDK error onto the storage error taxonomy
fn classify<E>(operation: &str, err: SdkError<E, HttpResponse>) -> StorageError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let message = DisplayErrorContext(&err).to_string();
    let kind = match &err {
        SdkError::ServiceError(ctx) => {
            let status = ctx.raw().status().as_u16();
            match ctx.err().code() {
                Some(code) if AUTHENTICATION_CODES.contains(&code) => StorageErrorKind::Authentication,
                _ if status == 401 || status == 403 => StorageErrorKind::Authentication,
                _ => StorageErrorKind::Api,
            }
        }
        _ => classify_message(&message),
    };
    StorageError::new(kind, operation, message)
}

/// Kind of a failure that never reached the service
fn classify_message(message: &str) -> StorageErrorKind {
    let lower = message.to_lowercase();
    if lower.contains("credential") {
        StorageErrorKind::Authentication
    } else if lower.contains("tls") || lower.contains("certificate") || lower.contains("ssl") {
        StorageErrorKind::Tls
    } else if lower.contains("dispatch")
        || lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("dns")
        || lower.contains("connect")
    {
        StorageErrorKind::Connectivity
    } else {
        StorageErrorKind::Api
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let endpoint = S3Endpoint::new("s3.example.org");
        assert_eq!(endpoint.url(), "https://s3.example.org");

        let endpoint = S3Endpoint::new("minio.local:9000").with_secure(false);
        assert_eq!(endpoint.host, "minio.local");
        assert_eq!(endpoint.port, Some(9000));
        assert_eq!(endpoint.url(), "http://minio.local:9000");

        let endpoint = S3Endpoint::new("minio.local").with_port(Some(9443));
        assert_eq!(endpoint.url(), "https://minio.local:9443");
    }

    #[test]
    fn test_endpoint_debug_hides_secret() {
        let endpoint = S3Endpoint::new("s3.example.org")
            .with_credentials(Some("AKIA".into()), Some("topsecret".into()));
        let debug = format!("{endpoint:?}");
        assert!(debug.contains("AKIA"));
        assert!(!debug.contains("topsecret"));
    }

    #[test]
    fn test_classify_message() {
        assert_eq!(
            classify_message("dispatch failure: io error: Connection refused"),
            StorageErrorKind::Connectivity
        );
        assert_eq!(
            classify_message("dispatch failure: invalid peer certificate: UnknownIssuer"),
            StorageErrorKind::Tls
        );
        assert_eq!(
            classify_message("failed to load credentials: no providers in chain"),
            StorageErrorKind::Authentication
        );
        assert_eq!(classify_message("unhandled error"), StorageErrorKind::Api);
    }
}
