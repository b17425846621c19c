use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::operation::put_object::PutObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use chrono::Local;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;
use crate::model::{RecordError, StoredRecord};

/// Key prefix under which all payloads are archived.
const KEY_PREFIX: &str = "weather-data";

/// Error from the storage layer. Returned, never swallowed; the caller
/// decides whether a failure is fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("bucket probe for '{bucket}' failed")]
    Probe {
        bucket: String,
        #[source]
        source: Box<SdkError<HeadBucketError>>,
    },

    #[error("failed to create bucket '{bucket}'")]
    Create {
        bucket: String,
        #[source]
        source: Box<SdkError<CreateBucketError>>,
    },

    #[error("failed to upload '{key}' to bucket '{bucket}'")]
    Upload {
        bucket: String,
        key: String,
        #[source]
        source: Box<SdkError<PutObjectError>>,
    },
}

/// Outcome of the bucket bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    /// The bucket already existed; nothing was created.
    AlreadyExists,
    /// The bucket was missing and has been created.
    Created,
}

/// Storage key for an object name: `weather-data/{name}.json`.
pub fn object_key(object_name: &str) -> String {
    format!("{KEY_PREFIX}/{object_name}.json")
}

/// S3-backed archive of fetched payloads.
///
/// Covers the one-time bucket bootstrap and the per-payload uploads. Like
/// every other boundary here it makes a single attempt per call: the SDK's
/// built-in retries are disabled.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
    region: String,
}

impl ObjectStore {
    /// Build a store from the runtime configuration.
    ///
    /// Credentials come from the SDK's default provider chain; an endpoint
    /// override in the configuration switches to path-style addressing
    /// (MinIO-style deployments have no per-bucket DNS).
    pub async fn connect(config: &Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(RetryConfig::disabled());
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if config.endpoint_url.is_some() {
            builder = builder.force_path_style(true);
        }

        Self::from_client(
            Client::from_conf(builder.build()),
            config.bucket.clone(),
            config.region.clone(),
        )
    }

    /// Build a store around an existing S3 client. Mainly for tests that
    /// point the client at a mock endpoint.
    pub fn from_client(client: Client, bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: region.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Make sure the destination bucket exists, creating it if the probe
    /// reports it missing.
    ///
    /// Idempotent in the success path: probing an existing bucket performs
    /// no creation call. Probe errors other than "not found" are returned
    /// as [`StoreError::Probe`] without attempting creation.
    pub async fn ensure_bucket(&self) -> Result<BucketStatus, StoreError> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(BucketStatus::AlreadyExists),
            Err(err) if is_not_found(&err) => self.create_bucket().await,
            Err(err) => Err(StoreError::Probe {
                bucket: self.bucket.clone(),
                source: Box::new(err),
            }),
        }
    }

    async fn create_bucket(&self) -> Result<BucketStatus, StoreError> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);

        // us-east-1 is the default location and rejects an explicit constraint.
        if !self.region.is_empty() && self.region != "us-east-1" {
            let constraint = BucketLocationConstraint::from(self.region.as_str());
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build(),
            );
        }

        request.send().await.map_err(|source| StoreError::Create {
            bucket: self.bucket.clone(),
            source: Box::new(source),
        })?;

        Ok(BucketStatus::Created)
    }

    /// Stamp the payload with the current capture time and upload it as
    /// `weather-data/{object_name}.json`, content type `application/json`.
    ///
    /// The payload itself is not modified; the uploaded record is a new
    /// value. A later save with the same name overwrites the object.
    pub async fn save(&self, payload: &Value, object_name: &str) -> Result<(), StoreError> {
        let record = StoredRecord::stamp(payload, Local::now())?;
        let key = object_key(object_name);
        let body = record.to_bytes()?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type("application/json")
            .send()
            .await
            .map_err(|source| StoreError::Upload {
                bucket: self.bucket.clone(),
                key,
                source: Box::new(source),
            })?;

        Ok(())
    }
}

fn is_not_found(err: &SdkError<HeadBucketError>) -> bool {
    err.as_service_error()
        .is_some_and(HeadBucketError::is_not_found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TIMESTAMP_FORMAT;
    use aws_sdk_s3::config::Credentials;
    use chrono::NaiveDateTime;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BUCKET: &str = "weather-archive";

    fn store_for(server: &MockServer) -> ObjectStore {
        let sdk_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .endpoint_url(server.uri())
            .credentials_provider(Credentials::new("test", "test", None, None, "test"))
            .retry_config(RetryConfig::disabled())
            .force_path_style(true)
            .build();

        ObjectStore::from_client(Client::from_conf(sdk_config), BUCKET, "us-east-1")
    }

    #[tokio::test]
    async fn ensure_bucket_is_a_noop_when_the_bucket_exists() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path(format!("/{BUCKET}/")))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("/{BUCKET}/")))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let status = store_for(&server).ensure_bucket().await.unwrap();

        assert_eq!(status, BucketStatus::AlreadyExists);
    }

    #[tokio::test]
    async fn ensure_bucket_creates_a_missing_bucket() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path(format!("/{BUCKET}/")))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("/{BUCKET}/")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let status = store_for(&server).ensure_bucket().await.unwrap();

        assert_eq!(status, BucketStatus::Created);
    }

    #[tokio::test]
    async fn repeated_ensure_performs_at_most_one_creation() {
        let server = MockServer::start().await;
        // First probe misses; every later probe sees the bucket.
        Mock::given(method("HEAD"))
            .and(path(format!("/{BUCKET}/")))
            .respond_with(ResponseTemplate::new(404))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("HEAD"))
            .and(path(format!("/{BUCKET}/")))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("/{BUCKET}/")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);

        assert_eq!(store.ensure_bucket().await.unwrap(), BucketStatus::Created);
        assert_eq!(
            store.ensure_bucket().await.unwrap(),
            BucketStatus::AlreadyExists
        );
    }

    #[tokio::test]
    async fn probe_errors_other_than_not_found_skip_creation() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path(format!("/{BUCKET}/")))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(format!("/{BUCKET}/")))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = store_for(&server).ensure_bucket().await.unwrap_err();

        assert!(matches!(err, StoreError::Probe { .. }));
    }

    #[tokio::test]
    async fn save_uploads_the_stamped_record_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path(format!("/{BUCKET}/weather-data/Seattle_current.json")))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let payload = json!({"name": "Seattle", "cod": 200});
        store_for(&server)
            .save(&payload, "Seattle_current")
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(body["name"], json!("Seattle"));
        assert_eq!(body["cod"], json!(200));
        let stamp = body["timestamp"].as_str().unwrap();
        NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
            .expect("uploaded timestamp must match YYYYMMDD-HHMMSS");
    }

    #[tokio::test]
    async fn upload_failures_become_typed_errors() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = store_for(&server)
            .save(&json!({"name": "Seattle"}), "Seattle_current")
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Upload { .. }));
    }

    #[tokio::test]
    async fn non_object_payloads_are_rejected_before_any_upload() {
        let server = MockServer::start().await;

        let err = store_for(&server)
            .save(&json!("just a string"), "Seattle_current")
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::Record(RecordError::NotAnObject)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn object_keys_follow_the_archive_pattern() {
        assert_eq!(
            object_key("Seattle_current"),
            "weather-data/Seattle_current.json"
        );
        assert_eq!(
            object_key("New York_forecast"),
            "weather-data/New York_forecast.json"
        );
    }
}
