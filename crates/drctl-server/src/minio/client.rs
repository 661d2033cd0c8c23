//! `MinIO` admin client.
//!
//! Creates job buckets through the S3 API (`aws-sdk-s3`) and manages canned
//! policies through the admin API (`/minio/admin/v3`). Admin requests go out
//! over reqwest and are signed with `aws-sigv4` using the `s3` service name.

use std::time::{Duration, SystemTime};

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::create_bucket::CreateBucketError;
use aws_sigv4::http_request::{
    PayloadChecksumKind, SignableBody, SignableRequest, SigningParams, SigningSettings, sign,
};
use aws_sigv4::sign::v4;
use aws_smithy_runtime_api::client::identity::Identity;
use drctl_core::config::StorageConfig;
use reqwest::{Method, Url};
use tracing::{debug, info, instrument, warn};

use super::ProvisionError;
use crate::jobs::StorageProvisioner;

const ADMIN_PREFIX: &str = "/minio/admin/v3";
const SIGNING_NAME: &str = "s3";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// IAM policy granting full access to one bucket and its objects only.
pub fn bucket_policy(bucket: &str) -> serde_json::Value {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [
            {
                "Effect": "Allow",
                "Action": ["s3:*"],
                "Resource": [
                    format!("arn:aws:s3:::{bucket}"),
                    format!("arn:aws:s3:::{bucket}/*"),
                ],
            }
        ],
    })
}

/// Client for the `MinIO` S3 and admin APIs.
#[derive(Debug)]
pub struct MinioAdmin {
    http: reqwest::Client,
    s3: aws_sdk_s3::Client,
    endpoint: String,
    credentials: Credentials,
    region: String,
}

impl MinioAdmin {
    /// Create a client for the object store described by `config`.
    pub fn new(config: &StorageConfig) -> Result<Self, ProvisionError> {
        // reqwest is built with rustls-no-provider; the `Err` case just means
        // a provider was already installed.
        let _ = rustls::crypto::ring::default_provider().install_default();

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Self::with_client(config, http)
    }

    /// Create a client from a pre-built HTTP client for the admin API.
    pub fn with_client(config: &StorageConfig, http: reqwest::Client) -> Result<Self, ProvisionError> {
        if config.endpoint.is_empty() {
            return Err(ProvisionError::Config("endpoint is empty".into()));
        }
        if config.access_key.is_empty() || config.secret_key.is_empty() {
            return Err(ProvisionError::Config("access credentials are not set".into()));
        }
        Url::parse(&config.endpoint)
            .map_err(|e| ProvisionError::Config(format!("invalid endpoint {}: {e}", config.endpoint)))?;

        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "drctl-config",
        );

        // Provisioning is never retried; a failed call fails the schedule.
        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&endpoint)
            .credentials_provider(credentials.clone())
            .force_path_style(true)
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(CONNECT_TIMEOUT)
                    .operation_timeout(REQUEST_TIMEOUT)
                    .build(),
            )
            .build();

        Ok(Self {
            http,
            s3: aws_sdk_s3::Client::from_conf(s3_config),
            endpoint,
            credentials,
            region: config.region.clone(),
        })
    }

    /// Build the full admin URL for `path` with `params` as its query.
    pub(crate) fn url(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, ProvisionError> {
        let raw = format!("{}{path}", self.endpoint);
        let mut url =
            Url::parse(&raw).map_err(|e| ProvisionError::Config(format!("invalid URL {raw}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    /// `SigV4` headers (`authorization`, `x-amz-date`, `x-amz-content-sha256`)
    /// for a request to `url` carrying `body`.
    fn sign(&self, method: &Method, url: &Url, body: &[u8]) -> Result<Vec<(String, String)>, ProvisionError> {
        let identity = Identity::new(self.credentials.clone(), None);

        let mut settings = SigningSettings::default();
        settings.payload_checksum_kind = PayloadChecksumKind::XAmzSha256;

        let params: SigningParams<'_> = v4::SigningParams::builder()
            .identity(&identity)
            .region(&self.region)
            .name(SIGNING_NAME)
            .time(SystemTime::now())
            .settings(settings)
            .build()
            .map_err(|e| ProvisionError::Config(format!("invalid signing parameters: {e}")))?
            .into();

        let signable = SignableRequest::new(
            method.as_str(),
            url.as_str(),
            std::iter::empty(),
            SignableBody::Bytes(body),
        )
        .map_err(|e| ProvisionError::Config(format!("request cannot be signed: {e}")))?;

        let (instructions, _signature) = sign(signable, &params)
            .map_err(|e| ProvisionError::Config(format!("request signing failed: {e}")))?
            .into_parts();

        Ok(instructions
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect())
    }

    /// Sign and send an admin request, failing on any non-success status.
    async fn admin_put(
        &self,
        path: &str,
        params: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<(), ProvisionError> {
        let url = self.url(path, params)?;
        let headers = self.sign(&Method::PUT, &url, &body)?;

        let mut request = self.http.put(url).body(body);
        for (name, value) in headers {
            request = request.header(name, value);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<failed to read body>".to_string());
        warn!(status = status.as_u16(), body = %body, path, "Object store admin API returned error");
        Err(ProvisionError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Create a bucket. A bucket we already own counts as created.
    pub async fn make_bucket(&self, bucket: &str) -> Result<(), ProvisionError> {
        match self.s3.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                debug!(bucket, "Bucket created");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(CreateBucketError::is_bucket_already_owned_by_you) =>
            {
                debug!(bucket, "Bucket already exists");
                Ok(())
            }
            Err(err) => Err(create_bucket_error(&err)),
        }
    }

    /// Register (or replace) a canned policy under `name`.
    pub async fn add_canned_policy(
        &self,
        name: &str,
        policy: &serde_json::Value,
    ) -> Result<(), ProvisionError> {
        let body = serde_json::to_vec(policy)
            .map_err(|e| ProvisionError::Config(format!("failed to encode policy: {e}")))?;
        let path = format!("{ADMIN_PREFIX}/add-canned-policy");
        self.admin_put(&path, &[("name", name)], body).await?;

        debug!(policy = name, "Canned policy added");
        Ok(())
    }

    /// Attach the canned policy `policy_name` to the user `user`.
    pub async fn set_user_policy(&self, policy_name: &str, user: &str) -> Result<(), ProvisionError> {
        let path = format!("{ADMIN_PREFIX}/set-user-or-group-policy");
        let params = [
            ("policyName", policy_name),
            ("userOrGroup", user),
            ("isGroup", "false"),
        ];
        self.admin_put(&path, &params, Vec::new()).await?;

        debug!(policy = policy_name, user, "Policy bound to user");
        Ok(())
    }
}

/// An S3 error with an HTTP response becomes [`ProvisionError::Api`]; one
/// that never got a response (connect failure, timeout) is
/// [`ProvisionError::S3`].
fn create_bucket_error(err: &SdkError<CreateBucketError, HttpResponse>) -> ProvisionError {
    let message = DisplayErrorContext(err).to_string();
    let Some(response) = err.raw_response() else {
        return ProvisionError::S3(message);
    };

    let status = response.status().as_u16();
    let body = response
        .body()
        .bytes()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .filter(|b| !b.is_empty())
        .unwrap_or(message);
    warn!(status, body = %body, "Object store S3 API returned error");
    ProvisionError::Api { status, body }
}

#[tonic::async_trait]
impl StorageProvisioner for MinioAdmin {
    #[instrument(skip(self))]
    async fn provision(&self, bucket: &str, identity: &str) -> Result<(), ProvisionError> {
        if identity.is_empty() {
            return Err(ProvisionError::Config(
                "agent has no object store identity".into(),
            ));
        }

        self.make_bucket(bucket).await?;
        self.add_canned_policy(bucket, &bucket_policy(bucket)).await?;
        self.set_user_policy(bucket, identity).await?;

        info!(bucket, identity, "Job storage provisioned");
        Ok(())
    }
}
