//! Lazily connected S3 `ListObjectsV2` client

use crate::error::{Result, UpstreamError};
use crate::lister::ObjectLister;
use crate::types::{ObjectPage, PageRequest, S3Settings};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
use aws_sdk_s3::Client;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// A built SDK client together with the bucket it lists
struct Connection {
    client: Client,
    bucket: String,
}

/// S3 lister whose SDK client is created on the first listing call
///
/// Settings are validated at that point; a missing bucket or region fails
/// with [`UpstreamError::Config`] and nothing is retried.
pub struct S3ObjectLister {
    settings: S3Settings,
    connection: OnceCell<Connection>,
}

impl S3ObjectLister {
    pub fn new(settings: S3Settings) -> Self {
        Self {
            settings,
            connection: OnceCell::new(),
        }
    }

    async fn connection(&self) -> Result<&Connection> {
        self.connection
            .get_or_try_init(|| connect(&self.settings))
            .await
    }
}

impl std::fmt::Debug for S3ObjectLister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3ObjectLister")
            .field("settings", &self.settings)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| UpstreamError::Config(format!("{} is not set", name)))
}

async fn connect(settings: &S3Settings) -> Result<Connection> {
    let bucket = required(&settings.bucket, "S3_BUCKET_NAME")?;
    let region = required(&settings.region, "AWS_REGION")?;

    if settings.access_key_id.is_some() ^ settings.secret_access_key.is_some() {
        return Err(UpstreamError::Config(
            "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".to_string(),
        ));
    }

    let timeouts = TimeoutConfig::builder()
        .connect_timeout(settings.connect_timeout)
        .operation_timeout(settings.operation_timeout)
        .build();

    let mut builder = aws_sdk_s3::config::Builder::new()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new(region.clone()))
        .retry_config(RetryConfig::standard().with_max_attempts(settings.max_attempts))
        .timeout_config(timeouts)
        .force_path_style(settings.force_path_style);

    if let Some(endpoint) = &settings.endpoint {
        builder = builder.endpoint_url(endpoint);
    }

    if let (Some(key_id), Some(secret)) = (&settings.access_key_id, &settings.secret_access_key)
    {
        let credentials = Credentials::new(key_id, secret, None, None, "gallery-static");
        builder = builder.credentials_provider(credentials);
    } else {
        // Ambient chain: env, profile, IMDS, ...
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        if let Some(provider) = shared.credentials_provider() {
            builder = builder.credentials_provider(provider);
        }
    }

    info!(
        bucket = %bucket,
        region = %region,
        max_attempts = settings.max_attempts,
        "S3 listing client initialized"
    );

    Ok(Connection {
        client: Client::from_conf(builder.build()),
        bucket,
    })
}

#[async_trait]
impl ObjectLister for S3ObjectLister {
    async fn list_page(&self, request: &PageRequest) -> Result<ObjectPage> {
        let connection = self.connection().await?;

        let mut call = connection
            .client
            .list_objects_v2()
            .bucket(&connection.bucket)
            .prefix(&request.prefix)
            .max_keys(request.max_keys);

        if let Some(token) = &request.continuation_token {
            call = call.continuation_token(token);
        }

        let output = call.send().await.map_err(classify_sdk_error)?;

        let keys: Vec<String> = output
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .map(str::to_string)
            .collect();

        debug!(
            prefix = %request.prefix,
            keys = keys.len(),
            truncated = output.is_truncated().unwrap_or(false),
            "Listed objects"
        );

        Ok(ObjectPage {
            keys,
            is_truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(str::to_string),
        })
    }
}

/// Map an SDK failure onto the upstream error taxonomy
pub(crate) fn classify_sdk_error(err: SdkError<ListObjectsV2Error>) -> UpstreamError {
    let detail = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            UpstreamError::Transient(detail)
        }
        SdkError::ServiceError(service_err) => {
            if service_err.err().is_no_such_bucket() {
                return UpstreamError::NotFound(detail);
            }
            classify_service_error(
                service_err.err().code(),
                service_err.raw().status().as_u16(),
                detail,
            )
        }
        _ => UpstreamError::Other(detail),
    }
}

/// Classify a service error from its S3 error code, falling back to the HTTP status
pub(crate) fn classify_service_error(code: Option<&str>, status: u16, detail: String) -> UpstreamError {
    match code {
        Some("NoSuchBucket") | Some("NoSuchKey") => UpstreamError::NotFound(detail),
        Some("AccessDenied")
        | Some("AllAccessDisabled")
        | Some("InvalidAccessKeyId")
        | Some("SignatureDoesNotMatch") => UpstreamError::AccessDenied(detail),
        Some("SlowDown")
        | Some("InternalError")
        | Some("ServiceUnavailable")
        | Some("RequestTimeout") => UpstreamError::Transient(detail),
        _ => match status {
            404 => UpstreamError::NotFound(detail),
            401 | 403 => UpstreamError::AccessDenied(detail),
            408 | 429 | 500..=599 => UpstreamError::Transient(detail),
            _ => UpstreamError::Other(detail),
        },
    }
}
