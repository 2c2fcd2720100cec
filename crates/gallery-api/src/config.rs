use crate::error::{GalleryError, Result};
use crate::validation::normalize_namespace;
use s3_listing_client::S3Settings;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3002;

/// How long a listing is served as a fresh hit
pub const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;

/// How long an expired listing is kept for stale fallback
pub const DEFAULT_STALE_RETENTION_SECS: u64 = 60 * 60;

pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// Which namespace a request is allowed to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespacePolicy {
    /// Honor the caller's `prefix`, using `default` when it is absent
    CallerSupplied { default: String },
    /// Ignore the caller's `prefix` and always list this namespace
    Fixed(String),
}

impl fmt::Display for NamespacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespacePolicy::CallerSupplied { default } => {
                write!(f, "caller (default {:?})", default)
            }
            NamespacePolicy::Fixed(namespace) => write!(f, "fixed ({:?})", namespace),
        }
    }
}

/// Settings consumed by the listing service
#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub bucket: Option<String>,
    /// Public URL base without a trailing slash
    pub public_base_url: Option<String>,
    pub namespace_policy: NamespacePolicy,
    pub cache_ttl: Duration,
    pub stale_retention: Duration,
    pub max_entries: usize,
    /// Expose upstream error detail in 500 responses
    pub development: bool,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            bucket: None,
            public_base_url: None,
            namespace_policy: NamespacePolicy::CallerSupplied {
                default: String::new(),
            },
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            stale_retention: Duration::from_secs(DEFAULT_STALE_RETENTION_SECS),
            max_entries: DEFAULT_MAX_ENTRIES,
            development: false,
        }
    }
}

/// Process configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub s3: S3Settings,
    pub listing: ListingSettings,
}

impl GalleryConfig {
    /// Parse configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Parse configuration from any variable source
    ///
    /// Bucket and public URL may be absent; requests then fail with a
    /// configuration error instead of the process refusing to start.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = var("PORT")
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let bucket = var("S3_BUCKET_NAME");

        let public_base_url = var("PUBLIC_BASE_URL")
            .or_else(|| var("CLOUDFRONT_URL"))
            .map(|raw| parse_public_base(&raw))
            .transpose()?;

        let namespace_policy = parse_namespace_policy(
            var("NAMESPACE_POLICY").as_deref(),
            var("FIXED_NAMESPACE"),
            var("DEFAULT_NAMESPACE"),
        )?;

        let cache_ttl_secs = var("CACHE_TTL_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CACHE_TTL_SECS);

        let stale_retention_secs = var("CACHE_STALE_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_STALE_RETENTION_SECS);

        let max_entries = var("CACHE_MAX_ENTRIES")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_ENTRIES)
            .max(1);

        let development = var("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("development"));

        let cors_origins = var("CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        let s3 = S3Settings {
            bucket: bucket.clone(),
            region: var("AWS_REGION"),
            endpoint: var("S3_ENDPOINT"),
            force_path_style: var("S3_FORCE_PATH_STYLE")
                .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
            access_key_id: var("AWS_ACCESS_KEY_ID"),
            secret_access_key: var("AWS_SECRET_ACCESS_KEY"),
            ..Default::default()
        };

        Ok(Self {
            port,
            cors_origins,
            s3,
            listing: ListingSettings {
                bucket,
                public_base_url,
                namespace_policy,
                cache_ttl: Duration::from_secs(cache_ttl_secs),
                stale_retention: Duration::from_secs(stale_retention_secs),
                max_entries,
                development,
            },
        })
    }
}

fn parse_public_base(raw: &str) -> Result<String> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| GalleryError::Config(format!("PUBLIC_BASE_URL is not a valid URL: {}", e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(GalleryError::Config(format!(
            "PUBLIC_BASE_URL must be http or https, got {}",
            parsed.scheme()
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}

fn parse_namespace_policy(
    policy: Option<&str>,
    fixed: Option<String>,
    default: Option<String>,
) -> Result<NamespacePolicy> {
    let normalize = |name: &str, raw: &str| {
        normalize_namespace(raw).map_err(|e| GalleryError::Config(format!("{}: {}", name, e)))
    };

    match policy.map(str::to_ascii_lowercase).as_deref() {
        None | Some("caller") => Ok(NamespacePolicy::CallerSupplied {
            default: normalize("DEFAULT_NAMESPACE", default.as_deref().unwrap_or(""))?,
        }),
        Some("fixed") => {
            let namespace = fixed.ok_or_else(|| {
                GalleryError::Config("NAMESPACE_POLICY=fixed requires FIXED_NAMESPACE".to_string())
            })?;
            Ok(NamespacePolicy::Fixed(normalize("FIXED_NAMESPACE", &namespace)?))
        }
        Some(other) => Err(GalleryError::Config(format!(
            "Unknown NAMESPACE_POLICY: {}",
            other
        ))),
    }
}
