//! Process configuration
//!
//! Every setting comes from the environment and is read once at startup.
//! Parsing goes through a lookup function so tests never touch the real
//! process environment.

use playlist_export_api_http::HttpServerConfig;
use playlist_export_core::application::consumer::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_RECOVERY_INTERVAL, DEFAULT_RETRY_BASE_DELAY_MS,
};
use playlist_export_core::application::{AckMode, ConsumerConfig, RetryPolicy};
use playlist_export_core::domain::EXPORT_QUEUE;
use playlist_export_core::error::{AppError, Result};
use playlist_export_infra_mail::HttpMailerConfig;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite://~/.playlist-export/library.db";
const DEFAULT_OUTBOX_DIR: &str = "~/.playlist-export/outbox";
const DEFAULT_OUTBOX_FROM: &str = "noreply@playlist-export.local";
const DEFAULT_HTTP_HOST: &str = "127.0.0.1";
const DEFAULT_HTTP_PORT: u16 = 5000;
const DEFAULT_CONCURRENCY: usize = 1;
const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LEASE_SECS: u64 = 300;
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 30;

/// Stores shared by both binaries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Library database (users, songs, playlists)
    pub database_url: String,
    /// Durable queue database
    pub broker_url: String,
}

impl StoreConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let broker_url = required(lookup, "EXPORT_BROKER_URL")?;

        Ok(Self {
            database_url: expand_sqlite_url(&database_url),
            broker_url: expand_sqlite_url(&broker_url),
        })
    }

    /// Create parent directories of file-backed databases
    pub fn prepare_directories(&self) -> Result<()> {
        for url in [&self.database_url, &self.broker_url] {
            if let Some(parent) = sqlite_file_path(url).and_then(|p| p.parent().map(Path::to_path_buf)) {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(&parent)?;
                }
            }
        }
        Ok(())
    }
}

/// `playlist-export-api`
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub stores: StoreConfig,
    pub http: HttpServerConfig,
    pub access_token_key: String,
    pub admin_key: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            stores: StoreConfig::from_lookup(lookup)?,
            http: HttpServerConfig {
                host: lookup("HTTP_HOST").unwrap_or_else(|| DEFAULT_HTTP_HOST.into()),
                port: parse_or(lookup, "HTTP_PORT", DEFAULT_HTTP_PORT)?,
            },
            access_token_key: required(lookup, "ACCESS_TOKEN_KEY")?,
            admin_key: lookup("EXPORT_ADMIN_KEY").filter(|k| !k.is_empty()),
        })
    }
}

/// Which mailer the consumer sends through
#[derive(Debug, Clone)]
pub enum MailTransport {
    /// JSON files in a local directory
    Outbox { dir: PathBuf, from: String },
    Http(HttpMailerConfig),
}

/// `playlist-export-consumer`
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    pub stores: StoreConfig,
    pub consumer: ConsumerConfig,
    pub retry_policy: RetryPolicy,
    pub recovery_interval: Duration,
    pub mail: MailTransport,
}

impl ConsumerSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&env_lookup)
    }

    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let concurrency: usize = parse_or(lookup, "EXPORT_CONCURRENCY", DEFAULT_CONCURRENCY)?;
        if concurrency == 0 {
            return Err(AppError::Config(
                "EXPORT_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let max_attempts: i32 = parse_or(lookup, "EXPORT_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts < 1 {
            return Err(AppError::Config(
                "EXPORT_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }

        let ack_mode = match lookup("EXPORT_ACK_MODE") {
            Some(raw) => AckMode::from_str(raw.trim())?,
            None => AckMode::default(),
        };
        let processing_timeout_secs: u64 = parse_or(
            lookup,
            "EXPORT_PROCESSING_TIMEOUT_SECS",
            DEFAULT_PROCESSING_TIMEOUT_SECS,
        )?;
        if processing_timeout_secs == 0 {
            return Err(AppError::Config(
                "EXPORT_PROCESSING_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }

        // The lease must outlast processing or a slow delivery is handed out twice
        let lease_secs: u64 = parse_or(lookup, "EXPORT_LEASE_SECS", DEFAULT_LEASE_SECS)?;
        if lease_secs <= processing_timeout_secs {
            return Err(AppError::Config(format!(
                "EXPORT_LEASE_SECS ({}) must exceed EXPORT_PROCESSING_TIMEOUT_SECS ({})",
                lease_secs, processing_timeout_secs
            )));
        }
        let lease_ms = lease_secs
            .checked_mul(1000)
            .and_then(|ms| i64::try_from(ms).ok())
            .ok_or_else(|| {
                AppError::Config(format!("EXPORT_LEASE_SECS ({}) is too large", lease_secs))
            })?;

        let consumer = ConsumerConfig {
            queue: EXPORT_QUEUE.to_string(),
            concurrency,
            ack_mode,
            processing_timeout: Duration::from_secs(processing_timeout_secs),
            lease_ms,
            ..ConsumerConfig::default()
        };

        let retry_policy = RetryPolicy::new(
            max_attempts,
            parse_or(lookup, "EXPORT_RETRY_BASE_DELAY_MS", DEFAULT_RETRY_BASE_DELAY_MS)?,
        );

        let recovery_interval_secs: u64 = parse_or(
            lookup,
            "EXPORT_RECOVERY_INTERVAL_SECS",
            DEFAULT_RECOVERY_INTERVAL.as_secs(),
        )?;
        if recovery_interval_secs == 0 {
            return Err(AppError::Config(
                "EXPORT_RECOVERY_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }
        let recovery_interval = Duration::from_secs(recovery_interval_secs);

        Ok(Self {
            stores: StoreConfig::from_lookup(lookup)?,
            consumer,
            retry_policy,
            recovery_interval,
            mail: mail_transport(lookup)?,
        })
    }
}

fn mail_transport<F>(lookup: &F) -> Result<MailTransport>
where
    F: Fn(&str) -> Option<String>,
{
    let transport = lookup("MAIL_TRANSPORT").unwrap_or_else(|| "outbox".into());

    match transport.trim() {
        "outbox" => Ok(MailTransport::Outbox {
            dir: PathBuf::from(expand_path(
                &lookup("MAIL_OUTBOX_DIR").unwrap_or_else(|| DEFAULT_OUTBOX_DIR.into()),
            )),
            from: lookup("MAIL_FROM").unwrap_or_else(|| DEFAULT_OUTBOX_FROM.into()),
        }),
        "http" => Ok(MailTransport::Http(HttpMailerConfig {
            api_url: required(lookup, "MAIL_API_URL")?,
            api_key: required(lookup, "MAIL_API_KEY")?,
            from: required(lookup, "MAIL_FROM")?,
            timeout: Duration::from_secs(parse_or(
                lookup,
                "MAIL_TIMEOUT_SECS",
                DEFAULT_MAIL_TIMEOUT_SECS,
            )?),
        })),
        other => Err(AppError::Config(format!(
            "Unknown MAIL_TRANSPORT '{}' (expected outbox or http)",
            other
        ))),
    }
}

pub fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("{} is required", key)))
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

fn expand_path(path: &str) -> String {
    shellexpand::tilde(path).into_owned()
}

/// Expand `~` in the path part of a `sqlite:` URL
fn expand_sqlite_url(url: &str) -> String {
    for prefix in ["sqlite://", "sqlite:"] {
        if let Some(rest) = url.strip_prefix(prefix) {
            if rest.starts_with('~') {
                return format!("{}{}", prefix, expand_path(rest));
            }
            return url.to_string();
        }
    }
    expand_path(url)
}

/// Filesystem path of a file-backed `sqlite:` URL; `None` for in-memory
fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    if url.contains(":memory:") || url.contains("mode=memory") {
        return None;
    }
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
