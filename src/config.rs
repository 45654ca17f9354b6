/*
 * Responsibility
 * - 環境変数の読み込み (JWT_SECRET, admission, storage, timeout など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use crate::services::admission::AdmissionPolicy;

// HS256 の鍵長 (production で強制)
const MIN_SECRET_BYTES: usize = 32;
const MAX_TOKEN_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: Option<String>) -> Self {
        match raw
            .unwrap_or_else(|| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub storage: StorageBackend,

    pub jwt_secret: Vec<u8>,
    pub token_ttl_seconds: u64,

    pub admission: AdmissionPolicy,
    pub storage_timeout: Duration,
    pub request_timeout: Duration,
}

// secret はログに出さない
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("storage", &self.storage_kind())
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("admission", &self.admission)
            .field("storage_timeout", &self.storage_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process env in production).
    pub fn from_source(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port: u16 = parse_or(&lookup, "PORT", 8080)?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(lookup("APP_ENV"));

        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?
            .into_bytes();
        if app_env.is_production() && jwt_secret.len() < MIN_SECRET_BYTES {
            return Err(ConfigError::Invalid("JWT_SECRET"));
        }

        let token_ttl_seconds: u64 = parse_or(&lookup, "TOKEN_TTL_SECONDS", 86_400)?; // 24h
        if token_ttl_seconds == 0 || token_ttl_seconds > MAX_TOKEN_TTL_SECONDS {
            return Err(ConfigError::Invalid("TOKEN_TTL_SECONDS"));
        }

        let rate_per_sec: f64 = parse_or(&lookup, "ADMISSION_RATE_PER_SEC", 1.0)?;
        if !rate_per_sec.is_finite() || rate_per_sec <= 0.0 {
            return Err(ConfigError::Invalid("ADMISSION_RATE_PER_SEC"));
        }
        let burst: u32 = parse_or(&lookup, "ADMISSION_BURST", 5)?;
        if burst == 0 {
            return Err(ConfigError::Invalid("ADMISSION_BURST"));
        }

        let storage_timeout =
            Duration::from_millis(parse_or(&lookup, "STORAGE_TIMEOUT_MS", 5_000)?);
        let request_timeout =
            Duration::from_secs(parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?);

        let storage = match lookup("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" => StorageBackend::Postgres {
                database_url: lookup("DATABASE_URL")
                    .ok_or(ConfigError::Missing("DATABASE_URL"))?,
            },
            "memory" => StorageBackend::Memory,
            _ => return Err(ConfigError::Invalid("STORAGE_BACKEND")),
        };

        Ok(Self {
            addr,
            app_env,
            storage,
            jwt_secret,
            token_ttl_seconds,
            admission: AdmissionPolicy {
                rate_per_sec,
                burst,
            },
            storage_timeout,
            request_timeout,
        })
    }

    fn storage_kind(&self) -> &'static str {
        match self.storage {
            StorageBackend::Postgres { .. } => "postgres",
            StorageBackend::Memory => "memory",
        }
    }
}

// 未設定ならデフォルト、設定されていて読めない値はエラー
fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
    }
}
