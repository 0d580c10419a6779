use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_USER_HEADER: &str = "x-vulpes-user";
pub const DEFAULT_RELOAD_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

// Control plane configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ControlPlaneConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    /// Skip authorization entirely. Local development only.
    pub debug: bool,
    pub always_allow_paths: Vec<String>,
    /// Header carrying the authenticated user name, set by the fronting
    /// authenticator.
    pub user_header: String,
    pub reload_timeout: Duration,
}

#[derive(Debug, Default, Deserialize)]
struct ControlPlaneConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    pg_url: Option<String>,
    pg_max_connections: Option<u32>,
    pg_acquire_timeout_ms: Option<u64>,
    debug: Option<bool>,
    always_allow_paths: Option<Vec<String>>,
    user_header: Option<String>,
    reload_timeout_ms: Option<u64>,
}

fn env_flag(key: &str) -> Result<bool> {
    match std::env::var(key) {
        Ok(value) => match value.as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" | "" => Ok(false),
            other => bail!("parse {key}: expected boolean, got {other}"),
        },
        Err(_) => Ok(false),
    }
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .map_err(|err| anyhow::anyhow!("parse {key}: {err}")),
        Err(_) => Ok(default),
    }
}

impl ControlPlaneConfig {
    pub fn from_env() -> Result<Self> {
        let metrics_bind = std::env::var("VULPES_CP_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse VULPES_CP_METRICS_BIND")?;
        let bind_addr = std::env::var("VULPES_CP_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8443".to_string())
            .parse()
            .with_context(|| "parse VULPES_CP_BIND")?;
        let storage = std::env::var("VULPES_STORAGE")
            .unwrap_or_else(|_| "memory".to_string())
            .parse()?;
        let postgres = match std::env::var("VULPES_PG_URL") {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse(
                    "VULPES_PG_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                acquire_timeout: Duration::from_millis(env_parse(
                    "VULPES_PG_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
                )?),
            }),
            Err(_) => None,
        };
        let always_allow_paths = std::env::var("VULPES_ALWAYS_ALLOW_PATHS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|path| !path.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            postgres,
            debug: env_flag("VULPES_DEBUG")?,
            always_allow_paths,
            user_header: std::env::var("VULPES_USER_HEADER")
                .unwrap_or_else(|_| DEFAULT_USER_HEADER.to_string()),
            reload_timeout: Duration::from_millis(env_parse(
                "VULPES_RBAC_RELOAD_TIMEOUT_MS",
                DEFAULT_RELOAD_TIMEOUT_MS,
            )?),
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("VULPES_CP_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read VULPES_CP_CONFIG: {path}"))?;
            let override_cfg: ControlPlaneConfigOverride = serde_yaml::from_str(&contents)
                .with_context(|| "parse control plane config yaml")?;
            config.apply_override(override_cfg)?;
        }
        config.validate()?;
        Ok(config)
    }

    fn apply_override(&mut self, override_cfg: ControlPlaneConfigOverride) -> Result<()> {
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value.parse()?;
        }
        if let Some(url) = override_cfg.pg_url {
            let postgres = self.postgres.get_or_insert(PostgresConfig {
                url: String::new(),
                max_connections: DEFAULT_PG_MAX_CONNECTIONS,
                acquire_timeout: Duration::from_millis(DEFAULT_PG_ACQUIRE_TIMEOUT_MS),
            });
            postgres.url = url;
        }
        if let Some(postgres) = self.postgres.as_mut() {
            if let Some(value) = override_cfg.pg_max_connections {
                postgres.max_connections = value;
            }
            if let Some(value) = override_cfg.pg_acquire_timeout_ms {
                postgres.acquire_timeout = Duration::from_millis(value);
            }
        }
        if let Some(value) = override_cfg.debug {
            self.debug = value;
        }
        if let Some(value) = override_cfg.always_allow_paths {
            self.always_allow_paths = value;
        }
        if let Some(value) = override_cfg.user_header {
            self.user_header = value;
        }
        if let Some(value) = override_cfg.reload_timeout_ms {
            self.reload_timeout = Duration::from_millis(value);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.storage == StorageBackend::Postgres && self.postgres.is_none() {
            bail!("VULPES_PG_URL is required for the postgres storage backend");
        }
        axum::http::HeaderName::from_bytes(self.user_header.as_bytes())
            .with_context(|| format!("invalid user header name: {}", self.user_header))?;
        Ok(())
    }
}
