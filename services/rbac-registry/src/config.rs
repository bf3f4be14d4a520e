use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 5000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Postgres,
}

impl std::str::FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "postgres" => Ok(StorageBackend::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    // HS256 shared secret; `None` disables bearer checks.
    pub jwt_secret: Option<String>,
}

// Registry configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    // Owner name under which this registry records its own endpoints.
    pub service_name: String,
    pub storage: StorageBackend,
    pub postgres: Option<PostgresConfig>,
    pub auth: AuthConfig,
    pub cors_allowed_origins: Vec<String>,
    // Reconcile the live endpoint table once before serving.
    pub mark_active_on_start: bool,
}

#[derive(Debug, Default, Deserialize)]
struct PostgresConfigOverride {
    url: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RegistryConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    service_name: Option<String>,
    storage: Option<StorageBackend>,
    postgres: Option<PostgresConfigOverride>,
    jwt_secret: Option<String>,
    cors_allowed_origins: Option<Vec<String>>,
    mark_active_on_start: Option<bool>,
}

impl RegistryConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("RBAC_BIND")
            .unwrap_or_else(|_| "0.0.0.0:5001".to_string())
            .parse()
            .with_context(|| "parse RBAC_BIND")?;
        let metrics_bind = std::env::var("RBAC_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9091".to_string())
            .parse()
            .with_context(|| "parse RBAC_METRICS_BIND")?;
        let service_name = std::env::var("RBAC_SERVICE_NAME")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "rbac".to_string());
        let storage = match std::env::var("RBAC_STORAGE_BACKEND") {
            Ok(value) => value.parse().with_context(|| "parse RBAC_STORAGE_BACKEND")?,
            Err(_) => StorageBackend::Memory,
        };
        let postgres = match std::env::var("RBAC_DATABASE_URL").or_else(|_| std::env::var("DB_RBAC"))
        {
            Ok(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse("RBAC_PG_MAX_CONNECTIONS")?
                    .unwrap_or(DEFAULT_PG_MAX_CONNECTIONS),
                acquire_timeout_ms: env_parse("RBAC_PG_ACQUIRE_TIMEOUT_MS")?
                    .unwrap_or(DEFAULT_PG_ACQUIRE_TIMEOUT_MS),
            }),
            Err(_) => None,
        };
        let jwt_secret = std::env::var("RBAC_JWT_SECRET")
            .ok()
            .filter(|value| !value.is_empty());
        let cors_allowed_origins = parse_origins(
            &std::env::var("RBAC_CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.into()),
        );
        let mark_active_on_start = std::env::var("RBAC_MARK_ACTIVE_ON_START")
            .ok()
            .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);
        Ok(Self {
            bind_addr,
            metrics_bind,
            service_name,
            storage,
            postgres,
            auth: AuthConfig { jwt_secret },
            cors_allowed_origins,
            mark_active_on_start,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("RBAC_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read RBAC_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        Ok(config)
    }

    fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: RegistryConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse registry config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.service_name {
            self.service_name = value;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value;
        }
        if let Some(pg) = override_cfg.postgres {
            let current = self.postgres.take();
            let url = pg
                .url
                .or_else(|| current.as_ref().map(|cfg| cfg.url.clone()));
            self.postgres = url.map(|url| PostgresConfig {
                url,
                max_connections: pg
                    .max_connections
                    .or_else(|| current.as_ref().map(|cfg| cfg.max_connections))
                    .unwrap_or(DEFAULT_PG_MAX_CONNECTIONS),
                acquire_timeout_ms: pg
                    .acquire_timeout_ms
                    .or_else(|| current.as_ref().map(|cfg| cfg.acquire_timeout_ms))
                    .unwrap_or(DEFAULT_PG_ACQUIRE_TIMEOUT_MS),
            });
        }
        if let Some(value) = override_cfg.jwt_secret {
            self.auth.jwt_secret = Some(value).filter(|secret| !secret.is_empty());
        }
        if let Some(value) = override_cfg.cors_allowed_origins {
            self.cors_allowed_origins = value;
        }
        if let Some(value) = override_cfg.mark_active_on_start {
            self.mark_active_on_start = value;
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => Ok(Some(
            value.trim().parse().with_context(|| format!("parse {key}"))?,
        )),
        Err(_) => Ok(None),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().to_string())
        .filter(|origin| !origin.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: &'static str,
        prev: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::set_var(key, value);
            }
            Self { key, prev }
        }

        fn unset(key: &'static str) -> Self {
            let prev = std::env::var(key).ok();
            unsafe {
                std::env::remove_var(key);
            }
            Self { key, prev }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.prev {
                Some(value) => unsafe {
                    std::env::set_var(self.key, value);
                },
                None => unsafe {
                    std::env::remove_var(self.key);
                },
            }
        }
    }

    const KEYS: [&str; 11] = [
        "RBAC_BIND",
        "RBAC_METRICS_BIND",
        "RBAC_SERVICE_NAME",
        "RBAC_STORAGE_BACKEND",
        "RBAC_DATABASE_URL",
        "DB_RBAC",
        "RBAC_PG_MAX_CONNECTIONS",
        "RBAC_PG_ACQUIRE_TIMEOUT_MS",
        "RBAC_JWT_SECRET",
        "RBAC_CORS_ORIGINS",
        "RBAC_MARK_ACTIVE_ON_START",
    ];

    fn clear_env() -> Vec<EnvGuard> {
        KEYS.iter().map(|key| EnvGuard::unset(key)).collect()
    }

    #[test]
    #[serial]
    fn defaults_without_env() {
        let _guards = clear_env();
        let config = RegistryConfig::from_env().expect("config");
        assert_eq!(config.bind_addr, "0.0.0.0:5001".parse().expect("addr"));
        assert_eq!(config.metrics_bind, "0.0.0.0:9091".parse().expect("addr"));
        assert_eq!(config.service_name, "rbac");
        assert_eq!(config.storage, StorageBackend::Memory);
        assert!(config.postgres.is_none());
        assert!(config.auth.jwt_secret.is_none());
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:3000"]);
        assert!(config.mark_active_on_start);
    }

    #[test]
    #[serial]
    fn env_overrides_are_applied() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("RBAC_STORAGE_BACKEND", "Postgres");
        let _g2 = EnvGuard::set("DB_RBAC", "postgres://localhost/rbac");
        let _g3 = EnvGuard::set("RBAC_PG_MAX_CONNECTIONS", "3");
        let _g4 = EnvGuard::set("RBAC_CORS_ORIGINS", "https://a.example, https://b.example");
        let _g5 = EnvGuard::set("RBAC_MARK_ACTIVE_ON_START", "false");
        let _g6 = EnvGuard::set("RBAC_JWT_SECRET", "s3cret");

        let config = RegistryConfig::from_env().expect("config");
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.url, "postgres://localhost/rbac");
        assert_eq!(pg.max_connections, 3);
        assert_eq!(pg.acquire_timeout_ms, DEFAULT_PG_ACQUIRE_TIMEOUT_MS);
        assert_eq!(
            config.cors_allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(!config.mark_active_on_start);
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
    }

    #[test]
    #[serial]
    fn primary_database_url_wins_over_fallback() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("RBAC_DATABASE_URL", "postgres://primary/rbac");
        let _g2 = EnvGuard::set("DB_RBAC", "postgres://fallback/rbac");
        let config = RegistryConfig::from_env().expect("config");
        assert_eq!(
            config.postgres.expect("postgres").url,
            "postgres://primary/rbac"
        );
    }

    #[test]
    #[serial]
    fn invalid_values_fail_with_context() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("RBAC_BIND", "not-an-addr");
        let err = RegistryConfig::from_env().expect_err("bind");
        assert!(err.to_string().contains("RBAC_BIND"));
        drop(_g1);

        let _g2 = EnvGuard::set("RBAC_STORAGE_BACKEND", "sqlite");
        let err = RegistryConfig::from_env().expect_err("backend");
        assert!(err.to_string().contains("RBAC_STORAGE_BACKEND"));
        drop(_g2);

        let _g3 = EnvGuard::set("RBAC_DATABASE_URL", "postgres://localhost/rbac");
        let _g4 = EnvGuard::set("RBAC_PG_ACQUIRE_TIMEOUT_MS", "soon");
        let err = RegistryConfig::from_env().expect_err("timeout");
        assert!(err.to_string().contains("RBAC_PG_ACQUIRE_TIMEOUT_MS"));
    }

    #[test]
    #[serial]
    fn yaml_overrides_env() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("RBAC_DATABASE_URL", "postgres://env/rbac");
        let mut config = RegistryConfig::from_env().expect("config");
        config
            .apply_yaml(
                r#"
bind_addr: "127.0.0.1:7000"
service_name: registry
storage: postgres
postgres:
  max_connections: 20
cors_allowed_origins:
  - https://console.example
mark_active_on_start: false
"#,
            )
            .expect("yaml");
        assert_eq!(config.bind_addr, "127.0.0.1:7000".parse().expect("addr"));
        assert_eq!(config.service_name, "registry");
        assert_eq!(config.storage, StorageBackend::Postgres);
        let pg = config.postgres.expect("postgres");
        assert_eq!(pg.url, "postgres://env/rbac");
        assert_eq!(pg.max_connections, 20);
        assert_eq!(config.cors_allowed_origins, vec!["https://console.example"]);
        assert!(!config.mark_active_on_start);
    }

    #[test]
    #[serial]
    fn from_env_or_yaml_reads_file() {
        let _guards = clear_env();
        let path = std::env::temp_dir().join(format!("rbac-config-{}.yaml", std::process::id()));
        std::fs::write(&path, "metrics_bind: \"127.0.0.1:9999\"\n").expect("write");
        let _g1 = EnvGuard::set("RBAC_CONFIG", path.to_str().expect("utf8 path"));
        let config = RegistryConfig::from_env_or_yaml().expect("config");
        assert_eq!(config.metrics_bind, "127.0.0.1:9999".parse().expect("addr"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    #[serial]
    fn missing_yaml_file_fails() {
        let _guards = clear_env();
        let _g1 = EnvGuard::set("RBAC_CONFIG", "/definitely/not/here.yaml");
        let err = RegistryConfig::from_env_or_yaml().expect_err("missing");
        assert!(err.to_string().contains("RBAC_CONFIG"));
    }
}
