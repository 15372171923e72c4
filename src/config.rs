use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Session secret used when none is configured outside production.
pub const DEV_SESSION_SECRET: &str = "dev-only-insecure-session-secret";

/// Minimum secret length accepted in production.
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

/// Deployment mode selected by `ENVIRONMENT_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("unknown mode '{}'", other)),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub environment: Environment,

    // Storage
    pub database_url: String,
    pub store_timeout_ms: u64,

    // Server
    pub bind_addr: SocketAddr,
    pub static_dir: PathBuf,
    pub max_body_bytes: usize,

    // Session cookie
    pub session_secret: String,
    pub session_cookie_name: String,
    pub session_ttl_secs: u64,
    pub session_touch_after_secs: u64,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("database_url", &"[REDACTED]")
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("bind_addr", &self.bind_addr)
            .field("static_dir", &self.static_dir)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("session_secret", &"[REDACTED]")
            .field("session_cookie_name", &self.session_cookie_name)
            .field("session_ttl_secs", &self.session_ttl_secs)
            .field("session_touch_after_secs", &self.session_touch_after_secs)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to parse {0}: {1}")]
    ParseError(String, String),
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file is only consulted outside production.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment: Environment = match env::var("ENVIRONMENT_MODE") {
            Ok(val) => val
                .parse()
                .map_err(|e| ConfigError::InvalidValue("ENVIRONMENT_MODE".to_string(), e))?,
            Err(_) => Environment::Development,
        };

        if !environment.is_production() {
            let _ = dotenvy::dotenv();
        }

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        if database_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "DATABASE_URL".to_string(),
                "cannot be empty".to_string(),
            ));
        }
        if environment.is_production() && database_url.starts_with("memory://") {
            return Err(ConfigError::InvalidValue(
                "DATABASE_URL".to_string(),
                "in-memory store is not allowed in production".to_string(),
            ));
        }

        let session_secret = match env::var("SESSION_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ if environment.is_production() => {
                return Err(ConfigError::MissingVar("SESSION_SECRET".to_string()))
            }
            _ => {
                tracing::warn!("SESSION_SECRET not set, using development fallback");
                DEV_SESSION_SECRET.to_string()
            }
        };
        if environment.is_production() {
            if session_secret == DEV_SESSION_SECRET {
                return Err(ConfigError::InvalidValue(
                    "SESSION_SECRET".to_string(),
                    "development fallback cannot be used in production".to_string(),
                ));
            }
            if session_secret.len() < MIN_PRODUCTION_SECRET_LEN {
                return Err(ConfigError::InvalidValue(
                    "SESSION_SECRET".to_string(),
                    format!("must be at least {} bytes", MIN_PRODUCTION_SECRET_LEN),
                ));
            }
        }

        let host = env::var("LISTEN_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port: u16 = parse_env_or_default("LISTEN_PORT", 5000)?;
        let bind_addr = format!("{}:{}", host, port)
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::ParseError("LISTEN_HOST".to_string(), e.to_string()))?;

        let static_dir = PathBuf::from(env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()));
        let max_body_bytes = parse_env_or_default("MAX_BODY_BYTES", 1_048_576)?;
        let store_timeout_ms = parse_env_or_default("STORE_TIMEOUT_MS", 2_000)?;

        let session_cookie_name =
            env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session_id".to_string());
        if session_cookie_name.is_empty()
            || !session_cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ConfigError::InvalidValue(
                "SESSION_COOKIE_NAME".to_string(),
                "may only contain alphanumeric characters, hyphens, and underscores".to_string(),
            ));
        }

        // One week, touched at most once a day
        let session_ttl_secs = parse_env_or_default("SESSION_TTL_SECS", 604_800)?;
        let session_touch_after_secs = parse_env_or_default("SESSION_TOUCH_AFTER_SECS", 86_400)?;
        if session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SESSION_TTL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        if session_touch_after_secs >= session_ttl_secs {
            return Err(ConfigError::InvalidValue(
                "SESSION_TOUCH_AFTER_SECS".to_string(),
                "must be less than SESSION_TTL_SECS".to_string(),
            ));
        }

        Ok(Config {
            environment,
            database_url,
            store_timeout_ms,
            bind_addr,
            static_dir,
            max_body_bytes,
            session_secret,
            session_cookie_name,
            session_ttl_secs,
            session_touch_after_secs,
        })
    }

    /// Secure cookies are only issued when serving production traffic.
    pub fn cookie_secure(&self) -> bool {
        self.environment.is_production()
    }

    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.store_timeout_ms)
    }
}

/// Helper function to parse environment variable with a default value
fn parse_env_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(key.to_string(), format!("{}: {}", e, val))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Tests mutate process-wide env vars, so run them one at a time.
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn lock_test() -> std::sync::MutexGuard<'static, ()> {
        TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner())
    }

    const PROD_SECRET: &str = "a-production-secret-that-is-long-enough-123";

    fn clear_test_env() {
        for key in [
            "ENVIRONMENT_MODE",
            "DATABASE_URL",
            "SESSION_SECRET",
            "LISTEN_HOST",
            "LISTEN_PORT",
            "STATIC_DIR",
            "MAX_BODY_BYTES",
            "STORE_TIMEOUT_MS",
            "SESSION_COOKIE_NAME",
            "SESSION_TTL_SECS",
            "SESSION_TOUCH_AFTER_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_parse_env_or_default() {
        let _guard = lock_test();

        env::set_var("TEST_STOREFRONT_U64", "12345");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_STOREFRONT_U64", 100);
        assert_eq!(result.unwrap(), 12345);

        env::remove_var("TEST_STOREFRONT_U64");
        let result: Result<u64, ConfigError> = parse_env_or_default("TEST_STOREFRONT_U64", 100);
        assert_eq!(result.unwrap(), 100);
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("production".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("Development".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());
    }

    #[test]
    fn test_missing_database_url() {
        let _guard = lock_test();
        clear_test_env();

        // Production skips .env so a local file cannot fill the gap.
        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("SESSION_SECRET", PROD_SECRET);

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::MissingVar(ref s) if s == "DATABASE_URL"
        ));

        clear_test_env();
    }

    #[test]
    fn test_production_requires_secret() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("DATABASE_URL", "redis://127.0.0.1:6379");

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::MissingVar(ref s) if s == "SESSION_SECRET"
        ));

        clear_test_env();
    }

    #[test]
    fn test_production_rejects_dev_secret() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("DATABASE_URL", "redis://127.0.0.1:6379");
        env::set_var("SESSION_SECRET", DEV_SESSION_SECRET);

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SESSION_SECRET"
        ));

        clear_test_env();
    }

    #[test]
    fn test_production_rejects_short_secret() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("DATABASE_URL", "redis://127.0.0.1:6379");
        env::set_var("SESSION_SECRET", "short");

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SESSION_SECRET"
        ));

        clear_test_env();
    }

    #[test]
    fn test_production_rejects_memory_store() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("DATABASE_URL", "memory://");
        env::set_var("SESSION_SECRET", PROD_SECRET);

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "DATABASE_URL"
        ));

        clear_test_env();
    }

    #[test]
    fn test_invalid_port() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("DATABASE_URL", "redis://127.0.0.1:6379");
        env::set_var("SESSION_SECRET", PROD_SECRET);
        env::set_var("LISTEN_PORT", "not-a-port");

        let result = Config::from_env();
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_, _)));

        clear_test_env();
    }

    #[test]
    fn test_invalid_cookie_name() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("DATABASE_URL", "redis://127.0.0.1:6379");
        env::set_var("SESSION_SECRET", PROD_SECRET);
        env::set_var("SESSION_COOKIE_NAME", "bad name;");

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SESSION_COOKIE_NAME"
        ));

        clear_test_env();
    }

    #[test]
    fn test_touch_window_must_be_shorter_than_ttl() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("DATABASE_URL", "redis://127.0.0.1:6379");
        env::set_var("SESSION_SECRET", PROD_SECRET);
        env::set_var("SESSION_TTL_SECS", "3600");
        env::set_var("SESSION_TOUCH_AFTER_SECS", "3600");

        let result = Config::from_env();
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidValue(ref s, _) if s == "SESSION_TOUCH_AFTER_SECS"
        ));

        env::set_var("SESSION_TOUCH_AFTER_SECS", "600");
        let config = Config::from_env().unwrap();
        assert_eq!(config.session_touch_after_secs, 600);

        clear_test_env();
    }

    #[test]
    fn test_production_defaults() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("DATABASE_URL", "redis://127.0.0.1:6379");
        env::set_var("SESSION_SECRET", PROD_SECRET);

        let config = Config::from_env().unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert!(config.cookie_secure());
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:5000");
        assert_eq!(config.static_dir, PathBuf::from("public"));
        assert_eq!(config.max_body_bytes, 1_048_576);
        assert_eq!(config.store_timeout_ms, 2_000);
        assert_eq!(config.session_cookie_name, "session_id");
        assert_eq!(config.session_ttl_secs, 604_800);
        assert_eq!(config.session_touch_after_secs, 86_400);

        clear_test_env();
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let _guard = lock_test();
        clear_test_env();

        env::set_var("ENVIRONMENT_MODE", "production");
        env::set_var("DATABASE_URL", "redis://:hunter2@db.internal:6379");
        env::set_var("SESSION_SECRET", PROD_SECRET);

        let config = Config::from_env().unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains(PROD_SECRET));
        assert!(!debug.contains("hunter2"));

        clear_test_env();
    }
}
