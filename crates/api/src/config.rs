use syllabi_core::upload::{Environment, UploadTiming};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development except
/// the environment itself, which defaults to production so a missing
/// `APP_ENV` never shortens verification delays on a live deployment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on post-shutdown cleanup in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub environment: Environment,
    /// Externally reachable base URL, used for `Location` headers and job
    /// callbacks (default: `http://localhost:3000`).
    pub public_url: String,
    /// Lifetime of presigned download URLs (default: `3600`).
    pub download_url_ttl_secs: u64,
    /// JWT validation and service-token settings.
    pub jwt: JwtConfig,
    /// Upload URL lifetime and verification delay.
    pub upload: UploadTiming,
    /// How often stale unconfirmed uploads are swept (default: `60`).
    pub sweep_interval_secs: u64,
}

/// Default lifetime of a presigned download URL.
const DEFAULT_DOWNLOAD_URL_TTL_SECS: u64 = 3600;

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{name} must be a valid {}", std::any::type_name::<T>())),
        Err(_) => default,
    }
}

/// A service token minted at intake must still be valid when the delayed
/// verification callback presents it.
fn token_outlasts_delay(expiry_mins: i64, delay_secs: u64) -> bool {
    u64::try_from(expiry_mins)
        .map(|mins| mins.saturating_mul(60) > delay_secs)
        .unwrap_or(false)
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                       |
    /// |-------------------------|-------------------------------|
    /// | `HOST`                  | `0.0.0.0`                     |
    /// | `PORT`                  | `3000`                        |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`       |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                          |
    /// | `SHUTDOWN_TIMEOUT_SECS` | `30`                          |
    /// | `APP_ENV`               | `production`                  |
    /// | `PUBLIC_URL`            | `http://localhost:3000`       |
    /// | `DOWNLOAD_URL_TTL_SECS` | `3600`                        |
    /// | `UPLOAD_URL_TTL_SECS`   | `30` dev / `300` prod         |
    /// | `VERIFY_GRACE_SECS`     | `5` dev / `60` prod           |
    /// | `SWEEP_INTERVAL_SECS`   | `60`                          |
    ///
    /// # Panics
    ///
    /// Panics on unparseable values, and if service tokens would expire
    /// before the verification callback they authorize can fire.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30);
        let shutdown_timeout_secs: u64 = env_or("SHUTDOWN_TIMEOUT_SECS", 30);

        let environment: Environment = std::env::var("APP_ENV")
            .map(|raw| raw.parse().unwrap_or_else(|e| panic!("APP_ENV: {e}")))
            .unwrap_or(Environment::Production);

        let public_url = std::env::var("PUBLIC_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into())
            .trim_end_matches('/')
            .to_string();

        let download_url_ttl_secs = env_or("DOWNLOAD_URL_TTL_SECS", DEFAULT_DOWNLOAD_URL_TTL_SECS);

        let defaults = UploadTiming::for_environment(environment);
        let upload = UploadTiming {
            upload_url_ttl_secs: env_or("UPLOAD_URL_TTL_SECS", defaults.upload_url_ttl_secs),
            verify_grace_secs: env_or("VERIFY_GRACE_SECS", defaults.verify_grace_secs),
        };

        let sweep_interval_secs: u64 = env_or("SWEEP_INTERVAL_SECS", 60);
        assert!(sweep_interval_secs > 0, "SWEEP_INTERVAL_SECS must be positive");

        let jwt = JwtConfig::from_env();
        assert!(
            token_outlasts_delay(jwt.service_token_expiry_mins, upload.verification_delay_secs()),
            "JWT_SERVICE_EXPIRY_MINS must outlast the verification delay ({}s)",
            upload.verification_delay_secs()
        );

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            environment,
            public_url,
            download_url_ttl_secs,
            jwt,
            upload,
            sweep_interval_secs,
        }
    }
}
