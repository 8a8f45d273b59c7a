//! JWT validation and service-token minting.
//!
//! User tokens are issued by the identity service and only validated here;
//! their `sub` is the user's UUID. Service tokens are minted by this API for
//! the delayed verification callback and carry the [`ROLE_SERVICE`] role.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role carried by machine-to-machine tokens (queue callbacks, storage events).
pub const ROLE_SERVICE: &str = "service";

/// Role carried by end-user tokens.
pub const ROLE_USER: &str = "user";

/// Subject of service tokens minted by this API.
const SERVICE_SUBJECT: &str = "syllabi-api";

/// JWT claims.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's UUID, or a service name for service tokens.
    pub sub: String,
    pub role: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4) for audit.
    pub jti: String,
}

/// Configuration for JWT validation and service-token generation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the identity service.
    pub secret: String,
    /// Service token lifetime in minutes (default: 60).
    pub service_token_expiry_mins: i64,
}

/// Default service token expiry in minutes.
const DEFAULT_SERVICE_EXPIRY_MINS: i64 = 60;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                   | Required | Default |
    /// |---------------------------|----------|---------|
    /// | `JWT_SECRET`              | **yes**  | --      |
    /// | `JWT_SERVICE_EXPIRY_MINS` | no       | `60`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty, or if
    /// `JWT_SERVICE_EXPIRY_MINS` is not a positive integer.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let service_token_expiry_mins = match std::env::var("JWT_SERVICE_EXPIRY_MINS") {
            Ok(raw) => parse_expiry_mins(&raw)
                .unwrap_or_else(|e| panic!("JWT_SERVICE_EXPIRY_MINS: {e}")),
            Err(_) => DEFAULT_SERVICE_EXPIRY_MINS,
        };

        Self {
            secret,
            service_token_expiry_mins,
        }
    }
}

/// Parse a token lifetime in minutes. Zero and negative values are rejected.
fn parse_expiry_mins(raw: &str) -> Result<i64, String> {
    match raw.trim().parse::<i64>() {
        Ok(mins) if mins > 0 => Ok(mins),
        Ok(mins) => Err(format!("must be positive, got {mins}")),
        Err(e) => Err(format!("'{raw}' is not an integer: {e}")),
    }
}

/// Generate an HS256 token for `subject` with the given role and lifetime.
pub fn generate_token(
    subject: &str,
    role: &str,
    expiry_mins: i64,
    config: &JwtConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();

    let claims = Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        exp: now + expiry_mins * 60,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Generate a service token for queued callbacks.
pub fn generate_service_token(config: &JwtConfig) -> Result<String, jsonwebtoken::errors::Error> {
    generate_token(
        SERVICE_SUBJECT,
        ROLE_SERVICE,
        config.service_token_expiry_mins,
        config,
    )
}

/// Validate and decode a token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}
