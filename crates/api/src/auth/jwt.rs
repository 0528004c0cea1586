//! JWT access-token generation/validation and refresh-token helpers.
//!
//! Access tokens are HS256-signed JWTs carrying a [`Claims`] payload and the
//! configured issuer. Refresh tokens are opaque random strings; only their
//! SHA-256 hash is stored in `refresh_tokens`.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use studies_core::types::DbId;
use uuid::Uuid;

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    pub email: String,
    /// Role wire name (`"OWNER"`, `"RESIDENT"`, `"GI"`).
    pub role: String,
    pub iss: String,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

/// Configuration for JWT token generation and validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Value of the `iss` claim; tokens from other issuers are rejected.
    pub issuer: String,
    /// Access token lifetime in minutes (default: 15).
    pub access_token_expiry_mins: i64,
    /// Refresh token lifetime in hours (default: 168).
    pub refresh_token_expiry_hours: i64,
}

const DEFAULT_ISSUER: &str = "studies-api";
const DEFAULT_ACCESS_EXPIRY_MINS: i64 = 15;
const DEFAULT_REFRESH_EXPIRY_HOURS: i64 = 168;

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// | Env Var                    | Required | Default       |
    /// |----------------------------|----------|---------------|
    /// | `JWT_SECRET`               | **yes**  | --            |
    /// | `JWT_ISSUER`               | no       | `studies-api` |
    /// | `JWT_ACCESS_EXPIRY_MINS`   | no       | `15`          |
    /// | `JWT_REFRESH_EXPIRY_HOURS` | no       | `168`         |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty, or if an expiry does not parse.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        let issuer = std::env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.into());

        let access_token_expiry_mins: i64 = std::env::var("JWT_ACCESS_EXPIRY_MINS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_EXPIRY_MINS.to_string())
            .parse()
            .expect("JWT_ACCESS_EXPIRY_MINS must be a valid i64");

        let refresh_token_expiry_hours: i64 = std::env::var("JWT_REFRESH_EXPIRY_HOURS")
            .unwrap_or_else(|_| DEFAULT_REFRESH_EXPIRY_HOURS.to_string())
            .parse()
            .expect("JWT_REFRESH_EXPIRY_HOURS must be a valid i64");

        Self {
            secret,
            issuer,
            access_token_expiry_mins,
            refresh_token_expiry_hours,
        }
    }
}

/// A signed access token together with its `exp` claim.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: i64,
}

/// Generate an HS256 access token for the given user.
pub fn generate_access_token(
    user_id: DbId,
    email: &str,
    role: &str,
    config: &JwtConfig,
) -> Result<AccessToken, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let exp = now + config.access_token_expiry_mins * 60;

    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role: role.to_string(),
        iss: config.issuer.clone(),
        exp,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::default(), // HS256
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok(AccessToken {
        token,
        expires_at: exp,
    })
}

fn validation(config: &JwtConfig) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.as_str()]);
    validation
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Checks the signature, the expiration and the issuer.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation(config),
    )?;
    Ok(token_data.claims)
}

/// `true` when the rejection was only due to the `exp` claim.
pub fn is_expired(err: &jsonwebtoken::errors::Error) -> bool {
    matches!(err.kind(), ErrorKind::ExpiredSignature)
}

/// Generate a random refresh token.
///
/// Returns `(plaintext_token, sha256_hex_hash)`. The plaintext goes to the
/// client; only the hash is persisted.
pub fn generate_refresh_token() -> (String, String) {
    let plaintext = Uuid::new_v4().to_string();
    let hash = hash_refresh_token(&plaintext);
    (plaintext, hash)
}

/// Compute the SHA-256 hex digest of a refresh token.
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            issuer: "studies-api".to_string(),
            access_token_expiry_mins: 15,
            refresh_token_expiry_hours: 168,
        }
    }

    fn sign(claims: &Claims, config: &JwtConfig) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .expect("encoding should succeed")
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let config = test_config();
        let issued = generate_access_token(42, "ann@example.com", "OWNER", &config)
            .expect("token generation should succeed");

        let claims = validate_token(&issued.token, &config).expect("token should validate");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "ann@example.com");
        assert_eq!(claims.role, "OWNER");
        assert_eq!(claims.iss, "studies-api");
        assert_eq!(claims.exp, issued.expires_at);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token_is_reported_as_expired() {
        let config = test_config();
        // Well past the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: 1,
            email: "old@example.com".to_string(),
            role: "RESIDENT".to_string(),
            iss: config.issuer.clone(),
            exp: now - 300,
            iat: now - 600,
            jti: Uuid::new_v4().to_string(),
        };

        let err = validate_token(&sign(&claims, &config), &config).unwrap_err();
        assert!(is_expired(&err));
    }

    #[test]
    fn test_foreign_issuer_is_rejected() {
        let config = test_config();
        let other = JwtConfig {
            issuer: "someone-else".to_string(),
            ..test_config()
        };
        let issued = generate_access_token(1, "a@b.c", "GI", &other).unwrap();

        let err = validate_token(&issued.token, &config).unwrap_err();
        assert!(!is_expired(&err));
    }

    #[test]
    fn test_different_secrets_fail() {
        let config_a = test_config();
        let config_b = JwtConfig {
            secret: "secret-bravo".to_string(),
            ..test_config()
        };
        let issued = generate_access_token(1, "a@b.c", "GI", &config_a).unwrap();
        assert!(validate_token(&issued.token, &config_b).is_err());
    }

    #[test]
    fn test_refresh_token_hash_matches() {
        let (plaintext, hash) = generate_refresh_token();
        assert_eq!(hash, hash_refresh_token(&plaintext));
        // SHA-256 hex digest.
        assert_eq!(hash.len(), 64);
    }
}
