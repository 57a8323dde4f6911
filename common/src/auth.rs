// Bearer token validation

use crate::config::AuthConfig;
use crate::errors::AuthError;
use crate::models::UserClaims;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

/// HMAC JWT service. Tokens are issued elsewhere; `encode_token` exists for
/// local tooling and tests.
#[derive(Clone)]
pub struct JwtService {
    algorithm: Algorithm,
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    expiration_minutes: i64,
}

impl JwtService {
    #[instrument(skip(config))]
    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        let algorithm = Algorithm::from_str(&config.jwt_algorithm)
            .map_err(|_| AuthError::UnsupportedAlgorithm(config.jwt_algorithm.clone()))?;

        if !matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::UnsupportedAlgorithm(config.jwt_algorithm.clone()));
        }

        Ok(Self {
            algorithm,
            encoding_key: Arc::new(EncodingKey::from_secret(config.jwt_secret.as_bytes())),
            decoding_key: Arc::new(DecodingKey::from_secret(config.jwt_secret.as_bytes())),
            expiration_minutes: config.expiration_minutes as i64,
        })
    }

    #[instrument(skip(self))]
    pub fn encode_token(&self, user_id: &str, email: Option<&str>) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = UserClaims {
            sub: user_id.to_string(),
            email: email.map(str::to_string),
            exp: (now + Duration::minutes(self.expiration_minutes)).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(format!("Failed to encode token: {}", e)))
    }

    /// Decode and validate a token, including expiry
    #[instrument(skip(self, token))]
    pub fn decode_token(&self, token: &str) -> Result<UserClaims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;

        let token_data =
            decode::<UserClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                debug!(error = %e, "Rejected bearer token");
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken(format!("Token validation failed: {}", e)),
                }
            })?;

        if token_data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("Token has no subject".to_string()));
        }

        Ok(token_data.claims)
    }
}

/// Strip the `Bearer ` prefix from an Authorization header value
pub fn bearer_token(header_value: &str) -> Result<&str, AuthError> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingCredentials)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            jwt_algorithm: "HS256".to_string(),
            expiration_minutes: 60,
        }
    }

    #[test]
    fn test_encode_and_decode_token() {
        let service = JwtService::from_config(&config("test-secret")).unwrap();
        let token = service.encode_token("user-1", Some("a@b.c")).unwrap();
        let claims = service.decode_token(&token).unwrap();

        assert_eq!(claims.sub, "user-1");
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::from_config(&config("one")).unwrap();
        let verifier = JwtService::from_config(&config("two")).unwrap();
        let token = issuer.encode_token("user-1", None).unwrap();

        assert!(matches!(
            verifier.decode_token(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = JwtService::from_config(&config("secret")).unwrap();
        let claims = UserClaims {
            sub: "user-1".to_string(),
            email: None,
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        assert!(matches!(
            service.decode_token(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_asymmetric_algorithm_is_unsupported() {
        let mut cfg = config("secret");
        cfg.jwt_algorithm = "RS256".to_string();
        assert!(matches!(
            JwtService::from_config(&cfg),
            Err(AuthError::UnsupportedAlgorithm(_))
        ));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc").unwrap(), "abc");
        assert!(bearer_token("Token abc").is_err());
        assert!(bearer_token("Bearer ").is_err());
    }
}
