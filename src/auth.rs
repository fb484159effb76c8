use crate::db::CredentialStore;
use crate::error::ApiError;
use crate::models::{Claims, LoginRequest, Role};
use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Fixed per deployment. Changing it (or the key) invalidates every issued token.
const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Issues and verifies HS256 bearer tokens.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(ALGORITHM);
        // expiry is checked below with zero leeway, after the signature
        validation.validate_exp = false;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, claims: &Claims) -> Result<String, TokenError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?;

        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

/// Checks login credentials and mints tokens. Holds no session state.
#[derive(Clone)]
pub struct Authenticator {
    credentials: Arc<dyn CredentialStore>,
    codec: Arc<TokenCodec>,
    ttl: Duration,
}

impl Authenticator {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        codec: Arc<TokenCodec>,
        ttl: Duration,
    ) -> Self {
        Self {
            credentials,
            codec,
            ttl,
        }
    }

    pub fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        if !self.credentials.verify(&request.email, &request.password) {
            warn!("Failed login attempt for {:?}", request.email);
            return Err(ApiError::Unauthorized);
        }

        let exp = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Internal("token expiry overflows".to_string()))?
            .timestamp();

        let claims = Claims {
            identity: request.email.clone(),
            role: Role::Admin,
            exp,
        };

        let token = self
            .codec
            .issue(&claims)
            .map_err(|e| ApiError::Internal(e.to_string()))?;

        info!("Login success for {} ({})", claims.identity, claims.role.as_str());
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SinglePrincipalStore;
    use crate::models::Principal;

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-secret-key-12345")
    }

    fn claims(exp_offset: i64) -> Claims {
        Claims {
            identity: "user@example.com".to_string(),
            role: Role::Admin,
            exp: Utc::now().timestamp() + exp_offset,
        }
    }

    #[test]
    fn test_issue_verify_round_trip() {
        let codec = codec();
        let original = claims(3600);
        let token = codec.issue(&original).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.verify(&token).unwrap(), original);
    }

    #[test]
    fn test_issue_is_deterministic() {
        let codec = codec();
        let c = claims(3600);
        assert_eq!(codec.issue(&c).unwrap(), codec.issue(&c).unwrap());
    }

    #[test]
    fn test_key_not_in_token() {
        let token = codec().issue(&claims(3600)).unwrap();
        assert!(!token.contains("test-secret-key-12345"));
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let codec = codec();
        let token = codec.issue(&claims(3600)).unwrap();
        let sig_start = token.rfind('.').unwrap() + 1;

        let mut bytes = token.into_bytes();
        bytes[sig_start] = if bytes[sig_start] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(codec.verify(&tampered), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec();
        let token = codec.issue(&claims(3600)).unwrap();
        let forged = codec
            .issue(&Claims {
                role: Role::Viewer,
                ..claims(3600)
            })
            .unwrap();

        // splice the forged payload under the original signature
        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(codec.verify(&spliced), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec();
        let token = codec.issue(&claims(-10)).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));

        let token = codec.issue(&claims(0)).unwrap();
        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_expired_token_with_bad_signature_is_signature_error() {
        let token = TokenCodec::new(b"other").issue(&claims(-10)).unwrap();
        assert_eq!(codec().verify(&token), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_malformed_token_rejected() {
        let codec = codec();
        assert_eq!(codec.verify("invalid.token.here"), Err(TokenError::Malformed));
        assert_eq!(codec.verify("not-a-token"), Err(TokenError::Malformed));
        assert_eq!(codec.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_different_secrets_reject() {
        let token = TokenCodec::new(b"secret1").issue(&claims(3600)).unwrap();
        assert_eq!(
            TokenCodec::new(b"secret2").verify(&token),
            Err(TokenError::InvalidSignature)
        );
    }

    fn authenticator(codec: Arc<TokenCodec>) -> Authenticator {
        let store = SinglePrincipalStore::new(&Principal::member(), 4).unwrap();
        Authenticator::new(Arc::new(store), codec, Duration::hours(72))
    }

    #[test]
    fn test_login_issues_admin_token() {
        let codec = Arc::new(codec());
        let auth = authenticator(Arc::clone(&codec));
        let token = auth
            .login(&LoginRequest {
                email: "user@example.com".to_string(),
                password: "password123".to_string(),
            })
            .unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.identity, "user@example.com");

        let expected = Utc::now().timestamp() + 72 * 3600;
        assert!((claims.exp - expected).abs() <= 5);
    }

    #[test]
    fn test_login_wrong_password_unauthorized() {
        let auth = authenticator(Arc::new(codec()));
        let result = auth.login(&LoginRequest {
            email: "user@example.com".to_string(),
            password: "wrong".to_string(),
        });
        assert!(matches!(result, Err(ApiError::Unauthorized)));
    }
}
