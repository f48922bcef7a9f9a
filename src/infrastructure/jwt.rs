use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::domain::auth::{Principal, Role};
use crate::domain::errors::DomainError;
use crate::domain::ports::Authenticator;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub rol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: usize,
}

/// HS256 token verifier sharing its secret with the session issuer.
pub struct JwtAuthenticator {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Mint a token for `principal` valid for `ttl`.
    pub fn issue(&self, principal: &Principal, ttl: Duration) -> Result<String, DomainError> {
        let rol = match principal.role {
            Role::Admin => "admin",
            Role::Client => "client",
        };
        let claims = Claims {
            sub: principal.user_id,
            rol: rol.to_string(),
            email: None,
            exp: (Utc::now() + ttl).timestamp().max(0) as usize,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| DomainError::Internal(format!("token encoding failed: {e}")))
    }
}

impl Authenticator for JwtAuthenticator {
    fn authenticate(&self, token: &str) -> Result<Principal, DomainError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            log::debug!("rejected token: {}", e);
            DomainError::Unauthenticated("invalid or expired token".to_string())
        })?;
        Ok(Principal {
            user_id: data.claims.sub,
            role: Role::from_claim(&data.claims.rol),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_authenticates() {
        let auth = JwtAuthenticator::new("s3cret");
        let token = auth
            .issue(&Principal::admin(9), Duration::minutes(5))
            .expect("issue");
        assert_eq!(auth.authenticate(&token).expect("auth"), Principal::admin(9));

        let token = auth
            .issue(&Principal::client(3), Duration::minutes(5))
            .expect("issue");
        assert_eq!(auth.authenticate(&token).expect("auth"), Principal::client(3));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtAuthenticator::new("one")
            .issue(&Principal::client(1), Duration::minutes(5))
            .expect("issue");
        let err = JwtAuthenticator::new("two").authenticate(&token).unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = JwtAuthenticator::new("s3cret");
        let token = auth
            .issue(&Principal::client(1), Duration::hours(-2))
            .expect("issue");
        assert!(matches!(
            auth.authenticate(&token),
            Err(DomainError::Unauthenticated(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        let auth = JwtAuthenticator::new("s3cret");
        assert!(matches!(
            auth.authenticate("not-a-jwt"),
            Err(DomainError::Unauthenticated(_))
        ));
    }

    #[test]
    fn unknown_role_claim_is_a_client() {
        let auth = JwtAuthenticator::new("s3cret");
        let claims = Claims {
            sub: 4,
            rol: "vendedor".into(),
            email: Some("v@example.com".into()),
            exp: (Utc::now() + Duration::minutes(5)).timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &auth.encoding).expect("encode");
        assert_eq!(auth.authenticate(&token).expect("auth"), Principal::client(4));
    }
}
