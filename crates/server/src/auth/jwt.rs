use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use medverify_core::Principal;

use crate::config::AuthConfig;

/// Claims carried by bearer tokens from the hosted auth service.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user id).
    pub sub: String,
    /// Expiry (seconds since epoch).
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
}

/// Validates HS256 bearer tokens and mints development tokens with the
/// same secret.
pub struct JwtVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
    audience: Option<String>,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer: None,
            audience: None,
        }
    }

    /// Require tokens to carry this `iss` claim.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Require tokens to carry this `aud` claim.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    /// Build a verifier from `[auth]`, resolving `ENV:` secrets.
    pub fn from_config(config: &AuthConfig) -> Result<Self, String> {
        let mut verifier = Self::new(&config.resolve_secret()?);
        if let Some(issuer) = &config.issuer {
            verifier = verifier.with_issuer(issuer);
        }
        if let Some(audience) = &config.audience {
            verifier = verifier.with_audience(audience);
        }
        Ok(verifier)
    }

    /// Issue a token for `user_id` valid for `ttl_seconds`.
    pub fn issue(&self, user_id: &str, ttl_seconds: u64) -> Result<String, String> {
        let claims = Claims {
            sub: user_id.to_owned(),
            exp: jsonwebtoken::get_current_timestamp() + ttl_seconds,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| format!("JWT encoding failed: {e}"))
    }

    /// Check signature, expiry and any configured issuer/audience.
    pub fn verify(&self, token: &str) -> Result<Principal, String> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| format!("invalid token: {e}"))?;

        if data.claims.sub.is_empty() {
            return Err("invalid token: empty subject".to_owned());
        }
        Ok(Principal::new(data.claims.sub, "jwt"))
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // A configured claim must be present, not just match when present.
        let mut required = vec!["exp"];
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
            required.push("iss");
        }
        match &self.audience {
            Some(audience) => {
                validation.set_audience(&[audience]);
                required.push("aud");
            }
            None => validation.validate_aud = false,
        }
        validation.set_required_spec_claims(&required);
        validation
    }
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_verifies() {
        let verifier = JwtVerifier::new("secret");
        let token = verifier.issue("user-1", 60).unwrap();
        let principal = verifier.verify(&token).unwrap();
        assert_eq!(principal.id, "user-1");
        assert_eq!(principal.auth_method, "jwt");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = JwtVerifier::new("secret").issue("user-1", 60).unwrap();
        let err = JwtVerifier::new("other").verify(&token).unwrap_err();
        assert!(err.starts_with("invalid token"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = JwtVerifier::new("secret");
        let claims = Claims {
            sub: "user-1".into(),
            exp: jsonwebtoken::get_current_timestamp() - 3600,
            iss: None,
            aud: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn issuer_must_match() {
        let issuer = JwtVerifier::new("secret").with_issuer("https://auth.example.com");
        let token = JwtVerifier::new("secret")
            .with_issuer("https://evil.example.com")
            .issue("user-1", 60)
            .unwrap();
        assert!(issuer.verify(&token).is_err());

        let token = issuer.issue("user-1", 60).unwrap();
        assert_eq!(issuer.verify(&token).unwrap().id, "user-1");
    }

    #[test]
    fn audience_is_checked_when_configured() {
        let verifier = JwtVerifier::new("secret").with_audience("medverify");
        let unscoped = JwtVerifier::new("secret").issue("user-1", 60).unwrap();
        assert!(verifier.verify(&unscoped).is_err());

        let scoped = verifier.issue("user-1", 60).unwrap();
        assert!(verifier.verify(&scoped).is_ok());
    }

    #[test]
    fn configured_claims_must_be_present() {
        let verifier = JwtVerifier::new("secret")
            .with_issuer("https://auth.example.com")
            .with_audience("medverify");
        let bare = JwtVerifier::new("secret").issue("mallory", 60).unwrap();
        let err = verifier.verify(&bare).unwrap_err();
        assert!(err.starts_with("invalid token"), "got {err}");

        let issuer_only = JwtVerifier::new("secret")
            .with_issuer("https://auth.example.com")
            .issue("mallory", 60)
            .unwrap();
        assert!(verifier.verify(&issuer_only).is_err());

        let audience_only = JwtVerifier::new("secret")
            .with_audience("medverify")
            .issue("mallory", 60)
            .unwrap();
        assert!(verifier.verify(&audience_only).is_err());

        let full = verifier.issue("alice", 60).unwrap();
        assert_eq!(verifier.verify(&full).unwrap().id, "alice");
    }
}
