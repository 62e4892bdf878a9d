use serde::Deserialize;

/// Bearer token verification settings.
///
/// Tokens are HS256 JWTs issued by the hosted auth service; the `sub` claim
/// is the user id.
///
/// # Example
///
/// ```toml
/// [auth]
/// enabled = true
/// jwt_secret = "ENV:MEDVERIFY_JWT_SECRET"
/// issuer = "https://auth.example.com"
/// ```
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// Whether tokens are required. When disabled, callers identify
    /// themselves with `userId` in the body or an `x-user-id` header.
    #[serde(default)]
    pub enabled: bool,
    /// HMAC secret, or `ENV:NAME` to read it from the environment.
    pub jwt_secret: Option<String>,
    /// Required `iss` claim, if set.
    pub issuer: Option<String>,
    /// Required `aud` claim, if set.
    pub audience: Option<String>,
    /// Lifetime of tokens minted by the `token` subcommand.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,
}

impl AuthConfig {
    /// Resolve the configured secret, following `ENV:` indirection.
    pub fn resolve_secret(&self) -> Result<String, String> {
        let raw = self
            .jwt_secret
            .as_deref()
            .ok_or("[auth] jwt_secret is required when auth is enabled")?;

        match raw.strip_prefix("ENV:") {
            Some(var) => std::env::var(var)
                .map_err(|_| format!("environment variable {var} (from [auth] jwt_secret) is not set")),
            None => Ok(raw.to_owned()),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            jwt_secret: None,
            issuer: None,
            audience: None,
            token_ttl_seconds: default_token_ttl(),
        }
    }
}

fn default_token_ttl() -> u64 {
    3600
}
