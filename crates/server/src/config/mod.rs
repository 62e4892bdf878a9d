mod auth;
mod engine;
mod images;
mod records;
mod server;
mod telemetry;

#[cfg(test)]
mod tests;

pub use auth::*;
pub use engine::*;
pub use images::*;
pub use records::*;
pub use server::*;
pub use telemetry::*;

use serde::Deserialize;

/// Top-level configuration for the medverify server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct MedverifyConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Bearer token verification.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Image store backend.
    #[serde(default)]
    pub images: ImagesConfig,
    /// Record store backend.
    #[serde(default)]
    pub records: RecordsConfig,
    /// Verdict engine strategy.
    #[serde(default)]
    pub engine: EngineConfig,
    /// OpenTelemetry distributed tracing configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
