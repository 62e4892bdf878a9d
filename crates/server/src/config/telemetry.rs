use serde::Deserialize;

/// Transport used to ship spans to the collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    Http,
}

impl OtlpProtocol {
    /// Collector address used when `endpoint` is not set.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            Self::Grpc => "http://localhost:4317",
            Self::Http => "http://localhost:4318/v1/traces",
        }
    }
}

impl std::fmt::Display for OtlpProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Grpc => "grpc",
            Self::Http => "http",
        })
    }
}

/// `[telemetry]`: span export for upload, analysis and persistence stages.
///
/// Off by default; local runs only need the `fmt` log output.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub protocol: OtlpProtocol,
    /// Collector URL. Defaults to the protocol's standard local port.
    pub endpoint: Option<String>,
    pub service_name: String,
    /// Fraction of traces kept, clamped to `0.0..=1.0`.
    pub sample_ratio: f64,
    pub export_timeout_seconds: u64,
    /// Reported as the `deployment.environment` resource attribute.
    pub environment: Option<String>,
}

impl TelemetryConfig {
    pub fn endpoint(&self) -> &str {
        self.endpoint
            .as_deref()
            .unwrap_or_else(|| self.protocol.default_endpoint())
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            protocol: OtlpProtocol::Grpc,
            endpoint: None,
            service_name: "medverify".to_owned(),
            // Analyses are low volume and each one matters when debugging a verdict.
            sample_ratio: 1.0,
            export_timeout_seconds: 5,
            environment: None,
        }
    }
}
