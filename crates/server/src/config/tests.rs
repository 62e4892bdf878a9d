use super::*;

#[test]
fn empty_file_uses_defaults() {
    let config: MedverifyConfig = toml::from_str("").unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.shutdown_timeout_seconds, 30);
    assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
    assert!(!config.auth.enabled);
    assert_eq!(config.auth.token_ttl_seconds, 3600);
    assert_eq!(config.images.backend, "memory");
    assert_eq!(config.records.backend, "memory");
    assert_eq!(config.records.prefix, "medverify_");
    assert_eq!(config.engine.strategy, "stochastic");
    assert_eq!(config.engine.input_size, 224);
    assert!(!config.telemetry.enabled);
    assert_eq!(config.telemetry.service_name, "medverify");
}

#[test]
fn external_url_defaults_to_localhost() {
    let config: ServerConfig = toml::from_str("port = 9000").unwrap();
    assert_eq!(config.external_url(), "http://localhost:9000");

    let config: ServerConfig =
        toml::from_str(r#"external_url = "https://verify.example.com/""#).unwrap();
    assert_eq!(config.external_url(), "https://verify.example.com");
}

#[test]
fn full_config() {
    let toml = r#"
        [server]
        host = "0.0.0.0"
        port = 3000
        max_upload_bytes = 1048576

        [auth]
        enabled = true
        jwt_secret = "s3cret"
        issuer = "https://auth.example.com"

        [images]
        backend = "filesystem"
        path = "/var/lib/medverify/images"

        [records]
        backend = "postgres"
        url = "postgres://localhost/medverify"
        prefix = "mv_"

        [engine]
        strategy = "model"
        model_path = "models/packaging.onnx"
        model_url = "https://models.example.com/packaging.onnx"
        input_size = 256
    "#;

    let config: MedverifyConfig = toml::from_str(toml).unwrap();
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.max_upload_bytes, 1_048_576);
    assert!(config.auth.enabled);
    assert_eq!(config.auth.resolve_secret().unwrap(), "s3cret");
    assert_eq!(config.auth.issuer.as_deref(), Some("https://auth.example.com"));
    assert_eq!(config.images.backend, "filesystem");
    assert_eq!(config.records.url.as_deref(), Some("postgres://localhost/medverify"));
    assert_eq!(config.records.prefix, "mv_");
    assert_eq!(config.engine.strategy, "model");
    assert_eq!(config.engine.model_location(), Some("models/packaging.onnx"));
    assert_eq!(config.engine.input_size, 256);
}

#[test]
fn secret_from_environment() {
    let config: AuthConfig =
        toml::from_str(r#"jwt_secret = "ENV:MEDVERIFY_TEST_SECRET_UNSET_1""#).unwrap();
    let err = config.resolve_secret().unwrap_err();
    assert!(err.contains("MEDVERIFY_TEST_SECRET_UNSET_1"));

    let config = AuthConfig::default();
    assert!(config.resolve_secret().is_err());
}

#[test]
fn telemetry_custom_config() {
    let toml = r#"
        enabled = true
        protocol = "http"
        sample_ratio = 0.5
        environment = "staging"
    "#;

    let config: TelemetryConfig = toml::from_str(toml).unwrap();
    assert!(config.enabled);
    assert_eq!(config.protocol, OtlpProtocol::Http);
    assert_eq!(config.endpoint(), "http://localhost:4318/v1/traces");
    assert!((config.sample_ratio - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.export_timeout_seconds, 5);
    assert_eq!(config.environment.as_deref(), Some("staging"));
}

#[test]
fn telemetry_explicit_endpoint_wins() {
    let config: TelemetryConfig =
        toml::from_str(r#"endpoint = "http://collector:4317""#).unwrap();
    assert_eq!(config.protocol, OtlpProtocol::Grpc);
    assert_eq!(config.endpoint(), "http://collector:4317");
}

#[test]
fn telemetry_unknown_protocol_is_rejected() {
    assert!(toml::from_str::<TelemetryConfig>(r#"protocol = "udp""#).is_err());
}
