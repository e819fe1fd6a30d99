use super::*;
use crate::config::{EmailTransportKind, PushProvider, ServerMode};
use std::sync::Mutex;
use uuid::Uuid;

static ENV_LOCK: Mutex<()> = Mutex::new(());

const MANAGED_VARS: &[&str] = &[
    "BLUEBRIDGE_ADDR",
    "BLUEBRIDGE_DB_URL",
    "BLUEBRIDGE_DB_POOL_MAX",
    "BLUEBRIDGE_CONFIG_PATH",
    "BLUEBRIDGE_SERVER_MODE",
    "BLUEBRIDGE_MAX_BODY_BYTES",
    "BLUEBRIDGE_PUBLIC_BASE_URL",
    "BLUEBRIDGE_CORS_ALLOWED_ORIGINS",
    "BLUEBRIDGE_OPENWEATHER_API_KEY",
    "OPENWEATHER_API_KEY",
    "BLUEBRIDGE_WEATHER_BASE_URL",
    "BLUEBRIDGE_WEATHER_ENABLED",
    "BLUEBRIDGE_PUSH_PROVIDER",
    "BLUEBRIDGE_FCM_PROJECT_ID",
    "BLUEBRIDGE_FCM_ACCESS_TOKEN",
    "BLUEBRIDGE_FCM_ENDPOINT",
    "BLUEBRIDGE_EMAIL_ENABLED",
    "BLUEBRIDGE_SMTP_HOST",
    "BLUEBRIDGE_SMTP_PORT",
    "BLUEBRIDGE_SMTP_USERNAME",
    "BLUEBRIDGE_SMTP_PASSWORD",
    "BLUEBRIDGE_EMAIL_FROM",
    "BLUEBRIDGE_OTEL_ENABLED",
    "BLUEBRIDGE_OTEL_ENDPOINT",
    "BLUEBRIDGE_METRICS_ENABLED",
    "BLUEBRIDGE_METRICS_ENDPOINT",
    "BLUEBRIDGE_SENTRY_DSN",
];

fn clear_env() {
    for name in MANAGED_VARS {
        env::remove_var(name);
    }
    let missing = std::env::temp_dir().join(format!("bluebridge-missing-{}.yaml", Uuid::new_v4()));
    env::set_var("BLUEBRIDGE_CONFIG_PATH", missing);
}

fn set_config_yaml(yaml: &str) {
    let config_path =
        std::env::temp_dir().join(format!("bluebridge-test-config-{}.yaml", Uuid::new_v4()));
    std::fs::write(&config_path, yaml).expect("write config");
    env::set_var("BLUEBRIDGE_CONFIG_PATH", config_path);
}

#[test]
fn defaults_without_env_or_file() {
    let _lock = ENV_LOCK.lock().expect("env lock");
    clear_env();

    let settings = Settings::from_env();
    assert_eq!(settings.addr.to_string(), "127.0.0.1:8080");
    assert_eq!(settings.db_pool_max, 10);
    assert!(settings.db_url.is_empty());
    assert_eq!(settings.config.server.mode, ServerMode::Production);
    assert!(settings.config.weather.enabled);
    assert_eq!(settings.config.weather.cache_ttl_seconds, 3600);
    assert_eq!(settings.config.weather.cache_max_entries, 10_000);
    assert_eq!(settings.config.weather.timeout_ms, 5000);
    assert_eq!(settings.config.push.provider, PushProvider::None);
    assert!(!settings.config.email.enabled);
    assert!(!settings.config.metrics.enabled);
}

#[test]
fn invalid_env_values_fall_back() {
    let _lock = ENV_LOCK.lock().expect("env lock");
    clear_env();
    env::set_var("BLUEBRIDGE_ADDR", "not-an-addr");
    env::set_var("BLUEBRIDGE_DB_POOL_MAX", "many");
    env::set_var("BLUEBRIDGE_METRICS_ENABLED", "maybe");
    env::set_var("BLUEBRIDGE_SERVER_MODE", "staging");

    let settings = Settings::from_env();
    assert_eq!(settings.addr.to_string(), "127.0.0.1:8080");
    assert_eq!(settings.db_pool_max, 10);
    assert!(!settings.config.metrics.enabled);
    assert_eq!(settings.config.server.mode, ServerMode::Production);
}

#[test]
fn yaml_config_is_loaded() {
    let _lock = ENV_LOCK.lock().expect("env lock");
    clear_env();
    set_config_yaml(
        r#"
server:
  mode: development
  max_body_bytes: 2048
  cors_allowed_origins: ["https://app.example.com"]
weather:
  api_key: from-file
  cache_ttl_seconds: 60
push:
  provider: fcm
  project_id: bluebridge-test
  access_token: token
email:
  enabled: true
  transport: smtp
  smtp:
    host: smtp.example.com
    port: 2525
"#,
    );

    let settings = Settings::from_env();
    let config = &settings.config;
    assert_eq!(config.server.mode, ServerMode::Development);
    assert_eq!(config.server.max_body_bytes, 2048);
    assert_eq!(config.server.cors_allowed_origins, vec!["https://app.example.com"]);
    assert_eq!(config.weather.api_key.as_deref(), Some("from-file"));
    assert_eq!(config.weather.cache_ttl_seconds, 60);
    assert_eq!(config.push.provider, PushProvider::Fcm);
    assert_eq!(config.email.transport, EmailTransportKind::Smtp);
    assert_eq!(config.email.smtp.port, 2525);
    assert!(validate_config(config).is_empty());
}

#[test]
fn broken_yaml_falls_back_to_defaults() {
    let _lock = ENV_LOCK.lock().expect("env lock");
    clear_env();
    set_config_yaml("server: [unclosed");

    let settings = Settings::from_env();
    assert_eq!(
        settings.config.server.max_body_bytes,
        crate::config::DEFAULT_MAX_BODY_BYTES
    );
}

#[test]
fn weather_key_prefers_prefixed_env() {
    let _lock = ENV_LOCK.lock().expect("env lock");
    clear_env();
    env::set_var("OPENWEATHER_API_KEY", "plain");

    let settings = Settings::from_env();
    assert_eq!(settings.config.weather.api_key.as_deref(), Some("plain"));

    env::set_var("BLUEBRIDGE_OPENWEATHER_API_KEY", "prefixed");
    let settings = Settings::from_env();
    assert_eq!(settings.config.weather.api_key.as_deref(), Some("prefixed"));
}

#[test]
fn env_overrides_apply() {
    let _lock = ENV_LOCK.lock().expect("env lock");
    clear_env();
    env::set_var("BLUEBRIDGE_ADDR", "0.0.0.0:9000");
    env::set_var("BLUEBRIDGE_DB_URL", "postgres://localhost/bluebridge");
    env::set_var("BLUEBRIDGE_FCM_PROJECT_ID", "project");
    env::set_var("BLUEBRIDGE_FCM_ACCESS_TOKEN", "secret");
    env::set_var("BLUEBRIDGE_PUSH_PROVIDER", "fcm");
    env::set_var("BLUEBRIDGE_SMTP_HOST", "smtp.example.com");
    env::set_var("BLUEBRIDGE_SMTP_PORT", "465");
    env::set_var("BLUEBRIDGE_OTEL_ENABLED", "true");
    env::set_var("BLUEBRIDGE_OTEL_ENDPOINT", "http://collector:4318");
    env::set_var("BLUEBRIDGE_METRICS_ENABLED", "yes");
    env::set_var("BLUEBRIDGE_SENTRY_DSN", "https://key@sentry.example.com/1");
    env::set_var("BLUEBRIDGE_SERVER_MODE", "dev");
    env::set_var("BLUEBRIDGE_CORS_ALLOWED_ORIGINS", "https://a.example, ,https://b.example");

    let settings = Settings::from_env();
    let config = &settings.config;
    assert_eq!(settings.addr.to_string(), "0.0.0.0:9000");
    assert_eq!(settings.db_url, "postgres://localhost/bluebridge");
    assert_eq!(config.push.provider, PushProvider::Fcm);
    assert_eq!(config.push.project_id.as_deref(), Some("project"));
    assert_eq!(config.push.access_token.as_deref(), Some("secret"));
    assert_eq!(config.email.transport, EmailTransportKind::Smtp);
    assert_eq!(config.email.smtp.host.as_deref(), Some("smtp.example.com"));
    assert_eq!(config.email.smtp.port, 465);
    assert!(config.tracing.otel.enabled);
    assert_eq!(
        config.tracing.otel.endpoint.as_deref(),
        Some("http://collector:4318")
    );
    assert!(config.metrics.enabled);
    assert!(config.sentry.enabled);
    assert_eq!(config.server.mode, ServerMode::Development);
    assert_eq!(
        config.server.cors_allowed_origins,
        vec!["https://a.example", "https://b.example"]
    );
}

#[test]
fn preflight_reports_every_problem() {
    let _lock = ENV_LOCK.lock().expect("env lock");
    clear_env();
    set_config_yaml(
        r#"
push:
  provider: fcm
email:
  enabled: true
  transport: smtp
"#,
    );

    let settings = Settings::from_env();
    let errors = preflight(&settings).expect_err("preflight must fail");
    assert!(errors.iter().any(|e| e.contains("BLUEBRIDGE_DB_URL")));
    assert!(errors.iter().any(|e| e.contains("weather.api_key")));
    assert!(errors.iter().any(|e| e.contains("push.project_id")));
    assert!(errors.iter().any(|e| e.contains("push.access_token")));
    assert!(errors.iter().any(|e| e.contains("email.smtp.host")));
}

#[test]
fn preflight_passes_with_minimal_config() {
    let _lock = ENV_LOCK.lock().expect("env lock");
    clear_env();
    env::set_var("BLUEBRIDGE_DB_URL", "postgres://localhost/bluebridge");
    env::set_var("OPENWEATHER_API_KEY", "key");

    let settings = Settings::from_env();
    assert!(preflight(&settings).is_ok());
}
