use std::env;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::config::{EmailTransportKind, PushProvider, ServerConfig, ServerMode};

pub(super) fn load_config(path: &str) -> ServerConfig {
    if !Path::new(path).exists() {
        return ServerConfig::default();
    }

    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            warn!(event = "config_read_failed", path, error = %err);
            return ServerConfig::default();
        }
    };
    match serde_yaml::from_str(&contents) {
        Ok(config) => config,
        Err(err) => {
            warn!(event = "config_parse_failed", path, error = %err);
            ServerConfig::default()
        }
    }
}

pub(super) fn apply_server_env_overrides(config: &mut ServerConfig) {
    if let Ok(value) = env::var("BLUEBRIDGE_SERVER_MODE") {
        match parse_server_mode(&value) {
            Some(mode) => config.server.mode = mode,
            None => warn!(event = "config_invalid", field = "BLUEBRIDGE_SERVER_MODE", value = %value),
        }
    }
    if let Ok(value) = env::var("BLUEBRIDGE_MAX_BODY_BYTES") {
        match value.trim().parse::<usize>() {
            Ok(bytes) if bytes > 0 => config.server.max_body_bytes = bytes,
            _ => warn!(
                event = "config_invalid",
                field = "BLUEBRIDGE_MAX_BODY_BYTES",
                value = %value
            ),
        }
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_PUBLIC_BASE_URL") {
        config.server.public_base_url = Some(value);
    }
    if let Ok(value) = env::var("BLUEBRIDGE_CORS_ALLOWED_ORIGINS") {
        config.server.cors_allowed_origins = value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(ToString::to_string)
            .collect();
    }
}

pub(super) fn apply_weather_env_overrides(config: &mut ServerConfig) {
    if let Some(value) =
        non_empty_env("BLUEBRIDGE_OPENWEATHER_API_KEY").or_else(|| non_empty_env("OPENWEATHER_API_KEY"))
    {
        config.weather.api_key = Some(value);
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_WEATHER_BASE_URL") {
        config.weather.base_url = value;
    }
    if let Ok(value) = env::var("BLUEBRIDGE_WEATHER_ENABLED") {
        match parse_bool(&value) {
            Some(enabled) => config.weather.enabled = enabled,
            None => warn!(
                event = "config_invalid",
                field = "BLUEBRIDGE_WEATHER_ENABLED",
                value = %value
            ),
        }
    }
}

pub(super) fn apply_push_env_overrides(config: &mut ServerConfig) {
    if let Ok(value) = env::var("BLUEBRIDGE_PUSH_PROVIDER") {
        match parse_push_provider(&value) {
            Some(provider) => config.push.provider = provider,
            None => warn!(
                event = "config_invalid",
                field = "BLUEBRIDGE_PUSH_PROVIDER",
                value = %value
            ),
        }
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_FCM_PROJECT_ID") {
        config.push.project_id = Some(value);
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_FCM_ACCESS_TOKEN") {
        config.push.access_token = Some(value);
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_FCM_ENDPOINT") {
        config.push.endpoint = value;
    }
}

pub(super) fn apply_email_env_overrides(config: &mut ServerConfig) {
    if let Ok(value) = env::var("BLUEBRIDGE_EMAIL_ENABLED") {
        match parse_bool(&value) {
            Some(enabled) => config.email.enabled = enabled,
            None => warn!(
                event = "config_invalid",
                field = "BLUEBRIDGE_EMAIL_ENABLED",
                value = %value
            ),
        }
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_SMTP_HOST") {
        config.email.smtp.host = Some(value);
        config.email.transport = EmailTransportKind::Smtp;
    }
    if let Ok(value) = env::var("BLUEBRIDGE_SMTP_PORT") {
        match value.trim().parse::<u16>() {
            Ok(port) => config.email.smtp.port = port,
            Err(_) => warn!(event = "config_invalid", field = "BLUEBRIDGE_SMTP_PORT", value = %value),
        }
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_SMTP_USERNAME") {
        config.email.smtp.username = Some(value);
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_SMTP_PASSWORD") {
        config.email.smtp.password = Some(value);
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_EMAIL_FROM") {
        config.email.from = value;
    }
}

pub(super) fn apply_tracing_env_overrides(config: &mut ServerConfig) {
    if let Ok(value) = env::var("BLUEBRIDGE_OTEL_ENABLED") {
        match parse_bool(&value) {
            Some(enabled) => config.tracing.otel.enabled = enabled,
            None => warn!(event = "config_invalid", field = "BLUEBRIDGE_OTEL_ENABLED", value = %value),
        }
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_OTEL_ENDPOINT") {
        config.tracing.otel.endpoint = Some(value);
    }
}

pub(super) fn apply_metrics_env_overrides(config: &mut ServerConfig) {
    if let Ok(value) = env::var("BLUEBRIDGE_METRICS_ENABLED") {
        match parse_bool(&value) {
            Some(enabled) => config.metrics.enabled = enabled,
            None => warn!(
                event = "config_invalid",
                field = "BLUEBRIDGE_METRICS_ENABLED",
                value = %value
            ),
        }
    }
    if let Some(value) = non_empty_env("BLUEBRIDGE_METRICS_ENDPOINT") {
        config.metrics.endpoint = value;
    }
}

pub(super) fn apply_sentry_env_overrides(config: &mut ServerConfig) {
    if let Some(value) = non_empty_env("BLUEBRIDGE_SENTRY_DSN") {
        config.sentry.dsn = value;
        config.sentry.enabled = true;
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub(super) fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn normalize_enum(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace('-', "_")
}

fn parse_server_mode(value: &str) -> Option<ServerMode> {
    match normalize_enum(value).as_str() {
        "development" | "dev" => Some(ServerMode::Development),
        "production" | "prod" => Some(ServerMode::Production),
        _ => None,
    }
}

fn parse_push_provider(value: &str) -> Option<PushProvider> {
    match normalize_enum(value).as_str() {
        "none" | "log" => Some(PushProvider::None),
        "fcm" => Some(PushProvider::Fcm),
        _ => None,
    }
}
