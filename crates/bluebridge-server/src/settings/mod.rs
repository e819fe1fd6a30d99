use std::env;
use std::net::SocketAddr;

use tracing::warn;

use crate::config::{EmailTransportKind, PushProvider, ServerConfig};

mod env_config;
#[cfg(test)]
mod tests;

#[derive(Debug)]
pub struct Settings {
    pub addr: SocketAddr,
    pub db_url: String,
    pub db_pool_max: u32,
    pub config_path: String,
    pub config: ServerConfig,
}

impl Settings {
    #[must_use]
    pub fn from_env() -> Self {
        let addr = match env::var("BLUEBRIDGE_ADDR") {
            Ok(value) => value.parse().unwrap_or_else(|_| {
                warn!(event = "config_invalid", field = "BLUEBRIDGE_ADDR", value = %value);
                default_addr()
            }),
            Err(_) => default_addr(),
        };
        let db_url = env::var("BLUEBRIDGE_DB_URL").unwrap_or_default();
        let db_pool_max = match env::var("BLUEBRIDGE_DB_POOL_MAX") {
            Ok(value) => value.parse::<u32>().unwrap_or_else(|_| {
                warn!(event = "config_invalid", field = "BLUEBRIDGE_DB_POOL_MAX", value = %value);
                10
            }),
            Err(_) => 10,
        };
        let config_path =
            env::var("BLUEBRIDGE_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        let mut config = env_config::load_config(&config_path);
        env_config::apply_server_env_overrides(&mut config);
        env_config::apply_weather_env_overrides(&mut config);
        env_config::apply_push_env_overrides(&mut config);
        env_config::apply_email_env_overrides(&mut config);
        env_config::apply_tracing_env_overrides(&mut config);
        env_config::apply_metrics_env_overrides(&mut config);
        env_config::apply_sentry_env_overrides(&mut config);

        Self {
            addr,
            db_url,
            db_pool_max,
            config_path,
            config,
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

pub fn preflight(settings: &Settings) -> Result<(), Vec<String>> {
    let mut missing = Vec::new();
    if settings.db_url.trim().is_empty() {
        missing.push("BLUEBRIDGE_DB_URL is required".to_string());
    }
    if settings.db_pool_max == 0 {
        missing.push("BLUEBRIDGE_DB_POOL_MAX must be greater than 0".to_string());
    }
    missing.extend(validate_config(&settings.config));
    if missing.is_empty() {
        Ok(())
    } else {
        Err(missing)
    }
}

/// Cross-field checks on the loaded config. Returns one message per problem.
pub fn validate_config(config: &ServerConfig) -> Vec<String> {
    let mut errors = Vec::new();

    let weather = &config.weather;
    if weather.enabled && is_blank(weather.api_key.as_deref()) {
        errors.push(
            "weather.api_key (or OPENWEATHER_API_KEY) is required when weather.enabled=true"
                .to_string(),
        );
    }
    if weather.timeout_ms == 0 {
        errors.push("weather.timeout_ms must be greater than 0".to_string());
    }
    if !weather.alert_radius_km.is_finite() || weather.alert_radius_km <= 0.0 {
        errors.push("weather.alert_radius_km must be a positive number".to_string());
    }

    let push = &config.push;
    if push.provider == PushProvider::Fcm {
        if is_blank(push.project_id.as_deref()) {
            errors.push("push.project_id is required when push.provider=fcm".to_string());
        }
        if is_blank(push.access_token.as_deref()) {
            errors.push("push.access_token is required when push.provider=fcm".to_string());
        }
    }

    let email = &config.email;
    if email.enabled {
        match email.transport {
            EmailTransportKind::Smtp if is_blank(email.smtp.host.as_deref()) => {
                errors.push("email.smtp.host is required when email.transport=smtp".to_string());
            }
            EmailTransportKind::File if email.file_path.trim().is_empty() => {
                errors.push("email.file_path is required when email.transport=file".to_string());
            }
            _ => {}
        }
        if email.from.trim().is_empty() {
            errors.push("email.from must not be empty".to_string());
        }
    }

    if config.metrics.enabled && !config.metrics.endpoint.starts_with('/') {
        errors.push("metrics.endpoint must start with '/'".to_string());
    }

    if let Some(ratio) = config.tracing.otel.sampling_ratio {
        if !(0.0..=1.0).contains(&ratio) {
            errors.push("tracing.otel.sampling_ratio must be between 0 and 1".to_string());
        }
    }

    errors
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |value| value.trim().is_empty())
}
