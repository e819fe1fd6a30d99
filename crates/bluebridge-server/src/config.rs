use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerRuntimeConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub push: PushConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub sentry: SentryConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub tracing: TracingConfig,
}

pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_FCM_ENDPOINT: &str = "https://fcm.googleapis.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerRuntimeConfig {
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default)]
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default)]
    pub mode: ServerMode,
}

impl Default for ServerRuntimeConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: default_max_body_bytes(),
            public_base_url: None,
            cors_allowed_origins: Vec::new(),
            mode: ServerMode::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    Development,
    #[default]
    Production,
}

impl ServerMode {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::Production => "Production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_weather_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    /// Upper bound on cached coordinate keys.
    #[serde(default = "default_weather_cache_max_entries")]
    pub cache_max_entries: u64,
    #[serde(default = "default_weather_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_true")]
    pub alerts_enabled: bool,
    #[serde(default = "default_alert_radius_km")]
    pub alert_radius_km: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_weather_base_url(),
            api_key: None,
            cache_ttl_seconds: default_weather_cache_ttl_seconds(),
            cache_max_entries: default_weather_cache_max_entries(),
            timeout_ms: default_weather_timeout_ms(),
            alerts_enabled: true,
            alert_radius_km: default_alert_radius_km(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PushProvider {
    #[default]
    None,
    Fcm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    #[serde(default)]
    pub provider: PushProvider,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_fcm_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_push_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            provider: PushProvider::None,
            project_id: None,
            access_token: None,
            endpoint: default_fcm_endpoint(),
            timeout_ms: default_push_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmailTransportKind {
    Smtp,
    #[default]
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_true")]
    pub starttls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_smtp_port(),
            username: None,
            password: None,
            starttls: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub transport: EmailTransportKind,
    #[serde(default)]
    pub smtp: SmtpConfig,
    #[serde(default = "default_email_file_path")]
    pub file_path: String,
    #[serde(default = "default_email_from")]
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            transport: EmailTransportKind::default(),
            smtp: SmtpConfig::default(),
            file_path: default_email_file_path(),
            from: default_email_from(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SentryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub dsn: String,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub release: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_metrics_endpoint")]
    pub endpoint: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_metrics_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TracingConfig {
    #[serde(default)]
    pub otel: OtelConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OtelConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub sampling_ratio: Option<f64>,
}

const fn default_true() -> bool {
    true
}

fn default_metrics_endpoint() -> String {
    "/metrics".to_string()
}

const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

fn default_weather_base_url() -> String {
    DEFAULT_WEATHER_BASE_URL.to_string()
}

const fn default_weather_cache_ttl_seconds() -> u64 {
    60 * 60
}

const fn default_weather_cache_max_entries() -> u64 {
    10_000
}

const fn default_weather_timeout_ms() -> u64 {
    5_000
}

const fn default_alert_radius_km() -> f64 {
    bluebridge_core::WEATHER_ALERT_RADIUS_KM
}

fn default_fcm_endpoint() -> String {
    DEFAULT_FCM_ENDPOINT.to_string()
}

const fn default_push_timeout_ms() -> u64 {
    10_000
}

const fn default_smtp_port() -> u16 {
    587
}

fn default_email_file_path() -> String {
    "emails".to_string()
}

fn default_email_from() -> String {
    "BlueBridge <noreply@bluebridge.app>".to_string()
}
