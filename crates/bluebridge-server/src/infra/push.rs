use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bluebridge_core::PUSH_MULTICAST_CHUNK;
use futures::future::join_all;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::{PushConfig, PushProvider};

#[derive(Debug, Error)]
pub enum PushError {
    #[error("push provider not configured: {0}")]
    NotConfigured(&'static str),
    #[error("push transport failed: {0}")]
    Transport(String),
    #[error("push rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MulticastOutcome {
    pub success_count: usize,
    pub failure_count: usize,
}

/// Delivery seam for device notifications.
#[async_trait]
pub trait PushSender: Send + Sync {
    /// Returns the provider message id.
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<String, PushError>;

    /// Sends to every token in chunks of [`PUSH_MULTICAST_CHUNK`]. The tokens
    /// of a chunk are sent concurrently, one chunk at a time. Individual
    /// failures are counted, never propagated.
    async fn send_multicast(
        &self,
        tokens: &[String],
        title: &str,
        body: &str,
        data: &BTreeMap<String, String>,
    ) -> MulticastOutcome {
        let mut outcome = MulticastOutcome::default();
        for (index, chunk) in tokens.chunks(PUSH_MULTICAST_CHUNK).enumerate() {
            let results = join_all(
                chunk
                    .iter()
                    .map(|token| self.send(token, title, body, data)),
            )
            .await;
            let mut chunk_outcome = MulticastOutcome::default();
            for (token, result) in chunk.iter().zip(results) {
                match result {
                    Ok(_) => chunk_outcome.success_count += 1,
                    Err(err) => {
                        chunk_outcome.failure_count += 1;
                        tracing::warn!(
                            event = "push_send_failed",
                            token_prefix = %token_prefix(token),
                            error = %err
                        );
                    }
                }
            }
            tracing::debug!(
                event = "push_chunk_sent",
                chunk = index,
                success = chunk_outcome.success_count,
                failure = chunk_outcome.failure_count
            );
            outcome.success_count += chunk_outcome.success_count;
            outcome.failure_count += chunk_outcome.failure_count;
        }
        outcome
    }
}

/// Flattens a JSON object into the string map providers require.
/// Non-object values yield an empty map.
#[must_use]
pub fn data_map(value: Option<&Value>) -> BTreeMap<String, String> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

fn token_prefix(token: &str) -> String {
    token.chars().take(10).collect()
}

pub fn build_push_sender(config: &PushConfig) -> Result<Arc<dyn PushSender>, PushError> {
    match config.provider {
        PushProvider::None => Ok(Arc::new(LogPushSender)),
        PushProvider::Fcm => Ok(Arc::new(FcmPushSender::new(config)?)),
    }
}

/// Records the message in the log instead of delivering it.
pub struct LogPushSender;

#[async_trait]
impl PushSender for LogPushSender {
    async fn send(
        &self,
        token: &str,
        title: &str,
        _body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<String, PushError> {
        let message_id = format!("log-{}", uuid::Uuid::new_v4());
        tracing::info!(
            event = "push_logged",
            token_prefix = %token_prefix(token),
            title,
            data_keys = data.len(),
            message_id = %message_id,
            "Push delivery disabled; message logged"
        );
        Ok(message_id)
    }
}

/// Firebase Cloud Messaging HTTP v1 sender. The OAuth access token is
/// supplied by configuration.
pub struct FcmPushSender {
    client: reqwest::Client,
    send_url: String,
    access_token: String,
}

#[derive(Deserialize)]
struct FcmSendResponse {
    name: String,
}

impl FcmPushSender {
    pub fn new(config: &PushConfig) -> Result<Self, PushError> {
        let project_id = config
            .project_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(PushError::NotConfigured("project_id"))?;
        let access_token = config
            .access_token
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(PushError::NotConfigured("access_token"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| PushError::Transport(err.to_string()))?;
        Ok(Self {
            client,
            send_url: format!(
                "{}/v1/projects/{project_id}/messages:send",
                config.endpoint.trim_end_matches('/')
            ),
            access_token: access_token.to_string(),
        })
    }
}

pub(crate) fn fcm_message(
    token: &str,
    title: &str,
    body: &str,
    data: &BTreeMap<String, String>,
) -> Value {
    json!({
        "message": {
            "token": token,
            "notification": { "title": title, "body": body },
            "data": data,
            "android": {
                "priority": "high",
                "notification": {
                    "sound": "default",
                    "channel_id": "default-channel"
                }
            },
            "apns": {
                "payload": {
                    "aps": {
                        "sound": "default",
                        "badge": 1,
                        "content-available": 1
                    }
                }
            }
        }
    })
}

#[async_trait]
impl PushSender for FcmPushSender {
    async fn send(
        &self,
        token: &str,
        title: &str,
        body: &str,
        data: &BTreeMap<String, String>,
    ) -> Result<String, PushError> {
        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(&self.access_token)
            .json(&fcm_message(token, title, body, data))
            .send()
            .await
            .map_err(|err| PushError::Transport(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PushError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        let parsed: FcmSendResponse = response
            .json()
            .await
            .map_err(|err| PushError::Transport(err.to_string()))?;
        tracing::debug!(event = "push_sent", token_prefix = %token_prefix(token));
        Ok(parsed.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct FlakySender {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PushSender for FlakySender {
        async fn send(
            &self,
            token: &str,
            _title: &str,
            _body: &str,
            _data: &BTreeMap<String, String>,
        ) -> Result<String, PushError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if token.starts_with("bad") {
                Err(PushError::Transport("unreachable".to_string()))
            } else {
                Ok(format!("id-{token}"))
            }
        }
    }

    #[tokio::test]
    async fn multicast_counts_each_token() {
        let sender = FlakySender {
            calls: AtomicUsize::new(0),
        };
        let mut tokens: Vec<String> = (0..PUSH_MULTICAST_CHUNK + 2)
            .map(|i| format!("good-{i}"))
            .collect();
        tokens.push("bad-1".to_string());

        let outcome = sender
            .send_multicast(&tokens, "t", "b", &BTreeMap::new())
            .await;
        assert_eq!(outcome.success_count, PUSH_MULTICAST_CHUNK + 2);
        assert_eq!(outcome.failure_count, 1);
        assert_eq!(sender.calls.load(Ordering::SeqCst), tokens.len());
    }

    struct GaugedSender {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl PushSender for GaugedSender {
        async fn send(
            &self,
            token: &str,
            _title: &str,
            _body: &str,
            _data: &BTreeMap<String, String>,
        ) -> Result<String, PushError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(format!("id-{token}"))
        }
    }

    #[tokio::test]
    async fn multicast_sends_a_chunk_concurrently_but_never_more() {
        let sender = GaugedSender {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        };
        let tokens: Vec<String> = (0..PUSH_MULTICAST_CHUNK * 2 + 7)
            .map(|i| format!("device-{i}"))
            .collect();

        let outcome = sender
            .send_multicast(&tokens, "t", "b", &BTreeMap::new())
            .await;
        assert_eq!(outcome.success_count, tokens.len());
        assert_eq!(outcome.failure_count, 0);
        let peak = sender.peak.load(Ordering::SeqCst);
        assert!(peak > 1, "sends ran one at a time");
        assert!(peak <= PUSH_MULTICAST_CHUNK, "peak {peak} exceeds a chunk");
        assert_eq!(sender.in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn data_map_stringifies_values() {
        let value = json!({"type": "weather_alert", "count": 3, "urgent": true});
        let map = data_map(Some(&value));
        assert_eq!(map.get("type").map(String::as_str), Some("weather_alert"));
        assert_eq!(map.get("count").map(String::as_str), Some("3"));
        assert_eq!(map.get("urgent").map(String::as_str), Some("true"));
        assert!(data_map(Some(&json!([1, 2]))).is_empty());
        assert!(data_map(None).is_empty());
    }

    #[test]
    fn fcm_message_shape() {
        let mut data = BTreeMap::new();
        data.insert("alertType".to_string(), "heat".to_string());
        let message = fcm_message("tok", "Weather Alert", "Hot", &data);
        assert_eq!(message["message"]["token"], "tok");
        assert_eq!(message["message"]["notification"]["title"], "Weather Alert");
        assert_eq!(message["message"]["data"]["alertType"], "heat");
        assert_eq!(message["message"]["android"]["priority"], "high");
        assert_eq!(message["message"]["apns"]["payload"]["aps"]["badge"], 1);
    }

    #[test]
    fn fcm_requires_credentials() {
        let config = PushConfig {
            provider: PushProvider::Fcm,
            ..PushConfig::default()
        };
        assert!(matches!(
            FcmPushSender::new(&config),
            Err(PushError::NotConfigured("project_id"))
        ));
    }

    #[tokio::test]
    async fn fcm_sender_posts_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/projects/demo/messages:send"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"name": "projects/demo/messages/42"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = PushConfig {
            provider: PushProvider::Fcm,
            project_id: Some("demo".to_string()),
            access_token: Some("secret".to_string()),
            endpoint: server.uri(),
            timeout_ms: 2_000,
        };
        let sender = FcmPushSender::new(&config).expect("sender");
        let id = sender
            .send("device", "Title", "Body", &BTreeMap::new())
            .await
            .expect("send");
        assert_eq!(id, "projects/demo/messages/42");
    }

    #[tokio::test]
    async fn fcm_sender_surfaces_rejections() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_string("UNREGISTERED"))
            .mount(&server)
            .await;

        let config = PushConfig {
            provider: PushProvider::Fcm,
            project_id: Some("demo".to_string()),
            access_token: Some("secret".to_string()),
            endpoint: server.uri(),
            timeout_ms: 2_000,
        };
        let sender = FcmPushSender::new(&config).expect("sender");
        let err = sender
            .send("device", "Title", "Body", &BTreeMap::new())
            .await
            .expect_err("rejected");
        assert!(matches!(err, PushError::Rejected { status: 404, .. }));
    }
}
