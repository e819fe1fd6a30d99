use std::path::Path;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::Address;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;

use crate::config::{EmailConfig, EmailTransportKind};

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email config invalid: {0}")]
    Config(String),
    #[error("email address invalid: {0}")]
    Address(String),
    #[error("email send failed: {0}")]
    Send(String),
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

pub struct EmailService {
    transport: EmailTransport,
    from: Mailbox,
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Result<Self, EmailError> {
        let transport = match config.transport {
            EmailTransportKind::Smtp => {
                let smtp = &config.smtp;
                let host = smtp
                    .host
                    .as_deref()
                    .ok_or_else(|| EmailError::Config("smtp.host missing".to_string()))?;
                if !smtp.starttls {
                    tracing::warn!(event = "smtp_tls_disabled", "SMTP STARTTLS is disabled");
                }
                let mut builder = if smtp.starttls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                        .map_err(|err| EmailError::Config(err.to_string()))?
                } else {
                    AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                }
                .port(smtp.port);
                if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
                    builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
                }
                EmailTransport::Smtp(builder.build())
            }
            EmailTransportKind::File => {
                let dir = Path::new(&config.file_path);
                if !dir.exists() {
                    std::fs::create_dir_all(dir)
                        .map_err(|err| EmailError::Config(format!("create {}: {err}", dir.display())))?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(dir))
            }
        };
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|err| EmailError::Address(format!("from: {err}")))?;
        Ok(Self { transport, from })
    }

    pub async fn send_welcome(&self, to_email: &str, full_name: &str) -> Result<(), EmailError> {
        let subject = "Welcome to BlueBridge";
        self.send(to_email, Some(full_name), subject, welcome_body(full_name))
            .await
    }

    async fn send(
        &self,
        to_email: &str,
        to_name: Option<&str>,
        subject: &str,
        body: String,
    ) -> Result<(), EmailError> {
        let to = recipient(to_email, to_name)?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|err| EmailError::Send(err.to_string()))?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => smtp
                .send(message)
                .await
                .map(|_| ())
                .map_err(|err| EmailError::Send(err.to_string())),
            EmailTransport::File(file) => file
                .send(message)
                .await
                .map(|_| ())
                .map_err(|err| EmailError::Send(err.to_string())),
        }
    }
}

/// Display names are kept as data, never parsed as address syntax.
fn recipient(to_email: &str, to_name: Option<&str>) -> Result<Mailbox, EmailError> {
    let address = to_email
        .parse::<Address>()
        .map_err(|err| EmailError::Address(format!("to: {err}")))?;
    let name = to_name
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);
    Ok(Mailbox::new(name, address))
}

fn welcome_body(full_name: &str) -> String {
    format!(
        "Hello {full_name},\n\n\
         Your BlueBridge account is ready. You can now find wells near you, \
         follow their water levels and share your water needs with your community.\n\n\
         The BlueBridge team\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config(dir: &Path) -> EmailConfig {
        EmailConfig {
            enabled: true,
            transport: EmailTransportKind::File,
            file_path: dir.to_string_lossy().to_string(),
            ..EmailConfig::default()
        }
    }

    #[tokio::test]
    async fn file_transport_writes_welcome_mail() {
        let dir = std::env::temp_dir().join(format!("bluebridge-mail-{}", uuid::Uuid::new_v4()));
        let service = EmailService::new(&file_config(&dir)).expect("service");
        service
            .send_welcome("ada@example.com", "Ada Lovelace")
            .await
            .expect("send");

        let written: Vec<_> = std::fs::read_dir(&dir).expect("dir").collect();
        assert_eq!(written.len(), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn invalid_from_is_rejected() {
        let dir = std::env::temp_dir().join(format!("bluebridge-mail-{}", uuid::Uuid::new_v4()));
        let mut config = file_config(&dir);
        config.from = "not an address".to_string();
        assert!(matches!(
            EmailService::new(&config),
            Err(EmailError::Address(_))
        ));
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn smtp_without_host_is_rejected() {
        let config = EmailConfig {
            enabled: true,
            transport: EmailTransportKind::Smtp,
            ..EmailConfig::default()
        };
        assert!(matches!(EmailService::new(&config), Err(EmailError::Config(_))));
    }

    #[test]
    fn recipient_keeps_punctuated_names_intact() {
        let to = recipient("john@example.com", Some("Doe, Jr.")).expect("mailbox");
        assert_eq!(to.name.as_deref(), Some("Doe, Jr."));
        assert_eq!(to.email.to_string(), "john@example.com");

        let bare = recipient("ada@example.com", Some("  ")).expect("mailbox");
        assert!(bare.name.is_none());

        assert!(matches!(
            recipient("not an address", Some("Ada")),
            Err(EmailError::Address(_))
        ));
    }

    #[tokio::test]
    async fn welcome_mail_reaches_a_comma_named_user() {
        let dir = std::env::temp_dir().join(format!("bluebridge-mail-{}", uuid::Uuid::new_v4()));
        let service = EmailService::new(&file_config(&dir)).expect("service");
        service
            .send_welcome("john@example.com", "Doe, Jr.")
            .await
            .expect("send");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn welcome_body_greets_by_name() {
        assert!(welcome_body("Ada").starts_with("Hello Ada,"));
    }
}
