//! SMTP-based notification gateway for production

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use tracing::info;

use super::templates::{self, RenderedEmail};
use crate::application::ports::{ApprovalRequest, GatewayError, NotificationGateway, StatusUpdate};

/// Transport security for the SMTP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Implicit TLS, usually port 465
    Tls,
    /// STARTTLS upgrade, usually port 587
    #[default]
    Starttls,
    /// Plain text, for local relays only
    None,
}

/// Configuration for SMTP email sending
#[derive(Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub tls: SmtpTls,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    /// Upper bound on a single send, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    587
}

fn default_from_name() -> String {
    "Visitor Management System".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

pub struct SmtpNotificationGateway {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotificationGateway {
    /// Build the transport. No connection is opened until the first send.
    pub fn new(config: &SmtpConfig) -> Result<Self, GatewayError> {
        let mut builder = match config.tls {
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| GatewayError::InvalidInput(format!("SMTP relay: {}", e)))?,
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| GatewayError::InvalidInput(format!("SMTP relay: {}", e)))?,
            SmtpTls::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host),
        };

        builder = builder
            .port(config.port)
            .timeout(Some(std::time::Duration::from_secs(config.timeout_secs)));

        if let (Some(user), Some(pass)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        let from = format!("{} <{}>", config.from_name, config.from_email)
            .parse::<Mailbox>()
            .map_err(|e| GatewayError::InvalidInput(format!("Invalid from address: {}", e)))?;

        info!(host = %config.host, port = config.port, tls = ?config.tls, "SMTP gateway configured");

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }

    async fn send(&self, email: RenderedEmail) -> Result<(), GatewayError> {
        let to = email
            .to
            .parse::<Mailbox>()
            .map_err(|e| GatewayError::InvalidInput(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body)
            .map_err(|e| GatewayError::InvalidInput(format!("Failed to build email: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for SmtpNotificationGateway {
    async fn send_approval_request(&self, request: &ApprovalRequest) -> Result<(), GatewayError> {
        self.send(templates::approval_request(request)).await
    }

    async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), GatewayError> {
        self.send(templates::status_update(update)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_apply() {
        let config: SmtpConfig = toml::from_str(
            r#"
            host = "smtp.example.com"
            from_email = "gate@example.com"
            password = "hunter2"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 587);
        assert_eq!(config.tls, SmtpTls::Starttls);
        assert!(!format!("{:?}", config).contains("hunter2"));
    }

    #[tokio::test]
    async fn builds_without_connecting() {
        let config: SmtpConfig = toml::from_str(
            r#"
            host = "localhost"
            port = 2525
            tls = "none"
            from_email = "gate@example.com"
            "#,
        )
        .unwrap();
        assert!(SmtpNotificationGateway::new(&config).is_ok());
    }
}
