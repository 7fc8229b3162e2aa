pub mod templates;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

/// Out-of-band delivery of reset codes.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_otp(&self, to_email: &str, otp: &str, display_name: &str) -> Result<(), String>;
}

pub struct SmtpSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
    otp_ttl_minutes: i64,
}

impl SmtpSender {
    pub fn new(config: &SmtpConfig, otp_ttl_minutes: i64) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
            otp_ttl_minutes,
        })
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

#[async_trait]
impl NotificationSender for SmtpSender {
    async fn send_otp(&self, to_email: &str, otp: &str, display_name: &str) -> Result<(), String> {
        let html = templates::render_password_reset_otp(display_name, otp, self.otp_ttl_minutes);
        self.send(to_email, "Password Reset OTP - Maintenix", &html)
            .await
    }
}

/// Used when no SMTP relay is configured: the code only reaches the server log.
pub struct LogSender;

#[async_trait]
impl NotificationSender for LogSender {
    async fn send_otp(&self, to_email: &str, otp: &str, _display_name: &str) -> Result<(), String> {
        tracing::warn!("SMTP not configured. Password reset OTP for {to_email}: {otp}");
        Ok(())
    }
}

#[cfg(test)]
pub use testing::RecordingSender;
