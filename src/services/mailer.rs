//! Outgoing mail for account verification and password reset

use anyhow::{anyhow, Result};
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;

/// A rendered message, before transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

enum Transport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    /// No SMTP host configured; messages are written to the log
    Log,
    #[cfg(test)]
    Capture(std::sync::Arc<std::sync::Mutex<Vec<OutgoingMail>>>),
}

pub struct Mailer {
    transport: Transport,
    from: String,
    public_url: String,
}

impl Mailer {
    pub fn new(config: &MailConfig, public_url: &str) -> Result<Self> {
        let transport = match config.smtp_host.as_deref().filter(|h| !h.is_empty()) {
            Some(host) => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                    .map_err(|e| anyhow!("Failed to create SMTP transport: {}", e))?
                    .port(config.smtp_port);
                if let (Some(user), Some(pass)) = (&config.username, &config.password) {
                    builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
                }
                Transport::Smtp(builder.build())
            }
            None => Transport::Log,
        };

        Ok(Self {
            transport,
            from: format!("{} <{}>", config.from_name, config.from_address),
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    /// Mailer that only logs, for setups without SMTP
    pub fn log_only(public_url: &str) -> Self {
        Self {
            transport: Transport::Log,
            from: "FinMaster <no-reply@finmaster.local>".to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    #[cfg(test)]
    pub fn capturing(public_url: &str) -> (Self, std::sync::Arc<std::sync::Mutex<Vec<OutgoingMail>>>) {
        let outbox = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut mailer = Self::log_only(public_url);
        mailer.transport = Transport::Capture(outbox.clone());
        (mailer, outbox)
    }

    pub async fn send_verification(&self, to: &str, name: &str, token: &str) -> Result<()> {
        let link = format!("{}/verify-email?token={}", self.public_url, token);
        self.send(OutgoingMail {
            to: to.to_string(),
            subject: "Verify your FinMaster email".to_string(),
            body: format!(
                "Hi {},\n\nWelcome to FinMaster! Confirm your email address by opening:\n\n{}\n\nIf you did not sign up, ignore this message.\n",
                name, link
            ),
        })
        .await
    }

    pub async fn send_password_reset(&self, to: &str, token: &str, valid_minutes: i64) -> Result<()> {
        let link = format!("{}/reset-password?token={}", self.public_url, token);
        self.send(OutgoingMail {
            to: to.to_string(),
            subject: "Reset your FinMaster password".to_string(),
            body: format!(
                "We received a request to reset your password. Open this link within {} minutes:\n\n{}\n\nIf you did not ask for this, you can ignore this message.\n",
                valid_minutes, link
            ),
        })
        .await
    }

    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        match &self.transport {
            Transport::Smtp(smtp) => {
                let message = Message::builder()
                    .from(self.from.parse().map_err(|e| anyhow!("Invalid from address: {}", e))?)
                    .to(mail.to.parse().map_err(|e| anyhow!("Invalid to address: {}", e))?)
                    .subject(mail.subject)
                    .header(ContentType::TEXT_PLAIN)
                    .body(mail.body)
                    .map_err(|e| anyhow!("Failed to build email: {}", e))?;
                smtp.send(message)
                    .await
                    .map_err(|e| anyhow!("Failed to send email: {}", e))?;
            }
            Transport::Log => {
                tracing::info!(to = %mail.to, subject = %mail.subject, "mail (not sent, no SMTP host):\n{}", mail.body);
            }
            #[cfg(test)]
            Transport::Capture(outbox) => {
                outbox
                    .lock()
                    .map_err(|_| anyhow!("outbox poisoned"))?
                    .push(mail);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_links_use_public_url() {
        let (mailer, outbox) = Mailer::capturing("https://finmaster.example/");
        mailer
            .send_verification("ana@example.com", "Ana", "tok123")
            .await
            .unwrap();
        mailer
            .send_password_reset("ana@example.com", "tok456", 30)
            .await
            .unwrap();

        let sent = outbox.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].body.contains("https://finmaster.example/verify-email?token=tok123"));
        assert!(sent[1].body.contains("https://finmaster.example/reset-password?token=tok456"));
        assert!(sent[1].body.contains("30 minutes"));
    }

    #[tokio::test]
    async fn test_without_smtp_host_logs() {
        let mailer = Mailer::new(&MailConfig::default(), "http://localhost:8080").unwrap();
        assert!(matches!(mailer.transport, Transport::Log));
        mailer
            .send_verification("ana@example.com", "Ana", "t")
            .await
            .unwrap();
    }
}
