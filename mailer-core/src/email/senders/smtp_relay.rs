use async_trait::async_trait;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use std::time::Duration;

use crate::email::{EmailError, EmailMessage, SendEmail};

// Permanent replies to RCPT TO that mean the mailbox itself was refused
const RECIPIENT_REJECTION_CODES: [&str; 3] = ["550", "551", "553"];

pub struct SmtpRelay {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpRelay {
    pub fn with_credentials(
        smtp_username: &str,
        smtp_password: &str,
        smtp_address: &str,
        smtp_port: u16,
        max_connections: u32,
        idle_timeout: Duration,
    ) -> Result<Self, EmailError> {
        let credentials = Credentials::new(smtp_username.to_owned(), smtp_password.to_owned());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(smtp_address)
            .map_err(|e| EmailError::RelayConnectionFailed(e.to_string()))?
            .port(smtp_port)
            .credentials(credentials)
            .pool_config(
                PoolConfig::new()
                    .max_size(max_connections)
                    .idle_timeout(idle_timeout),
            )
            .build();

        Ok(Self { transport })
    }

    pub async fn test_connection(&self) -> Result<bool, EmailError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| EmailError::RelayConnectionFailed(e.to_string()))
    }
}

#[async_trait]
impl SendEmail for SmtpRelay {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        let destination = message.destination.clone();
        let message = message.into_lettre_message()?;

        match self.transport.send(message).await {
            Ok(_) => Ok(()),
            Err(e) => {
                let code = e.status().map(|code| code.to_string());

                if e.is_permanent() && code.as_deref().is_some_and(is_recipient_rejection) {
                    Err(EmailError::InvalidDestination(destination))
                } else {
                    Err(EmailError::FailedToSend(e))
                }
            }
        }
    }
}

fn is_recipient_rejection(code: &str) -> bool {
    RECIPIENT_REJECTION_CODES.contains(&code)
}
