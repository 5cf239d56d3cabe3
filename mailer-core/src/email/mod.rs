pub mod senders;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::Message;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub enum EmailError {
    RelayConnectionFailed(String),
    InvalidDestination(String),
    InvalidMessage(String),
    FailedToSend(lettre::transport::smtp::Error),
}

impl std::error::Error for EmailError {}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmailError::RelayConnectionFailed(e) => {
                write!(f, "EmailError: Relay connection failed: {e}")
            }
            EmailError::InvalidDestination(dest) => {
                write!(f, "EmailError: Invalid destination address '{dest}'")
            }
            EmailError::InvalidMessage(e) => write!(f, "EmailError: Invalid message: {e}"),
            EmailError::FailedToSend(e) => write!(f, "EmailError: Failed to send: {e}"),
        }
    }
}

/// A message as handed to a transport.
#[derive(Clone, Debug, PartialEq)]
pub struct EmailMessage {
    pub body: String,
    pub subject: String,
    pub from: Mailbox,
    pub reply_to: Option<String>,
    pub destination: String,
    pub is_html: bool,
}

impl EmailMessage {
    pub fn new(from: Mailbox) -> Self {
        Self {
            body: String::new(),
            subject: String::new(),
            from,
            reply_to: None,
            destination: String::new(),
            is_html: false,
        }
    }

    pub fn into_lettre_message(self) -> Result<Message, EmailError> {
        let destination: Mailbox = self
            .destination
            .parse()
            .map_err(|_| EmailError::InvalidDestination(self.destination.clone()))?;

        let mut builder = Message::builder()
            .from(self.from)
            .to(destination)
            .subject(self.subject);

        if let Some(reply_to) = self.reply_to {
            let reply_to: Mailbox = reply_to.parse().map_err(|e| {
                EmailError::InvalidMessage(format!("Invalid reply-to address '{reply_to}': {e}"))
            })?;
            builder = builder.reply_to(reply_to);
        }

        let content_type = if self.is_html {
            ContentType::TEXT_HTML
        } else {
            ContentType::TEXT_PLAIN
        };

        builder
            .header(content_type)
            .body(self.body)
            .map_err(|e| EmailError::InvalidMessage(e.to_string()))
    }
}

#[async_trait]
pub trait SendEmail: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError>;
}

pub type EmailSender = Arc<dyn SendEmail>;
