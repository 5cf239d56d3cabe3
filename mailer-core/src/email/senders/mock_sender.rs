use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::email::{EmailError, EmailMessage, SendEmail};

/// Accepts every message without contacting a relay. Used when email is disabled and in
/// tests, where `sent()` exposes what would have gone out.
#[derive(Clone, Default)]
pub struct MockSender {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MockSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        match self.sent.lock() {
            Ok(sent) => sent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl SendEmail for MockSender {
    async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        log::info!(
            "Email disabled, not sending \"{}\" to {}",
            message.subject,
            message.destination
        );
        log::debug!("{:#?}", message);

        match self.sent.lock() {
            Ok(mut sent) => sent.push(message),
            Err(poisoned) => poisoned.into_inner().push(message),
        }

        Ok(())
    }
}
