use futures::FutureExt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::task::JoinHandle;

use crate::email::EmailError;
use crate::models::delivery_outcome::{DeliveryOutcome, FailureKind};
use crate::models::mail::Mail;
use crate::processor::{MessageProcessor, ProcessError};
use crate::validators::{violations_by_field, ValidateMail};

/// Validates and sends mails, reporting every result as a [`DeliveryOutcome`].
///
/// Nothing that goes wrong while sending is returned as an error or allowed to unwind into
/// the caller. Each call produces exactly one outcome.
#[derive(Clone)]
pub struct MailClient {
    processor: Arc<MessageProcessor>,
    validator: Arc<dyn ValidateMail>,
}

impl MailClient {
    pub fn new(processor: MessageProcessor, validator: Arc<dyn ValidateMail>) -> Self {
        Self {
            processor: Arc::new(processor),
            validator,
        }
    }

    pub async fn send_mail(&self, mail: Mail) -> DeliveryOutcome {
        let validation = panic::catch_unwind(AssertUnwindSafe(|| self.validator.validate(&mail)));

        let violations = match validation {
            Ok(v) => v,
            Err(_) => {
                log::error!("Unknown error occurred while validating mail: validator panicked");
                return DeliveryOutcome::failed(mail, FailureKind::Unknown);
            }
        };

        if !violations.is_empty() {
            let violations = violations_by_field(violations);
            log::error!("Invalid mail structure: {:?}", violations);
            return DeliveryOutcome::invalid(mail, violations);
        }

        let result = AssertUnwindSafe(self.processor.process(&mail))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(())) => DeliveryOutcome::delivered(mail),
            Ok(Err(e)) => {
                let kind = failure_kind(&e);

                match kind {
                    FailureKind::InvalidRecipient => log::error!("Invalid recipient: {e}"),
                    FailureKind::Communication => log::error!("Failed to send message: {e}"),
                    FailureKind::Unknown => {
                        log::error!("Unknown error occurred while processing mail: {e}")
                    }
                }

                DeliveryOutcome::failed(mail, kind)
            }
            Err(_) => {
                log::error!("Unknown error occurred while processing mail: processor panicked");
                DeliveryOutcome::failed(mail, FailureKind::Unknown)
            }
        }
    }

    /// Starts sending `mail` on the Tokio runtime and returns immediately. The returned
    /// handle resolves to the outcome once the attempt is over.
    pub fn dispatch(&self, mail: Mail) -> DeliveryHandle {
        let client = self.clone();
        let fallback = mail.clone();

        let task = tokio::spawn(async move { client.send_mail(mail).await });

        DeliveryHandle {
            mail: fallback,
            task,
        }
    }
}

/// A pending [`DeliveryOutcome`] for a dispatched mail.
pub struct DeliveryHandle {
    mail: Mail,
    task: JoinHandle<DeliveryOutcome>,
}

impl Future for DeliveryHandle {
    type Output = DeliveryOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match Pin::new(&mut this.task).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(e)) => {
                log::error!("Mail delivery task did not complete: {e}");
                Poll::Ready(DeliveryOutcome::failed(
                    this.mail.clone(),
                    FailureKind::Unknown,
                ))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

pub fn failure_kind(error: &ProcessError) -> FailureKind {
    match error {
        ProcessError::Send(EmailError::InvalidDestination(_)) => FailureKind::InvalidRecipient,
        ProcessError::Send(_) => FailureKind::Communication,
        ProcessError::Render(_) => FailureKind::Unknown,
    }
}
