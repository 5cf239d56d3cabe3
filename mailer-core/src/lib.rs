pub mod client;
pub mod email;
pub mod models;
pub mod processor;
pub mod renderers;
pub mod validators;

pub use client::{DeliveryHandle, MailClient};
pub use models::delivery_outcome::{DeliveryOutcome, DeliveryStatus, FailureKind};
pub use models::mail::Mail;
pub use processor::{MessageProcessor, ProcessorConf};
