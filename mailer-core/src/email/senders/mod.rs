mod mock_sender;
mod smtp_relay;

pub use mock_sender::MockSender;
pub use smtp_relay::SmtpRelay;
