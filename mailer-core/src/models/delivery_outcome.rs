use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::models::mail::Mail;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    /// The relay accepted the message.
    Delivered,
    /// The relay rejected the destination address.
    InvalidRecipient,
    /// Any other failure talking to the relay. See the application log for details.
    CommunicationError,
    /// The mail failed validation and was never sent.
    ValidationError,
    /// Anything else. See the application log for details.
    UnknownError,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            DeliveryStatus::Delivered => "DELIVERED",
            DeliveryStatus::InvalidRecipient => "INVALID_RECIPIENT",
            DeliveryStatus::CommunicationError => "COMMUNICATION_ERROR",
            DeliveryStatus::ValidationError => "VALIDATION_ERROR",
            DeliveryStatus::UnknownError => "UNKNOWN_ERROR",
        };

        f.write_str(status)
    }
}

/// Category of a failed send attempt, as decided by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    InvalidRecipient,
    Communication,
    Unknown,
}

impl From<FailureKind> for DeliveryStatus {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::InvalidRecipient => DeliveryStatus::InvalidRecipient,
            FailureKind::Communication => DeliveryStatus::CommunicationError,
            FailureKind::Unknown => DeliveryStatus::UnknownError,
        }
    }
}

/// The result of exactly one `MailClient::send_mail` call.
///
/// `violations` is non-empty if and only if the status is `ValidationError`. The
/// constructors are the only way to build an outcome, which keeps that true.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawOutcome")]
pub struct DeliveryOutcome {
    mail: Mail,
    status: DeliveryStatus,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    violations: BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct RawOutcome {
    mail: Mail,
    status: DeliveryStatus,
    #[serde(default)]
    violations: BTreeMap<String, String>,
}

#[derive(Debug)]
pub enum OutcomeError {
    MissingViolations,
    UnexpectedViolations(DeliveryStatus),
}

impl std::error::Error for OutcomeError {}

impl fmt::Display for OutcomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeError::MissingViolations => {
                write!(f, "OutcomeError: {} requires violations", DeliveryStatus::ValidationError)
            }
            OutcomeError::UnexpectedViolations(status) => {
                write!(f, "OutcomeError: {status} cannot carry violations")
            }
        }
    }
}

impl TryFrom<RawOutcome> for DeliveryOutcome {
    type Error = OutcomeError;

    fn try_from(raw: RawOutcome) -> Result<Self, Self::Error> {
        match (raw.status, raw.violations.is_empty()) {
            (DeliveryStatus::ValidationError, true) => Err(OutcomeError::MissingViolations),
            (DeliveryStatus::ValidationError, false) => Ok(Self::invalid(raw.mail, raw.violations)),
            (status, true) => Ok(Self {
                mail: raw.mail,
                status,
                violations: raw.violations,
            }),
            (status, false) => Err(OutcomeError::UnexpectedViolations(status)),
        }
    }
}

impl DeliveryOutcome {
    pub fn delivered(mail: Mail) -> Self {
        Self {
            mail,
            status: DeliveryStatus::Delivered,
            violations: BTreeMap::new(),
        }
    }

    pub fn failed(mail: Mail, kind: FailureKind) -> Self {
        Self {
            mail,
            status: kind.into(),
            violations: BTreeMap::new(),
        }
    }

    /// Builds a validation failure. An empty violation map is not a validation failure, so
    /// it is recorded as an unknown error instead.
    pub fn invalid(mail: Mail, violations: BTreeMap<String, String>) -> Self {
        if violations.is_empty() {
            return Self::failed(mail, FailureKind::Unknown);
        }

        Self {
            mail,
            status: DeliveryStatus::ValidationError,
            violations,
        }
    }

    pub fn mail(&self) -> &Mail {
        &self.mail
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn violations(&self) -> &BTreeMap<String, String> {
        &self.violations
    }

    pub fn is_delivered(&self) -> bool {
        self.status == DeliveryStatus::Delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail() -> Mail {
        Mail::builder().subject("Test").template("welcome").build()
    }

    #[test]
    fn test_delivered() {
        let outcome = DeliveryOutcome::delivered(mail());

        assert_eq!(outcome.status(), DeliveryStatus::Delivered);
        assert!(outcome.is_delivered());
        assert!(outcome.violations().is_empty());
        assert_eq!(outcome.mail(), &mail());
    }

    #[test]
    fn test_failed_maps_failure_kind() {
        assert_eq!(
            DeliveryOutcome::failed(mail(), FailureKind::InvalidRecipient).status(),
            DeliveryStatus::InvalidRecipient
        );
        assert_eq!(
            DeliveryOutcome::failed(mail(), FailureKind::Communication).status(),
            DeliveryStatus::CommunicationError
        );
        assert_eq!(
            DeliveryOutcome::failed(mail(), FailureKind::Unknown).status(),
            DeliveryStatus::UnknownError
        );
    }

    #[test]
    fn test_invalid() {
        let mut violations = BTreeMap::new();
        violations.insert(String::from("subject"), String::from("must not be empty"));

        let outcome = DeliveryOutcome::invalid(mail(), violations);
        assert_eq!(outcome.status(), DeliveryStatus::ValidationError);
        assert_eq!(outcome.violations().len(), 1);
        assert_eq!(outcome.violations()["subject"], "must not be empty");

        let outcome = DeliveryOutcome::invalid(mail(), BTreeMap::new());
        assert_eq!(outcome.status(), DeliveryStatus::UnknownError);
        assert!(outcome.violations().is_empty());
    }

    #[test]
    fn test_serialize_status() {
        let outcome = DeliveryOutcome::failed(mail(), FailureKind::Communication);
        let json = serde_json::to_value(&outcome).unwrap();

        assert_eq!(json["status"], "COMMUNICATION_ERROR");
        assert!(json.get("violations").is_none());
        assert_eq!(DeliveryStatus::InvalidRecipient.to_string(), "INVALID_RECIPIENT");
    }

    #[test]
    fn test_deserialize() {
        let outcome: DeliveryOutcome = serde_json::from_str(
            r#"{
                "mail": {"subject": "Test", "template": "welcome"},
                "status": "VALIDATION_ERROR",
                "violations": {"subject": "must not be empty"}
            }"#,
        )
        .unwrap();
        assert_eq!(outcome.status(), DeliveryStatus::ValidationError);
        assert_eq!(outcome.violations()["subject"], "must not be empty");

        let outcome: DeliveryOutcome = serde_json::from_str(
            r#"{"mail": {"subject": "Test", "template": "welcome"}, "status": "DELIVERED"}"#,
        )
        .unwrap();
        assert!(outcome.is_delivered());
        assert_eq!(outcome.mail(), &mail());
    }

    #[test]
    fn test_deserialize_rejects_inconsistent_violations() {
        let missing = r#"{
            "mail": {"subject": "Test", "template": "welcome"},
            "status": "VALIDATION_ERROR"
        }"#;
        let empty = r#"{
            "mail": {"subject": "Test", "template": "welcome"},
            "status": "VALIDATION_ERROR",
            "violations": {}
        }"#;
        let unexpected = r#"{
            "mail": {"subject": "Test", "template": "welcome"},
            "status": "DELIVERED",
            "violations": {"x": "y"}
        }"#;

        for json in [missing, empty, unexpected] {
            assert!(serde_json::from_str::<DeliveryOutcome>(json).is_err());
        }
    }
}
