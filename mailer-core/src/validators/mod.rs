use std::collections::BTreeMap;

use crate::models::mail::Mail;

const EMPTY_FIELD_MESSAGE: &str = "must not be empty";

#[derive(Debug)]
pub enum Validity {
    Valid,
    Invalid(String),
}

impl Validity {
    pub fn is_valid(&self) -> bool {
        match &self {
            Validity::Valid => true,
            Validity::Invalid(_) => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: String::from(field),
            message: String::from(message),
        }
    }
}

/// Structural checks run against a mail before any attempt is made to send it.
pub trait ValidateMail: Send + Sync {
    fn validate(&self, mail: &Mail) -> Vec<Violation>;
}

/// Rejects mails with an empty subject or template name.
#[derive(Clone, Copy, Debug, Default)]
pub struct MailValidator;

impl ValidateMail for MailValidator {
    fn validate(&self, mail: &Mail) -> Vec<Violation> {
        let mut violations = Vec::new();

        if mail.subject().is_empty() {
            violations.push(Violation::new("subject", EMPTY_FIELD_MESSAGE));
        }

        if mail.template().is_empty() {
            violations.push(Violation::new("template", EMPTY_FIELD_MESSAGE));
        }

        violations
    }
}

/// Collapses violations into a field path -> message map. The first message for a field
/// wins.
pub fn violations_by_field(violations: Vec<Violation>) -> BTreeMap<String, String> {
    let mut by_field = BTreeMap::new();

    for violation in violations {
        by_field.entry(violation.field).or_insert(violation.message);
    }

    by_field
}

pub fn validate_email_address(email: &str) -> Validity {
    if email.chars().count() > 320 {
        return Validity::Invalid(String::from("Email address is too long."));
    }

    for c in email.chars() {
        if c == ' ' || !c.is_ascii() {
            return Validity::Invalid(String::from(
                "Email address cannot contain a space or non-ASCII characters.",
            ));
        }
    }

    if email.contains("@.") {
        return Validity::Invalid(String::from(
            "Domain name in email address cannot begin with a period.",
        ));
    }

    let email = match email.split_once('@') {
        Some(s) => s,
        None => {
            return Validity::Invalid(String::from("Email address must contain an at symbol (@)."))
        }
    };

    if email.0.is_empty() || email.1.len() < 3 {
        return Validity::Invalid(String::from("Email username or domain name is too short."));
    }

    if email.1.contains('@') || !email.1.contains('.') {
        return Validity::Invalid(String::from(
            "Email address must have only one at symbol (@) and the domain must contain a period.",
        ));
    }

    if email.1.ends_with('.') {
        return Validity::Invalid(String::from("Email address cannot end with a period."));
    }

    Validity::Valid
}
