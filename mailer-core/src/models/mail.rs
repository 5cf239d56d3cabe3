use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A single outbound message request.
///
/// A `Mail` cannot be changed once built. Leaving the recipient unset makes the processor
/// fall back to the configured admin notification address.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Mail {
    recipient: Option<String>,
    subject: String,
    template: String,
    #[serde(default)]
    content_map: BTreeMap<String, Value>,
    reply_to: Option<String>,
}

impl Mail {
    pub fn builder() -> MailBuilder {
        MailBuilder::default()
    }

    pub fn recipient(&self) -> Option<&str> {
        self.recipient.as_deref()
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn content_map(&self) -> &BTreeMap<String, Value> {
        &self.content_map
    }

    pub fn reply_to(&self) -> Option<&str> {
        self.reply_to.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct MailBuilder {
    recipient: Option<String>,
    subject: String,
    template: String,
    content_map: BTreeMap<String, Value>,
    reply_to: Option<String>,
}

impl MailBuilder {
    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Logical template name, resolved by the active renderer.
    pub fn template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Adds a single variable to the template context.
    pub fn content(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.content_map.insert(key.into(), value.into());
        self
    }

    pub fn content_map(mut self, content_map: BTreeMap<String, Value>) -> Self {
        self.content_map = content_map;
        self
    }

    pub fn reply_to(mut self, reply_to: impl Into<String>) -> Self {
        self.reply_to = Some(reply_to.into());
        self
    }

    pub fn build(self) -> Mail {
        Mail {
            recipient: self.recipient,
            subject: self.subject,
            template: self.template,
            content_map: self.content_map,
            reply_to: self.reply_to,
        }
    }
}
