use lettre::message::Mailbox;
use lettre::Address;
use std::fmt;

use crate::email::{EmailError, EmailMessage, EmailSender};
use crate::models::mail::Mail;
use crate::renderers::{MailRenderer, RenderError, TeraRenderer};
use crate::validators::{validate_email_address, Validity};

#[derive(Debug)]
pub enum InitError {
    NoRendererProvided,
    RendererNotAvailable(String),
    InvalidSenderAddress(String),
    InvalidAdminAddress(String),
    MissingValue(&'static str),
}

impl std::error::Error for InitError {}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitError::NoRendererProvided => write!(f, "InitError: No mail renderer provided"),
            InitError::RendererNotAvailable(name) => {
                write!(f, "InitError: Selected mail renderer '{name}' not available")
            }
            InitError::InvalidSenderAddress(e) => {
                write!(f, "InitError: Could not prepare sender: {e}")
            }
            InitError::InvalidAdminAddress(e) => {
                write!(f, "InitError: Invalid admin notification address: {e}")
            }
            InitError::MissingValue(name) => write!(f, "InitError: Missing value for {name}"),
        }
    }
}

#[derive(Debug)]
pub enum ProcessError {
    Render(RenderError),
    Send(EmailError),
}

impl std::error::Error for ProcessError {}

impl fmt::Display for ProcessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessError::Render(e) => write!(f, "ProcessError: {e}"),
            ProcessError::Send(e) => write!(f, "ProcessError: {e}"),
        }
    }
}

impl From<RenderError> for ProcessError {
    fn from(e: RenderError) -> Self {
        ProcessError::Render(e)
    }
}

impl From<EmailError> for ProcessError {
    fn from(e: EmailError) -> Self {
        ProcessError::Send(e)
    }
}

#[derive(Clone, Debug)]
pub struct ProcessorConf {
    admin_notification_address: String,
    sender: Mailbox,
    renderer: String,
}

impl ProcessorConf {
    pub const DEFAULT_RENDERER: &'static str = TeraRenderer::NAME;

    /// Validates and assembles the processor settings. The renderer falls back to
    /// [`Self::DEFAULT_RENDERER`] when unset.
    pub fn new(
        admin_notification_address: &str,
        sender_address: &str,
        sender_name: Option<&str>,
        renderer: Option<&str>,
    ) -> Result<Self, InitError> {
        if admin_notification_address.is_empty() {
            return Err(InitError::MissingValue("admin notification address"));
        }

        if let Validity::Invalid(msg) = validate_email_address(admin_notification_address) {
            return Err(InitError::InvalidAdminAddress(msg));
        }

        // The fallback destination goes through the same parser as every send
        admin_notification_address
            .parse::<Address>()
            .map_err(|e| {
                InitError::InvalidAdminAddress(format!(
                    "'{admin_notification_address}' is invalid: {e}"
                ))
            })?;

        if sender_address.is_empty() {
            return Err(InitError::MissingValue("sender address"));
        }

        let address: Address = sender_address.parse().map_err(|e| {
            InitError::InvalidSenderAddress(format!("'{sender_address}' is invalid: {e}"))
        })?;

        let sender_name = sender_name
            .filter(|name| !name.is_empty())
            .map(String::from);

        let renderer = match renderer {
            Some(r) if !r.is_empty() => String::from(r),
            _ => String::from(Self::DEFAULT_RENDERER),
        };

        Ok(Self {
            admin_notification_address: String::from(admin_notification_address),
            sender: Mailbox::new(sender_name, address),
            renderer,
        })
    }

    pub fn admin_notification_address(&self) -> &str {
        &self.admin_notification_address
    }

    pub fn sender(&self) -> &Mailbox {
        &self.sender
    }

    pub fn renderer(&self) -> &str {
        &self.renderer
    }
}

/// Assembles mails into transport messages and hands them to the transport.
///
/// The processor never classifies failures. Whatever the renderer or the transport
/// reports is returned as is.
pub struct MessageProcessor {
    renderer: Box<dyn MailRenderer>,
    conf: ProcessorConf,
    sender: EmailSender,
}

impl MessageProcessor {
    /// Binds the renderer named by `conf` out of `renderers`. A bad renderer configuration
    /// is fatal, so a processor only exists if it is able to render.
    pub fn new(
        renderers: Vec<Box<dyn MailRenderer>>,
        conf: ProcessorConf,
        sender: EmailSender,
    ) -> Result<Self, InitError> {
        let renderer = select_renderer(renderers, conf.renderer())?;
        log::info!("Using mail renderer \"{}\"", renderer.name());

        Ok(Self {
            renderer,
            conf,
            sender,
        })
    }

    pub fn renderer_name(&self) -> &'static str {
        self.renderer.name()
    }

    pub async fn process(&self, mail: &Mail) -> Result<(), ProcessError> {
        let message = self.prepare_message(mail)?;
        self.sender.send(message).await?;

        Ok(())
    }

    fn prepare_message(&self, mail: &Mail) -> Result<EmailMessage, ProcessError> {
        let mut message = EmailMessage::new(self.conf.sender().clone());

        message.destination = self.recipient(mail);
        message.subject = String::from(mail.subject());
        message.body = self.renderer.render(mail)?;
        message.is_html = true;
        message.reply_to = mail.reply_to().map(String::from);

        Ok(message)
    }

    fn recipient(&self, mail: &Mail) -> String {
        match mail.recipient() {
            Some(recipient) if !recipient.is_empty() => String::from(recipient),
            _ => String::from(self.conf.admin_notification_address()),
        }
    }
}

fn select_renderer(
    renderers: Vec<Box<dyn MailRenderer>>,
    name: &str,
) -> Result<Box<dyn MailRenderer>, InitError> {
    if renderers.is_empty() {
        log::error!("No mail renderer provided");
        return Err(InitError::NoRendererProvided);
    }

    renderers
        .into_iter()
        .find(|renderer| renderer.name() == name)
        .ok_or_else(|| {
            log::error!("Selected mail renderer \"{name}\" not available");
            InitError::RendererNotAvailable(String::from(name))
        })
}
