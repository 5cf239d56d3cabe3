mod tera_renderer;

pub use tera_renderer::TeraRenderer;

use std::fmt;

use crate::models::mail::Mail;

#[derive(Debug)]
pub enum RenderError {
    TemplateNotFound(String),
    RenderFailed(String),
    TemplateLoadFailed(String),
}

impl std::error::Error for RenderError {}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TemplateNotFound(name) => {
                write!(f, "RenderError: Template '{name}' not found")
            }
            RenderError::RenderFailed(e) => write!(f, "RenderError: Rendering failed: {e}"),
            RenderError::TemplateLoadFailed(e) => {
                write!(f, "RenderError: Failed to load templates: {e}")
            }
        }
    }
}

/// Turns a [`Mail`] into the finished body that gets sent.
///
/// Implementations are registered with the processor under `name()`, and configuration
/// picks exactly one of them at startup. `render` must not depend on anything but the
/// mail it is given.
pub trait MailRenderer: Send + Sync {
    fn name(&self) -> &'static str;
    fn render(&self, mail: &Mail) -> Result<String, RenderError>;
}
