use tera::{Context, Tera};

use crate::models::mail::Mail;
use crate::renderers::{MailRenderer, RenderError};

const TEMPLATE_SUFFIX: &str = ".html";

/// Renders HTML mails from Tera templates.
///
/// A mail asking for template `welcome` is rendered with the template registered as
/// `welcome.html`, with the mail's content map as the template context.
pub struct TeraRenderer {
    tera: Tera,
}

impl TeraRenderer {
    pub const NAME: &'static str = "tera";

    pub fn new(tera: Tera) -> Self {
        Self { tera }
    }

    /// Loads every template matching `glob`, e.g. `templates/**/*.html`.
    pub fn from_glob(glob: &str) -> Result<Self, RenderError> {
        let tera = Tera::new(glob).map_err(|e| RenderError::TemplateLoadFailed(e.to_string()))?;

        log::info!(
            "Loaded {} mail template(s) from '{}'",
            tera.get_template_names().count(),
            glob
        );

        Ok(Self { tera })
    }

    /// Builds a renderer from in-memory `(template name, source)` pairs. Names should
    /// carry the `.html` suffix.
    pub fn from_raw_templates<'a, I>(templates: I) -> Result<Self, RenderError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| RenderError::TemplateLoadFailed(e.to_string()))?;

        Ok(Self { tera })
    }
}

impl MailRenderer for TeraRenderer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn render(&self, mail: &Mail) -> Result<String, RenderError> {
        let template_name = format!("{}{}", mail.template(), TEMPLATE_SUFFIX);

        if !self.tera.get_template_names().any(|name| name == template_name) {
            return Err(RenderError::TemplateNotFound(template_name));
        }

        let mut context = Context::new();
        for (key, value) in mail.content_map() {
            context.insert(key.as_str(), value);
        }

        self.tera
            .render(&template_name, &context)
            .map_err(|e| RenderError::RenderFailed(format!("{template_name}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> TeraRenderer {
        TeraRenderer::from_raw_templates([
            ("welcome.html", "<p>Hello {{ name }}</p>"),
            ("plain.html", "<p>Hello</p>"),
            (
                "report.html",
                "<ul>{% for item in items %}<li>{{ item }}</li>{% endfor %}</ul>",
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_render_binds_content_map() {
        let mail = Mail::builder()
            .subject("Welcome")
            .template("welcome")
            .content("name", "Alice")
            .build();

        assert_eq!(renderer().render(&mail).unwrap(), "<p>Hello Alice</p>");
    }

    #[test]
    fn test_render_without_content() {
        let mail = Mail::builder().subject("Hi").template("plain").build();
        assert_eq!(renderer().render(&mail).unwrap(), "<p>Hello</p>");
    }

    #[test]
    fn test_render_structured_values() {
        let mail = Mail::builder()
            .subject("Report")
            .template("report")
            .content("items", serde_json::json!(["a", "b"]))
            .build();

        assert_eq!(
            renderer().render(&mail).unwrap(),
            "<ul><li>a</li><li>b</li></ul>"
        );
    }

    #[test]
    fn test_render_escapes_html() {
        let mail = Mail::builder()
            .subject("Welcome")
            .template("welcome")
            .content("name", "<script>")
            .build();

        assert_eq!(
            renderer().render(&mail).unwrap(),
            "<p>Hello &lt;script&gt;</p>"
        );
    }

    #[test]
    fn test_render_missing_template() {
        let mail = Mail::builder().subject("Hi").template("missing").build();

        assert!(matches!(
            renderer().render(&mail).unwrap_err(),
            RenderError::TemplateNotFound(name) if name == "missing.html"
        ));
    }

    #[test]
    fn test_render_missing_variable() {
        let mail = Mail::builder().subject("Welcome").template("welcome").build();

        assert!(matches!(
            renderer().render(&mail).unwrap_err(),
            RenderError::RenderFailed(_)
        ));
    }

    #[test]
    fn test_render_does_not_change_mail() {
        let mail = Mail::builder()
            .subject("Welcome")
            .template("welcome")
            .content("name", "Alice")
            .build();
        let before = mail.clone();

        renderer().render(&mail).unwrap();
        assert_eq!(mail, before);
    }

    #[test]
    fn test_name() {
        assert_eq!(renderer().name(), "tera");
    }
}
