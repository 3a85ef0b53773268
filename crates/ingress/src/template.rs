use crate::Error;
use handlebars::{no_escape, Handlebars};
use nbmail_mailer::{Email, TemplateVariables};
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};
use tracing::debug;

/// An email whose subject and bodies are handlebars templates.
///
/// The html template is rendered with html escaping; the subject and the
/// plain text template are rendered verbatim.
#[derive(Debug, Default, Clone)]
pub struct TemplateEmail {
    subject: String,
    html: Option<String>,
    text: Option<String>,
    variables: TemplateVariables,
    recipients: Vec<String>,
    inline_attachments: BTreeMap<String, String>,
    external_attachments: Vec<PathBuf>,
}

impl TemplateEmail {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            ..Default::default()
        }
    }

    pub fn html(mut self, template: impl Into<String>) -> Self {
        self.html = Some(template.into());
        self
    }

    pub fn html_file<P: AsRef<Path>>(self, file: P) -> Result<Self, Error> {
        let file = file.as_ref();
        let template = fs::read_to_string(file).map_err(|err| Error::new_io(file, err))?;
        Ok(self.html(template))
    }

    pub fn text(mut self, template: impl Into<String>) -> Self {
        self.text = Some(template.into());
        self
    }

    pub fn text_file<P: AsRef<Path>>(self, file: P) -> Result<Self, Error> {
        let file = file.as_ref();
        let template = fs::read_to_string(file).map_err(|err| Error::new_io(file, err))?;
        Ok(self.text(template))
    }

    pub fn variables(mut self, variables: TemplateVariables) -> Self {
        self.variables.extend(variables);
        self
    }

    pub fn variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(key, value);
        self
    }

    pub fn recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipients.push(recipient.into());
        self
    }

    pub fn inline_attachment(mut self, cid: impl Into<String>, base64: impl Into<String>) -> Self {
        self.inline_attachments.insert(cid.into(), base64.into());
        self
    }

    pub fn attachment(mut self, file: impl Into<PathBuf>) -> Self {
        self.external_attachments.push(file.into());
        self
    }

    pub fn render(&self) -> Result<Email, Error> {
        if self.html.is_none() && self.text.is_none() {
            return Err(Error::MissingBody);
        }

        let html_registry = Handlebars::new();
        let mut plain_registry = Handlebars::new();
        plain_registry.register_escape_fn(no_escape);

        let vars = &self.variables.0;
        let render = |registry: &Handlebars, name: &'static str, template: &str| {
            registry
                .render_template(template, vars)
                .map_err(|err| Error::Render { name, err })
        };

        let subject = render(&plain_registry, "subject", self.subject.as_str())?;
        let html = match self.html.as_ref() {
            Some(t) => render(&html_registry, "html", t.as_str())?,
            None => String::new(),
        };
        let text = match self.text.as_ref() {
            Some(t) => Some(render(&plain_registry, "text", t.as_str())?),
            None => None,
        };

        debug!(msg = "rendered templated email", subject = subject);
        Ok(Email {
            subject,
            html,
            text,
            recipients: self.recipients.clone(),
            inline_attachments: self.inline_attachments.clone(),
            external_attachments: self.external_attachments.clone(),
            suppress_report_attachment: None,
            suppress_scheduled: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_subject_and_bodies() {
        let email = TemplateEmail::new("Report for {{team}}")
            .html("<p>Hello {{name}}</p>")
            .text("Hello {{name}}")
            .variables("name=Ada;team=R&D".parse().unwrap())
            .recipient("ada@example.com")
            .render()
            .unwrap();

        assert_eq!(email.subject, "Report for R&D");
        assert_eq!(email.html, "<p>Hello Ada</p>");
        assert_eq!(email.text.as_deref(), Some("Hello Ada"));
        assert_eq!(email.recipients, vec!["ada@example.com"]);
    }

    #[test]
    fn html_values_are_escaped() {
        let email = TemplateEmail::new("s")
            .html("<p>{{name}}</p>")
            .variable("name", "<script>")
            .render()
            .unwrap();

        assert_eq!(email.html, "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn attachments_are_carried() {
        let email = TemplateEmail::new("s")
            .html("<img src=\"cid:logo.png\">")
            .inline_attachment("logo.png", "AA==")
            .attachment("report.pdf")
            .render()
            .unwrap();

        assert_eq!(email.inline_attachments["logo.png"], "AA==");
        assert_eq!(email.external_attachments, vec![PathBuf::from("report.pdf")]);
    }

    #[test]
    fn templates_can_come_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("body.hbs");
        fs::write(&file, "<h1>{{title}}</h1>").unwrap();

        let email = TemplateEmail::new("s")
            .html_file(&file)
            .unwrap()
            .variable("title", "Q3")
            .render()
            .unwrap();

        assert_eq!(email.html, "<h1>Q3</h1>");
    }

    #[test]
    fn missing_body_fails() {
        assert!(matches!(
            TemplateEmail::new("s").render().unwrap_err(),
            Error::MissingBody
        ));
    }

    #[test]
    fn broken_template_fails() {
        let err = TemplateEmail::new("s").html("{{#if}}").render().unwrap_err();
        assert!(matches!(err, Error::Render { name: "html", .. }));
    }
}
