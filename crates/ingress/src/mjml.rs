use crate::Error;
use nbmail_mailer::Email;
use nbmail_mjml::{compile, process_images, MjmlTag};
use std::collections::BTreeMap;
use tracing::warn;

/// MJML given either as a tag tree or as finished markup.
#[derive(Debug, Clone)]
pub enum MjmlSource {
    Tag(MjmlTag),
    Markup(String),
}

impl From<MjmlTag> for MjmlSource {
    fn from(tag: MjmlTag) -> Self {
        MjmlSource::Tag(tag)
    }
}

impl From<String> for MjmlSource {
    fn from(markup: String) -> Self {
        MjmlSource::Markup(markup)
    }
}

impl From<&str> for MjmlSource {
    fn from(markup: &str) -> Self {
        MjmlSource::Markup(markup.to_string())
    }
}

/// Compiles MJML into an [`Email`].
///
/// Byte image sources of a tag tree become inline attachments referenced by
/// `cid:`. The subject is taken from `<mj-title>` when the document has one.
pub fn mjml_to_email(source: impl Into<MjmlSource>) -> Result<Email, Error> {
    let (markup, inline_attachments) = match source.into() {
        MjmlSource::Tag(tag) => {
            let (processed, attachments) = process_images(&tag);
            (processed.render_mjml()?, attachments)
        }
        MjmlSource::Markup(markup) => {
            warn!(msg = "no mjml tag tree given; treating input as plain mjml markup");
            (markup, BTreeMap::new())
        }
    };

    let compiled = compile(&markup).map_err(nbmail_mjml::tag::Error::from)?;

    Ok(Email {
        subject: compiled.title.unwrap_or_default(),
        html: compiled.html,
        inline_attachments,
        suppress_report_attachment: Some(false),
        suppress_scheduled: Some(false),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nbmail_mjml::tags::{body, column, head, image, mjml, section, text, title};

    fn doc() -> MjmlTag {
        mjml()
            .with_child(head().with_child(title().with_content("Weekly numbers")))
            .with_child(
                body().with_child(
                    section().with_child(
                        column()
                            .with_child(text().with_content("Hello from mjml"))
                            .with_child(image().with_attr("src", vec![1u8, 2, 3]).with_attr("alt", "plot")),
                    ),
                ),
            )
    }

    #[test]
    fn tag_tree_becomes_email_with_inline_images() {
        let email = mjml_to_email(doc()).unwrap();

        assert_eq!(email.subject, "Weekly numbers");
        assert!(email.html.contains("Hello from mjml"));
        assert_eq!(email.inline_attachments.len(), 1);

        let (cid, data) = email.inline_attachments.iter().next().unwrap();
        assert_eq!(data, "AQID");
        assert!(email.html.contains(&format!("cid:{cid}")));
        assert_eq!(email.suppress_scheduled, Some(false));
    }

    #[test]
    fn markup_is_compiled_as_is() {
        let email = mjml_to_email(
            "<mjml><mj-body><mj-section><mj-column><mj-text>Plain markup</mj-text></mj-column></mj-section></mj-body></mjml>",
        )
        .unwrap();

        assert_eq!(email.subject, "");
        assert!(email.html.contains("Plain markup"));
        assert!(email.inline_attachments.is_empty());
    }

    #[test]
    fn preview_embeds_processed_images() {
        let email = mjml_to_email(doc()).unwrap();
        let preview = email.preview_html();

        assert!(preview.contains("data:image/png;base64,AQID"));
        assert_eq!(preview, email.preview_html());
    }

    #[test]
    fn invalid_markup_fails() {
        let err = mjml_to_email("<mjml><mj-body>").unwrap_err();
        assert!(matches!(err, Error::Mjml(_)));
    }
}
