use mrml::{mjml::Mjml, prelude::render::RenderOptions};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum Error {
    #[error("could not parse mjml: {0}")]
    Parse(mrml::prelude::parser::Error),
    #[error("could not render mjml: {0}")]
    Render(mrml::prelude::render::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
    pub html: String,
    /// Text of `<mj-title>` without surrounding whitespace, if the head has
    /// one.
    pub title: Option<String>,
    /// Text of `<mj-preview>`, if the head has one.
    pub preview: Option<String>,
}

pub fn compile(markup: &str) -> Result<Compiled, Error> {
    let parsed = Mjml::parse(markup).map_err(Error::Parse)?;
    let html = parsed
        .render(&RenderOptions::default())
        .map_err(Error::Render)?;

    debug!(msg = "compiled mjml", bytes = html.len());
    Ok(Compiled {
        html,
        title: parsed.get_title().map(|t| t.trim().to_string()),
        preview: parsed.get_preview().map(|p| p.trim().to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_body_and_head() {
        let compiled = compile(
            "<mjml><mj-head><mj-title>Quarterly</mj-title><mj-preview>Numbers inside</mj-preview></mj-head>\
             <mj-body><mj-section><mj-column><mj-text>Hello</mj-text></mj-column></mj-section></mj-body></mjml>",
        )
        .unwrap();

        assert!(compiled.html.contains("Hello"));
        assert_eq!(compiled.title.as_deref(), Some("Quarterly"));
        assert_eq!(compiled.preview.as_deref(), Some("Numbers inside"));
    }

    #[test]
    fn head_text_is_trimmed() {
        let compiled = compile(
            "<mjml>\n  <mj-head>\n    <mj-title>\n      Weekly numbers\n    </mj-title>\n    \
             <mj-preview>\n  Up again\n</mj-preview>\n  </mj-head>\n  <mj-body></mj-body>\n</mjml>",
        )
        .unwrap();

        assert_eq!(compiled.title.as_deref(), Some("Weekly numbers"));
        assert_eq!(compiled.preview.as_deref(), Some("Up again"));
    }

    #[test]
    fn missing_head_has_no_title() {
        let compiled = compile("<mjml><mj-body></mj-body></mjml>").unwrap();
        assert_eq!(compiled.title, None);
    }

    #[test]
    fn invalid_markup_fails() {
        assert!(matches!(compile("<mjml><mj-body>").unwrap_err(), Error::Parse(_)));
    }
}
