use crate::{
    blocks::{block_title, Align, Block, BlockList},
    Error,
};
use nbmail_ingress::mjml_to_email;
use nbmail_mailer::Email;
use nbmail_mjml::{
    tags::{all, attributes, body, head, mjml, wrapper},
    MjmlTag,
};
use std::{fmt, str::FromStr};
use tracing::debug;

const GREY: &str = "#f6f6f6";

/// Page layout wrapped around the composed sections.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    /// Grey header and footer, body sections on white inside a grey frame.
    #[default]
    Blastula,
    None,
}

impl FromStr for Template {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blastula" => Ok(Template::Blastula),
            "none" => Ok(Template::None),
            other => Err(Error::UnknownTemplate(other.to_string())),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Template::Blastula => write!(f, "blastula"),
            Template::None => write!(f, "none"),
        }
    }
}

/// Content for one region of the email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    Markdown(String),
    Block(Block),
    Blocks(BlockList),
}

impl From<&str> for Section {
    fn from(s: &str) -> Self {
        Section::Markdown(s.to_string())
    }
}

impl From<String> for Section {
    fn from(s: String) -> Self {
        Section::Markdown(s)
    }
}

impl From<Block> for Section {
    fn from(block: Block) -> Self {
        Section::Block(block)
    }
}

impl From<BlockList> for Section {
    fn from(blocks: BlockList) -> Self {
        Section::Blocks(blocks)
    }
}

impl Section {
    fn into_mjml_list(self) -> Vec<MjmlTag> {
        match self {
            Section::Markdown(s) => std::iter::once(s).collect::<BlockList>().into_mjml_list(),
            Section::Block(block) => vec![block.into_mjml()],
            Section::Blocks(blocks) => blocks.into_mjml_list(),
        }
    }
}

fn with_attrs(sections: Vec<MjmlTag>, attrs: &[(&str, &str)]) -> Vec<MjmlTag> {
    sections
        .into_iter()
        .map(|s| s.with_attrs(attrs.iter().copied()))
        .collect()
}

/// Builds an email out of header, body and footer regions.
#[derive(Debug, Default, Clone)]
pub struct Composer {
    header: Option<Section>,
    body: Option<Section>,
    footer: Option<Section>,
    title: Option<String>,
    template: Template,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, header: impl Into<Section>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn body(mut self, body: impl Into<Section>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn footer(mut self, footer: impl Into<Section>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// A large heading placed above the header. This is not the subject.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    /// The MJML document the email is compiled from.
    pub fn document(&self) -> MjmlTag {
        let list = |s: &Option<Section>| s.clone().map(Section::into_mjml_list).unwrap_or_default();

        let mut header = list(&self.header);
        if let Some(title) = self.title.as_ref().filter(|t| !t.is_empty()) {
            header.insert(0, block_title(title, Align::Center).into_mjml());
        }
        let (body_sections, footer) = (list(&self.body), list(&self.footer));

        let sections = match self.template {
            Template::Blastula => {
                let grey = [
                    ("background-color", GREY),
                    ("padding-right", "16px"),
                    ("padding-left", "16px"),
                ];
                let white = [("background-color", "white"), ("padding", "0px")];

                let frame = wrapper()
                    .with_children(with_attrs(body_sections, &white))
                    .with_attrs([("background-color", GREY), ("padding", "16px")]);

                let mut sections = with_attrs(header, &grey);
                sections.push(frame);
                sections.extend(with_attrs(footer, &grey));
                sections
            }
            Template::None => header.into_iter().chain(body_sections).chain(footer).collect(),
        };

        mjml()
            .with_child(
                head().with_child(attributes().with_child(all().with_attrs([
                    ("padding", "0px 6px"),
                    ("font-family", "Helvetica, sans-serif"),
                ]))),
            )
            .with_child(body().with_attr("width", "600px").with_children(sections))
    }

    pub fn compose(&self) -> Result<Email, Error> {
        let doc = self.document();
        debug!(msg = "composing email", template = %self.template);
        Ok(mjml_to_email(doc)?)
    }
}

/// Composes an email from a body alone, with the default template.
pub fn compose_email(body: impl Into<Section>) -> Result<Email, Error> {
    Composer::new().body(body).compose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{block_image_bytes, block_text, create_blocks, ImageOptions};
    use nbmail_mjml::Child;

    fn child_names(tag: &MjmlTag) -> Vec<&str> {
        tag.children
            .iter()
            .filter_map(|c| match c {
                Child::Tag(t) => Some(t.name.as_str()),
                Child::Text(_) => None,
            })
            .collect()
    }

    fn mj_body(doc: &MjmlTag) -> &MjmlTag {
        match &doc.children[1] {
            Child::Tag(t) => t,
            Child::Text(_) => panic!("expected mj-body"),
        }
    }

    #[test]
    fn template_names_parse() {
        assert_eq!("blastula".parse::<Template>().unwrap(), Template::Blastula);
        assert_eq!("none".parse::<Template>().unwrap(), Template::None);
        assert!(matches!(
            "fancy".parse::<Template>().unwrap_err(),
            Error::UnknownTemplate(name) if name == "fancy"
        ));
    }

    #[test]
    fn blastula_wraps_body_in_grey_frame() {
        let doc = Composer::new()
            .header("Header")
            .body(create_blocks(["One", "Two"]))
            .footer("Footer")
            .document();

        let body = mj_body(&doc);
        assert_eq!(child_names(body), vec!["mj-section", "mj-wrapper", "mj-section"]);

        let mjml = doc.render_mjml().unwrap();
        assert!(mjml.contains("<mj-all padding=\"0px 6px\" font-family=\"Helvetica, sans-serif\">"));
        assert!(mjml.contains("<mj-body width=\"600px\">"));
        assert!(mjml.contains("<mj-wrapper background-color=\"#f6f6f6\" padding=\"16px\">"));
        assert!(mjml.contains(
            "<mj-section background-color=\"#f6f6f6\" padding-right=\"16px\" padding-left=\"16px\">"
        ));
        assert!(mjml.contains("<mj-section background-color=\"white\" padding=\"0px\">"));
    }

    #[test]
    fn no_template_keeps_sections_flat() {
        let doc = Composer::new()
            .template(Template::None)
            .header("Header")
            .body("Body")
            .document();

        assert_eq!(child_names(mj_body(&doc)), vec!["mj-section", "mj-section"]);
        assert!(!doc.render_mjml().unwrap().contains("mj-wrapper"));
    }

    #[test]
    fn title_is_prepended_to_header() {
        let doc = Composer::new()
            .template(Template::None)
            .title("Welcome!")
            .header("Header text")
            .document();

        let mjml = doc.render_mjml().unwrap();
        let title = mjml.find("Welcome!").unwrap();
        let header = mjml.find("Header text").unwrap();
        assert!(title < header);
        assert!(mjml.contains("font-size: 32px"));
    }

    #[test]
    fn composes_email_with_inline_images() {
        let email = Composer::new()
            .title("Report")
            .body(create_blocks([
                block_text("Numbers **up**", Align::Left),
                block_image_bytes(vec![1u8, 2, 3], &ImageOptions::default().alt("plot")),
            ]))
            .compose()
            .unwrap();

        assert!(email.html.contains("Report"));
        assert!(email.html.contains("<strong>up</strong>"));
        assert_eq!(email.inline_attachments.len(), 1);
        assert_eq!(email.inline_attachments.values().next().unwrap(), "AQID");
        assert_eq!(email.subject, "");
    }

    #[test]
    fn compose_email_uses_default_template() {
        let email = compose_email("Hello from **markdown**").unwrap();
        assert!(email.html.contains("<strong>markdown</strong>"));
        assert!(email.html.contains("#f6f6f6"));
    }
}
