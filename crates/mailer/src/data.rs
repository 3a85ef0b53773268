use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    io,
    path::PathBuf,
    str::FromStr,
    sync::LazyLock,
};
use thiserror::Error;

/// Matches `src="cid:..."` (or single-quoted) references inside an html body.
pub(crate) static CID_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"src=["']cid:([^"'\s]+)["']"#).expect("[Bug] invalid cid reference pattern")
});

#[derive(Debug, Error)]
pub enum Error {
    #[error("expected: key=value pairs for variables; got: {data}")]
    TemplateVariableParseError { data: String },
    #[error("{file:?}: {err}")]
    Io { file: PathBuf, err: io::Error },
    #[error("could not serialize quarto metadata: {0}")]
    Json(serde_json::Error),
    #[error("preview does not yet support external attachments")]
    ExternalAttachments,
    #[error("could not open preview in browser: {0}")]
    Open(io::Error),
}

impl Error {
    pub(crate) fn io(file: impl Into<PathBuf>, err: io::Error) -> Self {
        Self::Io {
            file: file.into(),
            err,
        }
    }
}

/// The intermediate representation every source format is converted into.
///
/// An `Email` is built once by an adapter (or by hand), optionally tweaked,
/// and then handed to a renderer or a sender. Inline attachments are keyed by
/// their content identifier and hold base64 data, mirroring the layout of
/// Quarto's `email_images` map.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub subject: String,
    pub html: String,
    pub text: Option<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default)]
    pub inline_attachments: BTreeMap<String, String>,
    #[serde(default)]
    pub external_attachments: Vec<PathBuf>,
    pub suppress_report_attachment: Option<bool>,
    pub suppress_scheduled: Option<bool>,
}

impl Email {
    pub fn new(subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            html: html.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipients.push(recipient.into());
        self
    }

    pub fn with_recipients<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.recipients = recipients.into_iter().map(Into::into).collect();
        self
    }

    /// Adds an inline attachment whose payload is already base64 encoded.
    pub fn with_inline_attachment(
        mut self,
        cid: impl Into<String>,
        base64: impl Into<String>,
    ) -> Self {
        self.inline_attachments.insert(cid.into(), base64.into());
        self
    }

    /// Adds an inline attachment from raw bytes.
    pub fn with_inline_bytes(mut self, cid: impl Into<String>, data: &[u8]) -> Self {
        self.inline_attachments
            .insert(cid.into(), BASE64.encode(data));
        self
    }

    pub fn with_external_attachment(mut self, file: impl Into<PathBuf>) -> Self {
        self.external_attachments.push(file.into());
        self
    }

    /// Content identifiers referenced from the html body, deduplicated.
    pub fn content_ids(&self) -> BTreeSet<&str> {
        CID_REFERENCE
            .captures_iter(&self.html)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Inline attachments that the html body never points at.
    pub fn unreferenced_attachments(&self) -> Vec<&str> {
        let referenced = self.content_ids();
        self.inline_attachments
            .keys()
            .map(String::as_str)
            .filter(|cid| !referenced.contains(cid))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVariables(pub HashMap<String, String>);

impl TemplateVariables {
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn extend(&mut self, other: TemplateVariables) {
        self.0.extend(other.0)
    }
}

impl FromStr for TemplateVariables {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }

        Ok(Self(
            s.split(';')
                .map(|s| {
                    if let Some(pos) = s.find('=') {
                        let (key, val) = s.split_at(pos);
                        Ok((key.trim().to_string(), val[1..].to_string()))
                    } else {
                        Err(Error::TemplateVariableParseError {
                            data: s.to_string(),
                        })
                    }
                })
                .collect::<Result<HashMap<String, String>, Error>>()?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_email_has_no_extras() {
        let email = Email::new("No Text or Attachments", "<p>Hi</p>");

        assert_eq!(email.text, None);
        assert!(email.recipients.is_empty());
        assert!(email.external_attachments.is_empty());
        assert!(email.inline_attachments.is_empty());
        assert_eq!(email.subject, "No Text or Attachments");
    }

    #[test]
    fn builder_sets_text_and_attachments() {
        let email = Email::new("With Text and Attachments", "<p>Hi</p>")
            .with_text("Plain text version")
            .with_recipient("a@example.com")
            .with_external_attachment("/tmp/file1.txt")
            .with_inline_attachment("img.png", "base64string");

        assert_eq!(email.text.as_deref(), Some("Plain text version"));
        assert_eq!(email.recipients, vec!["a@example.com"]);
        assert_eq!(email.external_attachments, vec![PathBuf::from("/tmp/file1.txt")]);
        assert_eq!(email.inline_attachments["img.png"], "base64string");
    }

    #[test]
    fn inline_bytes_are_base64_encoded() {
        let email = Email::new("s", "").with_inline_bytes("a.png", b"\x89PNG");
        assert_eq!(email.inline_attachments["a.png"], "iVBORw==");
    }

    #[test]
    fn content_ids_reads_both_quote_styles() {
        let email = Email::new(
            "s",
            r#"<img src="cid:one.png"><img src='cid:two'><img src="cid:one.png">"#,
        );

        let cids: Vec<&str> = email.content_ids().into_iter().collect();
        assert_eq!(cids, vec!["one.png", "two"]);
    }

    #[test]
    fn unreferenced_attachments_are_reported() {
        let email = Email::new("s", r#"<img src="cid:used">"#)
            .with_inline_attachment("used", "AA==")
            .with_inline_attachment("orphan", "AA==");

        assert_eq!(email.unreferenced_attachments(), vec!["orphan"]);
    }

    #[test]
    fn template_variables_parse_pairs() {
        let vars: TemplateVariables = "name=Ada;team=analytics".parse().unwrap();
        assert_eq!(vars.0["name"], "Ada");
        assert_eq!(vars.0["team"], "analytics");

        let err = "name".parse::<TemplateVariables>().unwrap_err();
        assert!(matches!(err, Error::TemplateVariableParseError { .. }));
    }

    #[test]
    fn template_variables_keep_equals_in_values() {
        let vars: TemplateVariables = "query=a=b".parse().unwrap();
        assert_eq!(vars.0["query"], "a=b");
    }
}
