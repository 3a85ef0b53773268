use super::Error;
use crate::{
    data::Email,
    message::{
        self, decode_inline, guess_mime, read_attachment, ATTACHMENT_FALLBACK_MIME,
        INLINE_FALLBACK_MIME,
    },
};
use reqwest::blocking::{
    multipart::{Form, Part},
    Client,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{debug, error};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Us,
    Eu,
}

impl Region {
    pub fn base_url(&self) -> &'static str {
        match self {
            Region::Us => "https://api.mailgun.net",
            Region::Eu => "https://api.eu.mailgun.net",
        }
    }
}

impl FromStr for Region {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "eu" => Ok(Region::Eu),
            other => Err(format!("unknown mailgun region '{other}'; expected us or eu")),
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Us => write!(f, "us"),
            Region::Eu => write!(f, "eu"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailgunResponse {
    pub id: String,
    pub message: String,
}

/// A file part of a Mailgun request, sent under the `inline` or
/// `attachment` form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailgunFile {
    pub field: &'static str,
    pub name: String,
    pub mime: String,
    pub data: Vec<u8>,
}

/// The multipart form posted to the messages endpoint, kept as plain data
/// until it is sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailgunRequest {
    pub fields: Vec<(String, String)>,
    pub files: Vec<MailgunFile>,
}

impl MailgunRequest {
    fn field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.push((name.to_string(), value.into()));
    }

    /// Values of every field named `name`, in insertion order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    fn into_form(self) -> Result<Form, Error> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }

        for file in self.files {
            let part = Part::bytes(file.data)
                .file_name(file.name)
                .mime_str(&file.mime)
                .map_err(Error::Http)?;
            form = form.part(file.field, part);
        }

        Ok(form)
    }
}

/// Sends emails through Mailgun's HTTP API.
#[derive(Debug, Clone)]
pub struct MailgunSender {
    api_key: String,
    domain: String,
    from: String,
    base_url: String,
    client: Client,
}

impl MailgunSender {
    pub fn new(api_key: impl Into<String>, domain: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            domain: domain.into(),
            from: from.into(),
            base_url: Region::default().base_url().to_string(),
            client: Client::new(),
        }
    }

    pub fn region(mut self, region: Region) -> Self {
        self.base_url = region.base_url().to_string();
        self
    }

    /// Overrides the API host, e.g. for a proxy.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/v3/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.domain
        )
    }

    pub fn request(&self, email: &Email) -> Result<MailgunRequest, Error> {
        if email.recipients.is_empty() {
            return Err(message::Error::MissingRecipients.into());
        }
        email.check_content_ids()?;

        let mut req = MailgunRequest::default();
        req.field("from", &self.from);
        for recipient in email.recipients.iter() {
            req.field("to", recipient);
        }
        req.field("subject", &email.subject);

        if !email.html.is_empty() {
            req.field("html", &email.html);
        }
        if let Some(text) = email.text.as_ref().filter(|t| !t.is_empty()) {
            req.field("text", text);
        }

        for (cid, data) in email.inline_attachments.iter() {
            req.files.push(MailgunFile {
                field: "inline",
                name: cid.clone(),
                mime: guess_mime(cid, INLINE_FALLBACK_MIME).to_string(),
                data: decode_inline(cid, data)?,
            });
        }

        for file in email.external_attachments.iter() {
            let (name, data) = read_attachment(file)?;
            req.files.push(MailgunFile {
                field: "attachment",
                mime: guess_mime(&name, ATTACHMENT_FALLBACK_MIME).to_string(),
                name,
                data,
            });
        }

        Ok(req)
    }

    pub fn send(&self, email: &Email) -> Result<MailgunResponse, Error> {
        let form = self.request(email)?.into_form()?;
        let endpoint = self.endpoint();
        debug!(msg = "posting to mailgun", endpoint = endpoint);

        let res = self
            .client
            .post(&endpoint)
            .basic_auth("api", Some(&self.api_key))
            .multipart(form)
            .send()
            .map_err(Error::Http)?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            error!(
                msg = "mailgun rejected message",
                status = status.as_u16(),
                body = body
            );
            return Err(Error::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        res.json::<MailgunResponse>().map_err(Error::Http)
    }
}
