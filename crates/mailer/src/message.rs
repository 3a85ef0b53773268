use crate::data::Email;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use lettre::{
    address::AddressError,
    message::{
        header::ContentType, Attachment, Mailbox, MultiPart, MultiPartBuilder, SinglePart,
    },
    Message,
};
use std::{fs, io, path::Path, path::PathBuf};
use thiserror::Error;
use tracing::warn;

pub(crate) const INLINE_FALLBACK_MIME: &str = "image/png";
pub(crate) const ATTACHMENT_FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum Error {
    #[error("email has no recipients")]
    MissingRecipients,
    #[error("could not parse address: {address}; error: {err}")]
    Address { address: String, err: AddressError },
    #[error("html body references a missing inline attachment: cid:{0}")]
    UnknownContentId(String),
    #[error("inline attachment '{cid}' is not valid base64: {err}")]
    InlineData {
        cid: String,
        err: base64::DecodeError,
    },
    #[error("could not read attachment: {file:?}; error: {err}")]
    Attachment { file: PathBuf, err: io::Error },
    #[error("invalid content type: {0}")]
    ContentType(String),
    #[error("could not build email message: {0}")]
    MessageBuild(lettre::error::Error),
}

/// A MIME body part that is either a leaf or a nested multipart.
enum Part {
    Single(SinglePart),
    Multi(MultiPart),
}

impl Part {
    fn open(self, builder: MultiPartBuilder) -> MultiPart {
        match self {
            Part::Single(part) => builder.singlepart(part),
            Part::Multi(part) => builder.multipart(part),
        }
    }
}

pub(crate) fn parse_mailbox(address: &str) -> Result<Mailbox, Error> {
    address.trim().parse().map_err(|err| Error::Address {
        address: address.to_string(),
        err,
    })
}

pub(crate) fn guess_mime(name: &str, fallback: &'static str) -> &'static str {
    mime_guess::from_path(name).first_raw().unwrap_or(fallback)
}

fn content_type(mime: &str) -> Result<ContentType, Error> {
    ContentType::parse(mime).map_err(|_| Error::ContentType(mime.to_string()))
}

pub(crate) fn decode_inline(cid: &str, data: &str) -> Result<Vec<u8>, Error> {
    let compact: String = data.split_ascii_whitespace().collect();
    BASE64.decode(compact).map_err(|err| Error::InlineData {
        cid: cid.to_string(),
        err,
    })
}

/// Reads an external attachment, returning the file name it should be sent as.
pub(crate) fn read_attachment(file: &Path) -> Result<(String, Vec<u8>), Error> {
    let data = fs::read(file).map_err(|err| Error::Attachment {
        file: file.to_path_buf(),
        err,
    })?;

    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.to_string_lossy().to_string());

    Ok((name, data))
}

impl Email {
    /// Checks that every `cid:` reference in the html resolves to an inline
    /// attachment. Attachments nothing points at are only logged.
    pub fn check_content_ids(&self) -> Result<(), Error> {
        if let Some(cid) = self
            .content_ids()
            .into_iter()
            .find(|cid| !self.inline_attachments.contains_key(*cid))
        {
            return Err(Error::UnknownContentId(cid.to_string()));
        }

        for cid in self.unreferenced_attachments() {
            warn!(msg = "inline attachment is not referenced by the html body", cid = cid);
        }

        Ok(())
    }

    fn text_part(&self) -> Part {
        let text = self.text.clone().filter(|t| !t.is_empty());

        match (self.html.is_empty(), text) {
            (false, Some(text)) => {
                Part::Multi(MultiPart::alternative_plain_html(text, self.html.clone()))
            }
            (false, None) => Part::Single(SinglePart::html(self.html.clone())),
            (true, text) => Part::Single(SinglePart::plain(text.unwrap_or_default())),
        }
    }

    fn inline_parts(&self) -> Result<Vec<SinglePart>, Error> {
        self.inline_attachments
            .iter()
            .map(|(cid, data)| {
                let body = decode_inline(cid, data)?;
                let mime = content_type(guess_mime(cid, INLINE_FALLBACK_MIME))?;
                Ok(Attachment::new_inline(cid.clone()).body(body, mime))
            })
            .collect()
    }

    fn attachment_parts(&self) -> Result<Vec<SinglePart>, Error> {
        self.external_attachments
            .iter()
            .map(|file| {
                let (name, body) = read_attachment(file)?;
                let mime = content_type(guess_mime(&name, ATTACHMENT_FALLBACK_MIME))?;
                Ok(Attachment::new(name).body(body, mime))
            })
            .collect()
    }

    fn body(&self) -> Result<Part, Error> {
        let mut body = self.text_part();

        let inline = self.inline_parts()?;
        if !inline.is_empty() {
            let related = inline
                .into_iter()
                .fold(body.open(MultiPart::related()), MultiPart::singlepart);
            body = Part::Multi(related);
        }

        let attachments = self.attachment_parts()?;
        if !attachments.is_empty() {
            let mixed = attachments
                .into_iter()
                .fold(body.open(MultiPart::mixed()), MultiPart::singlepart);
            body = Part::Multi(mixed);
        }

        Ok(body)
    }

    /// Renders the email into a MIME message sent from `from` to every
    /// recipient:
    /// `mixed[ related[ alternative[plain, html], inline.. ], attachments.. ]`,
    /// with each layer left out when it would be empty.
    pub fn to_message(&self, from: &str) -> Result<Message, Error> {
        if self.recipients.is_empty() {
            return Err(Error::MissingRecipients);
        }

        self.check_content_ids()?;

        let mut builder = Message::builder()
            .from(parse_mailbox(from)?)
            .subject(self.subject.as_str());

        for recipient in self.recipients.iter() {
            builder = builder.to(parse_mailbox(recipient)?);
        }

        let message = match self.body()? {
            Part::Single(part) => builder.singlepart(part),
            Part::Multi(part) => builder.multipart(part),
        };

        message.map_err(Error::MessageBuild)
    }
}
