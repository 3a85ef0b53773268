//! MIME messages, as produced by templating and simple-send mail libraries,
//! converted back into an [`Email`].

use crate::Error;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use lettre::Message;
use mailparse::{addrparse, DispositionType, MailAddr, MailHeaderMap, ParsedMail};
use nbmail_mailer::{preview, Email};
use std::{fs, path::Path, path::PathBuf};
use tracing::{debug, warn};

const RECIPIENT_HEADERS: [&str; 3] = ["To", "Cc", "Bcc"];

fn recipients(mail: &ParsedMail) -> Vec<String> {
    let mut out = vec![];

    for header in RECIPIENT_HEADERS {
        let Some(value) = mail.headers.get_first_value(header) else {
            continue;
        };

        match addrparse(&value) {
            Ok(list) => {
                for addr in list.iter() {
                    match addr {
                        MailAddr::Single(info) => out.push(info.to_string()),
                        MailAddr::Group(group) => {
                            out.extend(group.addrs.iter().map(|info| info.to_string()))
                        }
                    }
                }
            }
            Err(err) => {
                warn!(
                    msg = "could not parse address header; splitting on commas",
                    header = header,
                    err = format!("{err}")
                );
                out.extend(
                    value
                        .split(',')
                        .map(str::trim)
                        .filter(|a| !a.is_empty())
                        .map(str::to_string),
                );
            }
        }
    }

    out
}

fn filename(part: &ParsedMail) -> Option<String> {
    part.get_content_disposition()
        .params
        .get("filename")
        .or_else(|| part.ctype.params.get("name"))
        .cloned()
}

fn content_id(part: &ParsedMail) -> Option<String> {
    part.headers
        .get_first_value("Content-ID")
        .map(|cid| cid.trim().trim_start_matches('<').trim_end_matches('>').to_string())
        .filter(|cid| !cid.is_empty())
}

fn visit_part(part: &ParsedMail, email: &mut Email) -> Result<(), Error> {
    if !part.subparts.is_empty() {
        for sub in part.subparts.iter() {
            visit_part(sub, email)?;
        }
        return Ok(());
    }

    let is_attachment = part.get_content_disposition().disposition == DispositionType::Attachment;
    let mimetype = part.ctype.mimetype.to_ascii_lowercase();

    if !is_attachment && mimetype == "text/html" && email.html.is_empty() {
        email.html = part.get_body().map_err(Error::Mime)?;
    } else if !is_attachment && mimetype == "text/plain" && email.text.is_none() {
        email.text = Some(part.get_body().map_err(Error::Mime)?);
    } else if let Some(cid) = content_id(part) {
        let data = part.get_body_raw().map_err(Error::Mime)?;
        email.inline_attachments.insert(cid, BASE64.encode(data));
    } else if let Some(name) = filename(part) {
        email.external_attachments.push(PathBuf::from(name));
    } else {
        debug!(msg = "skipping unnamed mime part", mimetype = mimetype);
    }

    Ok(())
}

/// Parses a raw MIME message.
///
/// The first html and plain text parts that are not attachments become the
/// bodies. Parts carrying a `Content-ID` become inline attachments; other
/// named parts are recorded as external attachments by file name only.
pub fn mime_to_email(raw: &[u8]) -> Result<Email, Error> {
    let mail = mailparse::parse_mail(raw).map_err(Error::Mime)?;

    let mut email = Email {
        subject: mail.headers.get_first_value("Subject").unwrap_or_default(),
        recipients: recipients(&mail),
        ..Default::default()
    };
    visit_part(&mail, &mut email)?;

    Ok(email)
}

/// Converts a message built with lettre.
pub fn message_to_email(message: &Message) -> Result<Email, Error> {
    mime_to_email(&message.formatted())
}

/// Writes the html part of a raw MIME message with its `Content-ID` parts
/// embedded as data URIs.
pub fn write_mime_preview<P: AsRef<Path>>(raw: &[u8], out_file: P) -> Result<(), Error> {
    let out_file = out_file.as_ref();
    let email = mime_to_email(raw)?;

    let html = preview::inline_images(&email.html, &email.inline_attachments);
    fs::write(out_file, html).map_err(|err| Error::new_io(out_file, err))
}
