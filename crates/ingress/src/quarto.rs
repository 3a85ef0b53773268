use crate::Error;
use lettre::transport::smtp::response::Response;
use nbmail_mailer::{quarto::QuartoMetadata, transport::smtp::SmtpSender, Email};
use std::{fs, path::Path};
use tracing::{debug, info};

/// Builds an [`Email`] from Quarto output metadata.
///
/// Attachments are the rendered output files followed by the explicit email
/// attachments, in that order.
pub fn metadata_to_email(metadata: QuartoMetadata) -> Result<Email, Error> {
    let subject = metadata
        .email_subject
        .ok_or(Error::MissingField("email_subject"))?;

    if metadata.email_body_html.is_none() && metadata.email_body_text.is_none() {
        return Err(Error::MissingBody);
    }

    let mut external_attachments = metadata.output_files;
    external_attachments.extend(metadata.email_attachments);

    Ok(Email {
        subject,
        html: metadata.email_body_html.unwrap_or_default(),
        text: metadata.email_body_text,
        recipients: vec![],
        inline_attachments: metadata.email_images,
        external_attachments,
        suppress_report_attachment: metadata.email_suppress_report_attachment,
        suppress_scheduled: metadata.email_suppress_scheduled,
    })
}

pub fn from_str(json: &str) -> Result<Email, Error> {
    let metadata: QuartoMetadata = serde_json::from_str(json).map_err(Error::Json)?;
    metadata_to_email(metadata)
}

/// Reads a Quarto `.output_metadata.json` file. Relative attachment paths
/// are resolved against the directory holding the file.
pub fn quarto_json_to_email<P: AsRef<Path>>(path: P) -> Result<Email, Error> {
    let path = path.as_ref();
    debug!(msg = "reading quarto metadata", file = format!("{path:?}"));

    let json = fs::read_to_string(path).map_err(|err| Error::new_io(path, err))?;
    let mut email = from_str(&json)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        for file in email.external_attachments.iter_mut() {
            if file.is_relative() {
                *file = dir.join(&*file);
            }
        }
    }

    Ok(email)
}

/// Reads Quarto metadata from `json_path` and sends it to `recipients`
/// through Gmail.
pub fn send_quarto_email_with_gmail<P, I, S>(
    username: &str,
    password: &str,
    json_path: P,
    recipients: I,
) -> Result<Response, Error>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let email = quarto_json_to_email(json_path)?.with_recipients(recipients);
    let res = SmtpSender::gmail(username, password)?.send(&email)?;

    info!(
        msg = "sent quarto email",
        recipients = email.recipients.len(),
        code = format!("{}", res.code())
    );
    Ok(res)
}
