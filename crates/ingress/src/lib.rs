//! nbmail-ingress converts the formats produced by other email tooling into
//! an [`Email`](nbmail_mailer::Email). Every adapter is a single call that
//! either returns a complete email or fails naming what was missing.

use handlebars::RenderError;
use std::{io, path::Path};

pub mod mime;
pub mod mjml;
pub mod quarto;
pub mod template;

pub use mime::{message_to_email, mime_to_email, write_mime_preview};
pub use mjml::{mjml_to_email, MjmlSource};
pub use quarto::{quarto_json_to_email, send_quarto_email_with_gmail};
pub use template::TemplateEmail;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{file}: {err}")]
    Io { file: String, err: io::Error },
    #[error("invalid quarto metadata: {0}")]
    Json(serde_json::Error),
    #[error("quarto metadata is missing field: '{0}'")]
    MissingField(&'static str),
    #[error("email needs an html or a plain text body")]
    MissingBody,
    #[error(transparent)]
    Mjml(#[from] nbmail_mjml::tag::Error),
    #[error("could not parse mime message: {0}")]
    Mime(mailparse::MailParseError),
    #[error("could not render template: {name}; error: {err}")]
    Render {
        name: &'static str,
        err: RenderError,
    },
    #[error(transparent)]
    Transport(#[from] nbmail_mailer::transport::Error),
}

impl Error {
    fn new_io(f: &Path, err: io::Error) -> Self {
        Self::Io {
            file: f.to_string_lossy().into(),
            err,
        }
    }
}
