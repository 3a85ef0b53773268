use super::super::StdError;
use clap::ValueEnum;
use nbmail_ingress::{mime_to_email, mjml_to_email, quarto_json_to_email};
use nbmail_mailer::Email;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error as ThisError;
use tracing::debug;

#[derive(ThisError, Debug)]
pub enum Error {
    #[error("cannot tell the format of {0:?} from its extension; pass --format")]
    UnknownFormat(PathBuf),
    #[error("{file:?}: {err}")]
    Io { file: PathBuf, err: io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Pick by extension: .json, .mjml or .eml.
    Auto,
    Quarto,
    Mjml,
    Mime,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Auto => write!(f, "auto"),
            Format::Quarto => write!(f, "quarto"),
            Format::Mjml => write!(f, "mjml"),
            Format::Mime => write!(f, "mime"),
        }
    }
}

impl Format {
    /// Replaces `Auto` with the format implied by the file extension.
    pub fn resolve(self, input: &Path) -> Result<Format, Error> {
        if self != Format::Auto {
            return Ok(self);
        }

        let ext = input
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => Ok(Format::Quarto),
            Some("mjml") => Ok(Format::Mjml),
            Some("eml") => Ok(Format::Mime),
            _ => Err(Error::UnknownFormat(input.to_path_buf())),
        }
    }
}

pub fn read(input: &Path) -> Result<Vec<u8>, Error> {
    fs::read(input).map_err(|err| Error::Io {
        file: input.to_path_buf(),
        err,
    })
}

pub fn load_email(input: &Path, format: Format) -> Result<Email, StdError> {
    debug!(msg = "loading email", file = format!("{input:?}"), format = %format);

    let email = match format {
        Format::Auto => return load_email(input, format.resolve(input)?),
        Format::Quarto => quarto_json_to_email(input)?,
        Format::Mjml => {
            let markup = fs::read_to_string(input).map_err(|err| Error::Io {
                file: input.to_path_buf(),
                err,
            })?;
            mjml_to_email(markup)?
        }
        Format::Mime => mime_to_email(&read(input)?)?,
    };

    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_format_follows_extension() {
        let resolve = |p: &str| Format::Auto.resolve(Path::new(p)).unwrap();

        assert_eq!(resolve(".output_metadata.json"), Format::Quarto);
        assert_eq!(resolve("welcome.MJML"), Format::Mjml);
        assert_eq!(resolve("out/message.eml"), Format::Mime);
    }

    #[test]
    fn explicit_format_wins() {
        assert_eq!(
            Format::Mime.resolve(Path::new("message.txt")).unwrap(),
            Format::Mime
        );
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert!(matches!(
            Format::Auto.resolve(Path::new("notes.txt")).unwrap_err(),
            Error::UnknownFormat(p) if p == Path::new("notes.txt")
        ));
        assert!(Format::Auto.resolve(Path::new("README")).is_err());
    }

    #[test]
    fn loads_quarto_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("meta.json");
        fs::write(
            &file,
            r#"{"email_subject": "Weekly", "email_body_html": "<p>Hi</p>"}"#,
        )
        .unwrap();

        let email = load_email(&file, Format::Auto).unwrap();
        assert_eq!(email.subject, "Weekly");
        assert_eq!(email.html, "<p>Hi</p>");
    }

    #[test]
    fn loads_mime_message() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("message.eml");
        fs::write(
            &file,
            "From: a@example.com\r\nTo: b@example.com\r\nSubject: Hello\r\n\
             Content-Type: text/html; charset=utf-8\r\n\r\n<p>Body</p>\r\n",
        )
        .unwrap();

        let email = load_email(&file, Format::Mime).unwrap();
        assert_eq!(email.subject, "Hello");
        assert_eq!(email.recipients, vec!["b@example.com"]);
        assert!(email.html.contains("<p>Body</p>"));
    }
}
