//! Self-contained html previews of an [`Email`].
//!
//! Sent messages keep `cid:` references and ship images as separate MIME
//! parts; previews instead swap every reference for a base64 data URI so the
//! file renders on its own in a browser.

use crate::data::{Email, Error, CID_REFERENCE};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use regex::{Captures, Regex};
use std::{
    collections::BTreeMap,
    env, fs,
    io::Write,
    path::{Path, PathBuf},
    sync::LazyLock,
};
use tracing::debug;

pub const DEFAULT_PREVIEW_FILE: &str = "preview_email.html";

const SUBJECT_BANNER: &str =
    "<br><br><strong><span style=\"font-variant: small-caps;\">email subject: </span></strong>";

static BODY_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body[^>]*>").expect("[Bug] invalid body tag pattern"));

/// Replaces `src="cid:..."` references with data URIs built from `attachments`.
/// References without a matching attachment are left untouched.
pub fn inline_images(html: &str, attachments: &BTreeMap<String, String>) -> String {
    CID_REFERENCE
        .replace_all(html, |caps: &Captures| match attachments.get(&caps[1]) {
            Some(data) => format!("src=\"{}\"", data_uri(&caps[1], data)),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn data_uri(cid: &str, data: &str) -> String {
    let compact: String = data.split_ascii_whitespace().collect();
    // payloads that are not base64 get encoded from their raw bytes
    let encoded = match BASE64.decode(&compact) {
        Ok(_) => compact,
        Err(_) => BASE64.encode(data.as_bytes()),
    };

    let mime = mime_guess::from_path(cid).first_raw().unwrap_or("image");
    format!("data:{mime};base64,{encoded}")
}

fn with_subject_banner(html: String, subject: &str) -> String {
    if subject.is_empty() {
        return html;
    }

    let banner = format!("{SUBJECT_BANNER}{}<br>", handlebars::html_escape(subject));
    match BODY_TAG.find(&html) {
        Some(tag) => {
            let mut out = String::with_capacity(html.len() + banner.len());
            out.push_str(&html[..tag.end()]);
            out.push_str(&banner);
            out.push_str(&html[tag.end()..]);
            out
        }
        None => banner + &html,
    }
}

impl Email {
    /// Html with inline attachments embedded and the subject shown as a
    /// banner at the top of the body.
    pub fn preview_html(&self) -> String {
        with_subject_banner(
            inline_images(&self.html, &self.inline_attachments),
            &self.subject,
        )
    }

    pub fn write_preview<P: AsRef<Path>>(&self, out_file: P) -> Result<(), Error> {
        if !self.external_attachments.is_empty() {
            return Err(Error::ExternalAttachments);
        }

        let out_file = out_file.as_ref();
        debug!(msg = "writing preview", file = format!("{out_file:?}"));

        fs::write(out_file, self.preview_html()).map_err(|err| Error::io(out_file, err))
    }

    /// Writes the preview to a fresh `nbmail-preview-*.html` file in `dir`.
    /// The file is kept on disk when this returns.
    fn write_temp_preview(&self, dir: &Path) -> Result<PathBuf, Error> {
        let mut file = tempfile::Builder::new()
            .prefix("nbmail-preview-")
            .suffix(".html")
            .tempfile_in(dir)
            .map_err(|err| Error::io(dir, err))?;
        file.write_all(self.preview_html().as_bytes())
            .map_err(|err| Error::io(file.path(), err))?;

        let (_, path) = file.keep().map_err(|err| Error::io(dir, err.error))?;
        Ok(path)
    }

    /// Writes the preview to the temp directory and opens it in the default
    /// browser. Returns the path of the written file.
    ///
    /// The browser loads the file after this returns, so it is never removed
    /// here; it stays in the temp directory until the OS clears it.
    pub fn open_preview(&self) -> Result<PathBuf, Error> {
        let file = self.write_temp_preview(&env::temp_dir())?;

        debug!(msg = "opening preview", file = format!("{file:?}"));
        open::that(&file).map_err(Error::Open)?;

        Ok(file)
    }
}
