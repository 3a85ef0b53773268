//! Quarto's `.output_metadata.json` layout.
//!
//! Older Connect exports prefix every key with `rsc_` and spell
//! "suppress" with a single `p`; both spellings are accepted on read, the
//! current unprefixed keys are written.

use crate::data::{Email, Error};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path, path::PathBuf};
use tracing::debug;

pub const DEFAULT_METADATA_FILE: &str = ".output_metadata.json";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuartoMetadata {
    #[serde(alias = "rsc_email_subject", skip_serializing_if = "Option::is_none")]
    pub email_subject: Option<String>,

    #[serde(default, alias = "rsc_email_attachments")]
    pub email_attachments: Vec<PathBuf>,

    #[serde(default, rename = "rsc_output_files", skip_serializing)]
    pub output_files: Vec<PathBuf>,

    #[serde(alias = "rsc_email_body_html", skip_serializing_if = "Option::is_none")]
    pub email_body_html: Option<String>,

    #[serde(alias = "rsc_email_body_text", skip_serializing_if = "Option::is_none")]
    pub email_body_text: Option<String>,

    #[serde(
        default,
        alias = "rsc_email_images",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub email_images: BTreeMap<String, String>,

    #[serde(
        alias = "rsc_email_suppress_report_attachment",
        alias = "rsc_email_supress_report_attachment",
        skip_serializing_if = "Option::is_none"
    )]
    pub email_suppress_report_attachment: Option<bool>,

    #[serde(
        alias = "rsc_email_suppress_scheduled",
        alias = "rsc_email_supress_scheduled",
        skip_serializing_if = "Option::is_none"
    )]
    pub email_suppress_scheduled: Option<bool>,
}

impl From<&Email> for QuartoMetadata {
    fn from(email: &Email) -> Self {
        Self {
            email_subject: Some(email.subject.clone()),
            email_attachments: email.external_attachments.clone(),
            output_files: vec![],
            email_body_html: Some(email.html.clone()),
            email_body_text: email.text.clone().filter(|t| !t.is_empty()),
            email_images: email.inline_attachments.clone(),
            email_suppress_report_attachment: email.suppress_report_attachment,
            email_suppress_scheduled: email.suppress_scheduled,
        }
    }
}

impl QuartoMetadata {
    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string_pretty(self).map_err(Error::Json)
    }
}

impl Email {
    /// Serializes the email in Quarto's output metadata format, the inverse of
    /// reading it back with the Quarto adapter.
    pub fn write_quarto_json<P: AsRef<Path>>(&self, out_file: P) -> Result<(), Error> {
        let out_file = out_file.as_ref();
        debug!(msg = "writing quarto metadata", file = format!("{out_file:?}"));

        let json = QuartoMetadata::from(self).to_json()?;
        fs::write(out_file, json).map_err(|err| Error::io(out_file, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn writes_current_keys() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("meta.json");

        let mut email = Email::new("Weekly", "<p>Numbers</p>")
            .with_text("Numbers")
            .with_inline_attachment("plot.png", "AA==")
            .with_external_attachment("report.pdf");
        email.suppress_scheduled = Some(true);

        email.write_quarto_json(&out).unwrap();
        let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();

        assert_eq!(
            written,
            json!({
                "email_subject": "Weekly",
                "email_attachments": ["report.pdf"],
                "email_body_html": "<p>Numbers</p>",
                "email_body_text": "Numbers",
                "email_images": {"plot.png": "AA=="},
                "email_suppress_scheduled": true
            })
        );
    }

    #[test]
    fn omits_empty_optional_keys() {
        let metadata = QuartoMetadata::from(&Email::new("S", "<p>x</p>"));
        let written: Value = serde_json::from_str(&metadata.to_json().unwrap()).unwrap();

        assert_eq!(
            written,
            json!({
                "email_subject": "S",
                "email_attachments": [],
                "email_body_html": "<p>x</p>"
            })
        );
    }

    #[test]
    fn reads_legacy_keys() {
        let metadata: QuartoMetadata = serde_json::from_value(json!({
            "rsc_email_subject": "Legacy",
            "rsc_email_body_html": "<p>old</p>",
            "rsc_output_files": ["out.pdf"],
            "rsc_email_supress_report_attachment": true
        }))
        .unwrap();

        assert_eq!(metadata.email_subject.as_deref(), Some("Legacy"));
        assert_eq!(metadata.output_files, vec![PathBuf::from("out.pdf")]);
        assert_eq!(metadata.email_suppress_report_attachment, Some(true));
    }
}
