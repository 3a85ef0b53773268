//! Delivery backends.
//!
//! Every backend takes a rendered [`Email`] and hands it to a remote service
//! exactly once. Nothing is queued or retried: a failure is returned to the
//! caller as is.

use crate::{data::Email, message};
use lettre::transport::smtp::response::Response;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

pub mod mailgun;
pub mod smtp;

pub use mailgun::{MailgunRequest, MailgunResponse, MailgunSender, Region};
pub use smtp::{Security, SmtpSender};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Message(#[from] message::Error),
    #[error("could not build smtp transport for host: {host}; error: {err}")]
    Transport {
        host: String,
        err: lettre::transport::smtp::Error,
    },
    #[error("send error: {0}")]
    Send(BoxError),
    #[error("mailgun request failed: {0}")]
    Http(reqwest::Error),
    #[error("mailgun rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("environment variable '{var}' is not set")]
    MissingSecret { var: String },
}

/// What a backend reports back after accepting a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    Smtp { code: String, message: Vec<String> },
    Mailgun(MailgunResponse),
}

impl From<Response> for Receipt {
    fn from(response: Response) -> Self {
        Receipt::Smtp {
            code: response.code().to_string(),
            message: response.message().map(str::to_string).collect(),
        }
    }
}

impl From<MailgunResponse> for Receipt {
    fn from(response: MailgunResponse) -> Self {
        Receipt::Mailgun(response)
    }
}

impl std::fmt::Display for Receipt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Receipt::Smtp { code, message } => write!(f, "{code} {}", message.join(" ")),
            Receipt::Mailgun(res) => write!(f, "{} ({})", res.message, res.id),
        }
    }
}

/// A credential given either inline or by the name of the environment
/// variable that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Secret {
    Env { env: String },
    Plain(String),
}

impl Secret {
    pub fn resolve(&self) -> Result<String, Error> {
        match self {
            Secret::Plain(s) => Ok(s.clone()),
            Secret::Env { env: var } => {
                env::var(var).map_err(|_| Error::MissingSecret { var: var.clone() })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub username: String,
    pub password: Secret,
    #[serde(default)]
    pub security: Security,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmailConfig {
    pub username: String,
    pub password: Secret,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailgunConfig {
    pub api_key: Secret,
    pub domain: String,
    #[serde(default)]
    pub region: Region,
    pub base_url: Option<String>,
}

/// The configured delivery backend, tagged by `type` in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum Backend {
    Smtp(SmtpConfig),
    Gmail(GmailConfig),
    Mailgun(MailgunConfig),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Smtp(_) => "smtp",
            Backend::Gmail(_) => "gmail",
            Backend::Mailgun(_) => "mailgun",
        }
    }

    /// Sends `email` from `from` through this backend.
    pub fn send(&self, from: &str, email: &Email) -> Result<Receipt, Error> {
        match self {
            Backend::Smtp(cfg) => SmtpSender::smtp(
                &cfg.host,
                cfg.port,
                &cfg.username,
                &cfg.password.resolve()?,
                cfg.security,
            )?
            .from(from)
            .send(email)
            .map(Receipt::from),
            Backend::Gmail(cfg) => SmtpSender::gmail(&cfg.username, &cfg.password.resolve()?)?
                .from(from)
                .send(email)
                .map(Receipt::from),
            Backend::Mailgun(cfg) => {
                let mut sender = MailgunSender::new(cfg.api_key.resolve()?, &cfg.domain, from)
                    .region(cfg.region);
                if let Some(url) = cfg.base_url.as_ref() {
                    sender = sender.base_url(url);
                }

                sender.send(email).map(Receipt::from)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_is_tagged_by_type() {
        let backend: Backend = serde_json::from_str(
            r#"{"type": "smtp", "host": "smtp.example.com", "username": "me", "password": {"env": "SMTP_PASS"}, "security": "ssl"}"#,
        )
        .unwrap();

        assert_eq!(
            backend,
            Backend::Smtp(SmtpConfig {
                host: "smtp.example.com".into(),
                port: 587,
                username: "me".into(),
                password: Secret::Env {
                    env: "SMTP_PASS".into()
                },
                security: Security::Ssl,
            })
        );
        assert_eq!(backend.name(), "smtp");
    }

    #[test]
    fn mailgun_backend_defaults_to_us() {
        let backend: Backend = serde_json::from_str(
            r#"{"type": "mailgun", "api_key": "key-1", "domain": "mg.example.com"}"#,
        )
        .unwrap();

        match backend {
            Backend::Mailgun(cfg) => {
                assert_eq!(cfg.region, Region::Us);
                assert_eq!(cfg.api_key, Secret::Plain("key-1".into()));
                assert!(cfg.base_url.is_none());
            }
            other => panic!("unexpected backend: {other:?}"),
        }
    }

    #[test]
    fn plain_secret_resolves_to_itself() {
        assert_eq!(Secret::Plain("hunter2".into()).resolve().unwrap(), "hunter2");
    }

    #[test]
    fn missing_env_secret_fails() {
        let secret = Secret::Env {
            env: "NBMAIL_TEST_SECRET_THAT_IS_NEVER_SET".into(),
        };
        assert!(matches!(
            secret.resolve().unwrap_err(),
            Error::MissingSecret { var } if var == "NBMAIL_TEST_SECRET_THAT_IS_NEVER_SET"
        ));
    }

    #[test]
    fn receipts_display_backend_replies() {
        let smtp = Receipt::Smtp {
            code: "250".into(),
            message: vec!["2.0.0".into(), "OK queued".into()],
        };
        assert_eq!(smtp.to_string(), "250 2.0.0 OK queued");

        let mailgun = Receipt::from(MailgunResponse {
            id: "<1@mg.example.com>".into(),
            message: "Queued. Thank you.".into(),
        });
        assert_eq!(mailgun.to_string(), "Queued. Thank you. (<1@mg.example.com>)");
    }
}
