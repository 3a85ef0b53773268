use super::Error;
use crate::data::Email;
use lettre::{
    transport::smtp::{authentication::Credentials, response::Response},
    SmtpTransport, Transport,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use tracing::{debug, warn};

pub const GMAIL_HOST: &str = "smtp.gmail.com";
pub const GMAIL_PORT: u16 = 587;

/// How the connection to an SMTP server is secured.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    /// STARTTLS upgrade on a plain connection.
    #[default]
    Tls,
    /// Implicit TLS from the first byte.
    Ssl,
    /// Unencrypted and unauthenticated.
    #[serde(rename = "smtp", alias = "plain")]
    Plain,
}

impl FromStr for Security {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tls" | "starttls" => Ok(Security::Tls),
            "ssl" => Ok(Security::Ssl),
            "smtp" | "plain" => Ok(Security::Plain),
            other => Err(format!(
                "unknown security '{other}'; expected one of: tls, ssl, smtp"
            )),
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Security::Tls => "tls",
            Security::Ssl => "ssl",
            Security::Plain => "smtp",
        };
        write!(f, "{s}")
    }
}

/// Sends emails through any lettre [`Transport`].
#[derive(Debug, Clone)]
pub struct SmtpSender<T = SmtpTransport> {
    transport: T,
    from: String,
}

impl SmtpSender<SmtpTransport> {
    /// Connects to `host:port` authenticating as `username`, which is also
    /// used as the sender address unless [`SmtpSender::from`] overrides it.
    pub fn smtp(
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        security: Security,
    ) -> Result<Self, Error> {
        let creds = Credentials::new(username.to_string(), password.to_string());
        let transport_err = |err| Error::Transport {
            host: host.to_string(),
            err,
        };

        let transport = match security {
            Security::Tls => SmtpTransport::starttls_relay(host)
                .map_err(transport_err)?
                .port(port)
                .credentials(creds)
                .build(),
            Security::Ssl => SmtpTransport::relay(host)
                .map_err(transport_err)?
                .port(port)
                .credentials(creds)
                .build(),
            Security::Plain => {
                warn!(
                    msg = "using unencrypted smtp; credentials are not sent",
                    host = host,
                    port = port
                );
                SmtpTransport::builder_dangerous(host).port(port).build()
            }
        };

        debug!(msg = "built smtp transport", host = host, port = port, security = %security);
        Ok(Self::with_transport(username, transport))
    }

    pub fn gmail(username: &str, password: &str) -> Result<Self, Error> {
        Self::smtp(GMAIL_HOST, GMAIL_PORT, username, password, Security::Tls)
    }
}

impl<T> SmtpSender<T>
where
    T: Transport,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    pub fn with_transport(from: impl Into<String>, transport: T) -> Self {
        Self {
            transport,
            from: from.into(),
        }
    }

    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn send(&self, email: &Email) -> Result<T::Ok, Error> {
        let message = email.to_message(&self.from)?;
        debug!(
            msg = "sending email",
            from = self.from,
            recipients = email.recipients.len()
        );

        self.transport
            .send(&message)
            .map_err(|err| Error::Send(Box::new(err)))
    }
}

/// Sends `email` through `smtp.gmail.com` as `username`, authenticating
/// with an app password.
pub fn send_with_gmail(username: &str, password: &str, email: &Email) -> Result<Response, Error> {
    SmtpSender::gmail(username, password)?.send(email)
}
