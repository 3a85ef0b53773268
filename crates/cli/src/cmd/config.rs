use super::{input, Format, StdError};
use clap::Args;
use indicatif::ProgressStyle;
use nbmail_mailer::Backend;
use serde::Deserialize;
use std::{fs, path::Path, path::PathBuf};
use tracing::{info, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

/// Sender address and delivery backend, read from a TOML file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub from: String,
    pub backend: Backend,
}

impl Config {
    pub fn new(config_file: &Path) -> Result<Self, StdError> {
        let data = fs::read_to_string(config_file)?;
        Self::from_toml(&data)
    }

    pub fn from_toml(data: &str) -> Result<Self, StdError> {
        Ok(toml::from_str(data)?)
    }
}

#[derive(Debug, Args)]
pub struct SendArgs {
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Auto)]
    pub format: Format,

    /// TOML file with `from` and a `[backend]` table.
    #[arg(short, long)]
    pub config: PathBuf,

    /// Recipient address; repeat for several. Replaces the recipients found
    /// in the input.
    #[arg(long)]
    pub to: Vec<String>,
}

impl SendArgs {
    pub fn send(self) -> Result<(), StdError> {
        let config = Config::new(&self.config)?;
        let mut email = input::load_email(&self.input, self.format)?;
        if !self.to.is_empty() {
            email.recipients = self.to;
        }

        let span = sending_span(config.backend.name())?;
        let _enter = span.enter();

        let receipt = config.backend.send(&config.from, &email)?;
        info!(
            msg = "email sent",
            backend = config.backend.name(),
            recipients = email.recipients.len(),
            receipt = %receipt
        );

        Ok(())
    }
}

fn sending_span(backend: &'static str) -> Result<tracing::Span, StdError> {
    let span = info_span!("send", backend);

    span.pb_set_style(&ProgressStyle::with_template(&format!(
        " {{spinner}} {} {{span_fields}} {}",
        console::style("Sending").bold().dim().cyan(),
        console::style("{elapsed}").dim(),
    ))?);

    Ok(span)
}
