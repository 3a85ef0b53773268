use super::StdError;
use clap::{Args, Parser, Subcommand};
use nbmail_mailer::{preview::DEFAULT_PREVIEW_FILE, quarto::DEFAULT_METADATA_FILE};
use std::path::PathBuf;
use tracing::{info, Level};

mod config;
mod input;

pub use config::SendArgs;
pub use input::Format;

/// Convert notebook and MJML emails, preview them and send them.
#[derive(Debug, Parser)]
#[command(name = "nbmail", version, about)]
pub struct Cmd {
    #[command(subcommand)]
    pub command: Commands,

    /// Pretty-print logs and show progress spinners.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// One of error, warn, info, debug or trace.
    #[arg(long, global = true, default_value = "info", value_parser = nbmail_logger::parse_level)]
    pub log_level: Level,

    /// Directory for the rolling error log.
    #[arg(long, global = true, default_value = ".")]
    pub log_dir: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a self-contained html preview of an email.
    Preview(PreviewArgs),
    /// Convert an email into Quarto output metadata.
    Convert(ConvertArgs),
    /// Send an email through the configured backend.
    Send(SendArgs),
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Quarto metadata (.json), MJML (.mjml) or a MIME message (.eml).
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Auto)]
    pub format: Format,

    #[arg(short, long, default_value = DEFAULT_PREVIEW_FILE)]
    pub output: PathBuf,

    /// Open the preview in the default browser instead of writing `--output`.
    #[arg(long)]
    pub open: bool,
}

impl PreviewArgs {
    pub fn preview(self) -> Result<(), StdError> {
        let format = self.format.resolve(&self.input)?;

        if self.open {
            let file = input::load_email(&self.input, format)?.open_preview()?;
            info!(msg = "opened preview", file = format!("{file:?}"));
            return Ok(());
        }

        match format {
            Format::Mime => {
                let raw = input::read(&self.input)?;
                nbmail_ingress::write_mime_preview(&raw, &self.output)?;
            }
            _ => input::load_email(&self.input, format)?.write_preview(&self.output)?,
        }

        info!(msg = "wrote preview", file = format!("{:?}", self.output));
        Ok(())
    }
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = Format::Auto)]
    pub format: Format,

    #[arg(short, long, default_value = DEFAULT_METADATA_FILE)]
    pub output: PathBuf,
}

impl ConvertArgs {
    pub fn convert(self) -> Result<(), StdError> {
        let format = self.format.resolve(&self.input)?;
        let email = input::load_email(&self.input, format)?;

        email.write_quarto_json(&self.output)?;
        info!(
            msg = "wrote quarto metadata",
            file = format!("{:?}", self.output),
            format = %format
        );

        Ok(())
    }
}
