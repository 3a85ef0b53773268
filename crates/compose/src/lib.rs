//! nbmail-compose assembles emails out of markdown and blocks. Every block
//! is an MJML section; the [`Composer`] places them in a template and
//! compiles the result into an [`Email`](nbmail_mailer::Email).

use std::{io, path::PathBuf};

pub mod blocks;
pub mod compose;
pub mod inline;

pub use blocks::{
    block_image, block_image_bytes, block_spacer, block_text, block_title, create_blocks, Align,
    Block, BlockItem, BlockList, Float, ImageAlign, ImageOptions, Width,
};
pub use compose::{compose_email, Composer, Section, Template};
pub use inline::{add_cta_button, add_image, add_readable_time, md};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("unknown template: {0}; use 'blastula' or 'none'")]
    UnknownTemplate(String),
    #[error("invalid value for {option}: {value}")]
    InvalidOption { option: &'static str, value: String },
    #[error("image file not found: {0:?}")]
    ImageNotFound(PathBuf),
    #[error("path is not a file: {0:?}")]
    NotAFile(PathBuf),
    #[error("{file:?}: {err}")]
    Io { file: PathBuf, err: io::Error },
    #[error(transparent)]
    Ingress(#[from] nbmail_ingress::Error),
}
