//! nbmail-mjml builds MJML documents as a tree of [`MjmlTag`]s, turns
//! in-memory images into inline attachments and compiles the result to html
//! with `mrml`.

pub mod compile;
pub mod images;
pub mod tag;
pub mod tags;

pub use compile::{compile, Compiled};
pub use images::{inline_images, process_images};
pub use tag::{AttrValue, Child, MjmlTag};
