//! nbmail-mailer holds the intermediate [`Email`](data::Email) that every
//! source format is converted into, the renderers that turn it into a
//! preview page, a MIME message or Quarto metadata, and the backends that
//! deliver it.

pub mod data;
pub mod message;
pub mod preview;
pub mod quarto;
pub mod transport;

pub use data::{Email, TemplateVariables};
pub use transport::{Backend, Receipt};
