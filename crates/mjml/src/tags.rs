//! Constructors for the MJML tags, named after the tag without its `mj-`
//! prefix.
//!
//! ```
//! use nbmail_mjml::tags::{body, column, mjml, section, text};
//!
//! let doc = mjml().with_child(
//!     body().with_child(section().with_child(column().with_child(text().with_content("Hi")))),
//! );
//! assert!(doc.render_mjml().unwrap().contains("<mj-text>"));
//! ```

use crate::tag::MjmlTag;

macro_rules! container {
    ($($fn:ident => $name:literal),* $(,)?) => {
        $(
            #[doc = concat!("`<", $name, ">`")]
            pub fn $fn() -> MjmlTag {
                MjmlTag::new($name)
            }
        )*
    };
}

macro_rules! leaf {
    ($($fn:ident => $name:literal),* $(,)?) => {
        $(
            #[doc = concat!("`<", $name, ">`, holds content only.")]
            pub fn $fn() -> MjmlTag {
                MjmlTag::leaf($name)
            }
        )*
    };
}

container! {
    mjml => "mjml",
    head => "mj-head",
    body => "mj-body",
    section => "mj-section",
    column => "mj-column",
    group => "mj-group",
    wrapper => "mj-wrapper",
    hero => "mj-hero",
    attributes => "mj-attributes",
    all => "mj-all",
    class => "mj-class",
    navbar => "mj-navbar",
    social => "mj-social",
    accordion => "mj-accordion",
    accordion_element => "mj-accordion-element",
    carousel => "mj-carousel",
}

leaf! {
    title => "mj-title",
    preview => "mj-preview",
    style => "mj-style",
    font => "mj-font",
    breakpoint => "mj-breakpoint",
    text => "mj-text",
    button => "mj-button",
    image => "mj-image",
    divider => "mj-divider",
    spacer => "mj-spacer",
    raw => "mj-raw",
    table => "mj-table",
    navbar_link => "mj-navbar-link",
    social_element => "mj-social-element",
    accordion_title => "mj-accordion-title",
    accordion_text => "mj-accordion-text",
    carousel_image => "mj-carousel-image",
}
