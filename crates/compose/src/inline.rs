//! Html snippets meant to be dropped into markdown or text blocks.

use crate::blocks::ImageAlign;
use chrono::{DateTime, TimeZone};
use pulldown_cmark::{html, Options, Parser};
use std::fmt::Display;

pub const DEFAULT_TIME_FORMAT: &str = "%B %d, %Y";

/// Converts CommonMark to html. Tables, footnotes, strikethrough and task
/// lists are enabled; raw html passes through.
pub fn md(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options);
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

pub fn add_image(src: &str, alt: &str, width: &str, align: ImageAlign) -> String {
    let align_style = match align {
        ImageAlign::Center => "display: block; margin: 0 auto;",
        ImageAlign::Left => "display: block; margin: 0;",
        ImageAlign::Right => "float: right;",
        ImageAlign::Inline => "",
    };

    format!(
        "<img src=\"{src}\" alt=\"{alt}\" width=\"{width}\" style=\"{align_style} max-width: 100%; height: auto;\" />"
    )
}

pub fn add_cta_button(label: &str, url: &str, bg_color: &str, text_color: &str) -> String {
    format!(
        "<a href=\"{url}\" style=\"display: inline-block; padding: 12px 24px; \
         background-color: {bg_color}; color: {text_color}; text-decoration: none; \
         border-radius: 4px; font-weight: bold; text-align: center;\">{label}</a>"
    )
}

/// Formats a timestamp with a strftime pattern, [`DEFAULT_TIME_FORMAT`]
/// when none is given.
pub fn add_readable_time<Tz>(dt: &DateTime<Tz>, format: Option<&str>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    dt.format(format.unwrap_or(DEFAULT_TIME_FORMAT)).to_string()
}
