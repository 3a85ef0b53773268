use crate::{inline::md, Error};
use nbmail_mjml::{
    tags::{column, section, spacer, text},
    MjmlTag,
};
use std::{fmt, fs, path::Path, str::FromStr};
use tracing::debug;

/// One `mj-section` of a composed email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block(MjmlTag);

impl Block {
    pub fn new(section: MjmlTag) -> Self {
        Self(section)
    }

    pub fn mjml(&self) -> &MjmlTag {
        &self.0
    }

    pub fn into_mjml(self) -> MjmlTag {
        self.0
    }
}

/// An entry of a [`BlockList`]: a finished block or markdown that becomes a
/// plain text block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockItem {
    Block(Block),
    Markdown(String),
}

impl From<Block> for BlockItem {
    fn from(block: Block) -> Self {
        BlockItem::Block(block)
    }
}

impl From<&str> for BlockItem {
    fn from(s: &str) -> Self {
        BlockItem::Markdown(s.to_string())
    }
}

impl From<String> for BlockItem {
    fn from(s: String) -> Self {
        BlockItem::Markdown(s)
    }
}

impl BlockItem {
    fn into_mjml(self) -> MjmlTag {
        match self {
            BlockItem::Block(block) => block.into_mjml(),
            BlockItem::Markdown(s) => {
                section().with_child(column().with_child(text().with_content(md(&s))))
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockList {
    items: Vec<BlockItem>,
}

impl BlockList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: impl Into<BlockItem>) {
        self.items.push(item.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_mjml_list(self) -> Vec<MjmlTag> {
        self.items.into_iter().map(BlockItem::into_mjml).collect()
    }
}

impl<B: Into<BlockItem>> FromIterator<B> for BlockList {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Groups blocks (or markdown strings) for [`Composer`](crate::Composer).
pub fn create_blocks<I, B>(items: I) -> BlockList
where
    I: IntoIterator<Item = B>,
    B: Into<BlockItem>,
{
    items.into_iter().collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
            Align::Justify => "justify",
        };
        write!(f, "{s}")
    }
}

/// Markdown text in a single column.
pub fn block_text(content: &str, align: Align) -> Block {
    Block::new(
        section().with_child(
            column().with_child(
                text()
                    .with_attr("align", align.to_string())
                    .with_content(md(content)),
            ),
        ),
    )
}

/// A large heading, centered unless told otherwise.
pub fn block_title(title: &str, align: Align) -> Block {
    let html = format!(
        "<h1 style=\"margin: 0; font-size: 32px; font-weight: 300;\">{}</h1>",
        md(title)
    );

    Block::new(
        section().with_child(
            column().with_child(
                text()
                    .with_attr("align", align.to_string())
                    .with_content(html),
            ),
        ),
    )
}

pub const DEFAULT_SPACER_HEIGHT: &str = "20px";

pub fn block_spacer(height: &str) -> Block {
    Block::new(section().with_child(column().with_child(spacer().with_attr("height", height))))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Width {
    Px(u32),
    Css(String),
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Width::Px(n) => write!(f, "{n}px"),
            Width::Css(s) => write!(f, "{s}"),
        }
    }
}

impl From<u32> for Width {
    fn from(n: u32) -> Self {
        Width::Px(n)
    }
}

impl From<&str> for Width {
    fn from(s: &str) -> Self {
        Width::Css(s.to_string())
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ImageAlign {
    #[default]
    Center,
    Left,
    Right,
    Inline,
}

impl FromStr for ImageAlign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "center" => Ok(ImageAlign::Center),
            "left" => Ok(ImageAlign::Left),
            "right" => Ok(ImageAlign::Right),
            "inline" => Ok(ImageAlign::Inline),
            other => Err(Error::InvalidOption {
                option: "align",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Float {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageOptions {
    pub alt: String,
    pub width: Width,
    pub align: ImageAlign,
    /// Takes precedence over `align` when set.
    pub float: Float,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            alt: String::new(),
            width: Width::Px(520),
            align: ImageAlign::Center,
            float: Float::None,
        }
    }
}

impl ImageOptions {
    pub fn alt(mut self, alt: impl Into<String>) -> Self {
        self.alt = alt.into();
        self
    }

    pub fn width(mut self, width: impl Into<Width>) -> Self {
        self.width = width.into();
        self
    }

    pub fn align(mut self, align: ImageAlign) -> Self {
        self.align = align;
        self
    }

    pub fn float(mut self, float: Float) -> Self {
        self.float = float;
        self
    }

    fn style(&self) -> String {
        let align_style = match (self.float, self.align) {
            (Float::Left, _) => "float: left;",
            (Float::Right, _) => "float: right;",
            (Float::None, ImageAlign::Center) => "display: block; margin: 0 auto;",
            (Float::None, ImageAlign::Left) => "display: block; margin: 0;",
            (Float::None, ImageAlign::Right) => "display: block; margin: 0 0 0 auto;",
            (Float::None, ImageAlign::Inline) => "",
        };

        if align_style.is_empty() {
            "max-width: 100%; height: auto;".to_string()
        } else {
            format!("{align_style} max-width: 100%; height: auto;")
        }
    }

    fn image_block(&self, src: impl Into<nbmail_mjml::AttrValue>) -> Block {
        let image = nbmail_mjml::tags::image()
            .with_attr("src", src)
            .with_attr("alt", self.alt.as_str())
            .with_attr("width", self.width.to_string())
            .with_attr("style", self.style());

        Block::new(section().with_child(column().with_child(image)))
    }
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("//")
}

/// An image from a URL or a local file. Local files are read now and end
/// up as inline attachments once the email is composed.
pub fn block_image(file: &str, options: &ImageOptions) -> Result<Block, Error> {
    if is_url(file) {
        return Ok(options.image_block(file));
    }

    let path = Path::new(file);
    if !path.exists() {
        return Err(Error::ImageNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(Error::NotAFile(path.to_path_buf()));
    }

    let data = fs::read(path).map_err(|err| Error::Io {
        file: path.to_path_buf(),
        err,
    })?;
    debug!(msg = "read image for block", file = file, bytes = data.len());

    Ok(options.image_block(data))
}

/// An image from in-memory bytes, such as a rendered plot.
pub fn block_image_bytes(data: impl Into<Vec<u8>>, options: &ImageOptions) -> Block {
    options.image_block(data.into())
}
