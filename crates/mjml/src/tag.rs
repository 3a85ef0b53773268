use crate::{compile, images};
use std::fmt::Write;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum Error {
    #[error("<{tag}> has a byte value for '{attr}' which cannot be written as markup; convert the tag with an email adapter or inline its images first")]
    ByteAttribute { tag: String, attr: String },
    #[error("<{0}> is a leaf tag and cannot have children")]
    LeafChildren(String),
    #[error(transparent)]
    Compile(#[from] compile::Error),
}

/// An attribute value. Byte values only ever appear as `mj-image` sources
/// and must be converted before the tag can be written as markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Bytes(Vec<u8>),
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<Vec<u8>> for AttrValue {
    fn from(b: Vec<u8>) -> Self {
        AttrValue::Bytes(b)
    }
}

impl From<&[u8]> for AttrValue {
    fn from(b: &[u8]) -> Self {
        AttrValue::Bytes(b.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    Tag(MjmlTag),
    Text(String),
}

impl From<MjmlTag> for Child {
    fn from(tag: MjmlTag) -> Self {
        Child::Tag(tag)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Text(s.to_string())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Text(s)
    }
}

/// A node of an MJML document.
///
/// Attributes keep their insertion order; setting an existing attribute
/// replaces its value in place. When `content` is set it is rendered instead
/// of the children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MjmlTag {
    pub name: String,
    pub attrs: Vec<(String, AttrValue)>,
    pub children: Vec<Child>,
    pub content: Option<String>,
    leaf: bool,
}

impl MjmlTag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: vec![],
            children: vec![],
            content: None,
            leaf: false,
        }
    }

    /// A tag that only holds content, like `mj-text` or `mj-image`.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            leaf: true,
            ..Self::new(name)
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.leaf
    }

    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        let (key, value) = (key.into(), value.into());
        match self.attrs.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((key, value)),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_attrs<I, K, V>(mut self, attrs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<AttrValue>,
    {
        for (k, v) in attrs {
            self.set_attr(k, v);
        }
        self
    }

    pub fn with_child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children<I, C>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Child>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn render_mjml(&self) -> Result<String, Error> {
        self.render_mjml_with(0, "\n")
    }

    /// Writes the tag as MJML markup. Nested tags are indented two spaces
    /// deeper than their parent; text children are written as is.
    pub fn render_mjml_with(&self, indent: usize, eol: &str) -> Result<String, Error> {
        if self.leaf && !self.children.is_empty() {
            return Err(Error::LeafChildren(self.name.clone()));
        }

        let mut attrs = String::new();
        for (key, value) in self.attrs.iter() {
            match value {
                AttrValue::Text(v) => {
                    let _ = write!(attrs, " {key}=\"{}\"", v.replace('"', "&quot;"));
                }
                AttrValue::Bytes(_) => {
                    return Err(Error::ByteAttribute {
                        tag: self.name.clone(),
                        attr: key.clone(),
                    })
                }
            }
        }

        let inner = match self.content.as_ref() {
            Some(content) => content.clone(),
            None => self
                .children
                .iter()
                .map(|child| match child {
                    Child::Tag(tag) => tag.render_mjml_with(indent + 2, eol),
                    Child::Text(text) => Ok(text.clone()),
                })
                .collect::<Result<Vec<String>, Error>>()?
                .join(eol),
        };

        let (pad, name) = (" ".repeat(indent), &self.name);
        if inner.is_empty() {
            Ok(format!("{pad}<{name}{attrs}></{name}>"))
        } else {
            Ok(format!(
                "{pad}<{name}{attrs}>{eol}{inner}{eol}{pad}</{name}>"
            ))
        }
    }

    /// Compiles the tag to html with every byte image embedded as a data URI.
    ///
    /// Tags other than `mjml` are wrapped into a complete document first:
    /// `mj-body` gets an `mjml` parent, anything else `mjml > mj-body`.
    pub fn to_html(&self) -> Result<String, Error> {
        let doc = match self.name.as_str() {
            "mjml" => self.clone(),
            "mj-body" => {
                warn!(
                    msg = "to_html called on <mj-body>; wrapping in <mjml>",
                    tag = self.name
                );
                MjmlTag::new("mjml").with_child(self.clone())
            }
            _ => {
                warn!(
                    msg = "to_html called on a fragment; wrapping in <mjml><mj-body>",
                    tag = self.name
                );
                MjmlTag::new("mjml").with_child(MjmlTag::new("mj-body").with_child(self.clone()))
            }
        };

        let markup = images::inline_images(&doc).render_mjml()?;
        Ok(compile::compile(&markup)?.html)
    }
}
