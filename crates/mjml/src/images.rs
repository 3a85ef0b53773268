//! Conversion of in-memory `mj-image` sources.
//!
//! An image given as bytes cannot be written into markup. For emails the
//! bytes become an inline attachment referenced by `cid:`; for standalone
//! html they become a data URI.

use crate::tag::{AttrValue, Child, MjmlTag};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::collections::BTreeMap;
use uuid::Uuid;

const IMAGE_TAG: &str = "mj-image";

fn map_image_sources<F>(tag: &MjmlTag, convert: &mut F) -> MjmlTag
where
    F: FnMut(&[u8]) -> String,
{
    let mut out = tag.clone();

    if tag.name == IMAGE_TAG {
        if let Some(AttrValue::Bytes(data)) = tag.attr("src") {
            out.set_attr("src", convert(data));
        }
    }

    out.children = tag
        .children
        .iter()
        .map(|child| match child {
            Child::Tag(t) => Child::Tag(map_image_sources(t, convert)),
            Child::Text(s) => Child::Text(s.clone()),
        })
        .collect();

    out
}

fn fresh_cid(taken: &BTreeMap<String, String>) -> String {
    loop {
        let id = Uuid::new_v4().simple().to_string();
        let cid = format!("plot_{}.png", &id[..8]);
        if !taken.contains_key(&cid) {
            return cid;
        }
    }
}

/// Returns a copy of `tag` where every byte image source is replaced by a
/// `cid:` reference, along with the base64 payloads keyed by cid.
pub fn process_images(tag: &MjmlTag) -> (MjmlTag, BTreeMap<String, String>) {
    let mut attachments = BTreeMap::new();

    let processed = map_image_sources(tag, &mut |data: &[u8]| {
        let cid = fresh_cid(&attachments);
        attachments.insert(cid.clone(), BASE64.encode(data));
        format!("cid:{cid}")
    });

    (processed, attachments)
}

/// Returns a copy of `tag` with byte image sources embedded as data URIs.
pub fn inline_images(tag: &MjmlTag) -> MjmlTag {
    map_image_sources(tag, &mut |data: &[u8]| {
        format!("data:image/png;base64,{}", BASE64.encode(data))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::{body, column, image, mjml, section, text};

    fn doc_with_images(sources: Vec<AttrValue>) -> MjmlTag {
        let images = sources
            .into_iter()
            .map(|src| image().with_attr("src", src).with_attr("alt", "plot"));

        mjml().with_child(body().with_child(
            section().with_child(column().with_children(images).with_child(text().with_content("x"))),
        ))
    }

    fn image_sources(tag: &MjmlTag, out: &mut Vec<AttrValue>) {
        if tag.name == IMAGE_TAG {
            out.extend(tag.attr("src").cloned());
        }
        for child in tag.children.iter() {
            if let Child::Tag(t) = child {
                image_sources(t, out);
            }
        }
    }

    #[test]
    fn byte_sources_become_cid_references() {
        let doc = doc_with_images(vec![
            AttrValue::from(vec![1u8, 2, 3]),
            AttrValue::from(vec![4u8, 5, 6]),
        ]);

        let (processed, attachments) = process_images(&doc);
        let mut sources = vec![];
        image_sources(&processed, &mut sources);

        assert_eq!(attachments.len(), 2);
        assert!(attachments.values().any(|v| v == "AQID"));
        assert!(attachments.values().any(|v| v == "BAUG"));

        for src in sources {
            let AttrValue::Text(src) = src else {
                panic!("byte source survived processing")
            };
            let cid = src.strip_prefix("cid:").unwrap();
            assert!(cid.starts_with("plot_") && cid.ends_with(".png"));
            assert_eq!(cid.len(), "plot_".len() + 8 + ".png".len());
            assert!(attachments.contains_key(cid));
        }
    }

    #[test]
    fn url_sources_are_untouched() {
        let doc = doc_with_images(vec![AttrValue::from("https://example.com/a.png")]);
        let (processed, attachments) = process_images(&doc);

        assert!(attachments.is_empty());
        assert_eq!(processed, doc);
    }

    #[test]
    fn other_attributes_survive() {
        let doc = doc_with_images(vec![AttrValue::from(vec![9u8])]);
        let (processed, _) = process_images(&doc);

        let rendered = processed.render_mjml().unwrap();
        assert!(rendered.contains("alt=\"plot\""));
        assert!(rendered.contains("src=\"cid:plot_"));
    }

    #[test]
    fn inline_images_embeds_data_uris() {
        let doc = doc_with_images(vec![AttrValue::from(vec![1u8, 2, 3])]);
        let rendered = inline_images(&doc).render_mjml().unwrap();

        assert!(rendered.contains("src=\"data:image/png;base64,AQID\""));
    }
}
