//! Per-entry Atom feed parsing.
//!
//! Feeds are split into `<entry>` blocks first and each block is parsed on its
//! own, so one malformed entry drops only itself instead of the whole feed.

use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::error::SourceError;

static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<entry\b[^>]*>.*?</entry>").expect("valid entry regex"));

/// Fields of one Atom `<entry>` that any of the feed consumers read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct AtomEntry {
    pub id: Option<String>,
    pub title: Option<String>,
    pub link: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub published: Option<String>,
    pub updated: Option<String>,
    /// `term` of the first `<category>`.
    pub category: Option<String>,
    pub video_id: Option<String>,
    pub media_description: Option<String>,
}

/// Parse every well-formed `<entry>` in `xml`, skipping the rest.
pub(crate) fn parse_entries(xml: &str) -> Vec<AtomEntry> {
    ENTRY_RE
        .find_iter(xml)
        .filter_map(|block| match parse_entry(block.as_str()) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed feed entry");
                None
            }
        })
        .collect()
}

fn parse_entry(block: &str) -> Result<AtomEntry, SourceError> {
    let mut reader = Reader::from_str(block);
    reader.config_mut().trim_text(true);

    let mut entry = AtomEntry::default();
    let mut path: Vec<String> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = element_name(&e);
                read_attributes(&mut entry, &name, &e);
                path.push(name);
            }
            Event::Empty(e) => {
                let name = element_name(&e);
                read_attributes(&mut entry, &name, &e);
            }
            Event::Text(e) => {
                let text = e.unescape().unwrap_or_default().into_owned();
                assign_text(&mut entry, &path, text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                assign_text(&mut entry, &path, text);
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entry)
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| {
            attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(attr.value.as_ref()).into_owned(),
                std::borrow::Cow::into_owned,
            )
        })
}

fn read_attributes(entry: &mut AtomEntry, name: &str, e: &BytesStart<'_>) {
    match name {
        "link" if entry.link.is_none() => {
            let rel = attribute(e, b"rel");
            if rel.as_deref().is_none_or(|r| r == "alternate") {
                entry.link = attribute(e, b"href");
            }
        }
        "category" if entry.category.is_none() => entry.category = attribute(e, b"term"),
        _ => {}
    }
}

fn assign_text(entry: &mut AtomEntry, path: &[String], text: String) {
    let Some(current) = path.last() else {
        return;
    };
    let in_author = path.iter().any(|n| n == "author");
    let slot = match current.as_str() {
        "id" => &mut entry.id,
        "title" => &mut entry.title,
        "name" if in_author => &mut entry.author,
        "content" => &mut entry.content,
        "published" => &mut entry.published,
        "updated" => &mut entry.updated,
        "yt:videoId" => &mut entry.video_id,
        "media:description" => &mut entry.media_description,
        _ => return,
    };
    match slot {
        Some(existing) => {
            existing.push(' ');
            existing.push_str(&text);
        }
        None => *slot = Some(text),
    }
}
