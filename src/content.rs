//! Turns a downloaded body into the text returned to callers.

use serde_json::Value;

use crate::api::models::{Metadata, MetadataValue};
use crate::extract::extract_page;

#[derive(Debug, Default, PartialEq)]
pub struct ShapedContent {
    pub content: String,
    pub title: Option<String>,
    pub metadata: Metadata,
}

/// Decodes as UTF-8, falling back to Latin-1 which maps every byte.
pub fn decode_body(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => err.into_bytes().into_iter().map(char::from).collect(),
    }
}

/// Dispatches on the (lowercased) content type.
pub fn shape_content(text: String, content_type: &str, extract_text: bool, url: &str) -> ShapedContent {
    if content_type.contains("text/html") && extract_text {
        let page = extract_page(&text, url);
        return ShapedContent {
            content: page.text,
            title: page.title,
            metadata: page.metadata,
        };
    }

    if content_type.contains("application/json") {
        if let Some(shaped) = pretty_json(&text) {
            return shaped;
        }
    }

    ShapedContent {
        content: text,
        ..Default::default()
    }
}

fn pretty_json(text: &str) -> Option<ShapedContent> {
    let value: Value = serde_json::from_str(text).ok()?;
    let content = serde_json::to_string_pretty(&value).ok()?;
    let keys = match &value {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    };

    let mut metadata = Metadata::new();
    metadata.insert("json_keys".to_string(), MetadataValue::List(keys));

    Some(ShapedContent {
        content,
        title: None,
        metadata,
    })
}

pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}
