//! Timed-text XML parsing
//!
//! Each caption line arrives as `<text start=".." dur="..">line</text>`.

use lazy_static::lazy_static;
use regex::Regex;

use super::CaptionSegment;
use crate::utils::decode_basic_entities;

lazy_static! {
    static ref TEXT_ELEMENT: Regex = Regex::new(r"(?s)<text\b([^>/]*)>(.*?)</text>").unwrap();
    static ref START_ATTR: Regex = Regex::new(r#"\bstart="([^"]*)""#).unwrap();
    static ref DUR_ATTR: Regex = Regex::new(r#"\bdur="([^"]*)""#).unwrap();
    static ref INNER_TAG: Regex = Regex::new(r"<[^>]+>").unwrap();
}

/// Parse every `<text>` element into a segment, in document order
pub fn parse(xml: &str) -> Vec<CaptionSegment> {
    TEXT_ELEMENT
        .captures_iter(xml)
        .filter_map(|captures| {
            let attributes = &captures[1];
            let raw = INNER_TAG.replace_all(&captures[2], "");
            let text = decode_basic_entities(raw.trim());
            if text.is_empty() {
                return None;
            }
            Some(CaptionSegment {
                text,
                start: numeric_attr(&START_ATTR, attributes),
                duration: numeric_attr(&DUR_ATTR, attributes),
            })
        })
        .collect()
}

fn numeric_attr(pattern: &Regex, attributes: &str) -> f64 {
    pattern
        .captures(attributes)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0.0)
}
