//! Locates the JSON search payload Zillow embeds in its result pages.
//!
//! The payload sits inside a `<script>` element, wrapped in an HTML comment:
//! `<script type="application/json"><!--{"cat1": ...}--></script>`.

use crate::debug::preview;
use crate::debug_println;
use crate::error::ScrapeError;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

/// Literal that identifies the script element carrying listing data.
pub const PAYLOAD_MARKER: &str = "zestimate";

/// Return the comment-wrapped payload text of the first script element that
/// mentions [`PAYLOAD_MARKER`]. Later script elements are never inspected.
pub fn locate_payload(html: &str) -> Result<String, ScrapeError> {
    let document = Html::parse_document(html);
    let script_selector = Selector::parse("script").expect("valid script selector");

    let script_text = document
        .select(&script_selector)
        .map(|element| element.text().collect::<String>())
        .find(|text| text.contains(PAYLOAD_MARKER))
        .ok_or(ScrapeError::NotFound {
            marker: PAYLOAD_MARKER,
        })?;

    debug_println!("Payload script found: {}", preview(&script_text, 120));

    let comment_regex = Regex::new(r"(?s)<!--(.+?)-->").expect("valid comment regex");
    let captures = comment_regex
        .captures(&script_text)
        .ok_or(ScrapeError::MalformedPayload)?;

    Ok(captures[1].to_string())
}

/// Locate and parse the embedded payload.
pub fn extract_json(html: &str) -> Result<Value, ScrapeError> {
    let payload = locate_payload(html)?;
    let document: Value = serde_json::from_str(&payload)?;
    Ok(document)
}
