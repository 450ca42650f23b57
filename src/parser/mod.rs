pub mod blocks;
pub mod fields;

use scraper::Html;

use crate::error::{Error, Result};
use crate::record::ContentRecord;
use blocks::BodyRules;

/// raw HTML → DOM → content record.
pub fn parse_page(raw: &str) -> Result<ContentRecord> {
    parse_page_with(raw, &BodyRules::default())
}

pub fn parse_page_with(raw: &str, rules: &BodyRules) -> Result<ContentRecord> {
    if raw.trim().is_empty() {
        return Err(Error::Malformed("empty document".into()));
    }
    if !raw.contains('<') {
        return Err(Error::Malformed("no markup found".into()));
    }

    let doc = Html::parse_document(raw);
    Ok(fields::extract(&doc, raw, rules))
}

// ── Tests ──
