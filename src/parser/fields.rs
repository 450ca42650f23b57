use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::blocks::{collect_body, element_text, BodyRules};
use crate::record::ContentRecord;

static H2: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").unwrap());
static H4: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h4").unwrap());
static H6: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h6").unwrap());
static EM: LazyLock<Selector> = LazyLock::new(|| Selector::parse("em").unwrap());
static P: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static P_LEAD: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p.lead").unwrap());
static P_TEXT_LG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p.text-lg").unwrap());
static POLARITY_P: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.col-md-6 p").unwrap());
static GATE_IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img.gate").unwrap());
static MANDALA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"data:image/png;base64,([^"]+)"#).unwrap());

const FOOTER_MARKER: &str = "The Daily View reflects";
const DEFAULT_FOOTER: &str = "The Daily View reflects the impact the Sun (70% of the neutrino influence) \
is having on humanity as it moves through the Gates and Lines of the Mandala. \
Transits are potentials that you can witness in others and the world around you, \
and, if correct for you, as you follow your individual Strategy and Authority, \
may become a part of your experience as well.";

/// Pull every known field out of a parsed page. Missing markup leaves the field empty.
pub fn extract(doc: &Html, raw: &str, rules: &BodyRules) -> ContentRecord {
    let mut record = ContentRecord {
        title: first_text(doc, &H2),
        subtitle: subtitle(doc),
        lead: first_text(doc, &P_LEAD),
        cross_reference: first_containing(doc, &H4, "Cross"),
        quarter_theme: first_containing(doc, &P_TEXT_LG, "Quarter"),
        main_body: main_body(doc, rules),
        line_title: first_containing(doc, &H6, "Line"),
        footer_note: Some(
            first_containing(doc, &P, FOOTER_MARKER).unwrap_or_else(|| DEFAULT_FOOTER.to_string()),
        ),
        mandala_payload: MANDALA_RE.captures(raw).map(|c| c[1].to_string()),
        ..Default::default()
    };

    let (exaltation, detriment) = polarities(doc);
    record.exaltation = exaltation;
    record.detriment = detriment;

    if let Some(src) = doc
        .select(&GATE_IMG)
        .find_map(|img| img.value().attr("src"))
        .filter(|s| !s.trim().is_empty())
    {
        let src = src.trim();
        record.glyph_filename = src.rsplit('/').next().map(|s| s.to_string());
        record.glyph_url = Some(src.to_string());
    }

    record
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel).next().map(element_text).and_then(non_empty)
}

fn first_containing(doc: &Html, sel: &Selector, needle: &str) -> Option<String> {
    doc.select(sel)
        .map(element_text)
        .find(|t| t.contains(needle))
}

/// "Gate of …" heading preferred, any h4 otherwise; the italic part wins when present.
fn subtitle(doc: &Html) -> Option<String> {
    let heading: ElementRef = doc
        .select(&H4)
        .find(|h| element_text(*h).contains("Gate of"))
        .or_else(|| doc.select(&H4).next())?;

    heading
        .select(&EM)
        .next()
        .and_then(|em| non_empty(element_text(em)))
        .or_else(|| non_empty(element_text(heading)))
}

fn main_body(doc: &Html, rules: &BodyRules) -> Option<String> {
    let paragraphs: Vec<String> = doc.select(&P).map(element_text).collect();
    collect_body(paragraphs.iter().map(|s| s.as_str()), rules)
}

/// Exaltation / detriment lines share a container; each is keyed by its lead phrase.
fn polarities(doc: &Html) -> (Option<String>, Option<String>) {
    let mut exaltation = None;
    let mut detriment = None;

    for text in doc.select(&POLARITY_P).map(element_text) {
        if text.contains("Exaltation") {
            exaltation = non_empty(text.replace("Exaltation:", "").trim().to_string());
        } else if text.contains("Detriment") {
            detriment = non_empty(text.replace("Detriment:", "").trim().to_string());
        }
    }

    (exaltation, detriment)
}
