use chrono::NaiveDate;

use crate::record::ContentRecord;

/// Output language of a rendered document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    English,
    TraditionalChinese,
}

impl Locale {
    pub const BOTH: [Locale; 2] = [Locale::English, Locale::TraditionalChinese];

    pub fn code(self) -> &'static str {
        match self {
            Locale::English => "en",
            Locale::TraditionalChinese => "zh",
        }
    }

    /// The locale the page is written in; the other one is translated.
    pub fn is_source(self) -> bool {
        self == Locale::English
    }

    fn date_format(self) -> &'static str {
        match self {
            Locale::English => "%B %d, %Y",
            Locale::TraditionalChinese => "%Y年%m月%d日",
        }
    }

    fn labels(self) -> Labels {
        match self {
            Locale::English => Labels {
                glyph_alt: "Gate",
                mandala_alt: "Rave Mandala",
                exaltation: "☀️ Exaltation:",
                detriment: "🌑 Detriment:",
            },
            Locale::TraditionalChinese => Labels {
                glyph_alt: "閘門",
                mandala_alt: "人類圖曼陀羅",
                exaltation: "☀️ 高階表達:",
                detriment: "🌑 低階表達:",
            },
        }
    }
}

struct Labels {
    glyph_alt: &'static str,
    mandala_alt: &'static str,
    exaltation: &'static str,
    detriment: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Title,
    DateStamp,
    GlyphImage,
    Subtitle,
    LeadQuote,
    CrossReference,
    QuarterTheme,
    Rule,
    MainBody,
    MandalaImage,
    LineHeading,
    Exaltation,
    Detriment,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub kind: SectionKind,
    pub markdown: String,
}

/// Fixed-order sections for one locale; absent fields contribute nothing.
pub fn layout(record: &ContentRecord, locale: Locale, date: NaiveDate) -> Vec<Section> {
    let labels = locale.labels();
    let mut out = Vec::new();
    let mut push = |kind: SectionKind, markdown: String| out.push(Section { kind, markdown });

    if let Some(t) = present(&record.title) {
        push(SectionKind::Title, format!("# {}", t));
    }
    push(
        SectionKind::DateStamp,
        format!("**{}**", date.format(locale.date_format())),
    );
    if let Some(link) = present(&record.glyph_link) {
        push(
            SectionKind::GlyphImage,
            format!("![{}]({})", labels.glyph_alt, link),
        );
    }
    if let Some(t) = present(&record.subtitle) {
        push(SectionKind::Subtitle, format!("## *{}*", t));
    }
    if let Some(t) = present(&record.lead) {
        push(SectionKind::LeadQuote, quote(t));
    }
    if let Some(t) = present(&record.cross_reference) {
        push(SectionKind::CrossReference, format!("### {}", t));
    }
    if let Some(t) = present(&record.quarter_theme) {
        push(SectionKind::QuarterTheme, format!("*{}*", t));
    }
    push(SectionKind::Rule, "---".to_string());
    if let Some(t) = present(&record.main_body) {
        push(SectionKind::MainBody, t.to_string());
    }
    if let Some(link) = present(&record.mandala_link) {
        push(
            SectionKind::MandalaImage,
            format!("![{}]({})", labels.mandala_alt, link),
        );
    }
    push(SectionKind::Rule, "---".to_string());
    if let Some(t) = present(&record.line_title) {
        push(SectionKind::LineHeading, format!("### {}", t));
    }
    if let Some(t) = present(&record.exaltation) {
        push(
            SectionKind::Exaltation,
            format!("**{}** {}", labels.exaltation, t),
        );
    }
    if let Some(t) = present(&record.detriment) {
        push(
            SectionKind::Detriment,
            format!("**{}** {}", labels.detriment, t),
        );
    }

    out
}

pub fn render(record: &ContentRecord, locale: Locale, date: NaiveDate) -> String {
    to_markdown(&layout(record, locale, date))
}

pub fn to_markdown(sections: &[Section]) -> String {
    let blocks: Vec<&str> = sections.iter().map(|s| s.markdown.as_str()).collect();
    format!("{}\n", blocks.join("\n\n"))
}

/// Copy of `record` whose image links resolve from the base directory
/// instead of a run directory. Other text is left alone.
pub fn rebase_for_alias(record: &ContentRecord) -> ContentRecord {
    let rebase = |link: &Option<String>| {
        link.as_ref()
            .map(|l| l.strip_prefix("../").unwrap_or(l).to_string())
    };
    ContentRecord {
        glyph_link: rebase(&record.glyph_link),
        mandala_link: rebase(&record.mandala_link),
        ..record.clone()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

fn quote(text: &str) -> String {
    text.lines()
        .map(|l| if l.trim().is_empty() { ">".to_string() } else { format!("> {}", l) })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Tests ──
