/// Structured content of one daily view page.
///
/// Every field is optional: markup drift degrades a field to `None` instead of
/// failing the run. `footer_note` is the only field the extractor fills with a
/// default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentRecord {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub lead: Option<String>,
    pub cross_reference: Option<String>,
    pub quarter_theme: Option<String>,
    pub main_body: Option<String>,
    pub line_title: Option<String>,
    pub exaltation: Option<String>,
    pub detriment: Option<String>,
    pub footer_note: Option<String>,
    pub glyph_url: Option<String>,
    pub glyph_filename: Option<String>,
    pub mandala_payload: Option<String>,
    /// Document-relative links, attached once assets are resolved.
    pub glyph_link: Option<String>,
    pub mandala_link: Option<String>,
}

/// The text fields that go through translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Title,
    Subtitle,
    Lead,
    CrossReference,
    QuarterTheme,
    MainBody,
    LineTitle,
    Exaltation,
    Detriment,
    FooterNote,
}

impl TextField {
    pub const ALL: [TextField; 10] = [
        TextField::Title,
        TextField::Subtitle,
        TextField::Lead,
        TextField::CrossReference,
        TextField::QuarterTheme,
        TextField::MainBody,
        TextField::LineTitle,
        TextField::Exaltation,
        TextField::Detriment,
        TextField::FooterNote,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Subtitle => "subtitle",
            TextField::Lead => "lead",
            TextField::CrossReference => "cross_reference",
            TextField::QuarterTheme => "quarter_theme",
            TextField::MainBody => "main_body",
            TextField::LineTitle => "line_title",
            TextField::Exaltation => "exaltation",
            TextField::Detriment => "detriment",
            TextField::FooterNote => "footer_note",
        }
    }
}

impl ContentRecord {
    pub fn text(&self, field: TextField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set_text(&mut self, field: TextField, value: String) {
        *self.slot_mut(field) = Some(value);
    }

    /// Translatable fields holding non-empty text, in translation order.
    pub fn populated(&self) -> Vec<TextField> {
        TextField::ALL
            .into_iter()
            .filter(|f| self.text(*f).is_some_and(|t| !t.is_empty()))
            .collect()
    }

    fn slot(&self, field: TextField) -> &Option<String> {
        match field {
            TextField::Title => &self.title,
            TextField::Subtitle => &self.subtitle,
            TextField::Lead => &self.lead,
            TextField::CrossReference => &self.cross_reference,
            TextField::QuarterTheme => &self.quarter_theme,
            TextField::MainBody => &self.main_body,
            TextField::LineTitle => &self.line_title,
            TextField::Exaltation => &self.exaltation,
            TextField::Detriment => &self.detriment,
            TextField::FooterNote => &self.footer_note,
        }
    }

    fn slot_mut(&mut self, field: TextField) -> &mut Option<String> {
        match field {
            TextField::Title => &mut self.title,
            TextField::Subtitle => &mut self.subtitle,
            TextField::Lead => &mut self.lead,
            TextField::CrossReference => &mut self.cross_reference,
            TextField::QuarterTheme => &mut self.quarter_theme,
            TextField::MainBody => &mut self.main_body,
            TextField::LineTitle => &mut self.line_title,
            TextField::Exaltation => &mut self.exaltation,
            TextField::Detriment => &mut self.detriment,
            TextField::FooterNote => &mut self.footer_note,
        }
    }
}
