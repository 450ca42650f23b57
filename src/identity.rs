use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::record::ContentRecord;

static GATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Gate\s+(\d+)").unwrap());
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Line\s+(\d+)").unwrap());

/// (gate, line) pair naming a day's content. A line number never stands
/// without a gate number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityKey {
    gate: Option<String>,
    line: Option<String>,
}

impl IdentityKey {
    pub fn derive(record: &ContentRecord) -> Self {
        let gate = capture(&GATE_RE, record.title.as_deref());
        let line = gate
            .as_ref()
            .and_then(|_| capture(&LINE_RE, record.line_title.as_deref()));

        IdentityKey { gate, line }
    }

    pub fn gate(&self) -> Option<&str> {
        self.gate.as_deref()
    }

    pub fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }

    /// `YYYY-MM-DD-<gate>.<line>`, `YYYY-MM-DD-<gate>`, or the bare date.
    pub fn dir_name(&self, date: NaiveDate) -> String {
        let date = date.format("%Y-%m-%d");
        match (&self.gate, &self.line) {
            (Some(g), Some(l)) => format!("{}-{}.{}", date, g, l),
            (Some(g), None) => format!("{}-{}", date, g),
            _ => date.to_string(),
        }
    }

    pub fn glyph_filename(&self) -> Option<String> {
        self.gate.as_ref().map(|g| format!("Gate-{}.jpg", g))
    }

    pub fn mandala_filename(&self) -> Option<String> {
        self.gate.as_ref().map(|g| format!("Gate-{}-Rave-Mandala.png", g))
    }

    pub fn label(&self) -> String {
        match (&self.gate, &self.line) {
            (Some(g), Some(l)) => format!("{}.{}", g, l),
            (Some(g), None) => g.clone(),
            _ => "unknown".to_string(),
        }
    }
}

fn capture(re: &Regex, text: Option<&str>) -> Option<String> {
    text.and_then(|t| re.captures(t)).map(|c| c[1].to_string())
}

// ── Tests ──
