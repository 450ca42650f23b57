use scraper::ElementRef;

const START_MARKER: &str = "This Gate is part of";
const LONG_BLOCK_CHARS: usize = 100;
const STOP_MARKERS: &[&str] = &[
    "Daily View reflects",
    "Exaltation",
    "Detriment",
    "Copyright",
    "Projectors are designed",
    "Unlike energy Types",
    "young people",
    "register for an IHDS",
];

/// Text of an element: text nodes joined, whitespace collapsed, trimmed.
pub fn element_text(el: ElementRef<'_>) -> String {
    normalize_ws(&el.text().collect::<Vec<_>>().join(" "))
}

pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Where the main-body scan stands in the paragraph stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyState {
    BeforeMain,
    Collecting,
    Stopped,
}

/// Markers that drive the main-body scan.
#[derive(Debug, Clone)]
pub struct BodyRules {
    pub start_marker: String,
    pub stop_markers: Vec<String>,
    /// Blocks at or under this many chars are skipped while collecting.
    pub long_block_chars: usize,
}

impl Default for BodyRules {
    fn default() -> Self {
        BodyRules {
            start_marker: START_MARKER.to_string(),
            stop_markers: STOP_MARKERS.iter().map(|s| s.to_string()).collect(),
            long_block_chars: LONG_BLOCK_CHARS,
        }
    }
}

pub struct BodyCollector<'r> {
    rules: &'r BodyRules,
    state: BodyState,
    paragraphs: Vec<String>,
}

impl<'r> BodyCollector<'r> {
    pub fn new(rules: &'r BodyRules) -> Self {
        BodyCollector {
            rules,
            state: BodyState::BeforeMain,
            paragraphs: Vec::new(),
        }
    }

    pub fn state(&self) -> BodyState {
        self.state
    }

    /// Feed the next block; returns the state after it.
    pub fn push(&mut self, text: &str) -> BodyState {
        match self.state {
            BodyState::Stopped => {}
            _ if !text.is_empty() && text.contains(self.rules.start_marker.as_str()) => {
                self.paragraphs.push(text.to_string());
                self.state = BodyState::Collecting;
            }
            BodyState::BeforeMain => {}
            BodyState::Collecting => {
                if text.chars().count() > self.rules.long_block_chars {
                    if self
                        .rules
                        .stop_markers
                        .iter()
                        .any(|m| text.contains(m.as_str()))
                    {
                        self.state = BodyState::Stopped;
                    } else {
                        self.paragraphs.push(text.to_string());
                    }
                }
            }
        }
        self.state
    }

    pub fn finish(self) -> Option<String> {
        if self.paragraphs.is_empty() {
            None
        } else {
            Some(self.paragraphs.join("\n\n"))
        }
    }
}

/// Run the body scan over a block stream, stopping at the first stop block.
pub fn collect_body<'a, I>(blocks: I, rules: &BodyRules) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut collector = BodyCollector::new(rules);
    for block in blocks {
        if collector.push(block) == BodyState::Stopped {
            break;
        }
    }
    collector.finish()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn long(prefix: &str) -> String {
        format!("{} {}", prefix, "lorem ipsum ".repeat(12))
    }

    #[test]
    fn nothing_before_start_marker() {
        let rules = BodyRules::default();
        let blocks = [long("Intro paragraph"), long("Another one")];
        assert_eq!(collect_body(blocks.iter().map(|s| s.as_str()), &rules), None);
    }

    #[test]
    fn collects_long_blocks_until_stop_marker() {
        let rules = BodyRules::default();
        let first = "This Gate is part of the Channel of Struggle".to_string();
        let second = long("The drive to perfect");
        let short = "Read more".to_string();
        let stop = long("The Daily View reflects the Sun");
        let after = long("Never collected");
        let blocks = [first.clone(), second.clone(), short, stop, after];

        let body = collect_body(blocks.iter().map(|s| s.as_str()), &rules).unwrap();
        assert_eq!(body, format!("{}\n\n{}", first, second));
    }

    #[test]
    fn short_block_with_stop_marker_does_not_stop() {
        let rules = BodyRules::default();
        let mut c = BodyCollector::new(&rules);
        c.push("This Gate is part of something");
        assert_eq!(c.push("Exaltation"), BodyState::Collecting);
        c.push(&long("Still body"));
        assert!(c.finish().unwrap().contains("Still body"));
    }

    #[test]
    fn stopped_is_terminal() {
        let rules = BodyRules {
            stop_markers: vec!["FOOTER".into()],
            ..Default::default()
        };
        let mut c = BodyCollector::new(&rules);
        c.push("This Gate is part of it");
        assert_eq!(c.push(&long("FOOTER")), BodyState::Stopped);
        assert_eq!(c.push("This Gate is part of again"), BodyState::Stopped);
        assert_eq!(c.finish().as_deref(), Some("This Gate is part of it"));
    }

    #[test]
    fn injected_stop_markers_replace_defaults() {
        let rules = BodyRules {
            stop_markers: vec!["Legal".into()],
            ..Default::default()
        };
        let blocks = [
            "This Gate is part of X".to_string(),
            long("Copyright is no longer a stop marker"),
            long("Legal notice"),
        ];
        let body = collect_body(blocks.iter().map(|s| s.as_str()), &rules).unwrap();
        assert!(body.contains("Copyright"));
        assert!(!body.contains("Legal"));
    }
}
