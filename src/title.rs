use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::config::TitleConfig;
use crate::types::HeadingCandidate;

static NUMBERED_SECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}(?:\.\d{1,2})*\.?\s+\p{L}").unwrap());
static CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9][A-Z0-9._/-]*$").unwrap());

const REFERENCE_PREFIXES: &[&str] = &["page ", "fig ", "fig. ", "figure ", "table ", "tab. "];
const GREETINGS: &[&str] = &[
    "hello", "hi ", "hey ", "dear ", "welcome", "thank you", "thanks", "congratulations",
    "greetings",
];

/// The chosen title and the candidate texts it was built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleSelection {
    pub title: String,
    pub parts: Vec<String>,
}

impl TitleSelection {
    /// Whether a heading with this text is already part of the title.
    pub fn excludes(&self, text: &str) -> bool {
        let text = text.trim();
        !self.title.is_empty()
            && (self.title == text || self.parts.iter().any(|p| p == text))
    }
}

/// Pick the title from the first page's candidates at that page's largest
/// heading size.
pub fn select_title(candidates: &[HeadingCandidate], config: &TitleConfig) -> TitleSelection {
    let first_page: Vec<&HeadingCandidate> = candidates.iter().filter(|c| c.page == 0).collect();
    let Some(max_size) = first_page.iter().map(|c| c.size).max() else {
        return TitleSelection::default();
    };

    let mut fragments: Vec<&HeadingCandidate> = first_page
        .into_iter()
        .filter(|c| c.size == max_size && is_title_part(&c.text, config))
        .collect();
    fragments.sort_by(|a, b| {
        a.y.unwrap_or(f32::INFINITY).total_cmp(&b.y.unwrap_or(f32::INFINITY))
    });

    let selection = match fragments.as_slice() {
        [] => TitleSelection::default(),
        [only] => {
            let text = only.text.trim().to_string();
            TitleSelection { title: text.clone(), parts: vec![text] }
        }
        frags if frags.len() <= config.max_fragments => {
            let mut title = frags[0].text.trim().to_string();
            for pair in frags.windows(2) {
                let sep = if pair[0].lines.is_followed_by(&pair[1].lines) {
                    " "
                } else {
                    config.separator.as_str()
                };
                title.push_str(sep);
                title.push_str(pair[1].text.trim());
            }
            TitleSelection {
                title,
                parts: frags.iter().map(|c| c.text.trim().to_string()).collect(),
            }
        }
        frags => {
            let mut longest = frags[0];
            for c in &frags[1..] {
                if c.text.trim().chars().count() > longest.text.trim().chars().count() {
                    longest = *c;
                }
            }
            let text = longest.text.trim().to_string();
            TitleSelection { title: text.clone(), parts: vec![text] }
        }
    };
    debug!(size = %max_size, title = %selection.title, parts = selection.parts.len(), "title selected");
    selection
}

fn is_title_part(text: &str, config: &TitleConfig) -> bool {
    let text = text.trim();
    let lower = text.to_lowercase();
    text.chars().count() >= config.min_chars
        && text.chars().any(char::is_alphabetic)
        && !text.ends_with([':', '：'])
        && !text.ends_with('!')
        && !REFERENCE_PREFIXES.iter().any(|p| lower.starts_with(p))
        && !GREETINGS.iter().any(|g| lower.starts_with(g))
        && !is_short_code(text)
        && !NUMBERED_SECTION_RE.is_match(text)
}

/// Identifiers such as "RFP-2024" or "ISO9001".
fn is_short_code(text: &str) -> bool {
    text.chars().count() <= 12
        && CODE_RE.is_match(text)
        && text.chars().any(|c| c.is_ascii_digit() || matches!(c, '-' | '_' | '/' | '.'))
}
