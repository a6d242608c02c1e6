//! Noise/validity filter for heading strings.
//!
//! The filter is an ordered table of named rules. Each rule looks at the
//! trimmed string plus the lexicon of its detected language and says
//! whether the string is noise; the first rule that fires rejects it.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::config::{Config, FilterConfig, Lexicon, LexiconTable};
use crate::lang::{self, Language};

/// What a rule sees.
pub struct Probe<'a> {
    pub text: &'a str,
    pub language: Language,
    pub lexicon: &'a Lexicon,
    pub config: &'a FilterConfig,
}

/// One named rejection predicate.
pub struct Rule {
    pub name: &'static str,
    pub rejects: fn(&Probe<'_>) -> bool,
}

/// Rules in evaluation order.
pub static RULES: &[Rule] = &[
    Rule { name: "too_short", rejects: too_short },
    Rule { name: "numeric", rejects: numeric },
    Rule { name: "punctuation_only", rejects: punctuation_only },
    Rule { name: "page_marker", rejects: page_marker },
    Rule { name: "field_word", rejects: field_word },
    Rule { name: "toc_leader", rejects: toc_leader },
    Rule { name: "date", rejects: date },
    Rule { name: "boilerplate", rejects: boilerplate },
    Rule { name: "tabular", rejects: tabular },
    Rule { name: "form_field", rejects: form_field },
];

pub struct NoiseFilter<'a> {
    config: &'a FilterConfig,
    lexicons: &'a LexiconTable,
    rules: &'a [Rule],
}

impl<'a> NoiseFilter<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self::with_rules(&config.filter, &config.lexicons, RULES)
    }

    pub fn with_rules(
        config: &'a FilterConfig,
        lexicons: &'a LexiconTable,
        rules: &'a [Rule],
    ) -> Self {
        Self { config, lexicons, rules }
    }

    /// Name of the first rule that rejects `text`, if any.
    pub fn rejection(&self, text: &str) -> Option<&'static str> {
        let text = text.trim();
        let language = lang::detect(text);
        let probe = Probe {
            text,
            language,
            lexicon: self.lexicons.get(language),
            config: self.config,
        };
        let hit = self.rules.iter().find(|rule| (rule.rejects)(&probe)).map(|r| r.name);
        if let Some(name) = hit {
            trace!(rule = name, lang = language.code(), text, "rejected");
        }
        hit
    }

    pub fn is_valid(&self, text: &str) -> bool {
        self.rejection(text).is_none()
    }
}

// ── helpers ────────────────────────────────────────────────────────────────

fn normalized(text: &str) -> String {
    text.trim()
        .trim_end_matches([':', '：', '.'])
        .trim()
        .to_lowercase()
}

/// `phrase` occurs in `haystack` as whole words. Ideographic scripts have no
/// word boundaries, so edges made of those characters always match.
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let (Some(first), Some(last)) = (phrase.chars().next(), phrase.chars().next_back()) else {
        return false;
    };
    haystack.match_indices(phrase).any(|(idx, _)| {
        let before = haystack[..idx].chars().next_back();
        let after = haystack[idx + phrase.len()..].chars().next();
        let open = !is_word_char(first) || before.is_none_or(|c| !is_word_char(c));
        let close = !is_word_char(last) || after.is_none_or(|c| !is_word_char(c));
        open && close
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() && !lang::is_ideographic(c)
}

fn is_number_token(token: &str) -> bool {
    static NUMBER_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"^[-+(]?[$€£¥₹]?\d[\d,.]*%?\)?$").unwrap()
    });
    NUMBER_TOKEN_RE.is_match(token)
}

fn has_cased_letters_all_upper(token: &str) -> bool {
    token.chars().any(char::is_uppercase) && !token.chars().any(char::is_lowercase)
}

fn is_boolean_token(token: &str) -> bool {
    matches!(
        token.to_lowercase().as_str(),
        "yes" | "no" | "y" | "n" | "true" | "false" | "n/a" | "na" | "x" | "✓" | "✔" | "✗"
    )
}

// ── rules ──────────────────────────────────────────────────────────────────

fn too_short(p: &Probe<'_>) -> bool {
    let min = if p.language.is_cjk() { p.config.min_chars_cjk } else { p.config.min_chars };
    p.text.chars().count() < min
}

fn numeric(p: &Probe<'_>) -> bool {
    static NUMERIC_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\d+(?:[.,]\d+)*\.?$").unwrap());
    NUMERIC_RE.is_match(p.text)
}

fn punctuation_only(p: &Probe<'_>) -> bool {
    !p.text.chars().any(char::is_alphanumeric)
}

/// "Page 4", "Page 4 of 10", "p. 12", "- 7 -", "3 / 20", "第3页", "стр. 5".
fn page_marker(p: &Probe<'_>) -> bool {
    static DASHED_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^[-–—]\s*\d+\s*[-–—]$|^\d+\s*/\s*\d+$").unwrap());
    if DASHED_RE.is_match(p.text) {
        return true;
    }
    if !p.text.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    let words: Vec<String> = p
        .text
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .filter(|w| w != "of")
        .collect();
    !words.is_empty() && words.iter().all(|w| p.lexicon.page_words.contains(w))
}

fn field_word(p: &Probe<'_>) -> bool {
    let norm = normalized(p.text);
    if norm.split_whitespace().count() > 3 {
        return false;
    }
    p.lexicon.field_words.iter().any(|w| *w == norm)
}

/// Dot leaders from a table of contents: a run of `toc_min_dots` dots
/// (possibly space-separated or as ellipsis characters), or text followed
/// by a leader and a trailing page number.
fn toc_leader(p: &Probe<'_>) -> bool {
    static LEADER_NUMBER_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?:\.{2,}|…+|·{2,}|_{3,})\s*\d+\s*$").unwrap());
    if LEADER_NUMBER_RE.is_match(p.text) {
        return true;
    }
    let mut run = 0usize;
    let mut chars = p.text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '.' | '·' => run += 1,
            '…' => run += 3,
            ' ' if run > 0 && matches!(chars.peek(), Some('.' | '·' | '…')) => {}
            _ => run = 0,
        }
        if run >= p.config.toc_min_dots {
            return true;
        }
    }
    false
}

/// Bare dates ("March 2003", "April 11, 2003", "2003-04-11") and ordinals
/// ("3rd").
fn date(p: &Probe<'_>) -> bool {
    static MONTH_DATE_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r"(?i)^(?:\d{1,2}(?:st|nd|rd|th)?\s+)?(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?(?:\s+\d{1,2}(?:st|nd|rd|th)?)?,?(?:\s+\d{4})?$",
        )
        .unwrap()
    });
    static NUMERIC_DATE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^\d{1,4}[-/.]\d{1,2}[-/.]\d{1,4}$").unwrap());
    static ORDINAL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^\d+(?:st|nd|rd|th)$").unwrap());

    let has_digit = p.text.chars().any(|c| c.is_ascii_digit());
    (has_digit && MONTH_DATE_RE.is_match(p.text))
        || NUMERIC_DATE_RE.is_match(p.text)
        || ORDINAL_RE.is_match(p.text)
}

/// Signature lines, copyright footers, office-use stamps.
fn boilerplate(p: &Probe<'_>) -> bool {
    static COPYRIGHT_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^(?:©|\(c\)\s|copyright\b)").unwrap());
    if COPYRIGHT_RE.is_match(p.text) {
        return true;
    }
    let lower = p.text.to_lowercase();
    p.lexicon.boilerplate.iter().any(|phrase| contains_phrase(&lower, phrase))
}

/// Rows and cells of tables: number runs, currency/percent columns,
/// header rows, ruled borders, or a handful of short coded values.
fn tabular(p: &Probe<'_>) -> bool {
    static BORDER_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[|│┃┆┊─━═+=_]{3,}|\|.*\|").unwrap());
    if BORDER_RE.is_match(p.text) {
        return true;
    }

    let tokens: Vec<&str> = p.text.split_whitespace().collect();

    let mut numeric_run = 0usize;
    for token in &tokens {
        numeric_run = if is_number_token(token) { numeric_run + 1 } else { 0 };
        if numeric_run >= 3 {
            return true;
        }
    }

    let money = tokens
        .iter()
        .filter(|t| t.contains(['$', '€', '£', '¥', '₹']) || t.ends_with('%'))
        .count();
    if money >= 2 {
        return true;
    }

    if tokens.len() >= 2
        && tokens.iter().all(|t| {
            let t = t.trim_matches(|c: char| !c.is_alphanumeric() && c != '%').to_lowercase();
            p.lexicon.column_headers.contains(&t)
        })
    {
        return true;
    }

    let coded = |t: &&str| {
        t.chars().count() <= 4
            && (has_cased_letters_all_upper(t) || is_number_token(t) || is_boolean_token(t))
    };
    if !tokens.is_empty() && tokens.len() <= 3 && tokens.iter().all(coded) {
        let has_value = tokens.iter().any(|t| is_number_token(t) || is_boolean_token(t));
        return tokens.len() >= 2 || has_value;
    }
    false
}

/// Form prompts: "Name:", "Enter your address", "(optional)".
/// Long strings naming a document type ("Application Form for ...") are
/// titles, not prompts.
fn form_field(p: &Probe<'_>) -> bool {
    static ANNOTATION_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[(\[]([^()\[\]]{1,30})[)\]]$").unwrap());
    const ANNOTATION_WORDS: &[&str] = &[
        "optional", "required", "if any", "if applicable", "specify", "mm", "dd", "yy",
        "yyyy", "in words", "in figures", "block letters", "capital letters",
    ];

    let lower = p.text.to_lowercase();
    if p.text.chars().count() >= p.config.override_min_chars
        && p.lexicon.doc_type_words.iter().any(|w| contains_phrase(&lower, w))
    {
        return false;
    }

    if p.text.ends_with([':', '：']) {
        return true;
    }
    if p.text.starts_with(['(', '[']) {
        return true;
    }
    let first_word = lower.split_whitespace().next().unwrap_or("");
    let verb_lead = if p.language.is_cjk() {
        p.lexicon.instruction_verbs.iter().any(|v| lower.starts_with(v.as_str()))
    } else {
        p.lexicon.instruction_verbs.iter().any(|v| v == first_word)
    };
    if verb_lead {
        return true;
    }
    ANNOTATION_RE.captures(&lower).is_some_and(|caps| {
        let inner = &caps[1];
        ANNOTATION_WORDS.iter().any(|w| contains_phrase(inner, w))
            || p.lexicon.instruction_verbs.iter().any(|v| contains_phrase(inner, v))
    })
}
