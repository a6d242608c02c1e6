use tracing::trace;

use crate::config::MergeConfig;
use crate::filter::NoiseFilter;
use crate::types::HeadingCandidate;

/// Join headings of one page that wrap over consecutive lines.
///
/// Candidates are put into reading order first. A candidate folds into the
/// one before it when both share size, weight and slant, the earlier text
/// has no sentence-ending punctuation, no other line sits between them, and
/// the joined text stays short and still passes the noise filter.
pub fn merge_adjacent(
    mut candidates: Vec<HeadingCandidate>,
    config: &MergeConfig,
    filter: &NoiseFilter<'_>,
) -> Vec<HeadingCandidate> {
    candidates.sort_by(|a, b| {
        a.page
            .cmp(&b.page)
            .then(a.y.unwrap_or(f32::INFINITY).total_cmp(&b.y.unwrap_or(f32::INFINITY)))
    });

    let mut merged: Vec<HeadingCandidate> = Vec::with_capacity(candidates.len());
    for next in candidates {
        if let Some(prev) = merged.last_mut() {
            if let Some(text) = joined_text(prev, &next, config, filter) {
                trace!(
                    page = prev.page,
                    first = %prev.text,
                    second = %next.text,
                    sources = ?(prev.source, next.source),
                    "merged headings"
                );
                prev.text = text;
                prev.lines.last = prev.lines.last.max(next.lines.last);
                continue;
            }
        }
        merged.push(next);
    }
    merged
}

fn joined_text(
    prev: &HeadingCandidate,
    next: &HeadingCandidate,
    config: &MergeConfig,
    filter: &NoiseFilter<'_>,
) -> Option<String> {
    let same_style = prev.page == next.page
        && prev.size == next.size
        && prev.bold == next.bold
        && prev.italic == next.italic;
    if !same_style
        || prev.text.trim_end().ends_with(['.', '?', '!'])
        || !prev.lines.is_followed_by(&next.lines)
    {
        return None;
    }
    let text = format!("{} {}", prev.text.trim_end(), next.text.trim_start());
    (text.chars().count() < config.max_chars && filter.is_valid(&text)).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::{CandidateSource, FontSize, LineSpan};

    fn cand(text: &str, size: f32, bold: bool, y: f32, line: usize) -> HeadingCandidate {
        HeadingCandidate {
            text: text.to_string(),
            size: FontSize::from_points(size),
            bold,
            italic: false,
            page: 1,
            y: Some(y),
            lines: LineSpan::single(line),
            source: CandidateSource::Block,
        }
    }

    fn run(cands: Vec<HeadingCandidate>) -> Vec<String> {
        let config = Config::default();
        let filter = NoiseFilter::new(&config);
        merge_adjacent(cands, &config.merge, &filter)
            .into_iter()
            .map(|c| c.text)
            .collect()
    }

    #[test]
    fn wrapped_heading_is_joined() {
        let out = run(vec![
            cand("Overview", 16.0, true, 220.0, 1),
            cand("Section", 16.0, true, 200.0, 0),
        ]);
        assert_eq!(out, vec!["Section Overview"]);
    }

    #[test]
    fn chains_continue_over_three_lines() {
        let out = run(vec![
            cand("Guidelines for", 14.0, true, 100.0, 3),
            cand("Submitting", 14.0, true, 116.0, 4),
            cand("Proposals", 14.0, true, 132.0, 5),
        ]);
        assert_eq!(out, vec!["Guidelines for Submitting Proposals"]);
    }

    #[test]
    fn style_or_punctuation_breaks_the_chain() {
        let out = run(vec![
            cand("Introduction", 16.0, true, 100.0, 0),
            cand("Motivation", 14.0, true, 120.0, 1),
        ]);
        assert_eq!(out.len(), 2);

        let out = run(vec![
            cand("What is new?", 16.0, true, 100.0, 0),
            cand("Release Notes", 16.0, true, 120.0, 1),
        ]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn intervening_line_breaks_the_chain() {
        let out = run(vec![
            cand("Scope", 16.0, true, 100.0, 0),
            cand("Limitations", 16.0, true, 200.0, 4),
        ]);
        assert_eq!(out, vec!["Scope", "Limitations"]);
    }

    #[test]
    fn long_merges_are_refused() {
        let first = "A".repeat(60);
        let second = "B".repeat(45);
        let out = run(vec![
            cand(&first, 16.0, true, 100.0, 0),
            cand(&second, 16.0, true, 120.0, 1),
        ]);
        assert_eq!(out.len(), 2);
    }
}
