//! Reassembling heading text from span fragments.
//!
//! Some producers fake bold by drawing a glyph run several times with a
//! slight offset, and the layout engine then reports overlapping pieces
//! such as `"RFP: Request f"`, `"quest for Pr"`, `"r Proposal"`.

use crate::config::ReconstructConfig;

/// Clean heading string from the fragment texts of one candidate, in
/// reading order. `None` when nothing but whitespace is left.
pub fn reconstruct<'a>(
    fragments: impl IntoIterator<Item = &'a str>,
    config: &ReconstructConfig,
) -> Option<String> {
    let mut frags: Vec<Fragment> = Vec::new();
    let mut artifacts = false;
    for frag in fragments {
        let frag = frag.trim();
        if frag.is_empty() {
            continue;
        }
        if frags.iter().any(|f| f.text == frag) {
            artifacts = true;
        } else {
            frags.push(Fragment { text: frag.to_string(), folded: false });
        }
    }
    if frags.is_empty() {
        return None;
    }

    if frags.len() >= 3 {
        merge_overlaps(&mut frags, config.min_overlap, &mut artifacts);
    }
    let joined = if frags.iter().filter(|f| f.folded).count() > 1 {
        longest(frags)
    } else {
        frags.iter().map(|f| f.text.as_str()).collect::<Vec<_>>().join(" ")
    };

    let cleaned = clean_tokens(&joined, artifacts);
    (!cleaned.is_empty()).then_some(cleaned)
}

struct Fragment {
    text: String,
    /// Absorbed another fragment.
    folded: bool,
}

/// Repeatedly fold fragments into each other: first drop fragments that are
/// a prefix or suffix of another, then join the pair with the largest
/// suffix/prefix overlap that looks like a render artifact. A fragment
/// folded away counts as artifact evidence.
fn merge_overlaps(frags: &mut Vec<Fragment>, min_overlap: usize, artifacts: &mut bool) {
    loop {
        let chars: Vec<Vec<char>> = frags.iter().map(|f| f.text.chars().collect()).collect();

        if let Some((j, into)) = contained_fragment(&chars, min_overlap.max(4)) {
            frags[into].folded = true;
            frags.remove(j);
            *artifacts = true;
            continue;
        }

        let mut best: Option<(usize, usize, usize)> = None;
        for i in 0..chars.len() {
            for j in 0..chars.len() {
                if i == j {
                    continue;
                }
                let k = overlap(&chars[i], &chars[j]);
                if k >= min_overlap
                    && (*artifacts || is_render_overlap(&chars[i], &chars[j], k))
                    && best.is_none_or(|(bk, _, _)| k > bk)
                {
                    best = Some((k, i, j));
                }
            }
        }
        let Some((k, i, j)) = best else {
            return;
        };

        let tail: String = chars[j][k..].iter().collect();
        frags[i].text.push_str(&tail);
        frags[i].folded = true;
        frags.remove(j);
        *artifacts = true;
    }
}

/// An overlap of `k` chars between the end of `a` and the start of `b` that
/// cuts into a word of `a`, or spans several words and cuts into a word of
/// `b`. Whole-word overlaps ("to the" + "theory") are ordinary wrapping.
fn is_render_overlap(a: &[char], b: &[char], k: usize) -> bool {
    splits_word(a, a.len() - k) || (splits_word(b, k) && b[..k].iter().any(|c| c.is_whitespace()))
}

fn splits_word(text: &[char], at: usize) -> bool {
    at > 0 && at < text.len() && text[at - 1].is_alphanumeric() && text[at].is_alphanumeric()
}

/// A fragment that another fragment starts or ends with, and that other
/// fragment. Of two equal fragments the later one goes.
fn contained_fragment(chars: &[Vec<char>], min_len: usize) -> Option<(usize, usize)> {
    for (j, small) in chars.iter().enumerate() {
        if small.len() < min_len {
            continue;
        }
        for (i, big) in chars.iter().enumerate() {
            if i == j || big.len() < small.len() || (big.len() == small.len() && j < i) {
                continue;
            }
            let head = chars_eq_ignore_case(&big[..small.len()], small);
            let tail = chars_eq_ignore_case(&big[big.len() - small.len()..], small);
            if head || tail {
                return Some((j, i));
            }
        }
    }
    None
}

/// Longest proper suffix of `a` that is a proper prefix of `b`.
fn overlap(a: &[char], b: &[char]) -> usize {
    let max = a.len().min(b.len()).saturating_sub(1);
    (1..=max)
        .rev()
        .find(|&k| chars_eq_ignore_case(&a[a.len() - k..], &b[..k]))
        .unwrap_or(0)
}

fn chars_eq_ignore_case(a: &[char], b: &[char]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.to_lowercase().eq(y.to_lowercase()))
}

fn longest(frags: Vec<Fragment>) -> String {
    let mut best = String::new();
    for frag in frags {
        if frag.text.chars().count() > best.chars().count() {
            best = frag.text;
        }
    }
    best
}

/// Collapse whitespace and drop a token repeated right after itself. With
/// render artifacts around, a token that is a truncated copy of the next
/// one ("Pr Proposal") goes too.
fn clean_tokens(text: &str, artifacts: bool) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(tokens.len());
    for (idx, token) in tokens.iter().enumerate() {
        if kept.last().is_some_and(|prev| prev.to_lowercase() == token.to_lowercase()) {
            continue;
        }
        if artifacts
            && tokens.get(idx + 1).is_some_and(|next| {
                next.len() > token.len() && next.to_lowercase().starts_with(&token.to_lowercase())
            })
        {
            continue;
        }
        kept.push(token);
    }
    kept.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(frags: &[&str]) -> Option<String> {
        reconstruct(frags.iter().copied(), &ReconstructConfig::default())
    }

    #[test]
    fn plain_fragments_are_joined() {
        assert_eq!(run(&["Annual", "Report"]).as_deref(), Some("Annual Report"));
        assert_eq!(
            run(&["Chapter 3", "Methods", "and Materials"]).as_deref(),
            Some("Chapter 3 Methods and Materials")
        );
    }

    #[test]
    fn exact_duplicates_are_dropped() {
        assert_eq!(run(&["Overview", "Overview", " "]).as_deref(), Some("Overview"));
    }

    #[test]
    fn overlapping_render_artifacts_merge() {
        assert_eq!(
            run(&["RFP: Request f", "quest for Pr", "r Proposal"]).as_deref(),
            Some("RFP: Request for Proposal")
        );
    }

    #[test]
    fn whole_word_overlap_is_wrapping() {
        assert_eq!(
            run(&["Introduction to the", "theory of", "operations"]).as_deref(),
            Some("Introduction to the theory of operations")
        );
    }

    #[test]
    fn untouched_fragments_survive_a_merge() {
        assert_eq!(
            run(&["Quarterly Finan", "nancial Review", "2024"]).as_deref(),
            Some("Quarterly Financial Review 2024")
        );
    }

    #[test]
    fn contained_fragments_fold_away() {
        assert_eq!(
            run(&["Request for Proposal", "Request", "for Proposal"]).as_deref(),
            Some("Request for Proposal")
        );
    }

    #[test]
    fn overlap_ignores_case() {
        assert_eq!(
            run(&["Ontario digital", "DIGITAL Library", "Library"]).as_deref(),
            Some("Ontario digital Library")
        );
    }

    #[test]
    fn repeated_tokens_collapse() {
        assert_eq!(run(&["Proposal  Proposal   Summary"]).as_deref(), Some("Proposal Summary"));
        assert_eq!(run(&["RFP: R", "RFP: R", "RFP: Request for Pr"]).as_deref(), Some("RFP: Request for Pr"));
    }

    #[test]
    fn prefix_tokens_need_artifact_evidence() {
        assert_eq!(run(&["A Approach"]).as_deref(), Some("A Approach"));
    }

    #[test]
    fn empty_input() {
        assert_eq!(run(&[]), None);
        assert_eq!(run(&["  ", ""]), None);
    }
}
