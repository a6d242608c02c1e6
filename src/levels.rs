use std::cmp::Reverse;

use crate::config::{LevelConfig, LevelStrategy};
use crate::types::{FontSize, HeadingCandidate, Level};

/// Heading style used to tell levels apart.
type Style = (FontSize, bool, bool);

/// One level per candidate, in input order. Larger sizes never get a lower
/// level than smaller ones.
pub fn assign_levels(candidates: &[HeadingCandidate], config: &LevelConfig) -> Vec<Level> {
    let mut styles: Vec<Style> = candidates.iter().map(|c| (c.size, c.bold, c.italic)).collect();
    // Larger first, bold before regular, upright before italic.
    styles.sort_by_key(|&(size, bold, italic)| (Reverse(size), Reverse(bold), italic));
    styles.dedup();

    if config.refine_by_style && styles.len() <= Level::ALL.len() {
        return candidates
            .iter()
            .map(|c| {
                let rank = styles
                    .iter()
                    .position(|s| *s == (c.size, c.bold, c.italic))
                    .unwrap_or(Level::ALL.len() - 1);
                Level::from_rank(rank)
            })
            .collect();
    }

    let mut sizes: Vec<FontSize> = styles.iter().map(|s| s.0).collect();
    sizes.dedup();
    let ranks = size_ranks(&sizes, config.strategy);
    candidates
        .iter()
        .map(|c| {
            let rank = sizes
                .iter()
                .position(|s| *s == c.size)
                .map_or(Level::ALL.len() - 1, |i| ranks[i]);
            Level::from_rank(rank)
        })
        .collect()
}

/// Rank (0..4) of each size in `sizes`, which is sorted largest first.
fn size_ranks(sizes: &[FontSize], strategy: LevelStrategy) -> Vec<usize> {
    let levels = Level::ALL.len();
    if sizes.len() <= levels {
        return (0..sizes.len()).collect();
    }
    match strategy {
        LevelStrategy::Count => {
            // Near-equal groups; the leftover sizes widen the top groups.
            let base = sizes.len() / levels;
            let extra = sizes.len() % levels;
            let mut ranks = Vec::with_capacity(sizes.len());
            for rank in 0..levels {
                let width = base + usize::from(rank < extra);
                ranks.extend(std::iter::repeat_n(rank, width));
            }
            ranks
        }
        LevelStrategy::Range => {
            let max = sizes[0].points();
            let min = sizes[sizes.len() - 1].points();
            let band = (max - min) / levels as f32;
            sizes
                .iter()
                .map(|s| {
                    if band <= 0.0 {
                        0
                    } else {
                        (((max - s.points()) / band) as usize).min(levels - 1)
                    }
                })
                .collect()
        }
    }
}
