use crate::config::FontConfig;
use crate::types::{Block, FontSize, Page, Span};
use crate::zones::RegionMap;

/// Frequency of each quantised font size, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct SizeHistogram {
    counts: Vec<(FontSize, usize)>,
}

impl SizeHistogram {
    pub fn add(&mut self, size: FontSize) {
        if let Some(entry) = self.counts.iter_mut().find(|(k, _)| *k == size) {
            entry.1 += 1;
        } else {
            self.counts.push((size, 1));
        }
    }

    pub fn from_spans<'a>(spans: impl IntoIterator<Item = &'a Span>) -> Self {
        let mut hist = Self::default();
        for span in spans {
            hist.add(span.size_key());
        }
        hist
    }

    pub fn of_block(block: &Block) -> Self {
        Self::from_spans(block.text_spans())
    }

    /// Sizes by descending frequency. Ties keep first-seen order.
    pub fn ranked(&self) -> Vec<(FontSize, usize)> {
        let mut ranked = self.counts.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn most_common(&self) -> Option<FontSize> {
        self.ranked().first().map(|(size, _)| *size)
    }

    pub fn count(&self, size: FontSize) -> usize {
        self.counts
            .iter()
            .find(|(k, _)| *k == size)
            .map_or(0, |(_, n)| *n)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, n)| n).sum()
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn max_size(&self) -> Option<FontSize> {
        self.counts.iter().map(|(k, _)| *k).max()
    }
}

/// Font statistics of one page's body region.
#[derive(Debug, Clone)]
pub struct FontStats {
    pub most_common: FontSize,
    /// The size ordinary paragraphs are set in.
    pub body_size: FontSize,
    pub max_size: FontSize,
}

/// Histogram over the spans of body-region blocks (title candidates
/// included). `None` when the page has no body text at all.
pub fn page_stats(page: &Page, regions: &RegionMap, config: &FontConfig) -> Option<FontStats> {
    let histogram = SizeHistogram::from_spans(
        regions
            .body_blocks(page)
            .flat_map(|(_, block)| block.text_spans()),
    );
    let ranked = histogram.ranked();
    let (most_common, _) = *ranked.first()?;
    let max_size = histogram.max_size()?;

    // A page dominated by one giant title would otherwise report the title
    // size as body text.
    let body_size = match ranked.get(1) {
        Some((second, _)) if most_common.points() >= config.large_body_size => *second,
        _ => most_common,
    };

    Some(FontStats { most_common, body_size, max_size })
}
