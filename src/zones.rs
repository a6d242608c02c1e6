use std::borrow::Cow;
use std::collections::BTreeSet;

use crate::config::RegionConfig;
use crate::types::{Block, Line, Page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Header,
    Body,
    Footer,
}

impl Region {
    pub fn label(self) -> &'static str {
        match self {
            Region::Header => "header",
            Region::Body => "body",
            Region::Footer => "footer",
        }
    }
}

/// Region of every block on a page, indexed like `page.blocks`.
#[derive(Debug, Clone, Default)]
pub struct RegionMap {
    pub regions: Vec<Region>,
    /// Header/footer blocks on the first page that may carry the title.
    pub title_candidates: BTreeSet<usize>,
}

impl RegionMap {
    pub fn region(&self, idx: usize) -> Region {
        self.regions.get(idx).copied().unwrap_or(Region::Body)
    }

    pub fn is_title_candidate(&self, idx: usize) -> bool {
        self.title_candidates.contains(&idx)
    }

    /// Body blocks and promoted title candidates.
    pub fn is_body(&self, idx: usize) -> bool {
        self.region(idx) == Region::Body || self.is_title_candidate(idx)
    }

    pub fn body_blocks<'p>(&'p self, page: &'p Page) -> impl Iterator<Item = (usize, &'p Block)> {
        page.blocks
            .iter()
            .enumerate()
            .filter(move |(idx, _)| self.is_body(*idx))
    }
}

/// Slack around the cut lines; `792.0 * 0.1` is 79.200005 in f32 while a
/// parsed `79.2` is 79.199997.
const CUT_TOLERANCE: f32 = 1e-3;

/// Classify blocks on a page into header, body and footer by the position
/// of their top edge. Both cut lines belong to the body.
pub fn classify_page(page: &Page, config: &RegionConfig) -> RegionMap {
    let header_cut = page.height * config.header_ratio - CUT_TOLERANCE;
    let footer_cut = page.height * config.footer_ratio + CUT_TOLERANCE;

    let mut map = RegionMap::default();
    for (idx, block) in page.blocks.iter().enumerate() {
        let top = block.bbox.y0;
        let region = if top < header_cut {
            Region::Header
        } else if top > footer_cut {
            Region::Footer
        } else {
            Region::Body
        };
        if region != Region::Body && page.index == 0 && is_potential_title(block, config) {
            map.title_candidates.insert(idx);
        }
        map.regions.push(region);
    }
    map
}

fn is_potential_title(block: &Block, config: &RegionConfig) -> bool {
    let Some(avg) = block.avg_font_size() else {
        return false;
    };
    let text = block.text();
    let trimmed = text.trim();
    let len = trimmed.chars().count();
    avg >= config.title_min_avg_size
        && (config.title_min_chars..=config.title_max_chars).contains(&len)
        && !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '.' | ',' | '-'))
}

/// Drop spans that sit mostly on top of an embedded image (logos, figure
/// labels), then any lines and blocks left empty. Borrows the page untouched
/// when it has no images.
pub fn without_image_text(page: &Page, max_overlap: f32) -> Cow<'_, Page> {
    if page.images.is_empty() {
        return Cow::Borrowed(page);
    }

    let covered = |bbox: &crate::types::BBox| {
        let area = bbox.area();
        area > 0.0
            && page
                .images
                .iter()
                .any(|img| img.intersection_area(bbox) / area > max_overlap)
    };

    let blocks = page
        .blocks
        .iter()
        .filter_map(|block| {
            let lines: Vec<Line> = block
                .lines
                .iter()
                .filter_map(|line| {
                    let spans: Vec<_> =
                        line.spans.iter().filter(|s| !covered(&s.bbox)).cloned().collect();
                    (!spans.is_empty()).then(|| Line { spans, bbox: line.bbox })
                })
                .collect();
            (!lines.is_empty()).then(|| Block { lines, bbox: block.bbox })
        })
        .collect();

    Cow::Owned(Page { blocks, ..page.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{page, text_block};
    use crate::types::BBox;

    #[test]
    fn header_boundary_is_inclusive_to_body() {
        let p = page(
            2,
            vec![
                text_block("At the cut", 11.0, 100.0, false),
                text_block("Just above", 11.0, 99.99, false),
                text_block("At the footer cut", 11.0, 900.0, false),
                text_block("Below footer cut", 11.0, 900.5, false),
            ],
        );
        let map = classify_page(&p, &RegionConfig::default());
        assert_eq!(
            map.regions,
            vec![Region::Body, Region::Header, Region::Body, Region::Footer]
        );
    }

    #[test]
    fn letter_page_cuts_survive_float_rounding() {
        let mut p = page(
            3,
            vec![
                text_block("At the cut", 11.0, 79.2, false),
                text_block("Just above", 11.0, 79.1, false),
                text_block("At the footer cut", 11.0, 712.8, false),
                text_block("Below footer cut", 11.0, 712.9, false),
            ],
        );
        p.height = 792.0;
        p.width = 612.0;
        let map = classify_page(&p, &RegionConfig::default());
        assert_eq!(
            map.regions,
            vec![Region::Body, Region::Header, Region::Body, Region::Footer]
        );
    }

    #[test]
    fn first_page_header_can_be_title() {
        let blocks = vec![
            text_block("Annual Report 2024", 24.0, 40.0, true),
            text_block("2024", 24.0, 60.0, true),
            text_block("tiny", 8.0, 70.0, false),
        ];
        let first = classify_page(&page(0, blocks.clone()), &RegionConfig::default());
        assert_eq!(first.title_candidates, BTreeSet::from([0]));
        assert!(first.is_body(0));
        assert!(!first.is_body(1));

        let later = classify_page(&page(1, blocks), &RegionConfig::default());
        assert!(later.title_candidates.is_empty());
    }

    #[test]
    fn text_over_images_is_dropped() {
        let mut p = page(
            0,
            vec![
                text_block("LOGO", 14.0, 300.0, false),
                text_block("Body text stays", 11.0, 500.0, false),
            ],
        );
        p.images.push(BBox::new(0.0, 290.0, 600.0, 330.0));
        let cleaned = without_image_text(&p, 0.5);
        assert_eq!(cleaned.blocks.len(), 1);
        assert_eq!(cleaned.blocks[0].text(), "Body text stays");
    }

    #[test]
    fn imageless_page_is_borrowed() {
        let p = page(0, vec![text_block("Text", 11.0, 500.0, false)]);
        assert!(matches!(without_image_text(&p, 0.5), Cow::Borrowed(_)));
    }
}
