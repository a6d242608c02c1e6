use tracing::debug;

use crate::config::Config;
use crate::filter::NoiseFilter;
use crate::fonts::{SizeHistogram, page_stats};
use crate::headings::{BlockClass, classify_block, detect};
use crate::levels::assign_levels;
use crate::merge::merge_adjacent;
use crate::title::select_title;
use crate::types::{FontSize, HeadingCandidate, Outline, OutlineEntry, Page};
use crate::zones::{Region, classify_page, without_image_text};

/// Runs the heading pipeline over the pages of one document.
pub struct OutlineExtractor<'a> {
    config: &'a Config,
    filter: NoiseFilter<'a>,
}

/// How one block was seen, for `--debug-layout`.
#[derive(Debug)]
pub struct BlockReport {
    pub index: usize,
    pub region: Region,
    pub title_candidate: bool,
    pub top: f32,
    pub main_size: Option<FontSize>,
    pub class: BlockClass,
    pub text: String,
}

impl<'a> OutlineExtractor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, filter: NoiseFilter::new(config) }
    }

    pub fn extract(&self, pages: &[Page]) -> Outline {
        let candidates: Vec<HeadingCandidate> =
            self.candidates_per_page(pages).into_iter().flatten().collect();

        let title = select_title(&candidates, &self.config.title);
        let headings: Vec<HeadingCandidate> =
            candidates.into_iter().filter(|c| !title.excludes(&c.text)).collect();
        let levels = assign_levels(&headings, &self.config.levels);

        let outline = headings
            .into_iter()
            .zip(levels)
            .map(|(c, level)| OutlineEntry { level, text: c.text, page: c.page })
            .collect();
        Outline { title: title.title, outline }
    }

    /// Candidates of each page, in page order.
    fn candidates_per_page(&self, pages: &[Page]) -> Vec<Vec<HeadingCandidate>> {
        #[cfg(feature = "parallel")]
        if self.config.parallel {
            use rayon::prelude::*;

            return pages.par_iter().map(|p| self.page_candidates(p)).collect();
        }
        pages.iter().map(|p| self.page_candidates(p)).collect()
    }

    /// Region, font, heading and merge stages for one page. Pages without
    /// body text yield nothing.
    pub fn page_candidates(&self, page: &Page) -> Vec<HeadingCandidate> {
        let page = without_image_text(page, self.config.region.image_overlap);
        let regions = classify_page(&page, &self.config.region);
        let Some(stats) = page_stats(&page, &regions, &self.config.fonts) else {
            debug!(page = page.index, "no body text, skipped");
            return Vec::new();
        };
        debug!(
            page = page.index,
            most_common = %stats.most_common,
            body = %stats.body_size,
            max = %stats.max_size,
            "font statistics"
        );
        let found = detect(&page, &regions, &stats, self.config, &self.filter);
        merge_adjacent(found, &self.config.merge, &self.filter)
    }

    pub fn block_reports(&self, page: &Page) -> Vec<BlockReport> {
        let page = without_image_text(page, self.config.region.image_overlap);
        let regions = classify_page(&page, &self.config.region);
        let body = page_stats(&page, &regions, &self.config.fonts).map(|s| s.body_size);

        page.blocks
            .iter()
            .enumerate()
            .map(|(index, block)| BlockReport {
                index,
                region: regions.region(index),
                title_candidate: regions.is_title_candidate(index),
                top: block.bbox.y0,
                main_size: SizeHistogram::of_block(block).most_common(),
                class: match body {
                    Some(body) if regions.is_body(index) => {
                        classify_block(block, body, page.index, &self.config.classifier)
                    }
                    _ => BlockClass::NotHeading,
                },
                text: block.text(),
            })
            .collect()
    }
}
