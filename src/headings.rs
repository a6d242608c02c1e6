use std::collections::BTreeSet;

use tracing::debug;

use crate::config::{ClassifierConfig, Config};
use crate::filter::NoiseFilter;
use crate::fonts::{FontStats, SizeHistogram};
use crate::reconstruct::reconstruct;
use crate::types::{Block, CandidateSource, FontSize, HeadingCandidate, Line, LineSpan, Page, Span};
use crate::zones::RegionMap;

/// Verdict of the block-level classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockClass {
    /// Few sizes, mostly one size well above body text.
    Heading { size: FontSize },
    /// First-page block far above body size, whatever its size mix.
    TitleStyle { size: FontSize },
    NotHeading,
}

impl BlockClass {
    pub fn label(self) -> &'static str {
        match self {
            BlockClass::Heading { .. } => "heading",
            BlockClass::TitleStyle { .. } => "title-style",
            BlockClass::NotHeading => "-",
        }
    }
}

/// Blocks and lines of one page that already produced a candidate, keyed by
/// their position in the page.
#[derive(Debug, Default)]
pub struct Visited {
    blocks: BTreeSet<usize>,
    lines: BTreeSet<(usize, usize)>,
}

impl Visited {
    pub fn consume_block(&mut self, block: usize) {
        self.blocks.insert(block);
    }

    pub fn is_consumed(&self, block: usize) -> bool {
        self.blocks.contains(&block)
    }

    pub fn visit_line(&mut self, block: usize, line: usize) {
        self.lines.insert((block, line));
    }

    pub fn is_visited(&self, block: usize, line: usize) -> bool {
        self.lines.contains(&(block, line))
    }
}

pub fn classify_block(
    block: &Block,
    body: FontSize,
    page_index: usize,
    config: &ClassifierConfig,
) -> BlockClass {
    let hist = SizeHistogram::of_block(block);
    let Some(main) = hist.most_common() else {
        return BlockClass::NotHeading;
    };
    if block.text().trim().chars().count() > config.max_block_chars {
        return BlockClass::NotHeading;
    }

    let coverage = hist.count(main) as f32 / hist.total() as f32;
    if hist.distinct() <= config.max_distinct_sizes
        && main.exceeds(body, config.heading_ratio)
        && coverage > config.min_coverage
    {
        return BlockClass::Heading { size: main };
    }

    if page_index == 0 {
        let avg = block.avg_font_size().map(FontSize::from_points).unwrap_or_default();
        if avg.exceeds(body, config.title_style_ratio) {
            let large = SizeHistogram::from_spans(
                block.text_spans().filter(|s| s.size_key().exceeds(body, config.heading_ratio)),
            );
            if let Some(size) = large.most_common() {
                return BlockClass::TitleStyle { size };
            }
        }
    }
    BlockClass::NotHeading
}

/// Run the block pass, the mixed-line pass and the title-region pass over
/// one page. A block yields candidates in at most one pass.
pub fn detect(
    page: &Page,
    regions: &RegionMap,
    stats: &FontStats,
    config: &Config,
    filter: &NoiseFilter<'_>,
) -> Vec<HeadingCandidate> {
    let mut detector = Detector {
        page,
        body: stats.body_size,
        config,
        filter,
        offsets: page.line_offsets(),
        visited: Visited::default(),
        found: Vec::new(),
    };

    detector.block_pass(regions);
    let from_blocks = detector.found.len();
    detector.line_pass(regions);
    let from_lines = detector.found.len() - from_blocks;
    detector.title_region_pass(regions);
    let from_title = detector.found.len() - from_blocks - from_lines;

    debug!(
        page = page.index,
        body = %stats.body_size,
        blocks = from_blocks,
        lines = from_lines,
        title_region = from_title,
        "heading candidates"
    );
    detector.found
}

struct Detector<'a> {
    page: &'a Page,
    body: FontSize,
    config: &'a Config,
    filter: &'a NoiseFilter<'a>,
    offsets: Vec<usize>,
    visited: Visited,
    found: Vec<HeadingCandidate>,
}

impl Detector<'_> {
    fn block_pass(&mut self, regions: &RegionMap) {
        let (page, config) = (self.page, self.config);
        let cfg = &config.classifier;
        for (idx, block) in regions.body_blocks(page) {
            let spans: Vec<&Span> = match classify_block(block, self.body, page.index, cfg) {
                BlockClass::Heading { size } => {
                    block.text_spans().filter(|s| s.size_key() == size).collect()
                }
                BlockClass::TitleStyle { .. } => block
                    .text_spans()
                    .filter(|s| s.size_key().exceeds(self.body, cfg.heading_ratio))
                    .collect(),
                BlockClass::NotHeading => continue,
            };
            let lines = self.block_lines(idx, block);
            if self.emit(&spans, Some(block.bbox.y0), lines, CandidateSource::Block) {
                self.visited.consume_block(idx);
            }
        }
    }

    fn line_pass(&mut self, regions: &RegionMap) {
        let page = self.page;
        for (idx, block) in regions.body_blocks(page) {
            if self.visited.is_consumed(idx) {
                continue;
            }
            let mut yielded = false;
            for (line_idx, line) in block.lines.iter().enumerate() {
                if self.visited.is_visited(idx, line_idx) {
                    continue;
                }
                let Some(spans) = self.heading_spans(line) else {
                    continue;
                };
                let lines = LineSpan::single(self.offsets[idx] + line_idx);
                if self.emit(&spans, Some(line.bbox.y0), lines, CandidateSource::MixedLine) {
                    self.visited.visit_line(idx, line_idx);
                    yielded = true;
                }
            }
            if yielded {
                self.visited.consume_block(idx);
            }
        }
    }

    fn title_region_pass(&mut self, regions: &RegionMap) {
        let page = self.page;
        if page.index != 0 {
            return;
        }
        for &idx in &regions.title_candidates {
            if self.visited.is_consumed(idx) {
                continue;
            }
            let Some(block) = page.blocks.get(idx) else {
                continue;
            };
            let Some(main) = SizeHistogram::of_block(block).most_common() else {
                continue;
            };
            if main <= self.body {
                continue;
            }
            let spans: Vec<&Span> = block.text_spans().filter(|s| s.size_key() == main).collect();
            let lines = self.block_lines(idx, block);
            if self.emit(&spans, Some(block.bbox.y0), lines, CandidateSource::TitleRegion) {
                self.visited.consume_block(idx);
            }
        }
    }

    /// Spans of a body-paragraph line that look like an embedded subheading,
    /// if they make up most of the line.
    fn heading_spans<'l>(&self, line: &'l Line) -> Option<Vec<&'l Span>> {
        let cfg = &self.config.classifier;
        if line.text_spans().count() > cfg.max_line_spans
            || gap_count(&line.text()) > cfg.max_line_gaps
        {
            return None;
        }

        let mut spans: Vec<&Span> = line
            .text_spans()
            .filter(|s| {
                let size = s.size_key();
                (size.exceeds(self.body, cfg.line_bold_ratio) && s.is_bold())
                    || size.exceeds(self.body, cfg.line_large_ratio)
            })
            .collect();

        if spans.is_empty() && cfg.body_emphasis_lines {
            let all_bold_body = line.text_spans().next().is_some()
                && line.text_spans().all(|s| s.is_bold() && s.size_key() == self.body);
            if all_bold_body {
                spans = line.text_spans().collect();
            }
        }
        if spans.is_empty() {
            return None;
        }

        let visible = |s: &&Span| s.text.chars().filter(|c| !c.is_whitespace()).count();
        let heading_chars: usize = spans.iter().map(visible).sum();
        let line_chars: usize = line.text_spans().map(|s| visible(&s)).sum();
        (line_chars > 0 && heading_chars as f32 / line_chars as f32 >= cfg.min_coverage)
            .then_some(spans)
    }

    fn block_lines(&self, idx: usize, block: &Block) -> LineSpan {
        let first = self.offsets[idx];
        LineSpan { first, last: first + block.lines.len().saturating_sub(1) }
    }

    /// Reconstruct, filter and record one candidate. Returns whether it was
    /// kept.
    fn emit(
        &mut self,
        spans: &[&Span],
        y: Option<f32>,
        lines: LineSpan,
        source: CandidateSource,
    ) -> bool {
        let Some(size) = SizeHistogram::from_spans(spans.iter().copied()).most_common() else {
            return false;
        };
        let Some(text) = reconstruct(spans.iter().map(|s| s.text.as_str()), &self.config.reconstruct)
        else {
            return false;
        };
        if let Some(rule) = self.filter.rejection(&text) {
            debug!(page = self.page.index, rule, text = %text, ?source, "candidate rejected");
            return false;
        }
        self.found.push(HeadingCandidate {
            text,
            size,
            bold: spans.iter().any(|s| s.is_bold()),
            italic: spans.iter().any(|s| s.is_italic()),
            page: self.page.index,
            y,
            lines,
            source,
        });
        true
    }
}

/// Tab and multi-space gaps in a line; many of them mean a table row.
fn gap_count(text: &str) -> usize {
    let mut gaps = 0;
    let mut spaces = 0;
    for c in text.trim().chars() {
        match c {
            '\t' => {
                gaps += 1;
                spaces = 0;
            }
            ' ' => {
                spaces += 1;
                if spaces == 2 {
                    gaps += 1;
                }
            }
            _ => spaces = 0,
        }
    }
    gaps
}
