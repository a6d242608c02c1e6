use crate::fonts::SizeHistogram;
use crate::types::{BBox, Block, FontSize, Line, Page, PageChars, PdfChar, Span, SpanFlags};

/// Group characters into spans, lines, and blocks for a single page. The
/// result uses a top-down origin.
pub fn build_page(page: &PageChars) -> Page {
    Page {
        index: page.page_idx,
        width: page.width,
        height: page.height,
        blocks: group_page(page),
        images: page.images.clone(),
    }
}

fn group_page(page: &PageChars) -> Vec<Block> {
    if page.chars.is_empty() {
        return Vec::new();
    }

    let avg_char_width = compute_avg_char_width(page);
    let dominant_font_size = compute_dominant_font_size(page);

    let spans = group_chars_into_spans(page, avg_char_width, dominant_font_size);
    let lines = group_spans_into_lines(spans);
    let lines = split_columns(lines, page.width);
    group_lines_into_blocks(lines)
}

fn compute_avg_char_width(page: &PageChars) -> f32 {
    let widths: Vec<f32> = page
        .chars
        .iter()
        .filter(|c| c.width > 0.0 && !c.ch.is_whitespace())
        .map(|c| c.width)
        .collect();
    if widths.is_empty() {
        return 5.0;
    }
    widths.iter().sum::<f32>() / widths.len() as f32
}

fn compute_dominant_font_size(page: &PageChars) -> f32 {
    let mut hist = SizeHistogram::default();
    for ch in &page.chars {
        hist.add(FontSize::from_points(ch.font_size));
    }
    hist.most_common().map_or(10.0, FontSize::points)
}

fn is_superscript(size: f32, dominant_size: f32) -> bool {
    size < dominant_size * 0.75
}

struct SpanAccum {
    text: String,
    font: String,
    size: f32,
    bold: bool,
    italic: bool,
    bbox: BBox,
    baseline: f32,
    prev_right: f32,
}

impl SpanAccum {
    fn start(ch: &PdfChar, page_height: f32) -> Self {
        let (bbox, baseline) = char_box(ch, page_height);
        Self {
            text: ch.ch.to_string(),
            font: ch.font_name.clone(),
            size: ch.font_size,
            bold: ch.bold,
            italic: ch.italic,
            bbox,
            baseline,
            prev_right: ch.x + ch.width,
        }
    }

    /// Same style, same baseline, no large jump.
    fn accepts(&self, ch: &PdfChar, page_height: f32, avg_char_width: f32) -> bool {
        let (_, baseline) = char_box(ch, page_height);
        let gap = ch.x - self.prev_right;
        ch.font_name == self.font
            && FontSize::from_points(ch.font_size) == FontSize::from_points(self.size)
            && ch.bold == self.bold
            && ch.italic == self.italic
            && (baseline - self.baseline).abs() <= self.size * 0.5
            && gap <= avg_char_width * 3.0
            && gap >= -avg_char_width
    }

    fn extend(&mut self, ch: &PdfChar, page_height: f32, avg_char_width: f32) {
        if ch.x - self.prev_right > avg_char_width * 0.3 {
            self.push_space();
        }
        let (bbox, _) = char_box(ch, page_height);
        self.bbox = self.bbox.union(&bbox);
        self.text.push(ch.ch);
        self.prev_right = ch.x + ch.width;
    }

    fn push_space(&mut self) {
        if !self.text.ends_with(' ') {
            self.text.push(' ');
        }
    }

    fn finish(self, dominant_font_size: f32) -> Span {
        let mut flags = SpanFlags::empty();
        flags.set(SpanFlags::BOLD, self.bold);
        flags.set(SpanFlags::ITALIC, self.italic);
        flags.set(SpanFlags::SUPERSCRIPT, is_superscript(self.size, dominant_font_size));
        Span {
            text: self.text.trim_end().to_string(),
            size: self.size,
            font: self.font,
            flags,
            bbox: self.bbox,
        }
    }
}

/// Top-down box of a character and the y of its bottom edge.
fn char_box(ch: &PdfChar, page_height: f32) -> (BBox, f32) {
    let bottom = page_height - ch.y;
    let top = page_height - (ch.y + ch.height);
    (BBox::new(ch.x, top, ch.x + ch.width, bottom), bottom)
}

fn group_chars_into_spans(
    page: &PageChars,
    avg_char_width: f32,
    dominant_font_size: f32,
) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut acc: Option<SpanAccum> = None;

    for ch in &page.chars {
        if ch.ch.is_whitespace() {
            if let Some(acc) = acc.as_mut() {
                acc.push_space();
                acc.prev_right = ch.x + ch.width;
            }
            continue;
        }
        let continues = acc
            .as_ref()
            .is_some_and(|a| a.accepts(ch, page.height, avg_char_width));
        if !continues {
            if let Some(done) = acc.take() {
                spans.push(done.finish(dominant_font_size));
            }
        }
        match acc.as_mut() {
            Some(a) => a.extend(ch, page.height, avg_char_width),
            None => acc = Some(SpanAccum::start(ch, page.height)),
        }
    }
    if let Some(done) = acc {
        spans.push(done.finish(dominant_font_size));
    }
    spans
}

fn group_spans_into_lines(spans: Vec<Span>) -> Vec<Line> {
    let mut lines: Vec<Line> = Vec::new();

    for span in spans {
        let tolerance = span.size * 0.5;
        let target = lines
            .iter_mut()
            .rev()
            .take(5)
            .find(|line| (span.bbox.y1 - line.bbox.y1).abs() < tolerance);

        match target {
            Some(line) => {
                line.bbox = line.bbox.union(&span.bbox);
                line.spans.push(span);
            }
            None => lines.push(Line { bbox: span.bbox, spans: vec![span] }),
        }
    }

    for line in &mut lines {
        line.spans.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    }
    lines.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0));
    lines
}

/// Detect two-column layout and split lines into reading order.
///
/// If a consistent vertical gap divides the page into two columns,
/// splits each line at the boundary and returns left-column lines
/// followed by right-column lines (both top-to-bottom).
fn split_columns(lines: Vec<Line>, page_width: f32) -> Vec<Line> {
    let Some(boundary) = detect_column_boundary(&lines, page_width) else {
        return lines;
    };

    let mut left_lines = Vec::new();
    let mut right_lines = Vec::new();

    for line in lines {
        let (left, right): (Vec<Span>, Vec<Span>) = line
            .spans
            .into_iter()
            .partition(|s| (s.bbox.x0 + s.bbox.x1) / 2.0 < boundary);
        left_lines.extend(make_line(left));
        right_lines.extend(make_line(right));
    }

    left_lines.extend(right_lines);
    left_lines
}

/// Find the x-coordinate of a column gap, if the page is two-column.
///
/// Looks for a vertical strip in the middle 30-70% of the page where
/// no spans exist, with spans on both sides.
fn detect_column_boundary(lines: &[Line], page_width: f32) -> Option<f32> {
    if page_width <= 0.0 || lines.is_empty() {
        return None;
    }
    let n_buckets = 200;
    let bucket_width = page_width / n_buckets as f32;
    let mut coverage = vec![0u32; n_buckets];

    let bucket = |x: f32| ((x.max(0.0) / page_width) * n_buckets as f32) as usize;
    for span in lines.iter().flat_map(|l| &l.spans) {
        let start = bucket(span.bbox.x0).min(n_buckets - 1);
        let end = bucket(span.bbox.x1).min(n_buckets - 1);
        for slot in &mut coverage[start..=end.max(start)] {
            *slot += 1;
        }
    }

    let gap = find_gap_in_coverage(&coverage, lines.len())?;
    let left_used = coverage[..gap.0].iter().any(|&c| c > 0);
    let right_used = coverage[gap.0 + gap.1..].iter().any(|&c| c > 0);
    (left_used && right_used).then(|| (gap.0 as f32 + gap.1 as f32 / 2.0) * bucket_width)
}

/// Widest sparse run `(start, len)` of buckets in the middle of the page.
fn find_gap_in_coverage(coverage: &[u32], num_lines: usize) -> Option<(usize, usize)> {
    let n_buckets = coverage.len();
    let search_start = n_buckets * 30 / 100;
    let search_end = n_buckets * 70 / 100;
    let threshold = (num_lines as u32) / 10;

    let mut best: Option<(usize, usize)> = None;
    let mut gap_start = None;

    for (i, &val) in coverage.iter().enumerate().take(search_end).skip(search_start) {
        if val <= threshold {
            let start = *gap_start.get_or_insert(i);
            let len = i - start + 1;
            if best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((start, len));
            }
        } else {
            gap_start = None;
        }
    }
    best
}

fn make_line(spans: Vec<Span>) -> Option<Line> {
    let bbox = BBox::enclosing(spans.iter().map(|s| &s.bbox))?;
    Some(Line { spans, bbox })
}

fn line_font_size(line: &Line) -> f32 {
    line.spans.iter().map(|s| s.size).fold(0.0, f32::max)
}

fn group_lines_into_blocks(lines: Vec<Line>) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();

    for line in lines {
        let size = line_font_size(&line);
        let target = blocks.last_mut().filter(|block| {
            block.lines.last().is_some_and(|prev| {
                let gap = line.bbox.y0 - prev.bbox.y0;
                let x_overlap = line.bbox.x0 < prev.bbox.x1 && line.bbox.x1 > prev.bbox.x0;
                (0.0..size * 1.5).contains(&gap) && x_overlap
            })
        });

        match target {
            Some(block) => {
                block.bbox = block.bbox.union(&line.bbox);
                block.lines.push(line);
            }
            None => blocks.push(Block { bbox: line.bbox, lines: vec![line] }),
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEIGHT: f32 = 800.0;

    /// Characters of `text` on one baseline (PDF coordinates, bottom-left
    /// origin), each half an em wide.
    fn run(text: &str, x: f32, baseline: f32, size: f32, bold: bool) -> Vec<PdfChar> {
        text.chars()
            .enumerate()
            .map(|(i, ch)| PdfChar {
                ch,
                x: x + i as f32 * size * 0.5,
                y: baseline,
                width: size * 0.5,
                height: size,
                font_size: size,
                font_name: if bold { "Arial-Bold".into() } else { "Arial".into() },
                bold,
                italic: false,
            })
            .collect()
    }

    fn page_of(chars: Vec<PdfChar>) -> Page {
        build_page(&PageChars {
            page_idx: 0,
            width: 600.0,
            height: HEIGHT,
            chars,
            images: Vec::new(),
        })
    }

    #[test]
    fn words_join_into_one_span() {
        let page = page_of(run("Hello World", 72.0, 700.0, 10.0, false));
        assert_eq!(page.blocks.len(), 1);
        let line = &page.blocks[0].lines[0];
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.text(), "Hello World");
        // Flipped: baseline at 700 from the bottom is 100 from the top.
        assert_eq!(line.bbox.y1, 100.0);
        assert_eq!(line.bbox.y0, 90.0);
    }

    #[test]
    fn style_change_splits_spans_on_one_line() {
        let mut chars = run("Note:", 72.0, 700.0, 10.0, true);
        chars.extend(run("details follow", 72.0 + 6.0 * 5.0, 700.0, 10.0, false));
        let page = page_of(chars);
        let line = &page.blocks[0].lines[0];
        assert_eq!(line.spans.len(), 2);
        assert!(line.spans[0].is_bold());
        assert!(!line.spans[1].is_bold());
        assert_eq!(line.text(), "Note: details follow");
    }

    #[test]
    fn heading_and_paragraph_form_separate_blocks() {
        let mut chars = run("Introduction", 72.0, 700.0, 16.0, true);
        chars.extend(run("first line of the paragraph", 72.0, 670.0, 10.0, false));
        chars.extend(run("second line of the paragraph", 72.0, 658.0, 10.0, false));
        let page = page_of(chars);
        assert_eq!(page.blocks.len(), 2);
        assert_eq!(page.blocks[0].text(), "Introduction");
        assert_eq!(page.blocks[1].lines.len(), 2);
        assert!(page.blocks[0].bbox.y0 < page.blocks[1].bbox.y0);
    }

    #[test]
    fn two_columns_read_left_then_right() {
        let left = "left column words in a long row here";
        let right = "right column words in a long row too";
        let mut chars = Vec::new();
        for (i, baseline) in [700.0, 688.0, 676.0].into_iter().enumerate() {
            chars.extend(run(&format!("{left} {i}"), 50.0, baseline, 10.0, false));
        }
        for (i, baseline) in [700.0, 688.0, 676.0].into_iter().enumerate() {
            chars.extend(run(&format!("{right} {i}"), 350.0, baseline, 10.0, false));
        }
        let page = page_of(chars);
        assert_eq!(page.blocks.len(), 2);
        assert!(page.blocks[0].text().starts_with("left column"));
        assert!(page.blocks[1].text().starts_with("right column"));
        assert_eq!(page.blocks[0].lines.len(), 3);
    }

    #[test]
    fn small_text_is_superscript() {
        let mut chars = run("Body text here", 72.0, 700.0, 10.0, false);
        chars.extend(run("12", 150.0, 704.0, 6.0, false));
        let page = page_of(chars);
        let spans: Vec<&Span> = page.blocks.iter().flat_map(|b| b.text_spans()).collect();
        assert!(spans.iter().any(|s| s.text == "12" && s.flags.contains(SpanFlags::SUPERSCRIPT)));
    }

    #[test]
    fn empty_page_has_no_blocks() {
        assert!(page_of(Vec::new()).blocks.is_empty());
    }
}
