//! Hand-built layout for unit tests. Pages are 600x1000 with a top-down
//! origin, so y=100 is the header cut and y=900 the footer cut.

use crate::types::{BBox, Block, Line, Page, Span, SpanFlags};

pub const PAGE_WIDTH: f32 = 600.0;
pub const PAGE_HEIGHT: f32 = 1000.0;
const LEFT_MARGIN: f32 = 72.0;

pub fn span(text: &str, size: f32) -> Span {
    Span {
        text: text.to_string(),
        size,
        font: "Helvetica".to_string(),
        flags: SpanFlags::empty(),
        bbox: BBox::default(),
    }
}

pub fn bold_span(text: &str, size: f32) -> Span {
    Span {
        font: "Helvetica-Bold".to_string(),
        flags: SpanFlags::BOLD,
        ..span(text, size)
    }
}

/// Lay spans out left to right on one baseline with a visible gap between
/// them.
pub fn line(spans: Vec<Span>, y: f32) -> Line {
    let mut x = LEFT_MARGIN;
    let spans: Vec<Span> = spans
        .into_iter()
        .map(|mut s| {
            let width = s.text.chars().count() as f32 * s.size * 0.5;
            s.bbox = BBox::new(x, y, x + width, y + s.size);
            x += width + s.size * 0.3;
            s
        })
        .collect();
    let bbox = BBox::enclosing(spans.iter().map(|s| &s.bbox))
        .unwrap_or(BBox::new(LEFT_MARGIN, y, LEFT_MARGIN, y));
    Line { spans, bbox }
}

pub fn block(lines: Vec<Line>) -> Block {
    let bbox = BBox::enclosing(lines.iter().map(|l| &l.bbox)).unwrap_or_default();
    Block { lines, bbox }
}

/// One block holding one single-span line.
pub fn text_block(text: &str, size: f32, y: f32, bold: bool) -> Block {
    let s = if bold { bold_span(text, size) } else { span(text, size) };
    block(vec![line(vec![s], y)])
}

/// Three lines of 11pt running text starting at `y`.
pub fn body_paragraph(y: f32) -> Block {
    block(vec![
        line(vec![span("This is ordinary running text that fills", 11.0)], y),
        line(vec![span("the page between headings and carries", 11.0)], y + 14.0),
        line(vec![span("the body size of the document.", 11.0)], y + 28.0),
    ])
}

pub fn page(index: usize, blocks: Vec<Block>) -> Page {
    Page { index, width: PAGE_WIDTH, height: PAGE_HEIGHT, blocks, images: Vec::new() }
}
