use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// A character extracted from a PDF page with position and font info.
/// Coordinates are PDF user space (origin bottom-left).
#[derive(Debug, Clone)]
pub struct PdfChar {
    pub ch: char,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub font_size: f32,
    pub font_name: String,
    pub bold: bool,
    pub italic: bool,
}

/// All characters on a single PDF page, plus the boxes of embedded images
/// (already flipped to a top-down origin).
#[derive(Debug)]
pub struct PageChars {
    pub page_idx: usize,
    pub width: f32,
    pub height: f32,
    pub chars: Vec<PdfChar>,
    pub images: Vec<BBox>,
}

/// Axis-aligned box with a top-down origin: `y0` is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0: x0.min(x1), y0: y0.min(y1), x1: x0.max(x1), y1: y0.max(y1) }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn intersection_area(&self, other: &BBox) -> f32 {
        let w = self.x1.min(other.x1) - self.x0.max(other.x0);
        let h = self.y1.min(other.y1) - self.y0.max(other.y0);
        if w <= 0.0 || h <= 0.0 { 0.0 } else { w * h }
    }

    /// Union of all boxes, or `None` for an empty iterator.
    pub fn enclosing<'a>(boxes: impl IntoIterator<Item = &'a BBox>) -> Option<BBox> {
        boxes.into_iter().copied().reduce(|a, b| a.union(&b))
    }
}

/// Font size quantised to 0.1 units. All size comparisons go through this
/// key so that 11.96 and 12.04 land in the same bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FontSize(i32);

impl FontSize {
    pub fn from_points(points: f32) -> Self {
        Self((points * 10.0).round() as i32)
    }

    pub fn points(self) -> f32 {
        self.0 as f32 / 10.0
    }

    /// True when `self` is strictly larger than `base` and at least
    /// `ratio` times it.
    pub fn exceeds(self, base: FontSize, ratio: f32) -> bool {
        self > base && self.points() >= base.points() * ratio
    }
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.points())
    }
}

bitflags! {
    /// Style bits of a span, in the usual layout-dump bit order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SpanFlags: u32 {
        const SUPERSCRIPT = 1 << 0;
        const ITALIC = 1 << 1;
        const SERIF = 1 << 2;
        const MONOSPACE = 1 << 3;
        const BOLD = 1 << 4;
    }
}

const BOLD_NAME_MARKERS: &[&str] = &["bold", "black", "heavy", "semibold", "demi"];
const ITALIC_NAME_MARKERS: &[&str] = &["italic", "oblique"];

fn font_name_has(font: &str, markers: &[&str]) -> bool {
    let lower = font.to_ascii_lowercase();
    markers.iter().any(|m| lower.contains(m))
}

/// A run of text sharing one font, size, and style.
#[derive(Debug, Clone)]
pub struct Span {
    pub text: String,
    pub size: f32,
    pub font: String,
    pub flags: SpanFlags,
    pub bbox: BBox,
}

impl Span {
    pub fn size_key(&self) -> FontSize {
        FontSize::from_points(self.size)
    }

    pub fn is_bold(&self) -> bool {
        self.flags.contains(SpanFlags::BOLD) || font_name_has(&self.font, BOLD_NAME_MARKERS)
    }

    pub fn is_italic(&self) -> bool {
        self.flags.contains(SpanFlags::ITALIC) || font_name_has(&self.font, ITALIC_NAME_MARKERS)
    }

    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Spans sharing a baseline, in left-to-right order.
#[derive(Debug, Clone)]
pub struct Line {
    pub spans: Vec<Span>,
    pub bbox: BBox,
}

impl Line {
    /// Concatenated span text. A space is inserted between spans only when
    /// neither side carries whitespace and the glyphs are visibly apart.
    pub fn text(&self) -> String {
        let mut out = String::new();
        let mut prev: Option<&Span> = None;
        for span in &self.spans {
            if let Some(p) = prev {
                let touching = p.text.ends_with(char::is_whitespace)
                    || span.text.starts_with(char::is_whitespace);
                let gap = span.bbox.x0 - p.bbox.x1;
                if !touching && gap > span.size.max(p.size) * 0.15 {
                    out.push(' ');
                }
            }
            out.push_str(&span.text);
            prev = Some(span);
        }
        out
    }

    pub fn text_spans(&self) -> impl Iterator<Item = &Span> {
        self.spans.iter().filter(|s| s.has_text())
    }
}

/// Lines forming one layout paragraph.
#[derive(Debug, Clone)]
pub struct Block {
    pub lines: Vec<Line>,
    pub bbox: BBox,
}

impl Block {
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn text_spans(&self) -> impl Iterator<Item = &Span> {
        self.lines.iter().flat_map(|l| l.text_spans())
    }

    /// Mean raw span size over spans that carry text.
    pub fn avg_font_size(&self) -> Option<f32> {
        let (sum, n) = self
            .text_spans()
            .fold((0.0f32, 0usize), |(sum, n), s| (sum + s.size, n + 1));
        (n > 0).then(|| sum / n as f32)
    }
}

/// One page of layout, top-down coordinates, blocks in document order.
#[derive(Debug, Clone)]
pub struct Page {
    pub index: usize,
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<Block>,
    pub images: Vec<BBox>,
}

impl Page {
    /// Ordinal of the first line of each block when all lines of the page
    /// are numbered in block order.
    pub fn line_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.blocks.len());
        let mut next = 0;
        for block in &self.blocks {
            offsets.push(next);
            next += block.lines.len();
        }
        offsets
    }
}

/// Inclusive range of page-level line ordinals a candidate was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub first: usize,
    pub last: usize,
}

impl LineSpan {
    pub fn single(ordinal: usize) -> Self {
        Self { first: ordinal, last: ordinal }
    }

    /// True when `next` starts on the line right after this span ends
    /// (or overlaps it), i.e. no other line sits between them.
    pub fn is_followed_by(&self, next: &LineSpan) -> bool {
        next.first >= self.first && next.first <= self.last + 1
    }
}

/// Which detection pass produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Block,
    MixedLine,
    TitleRegion,
}

/// A reconstructed heading string that passed the noise filter but has no
/// level yet.
#[derive(Debug, Clone)]
pub struct HeadingCandidate {
    pub text: String,
    pub size: FontSize,
    pub bold: bool,
    pub italic: bool,
    pub page: usize,
    pub y: Option<f32>,
    pub lines: LineSpan,
    pub source: CandidateSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    H1,
    H2,
    H3,
    H4,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::H1, Level::H2, Level::H3, Level::H4];

    /// Level for a zero-based rank; ranks past H4 clamp to H4.
    pub fn from_rank(rank: usize) -> Self {
        Self::ALL[rank.min(Self::ALL.len() - 1)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub level: Level,
    pub text: String,
    pub page: usize,
}

/// Final per-document result, serialised as-is.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Outline {
    pub title: String,
    pub outline: Vec<OutlineEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_rounds_to_tenths() {
        assert_eq!(FontSize::from_points(11.96), FontSize::from_points(12.04));
        assert_eq!(FontSize::from_points(11.96).to_string(), "12.0");
        assert_ne!(FontSize::from_points(12.0), FontSize::from_points(12.1));
    }

    #[test]
    fn exceeds_needs_both_ratio_and_strict_growth() {
        let body = FontSize::from_points(10.0);
        assert!(FontSize::from_points(12.0).exceeds(body, 1.15));
        assert!(!FontSize::from_points(11.0).exceeds(body, 1.15));
        assert!(!body.exceeds(body, 1.0));
    }

    #[test]
    fn style_from_bits_or_font_name() {
        let mut span = Span {
            text: "x".into(),
            size: 10.0,
            font: "Helvetica".into(),
            flags: SpanFlags::empty(),
            bbox: BBox::default(),
        };
        assert!(!span.is_bold() && !span.is_italic());
        span.flags = SpanFlags::BOLD;
        assert!(span.is_bold());
        span.flags = SpanFlags::empty();
        span.font = "Arial-BoldItalicMT".into();
        assert!(span.is_bold() && span.is_italic());
        span.font = "Times-Oblique".into();
        assert!(span.is_italic() && !span.is_bold());
    }

    #[test]
    fn line_text_inserts_space_only_at_gaps() {
        let mk = |text: &str, x0: f32, x1: f32| Span {
            text: text.into(),
            size: 10.0,
            font: String::new(),
            flags: SpanFlags::empty(),
            bbox: BBox::new(x0, 0.0, x1, 10.0),
        };
        let line = Line {
            spans: vec![mk("Bold", 0.0, 20.0), mk("er", 20.0, 30.0), mk("word", 40.0, 60.0)],
            bbox: BBox::new(0.0, 0.0, 60.0, 10.0),
        };
        assert_eq!(line.text(), "Bolder word");
    }

    #[test]
    fn line_span_adjacency() {
        let a = LineSpan { first: 2, last: 3 };
        assert!(a.is_followed_by(&LineSpan::single(4)));
        assert!(!a.is_followed_by(&LineSpan::single(5)));
        assert!(!a.is_followed_by(&LineSpan::single(1)));
    }

    #[test]
    fn level_rank_clamps() {
        assert_eq!(Level::from_rank(0), Level::H1);
        assert_eq!(Level::from_rank(9), Level::H4);
        assert_eq!(serde_json::to_string(&Level::H2).unwrap(), "\"H2\"");
    }
}
