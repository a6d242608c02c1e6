//! Reading pre-extracted page layout from JSON.
//!
//! ```json
//! {"pages": [{"height": 792, "width": 612, "blocks": [
//!   {"type": 0, "bbox": [72, 90, 300, 110], "lines": [
//!     {"bbox": [72, 90, 300, 110], "spans": [
//!       {"text": "Overview", "size": 16, "font": "Arial-BoldMT", "flags": 16,
//!        "bbox": [72, 90, 160, 110]}]}]}]}]}
//! ```
//!
//! A bare array of pages is accepted too. The page structure is strict;
//! blocks, lines and spans that lack what the pipeline needs are skipped.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::OutlineError;
use crate::types::{BBox, Block, Line, Page, Span, SpanFlags};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDocument {
    Wrapped { pages: Vec<RawPage> },
    Bare(Vec<RawPage>),
}

#[derive(Deserialize)]
struct RawPage {
    height: f32,
    #[serde(default)]
    width: Option<f32>,
    #[serde(default)]
    blocks: Vec<Value>,
    #[serde(default)]
    images: Vec<Value>,
}

pub fn load_dump(path: &Path) -> Result<Vec<Page>, OutlineError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| OutlineError::Io { path: path.to_path_buf(), source })?;
    parse_dump(&text)
}

pub fn parse_dump(text: &str) -> Result<Vec<Page>, OutlineError> {
    let raw_pages = match serde_json::from_str::<RawDocument>(text)? {
        RawDocument::Wrapped { pages } | RawDocument::Bare(pages) => pages,
    };
    Ok(raw_pages.into_iter().enumerate().map(|(index, raw)| convert_page(index, raw)).collect())
}

fn convert_page(index: usize, raw: RawPage) -> Page {
    let mut images: Vec<BBox> = raw
        .images
        .iter()
        .filter_map(|img| bbox_of(img).or_else(|| bbox_of(img.get("bbox")?)))
        .collect();

    let mut blocks = Vec::new();
    let mut skipped = 0usize;
    for value in &raw.blocks {
        let kind = value.get("type").and_then(Value::as_u64).unwrap_or(0);
        let bbox = value.get("bbox").and_then(bbox_of);
        if kind != 0 {
            images.extend(bbox);
            continue;
        }
        match convert_block(value, bbox, &mut skipped) {
            Some(block) => blocks.push(block),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        debug!(page = index, skipped, "skipped malformed layout fragments");
    }

    let width = raw.width.unwrap_or_else(|| {
        blocks.iter().map(|b: &Block| b.bbox.x1).fold(0.0, f32::max)
    });
    Page { index, width, height: raw.height, blocks, images }
}

fn convert_block(value: &Value, bbox: Option<BBox>, skipped: &mut usize) -> Option<Block> {
    let lines: Vec<Line> = value
        .get("lines")?
        .as_array()?
        .iter()
        .filter_map(|line| {
            let converted = convert_line(line, bbox, skipped);
            if converted.is_none() {
                *skipped += 1;
            }
            converted
        })
        .collect();
    if lines.is_empty() {
        return None;
    }
    let bbox = bbox.or_else(|| BBox::enclosing(lines.iter().map(|l| &l.bbox)))?;
    Some(Block { lines, bbox })
}

fn convert_line(value: &Value, parent: Option<BBox>, skipped: &mut usize) -> Option<Line> {
    let given = value.get("bbox").and_then(bbox_of);
    let spans: Vec<Span> = value
        .get("spans")?
        .as_array()?
        .iter()
        .filter_map(|span| {
            let converted = convert_span(span, given.or(parent));
            if converted.is_none() {
                *skipped += 1;
            }
            converted
        })
        .collect();
    if spans.is_empty() {
        return None;
    }
    let bbox = given.or_else(|| BBox::enclosing(spans.iter().map(|s| &s.bbox)))?;
    Some(Line { spans, bbox })
}

fn convert_span(value: &Value, parent: Option<BBox>) -> Option<Span> {
    let text = value.get("text")?.as_str()?.to_string();
    let size = value.get("size")?.as_f64()? as f32;
    let font = value.get("font").and_then(Value::as_str).unwrap_or_default().to_string();
    let bits = value.get("flags").and_then(Value::as_u64).unwrap_or(0);
    let bbox = value
        .get("bbox")
        .and_then(bbox_of)
        .or(parent)
        .unwrap_or_default();
    Some(Span {
        text,
        size,
        font,
        flags: SpanFlags::from_bits_truncate(bits as u32),
        bbox,
    })
}

fn bbox_of(value: &Value) -> Option<BBox> {
    let coords = value.as_array()?;
    if coords.len() != 4 {
        return None;
    }
    let mut n = [0.0f32; 4];
    for (slot, coord) in n.iter_mut().zip(coords) {
        *slot = coord.as_f64()? as f32;
    }
    Some(BBox::new(n[0], n[1], n[2], n[3]))
}
