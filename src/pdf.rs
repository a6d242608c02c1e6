use std::path::Path;

use anyhow::{Context, Result};
use pdfium_render::prelude::*;
use tracing::debug;

use crate::batch::Budget;
use crate::types::{BBox, PageChars, PdfChar};

/// Bind pdfium from an explicit library path or the system library.
pub fn bind_pdfium(pdfium_path: Option<&str>) -> Result<Pdfium> {
    let bindings = if let Some(path) = pdfium_path {
        Pdfium::bind_to_library(path)
            .with_context(|| format!("Failed to load pdfium from: {path}"))?
    } else {
        Pdfium::bind_to_system_library()
            .context("Failed to find pdfium. Install pdfium-binaries or use --pdfium-path")?
    };
    Ok(Pdfium::new(bindings))
}

/// Load a PDF and extract characters with positions and style from every
/// page. The budget is checked before each page.
pub fn extract_chars(pdfium: &Pdfium, path: &Path, budget: &Budget) -> Result<Vec<PageChars>> {
    let document = pdfium
        .load_pdf_from_file(path, None)
        .with_context(|| format!("Failed to load PDF: {}", path.display()))?;

    let mut pages = Vec::new();
    for (idx, page) in document.pages().iter().enumerate() {
        budget.check()?;
        pages.push(extract_page_chars(idx, &page)?);
    }
    Ok(pages)
}

fn extract_page_chars(page_idx: usize, page: &PdfPage) -> Result<PageChars> {
    let text_page = page
        .text()
        .with_context(|| format!("Failed to load text for page {}", page_idx + 1))?;

    let chars: Vec<PdfChar> = text_page
        .chars()
        .iter()
        .filter_map(|ch| convert_text_char(&ch))
        .collect();

    let height = page.height().value;
    let images: Vec<BBox> = page
        .objects()
        .iter()
        .filter(|obj| obj.object_type() == PdfPageObjectType::Image)
        .filter_map(|obj| obj.bounds().ok())
        .map(|quad| {
            let rect = quad.to_rect();
            BBox::new(
                rect.left().value,
                height - rect.top().value,
                rect.right().value,
                height - rect.bottom().value,
            )
        })
        .collect();

    debug!(page = page_idx, chars = chars.len(), images = images.len(), "extracted page");
    Ok(PageChars {
        page_idx,
        width: page.width().value,
        height,
        chars,
        images,
    })
}

fn convert_text_char(ch: &PdfPageTextChar) -> Option<PdfChar> {
    let unicode = ch.unicode_char()?;
    if unicode.is_control() && unicode != ' ' {
        return None;
    }

    // Skip zero-size font characters (watermarks, hidden text)
    let font_size = ch.scaled_font_size().value;
    if font_size < 0.5 {
        return None;
    }

    let (x, y, width, height) = char_bounds(ch)?;
    let weight_is_bold = match ch.font_weight() {
        Some(PdfFontWeight::Weight600)
        | Some(PdfFontWeight::Weight700Bold)
        | Some(PdfFontWeight::Weight800)
        | Some(PdfFontWeight::Weight900) => true,
        Some(PdfFontWeight::Custom(weight)) => weight >= 600,
        _ => false,
    };

    Some(PdfChar {
        ch: unicode,
        x,
        y,
        width,
        height,
        font_size,
        font_name: ch.font_name(),
        bold: weight_is_bold || ch.font_is_bold_reenforced(),
        italic: ch.font_is_italic(),
    })
}

fn char_bounds(ch: &PdfPageTextChar) -> Option<(f32, f32, f32, f32)> {
    let rect = ch.loose_bounds().or_else(|_| ch.tight_bounds()).ok()?;
    Some((
        rect.left().value,
        rect.bottom().value,
        (rect.right().value - rect.left().value).abs(),
        (rect.top().value - rect.bottom().value).abs(),
    ))
}
