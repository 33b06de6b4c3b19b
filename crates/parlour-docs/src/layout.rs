//! # Page Layout
//!
//! A cursor over an A4 document. Coordinates are millimetres from the
//! bottom-left corner, which is how printpdf places text; the cursor
//! walks down from the top margin and starts a new page when a block
//! would run into the footer.
//!
//! ```text
//! ┌──────────────────────────┐ ← PAGE_HEIGHT
//! │  header                  │ ← TOP (cursor starts here)
//! │  ...                     │
//! │  table rows              │
//! │  ...                     │
//! │                          │ ← BOTTOM (no content below)
//! │  footer  Page 1 of 2     │ ← FOOTER_Y
//! └──────────────────────────┘ 0
//! ```

use std::io::BufWriter;

use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfLayerReference, PdfPageIndex, Point,
};

use crate::error::{DocError, DocResult};

pub const PAGE_WIDTH: f32 = 210.0;
pub const PAGE_HEIGHT: f32 = 297.0;
pub const LEFT: f32 = 18.0;
pub const RIGHT: f32 = PAGE_WIDTH - 18.0;
const TOP: f32 = PAGE_HEIGHT - 18.0;
const BOTTOM: f32 = 24.0;
const FOOTER_Y: f32 = 12.0;

/// Millimetres per point.
const PT_TO_MM: f32 = 25.4 / 72.0;

/// Average Helvetica advance as a share of the font size. printpdf gives
/// no metrics for built-in fonts, so right alignment works off this.
const AVG_CHAR_EM: f32 = 0.54;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weight {
    Regular,
    Bold,
}

/// Line height for a font size, in millimetres.
pub fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.35
}

/// Estimated width of `text` at `size`, in millimetres.
pub fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * PT_TO_MM * AVG_CHAR_EM
}

/// Maps text onto what the built-in fonts can draw.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '£' => out.push_str("GBP "),
            '€' => out.push_str("EUR "),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\t' => out.push(' '),
            c if c.is_ascii() && !c.is_ascii_control() => out.push(c),
            c if c.is_alphabetic() => out.push('?'),
            _ => {}
        }
    }
    out
}

/// Greedy word wrap to `max_chars` per line. Words longer than a line are
/// split. Blank input lines are dropped.
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for raw in text.lines() {
        let mut current = String::new();
        for word in raw.split_whitespace() {
            let mut word = word.to_string();
            while word.chars().count() > max_chars {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let head: String = word.chars().take(max_chars).collect();
                word = word.chars().skip(max_chars).collect();
                lines.push(head);
            }
            if word.is_empty() {
                continue;
            }
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > max_chars {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

pub struct PageWriter {
    doc: PdfDocumentReference,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    footer: String,
}

impl PageWriter {
    /// Opens a one-page document. `footer` is printed on every page next
    /// to the page number.
    pub fn new(title: &str, footer: &str) -> DocResult<Self> {
        let (doc, page, layer) =
            PdfDocument::new(sanitize(title), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(DocError::render)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(DocError::render)?;

        Ok(PageWriter {
            doc,
            pages: vec![(page, layer)],
            regular,
            bold,
            y: TOP,
            footer: sanitize(footer),
        })
    }

    fn layer(&self) -> PdfLayerReference {
        // `pages` always holds the first page
        let (page, layer) = self.pages[self.pages.len() - 1];
        self.doc.get_page(page).get_layer(layer)
    }

    fn font(&self, weight: Weight) -> &IndirectFontRef {
        match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        }
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    pub fn down(&mut self, mm: f32) {
        self.y -= mm;
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Room left above the bottom margin.
    pub fn remaining(&self) -> f32 {
        self.y - BOTTOM
    }

    pub fn new_page(&mut self) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.pages.push((page, layer));
        self.y = TOP;
    }

    /// Starts a new page unless `height` millimetres still fit. Returns
    /// true when a page was added.
    pub fn ensure_space(&mut self, height: f32) -> bool {
        if self.remaining() < height {
            self.new_page();
            true
        } else {
            false
        }
    }

    /// Text with its left edge at `x` on the cursor line.
    pub fn text(&self, x: f32, size: f32, weight: Weight, text: &str) {
        self.text_at(x, self.y, size, weight, text);
    }

    pub fn text_at(&self, x: f32, y: f32, size: f32, weight: Weight, text: &str) {
        let text = sanitize(text);
        if text.is_empty() {
            return;
        }
        self.layer()
            .use_text(text, size, Mm(x), Mm(y), self.font(weight));
    }

    /// Text with its right edge at `x_right` on the cursor line.
    pub fn text_right(&self, x_right: f32, size: f32, weight: Weight, text: &str) {
        let text = sanitize(text);
        let x = (x_right - text_width(&text, size)).max(LEFT);
        self.text_at(x, self.y, size, weight, &text);
    }

    /// Horizontal rule just below the cursor line.
    pub fn rule(&self, x1: f32, x2: f32, thickness: f32) {
        let y = self.y - 1.5;
        let layer = self.layer();
        layer.set_outline_thickness(thickness);
        layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y)), false),
                (Point::new(Mm(x2), Mm(y)), false),
            ],
            is_closed: false,
        });
    }

    /// Writes the page footers and serialises the document.
    pub fn finish(self) -> DocResult<Vec<u8>> {
        let total = self.pages.len();
        for (index, (page, layer)) in self.pages.iter().enumerate() {
            let layer = self.doc.get_page(*page).get_layer(*layer);
            layer.use_text(self.footer.clone(), 8.0, Mm(LEFT), Mm(FOOTER_Y), &self.regular);

            let label = format!("Page {} of {}", index + 1, total);
            let x = RIGHT - text_width(&label, 8.0);
            layer.use_text(label, 8.0, Mm(x), Mm(FOOTER_Y), &self.regular);
        }

        let mut writer = BufWriter::new(Vec::new());
        self.doc.save(&mut writer).map_err(DocError::render)?;
        writer.into_inner().map_err(|e| DocError::Render(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_unsupported_characters() {
        assert_eq!(sanitize("£12.50 – “deposit”"), "GBP 12.50 - \"deposit\"");
        assert_eq!(sanitize("Tŷ Mawr"), "T? Mawr");
        assert_eq!(sanitize("plain"), "plain");
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap("Replace the vacuum regulator and test the pump", 16);
        assert!(lines.iter().all(|l| l.chars().count() <= 16));
        assert_eq!(lines.join(" "), "Replace the vacuum regulator and test the pump");

        let long = wrap("ABCDEFGHIJKLMNOPQRSTUVWXYZ", 10);
        assert_eq!(long, vec!["ABCDEFGHIJ", "KLMNOPQRST", "UVWXYZ"]);

        assert_eq!(wrap("one\n\ntwo", 20), vec!["one", "two"]);
    }

    #[test]
    fn test_ensure_space_adds_pages() {
        let mut writer = PageWriter::new("Test", "Parlour").unwrap();
        assert!(!writer.ensure_space(10.0));
        writer.set_y(BOTTOM + 5.0);
        assert!(writer.ensure_space(10.0));
        assert_eq!(writer.page_count(), 2);
        assert_eq!(writer.y(), TOP);

        let bytes = writer.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
