//! PDF → per-page fragment streams.
//!
//! Every text-showing run (`Tj`, or one string of a `TJ` array) becomes one
//! fragment, in content-stream order. Runs on one baseline are *not* joined
//! into lines: a statement row `05 MAR | UBER | -R$ 23,50` stays three
//! fragments. The one exception is a run that picks up exactly where the
//! previous one stopped mid-word, which is how kerned `TJ` arrays split a word.

use anyhow::{anyhow, Result};
use pdf_extract::{Document, MediaBox, OutputDev, OutputError, Transform};

use crate::types::TextFragment;

/// Anything that can hand the parser ordered fragments, one list per page.
pub trait PageSource {
    fn pages(&self) -> Result<Vec<Vec<TextFragment>>>;
}

/// An in-memory PDF document.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    bytes: Vec<u8>,
}

impl PdfDocument {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }
}

impl PageSource for PdfDocument {
    fn pages(&self) -> Result<Vec<Vec<TextFragment>>> {
        let mut doc = Document::load_mem(&self.bytes).map_err(|e| anyhow!("load PDF: {e}"))?;
        let mut runs = RunCollector::default();
        if doc.is_encrypted() {
            pdf_extract::output_doc_encrypted(&mut doc, &mut runs, "")
        } else {
            pdf_extract::output_doc(&doc, &mut runs)
        }
        .map_err(|e| anyhow!("decode PDF text: {e}"))?;
        Ok(runs.into_pages())
    }
}

/// Already-extracted pages, e.g. from another extractor or a test.
impl PageSource for Vec<Vec<TextFragment>> {
    fn pages(&self) -> Result<Vec<Vec<TextFragment>>> {
        Ok(self.clone())
    }
}

/// Pen state after the last glyph written.
#[derive(Debug, Clone, Copy)]
struct Pen {
    end_x: f64,
    y: f64,
    size: f64,
}

/// `OutputDev` that records one string per text run instead of laying text
/// out as lines.
#[derive(Debug, Default)]
struct RunCollector {
    pages: Vec<Vec<String>>,
    pen: Option<Pen>,
    run_open: bool,
}

impl RunCollector {
    fn into_pages(self) -> Vec<Vec<TextFragment>> {
        self.pages
            .into_iter()
            .map(|runs| TextFragment::sequence(runs.iter().map(|r| r.trim())))
            .collect()
    }

    /// A new run glues onto the previous one only when it starts at the
    /// previous pen position on the same baseline and neither side of the
    /// seam is whitespace.
    fn continues_previous(&self, x: f64, y: f64, ch: &str) -> bool {
        let Some(pen) = self.pen else {
            return false;
        };
        let Some(prev) = self.pages.last().and_then(|runs| runs.last()) else {
            return false;
        };
        let tolerance = pen.size * 0.1;
        (y - pen.y).abs() < tolerance
            && (x - pen.end_x).abs() <= tolerance
            && !ch.trim().is_empty()
            && prev.chars().last().is_some_and(|c| !c.is_whitespace())
    }
}

impl OutputDev for RunCollector {
    fn begin_page(
        &mut self,
        _page_num: u32,
        _media_box: &MediaBox,
        _art_box: Option<(f64, f64, f64, f64)>,
    ) -> Result<(), OutputError> {
        self.pages.push(Vec::new());
        self.pen = None;
        self.run_open = false;
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), OutputError> {
        Ok(())
    }

    fn output_character(
        &mut self,
        trm: &Transform,
        width: f64,
        _spacing: f64,
        font_size: f64,
        ch: &str,
    ) -> Result<(), OutputError> {
        let (x, y) = (trm.m31, trm.m32);
        let size = font_size * trm.m11.hypot(trm.m12);

        if self.run_open {
            self.run_open = false;
            if !self.continues_previous(x, y, ch) {
                if self.pages.is_empty() {
                    self.pages.push(Vec::new());
                }
                if let Some(runs) = self.pages.last_mut() {
                    runs.push(String::new());
                }
            }
        }

        if let Some(run) = self.pages.last_mut().and_then(|runs| runs.last_mut()) {
            run.push_str(ch);
        }
        self.pen = Some(Pen {
            end_x: x + width * size,
            y,
            size,
        });
        Ok(())
    }

    fn begin_word(&mut self) -> Result<(), OutputError> {
        self.run_open = true;
        Ok(())
    }

    fn end_word(&mut self) -> Result<(), OutputError> {
        self.run_open = false;
        Ok(())
    }

    fn end_line(&mut self) -> Result<(), OutputError> {
        Ok(())
    }
}
