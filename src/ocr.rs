use std::io::Cursor;

use anyhow::Result;
use image::ImageFormat;
use leptess::{LepTess, Variable};
use thiserror::Error;
use tracing::debug;

use crate::artifacts::ArtifactStore;

/// Graphical cells only ever contain numeric percentages.
const CHAR_WHITELIST: &str = "0123456789.%";
/// PSM 6: assume a single uniform block of text.
const PAGE_SEG_MODE: u32 = 6;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("Failed to initialize Tesseract: {0}")]
    Init(String),

    #[error("Failed to decode cell image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to run OCR: {0}")]
    Recognition(String),
}

/// OCR engine boundary: encoded image bytes in, raw multi-line text out.
pub trait TextRecognizer {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

/// Tesseract-backed recognizer restricted to the digit/dot/percent set.
pub struct TesseractRecognizer {
    language: String,
}

impl TesseractRecognizer {
    pub fn new() -> Result<Self, OcrError> {
        let language = "eng".to_string();
        // Verify Tesseract can initialize before the batch starts
        LepTess::new(None, &language).map_err(|e| {
            OcrError::Init(format!(
                "language '{}': {}. Make sure Tesseract language data is installed",
                language, e
            ))
        })?;
        Ok(Self { language })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut lt = LepTess::new(None, &self.language)
            .map_err(|e| OcrError::Init(e.to_string()))?;
        lt.set_variable(Variable::TesseditCharWhitelist, CHAR_WHITELIST)
            .map_err(|e| OcrError::Init(format!("Failed to set whitelist: {}", e)))?;
        lt.set_variable(Variable::TesseditPagesegMode, &PAGE_SEG_MODE.to_string())
            .map_err(|e| OcrError::Init(format!("Failed to set PSM: {}", e)))?;
        lt.set_image_from_mem(image)
            .map_err(|e| OcrError::Recognition(format!("Failed to set image: {}", e)))?;
        lt.get_utf8_text()
            .map_err(|e| OcrError::Recognition(e.to_string()))
    }
}

/// Decode a captured cell image, optionally persist the raw bytes for
/// offline inspection, run OCR on it, and return the cleaned text lines.
pub fn read_cell<R: TextRecognizer>(
    recognizer: &R,
    png: &[u8],
    artifact: Option<(&ArtifactStore, String)>,
) -> Result<Vec<String>> {
    let decoded = image::load_from_memory(png).map_err(OcrError::Decode)?;
    if let Some((store, name)) = artifact {
        let path = store.save(&name, png)?;
        debug!("saved cell image to {}", path.display());
    }

    // leptess expects encoded image data; normalize to RGB PNG
    let mut buf = Cursor::new(Vec::new());
    decoded
        .to_rgb8()
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(OcrError::Decode)?;

    let text = recognizer.recognize(buf.get_ref())?;
    let lines = text
        .trim()
        .lines()
        .map(|l| l.trim().to_string())
        .collect();
    Ok(merge_split_percent(lines))
}

/// Tesseract often splits a value like "87.5%" onto two lines when the
/// percent glyph renders apart from the digits. Only the exact ambiguous
/// shape (3+ lines, lone trailing '%') is repaired, so already-correct
/// multi-line output is never corrupted.
fn merge_split_percent(mut lines: Vec<String>) -> Vec<String> {
    if lines.len() >= 3 && lines.last().is_some_and(|l| l == "%") {
        let pct = lines.pop().unwrap_or_default();
        if let Some(value) = lines.last_mut() {
            value.push_str(&pct);
        }
    }
    lines
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    struct FakeRecognizer(&'static str);

    impl TextRecognizer for FakeRecognizer {
        fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
            Ok(self.0.to_string())
        }
    }

    fn white_png() -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    fn merged(lines: &[&str]) -> Vec<String> {
        merge_split_percent(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn lone_trailing_percent_merges() {
        assert_eq!(merged(&["12", "34", "%"]), vec!["12", "34%"]);
    }

    #[test]
    fn plain_lines_unchanged() {
        assert_eq!(merged(&["12", "34", "56"]), vec!["12", "34", "56"]);
    }

    #[test]
    fn short_output_unchanged() {
        assert_eq!(merged(&["%"]), vec!["%"]);
        assert_eq!(merged(&["34", "%"]), vec!["34", "%"]);
    }

    #[test]
    fn read_cell_splits_and_merges() {
        let rec = FakeRecognizer("Label\n87.5\n%\n");
        let lines = read_cell(&rec, &white_png(), None).unwrap();
        assert_eq!(lines, vec!["Label", "87.5%"]);
    }

    #[test]
    fn read_cell_rejects_garbage_bytes() {
        let rec = FakeRecognizer("irrelevant");
        assert!(read_cell(&rec, &[0, 1, 2, 3], None).is_err());
    }

    #[test]
    fn read_cell_persists_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ArtifactStore::new(tmp.path());
        let png = white_png();
        let rec = FakeRecognizer("42%");
        let lines = read_cell(&rec, &png, Some((&store, "cafe_001".to_string()))).unwrap();
        assert_eq!(lines, vec!["42%"]);
        // Raw bytes are written unmodified
        let saved = std::fs::read(tmp.path().join("cafe_001.png")).unwrap();
        assert_eq!(saved, png);
    }
}
