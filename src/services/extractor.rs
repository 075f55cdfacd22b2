//! Document text extraction
//!
//! Pure transform from raw document bytes to plain text. Every failure mode —
//! corrupt file, unsupported encoding, missing OCR capability — is swallowed
//! into an empty string: the caller's raw-text/manual-review path is the
//! recovery mechanism, not an error.

use std::sync::Arc;

/// Document kind hint derived from the filename extension. Never validated
/// against the actual content; extraction is attempted per hint and falls
/// through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Image,
    /// DWG/ZIP/unknown: accepted as a stored blob, never extracted.
    Opaque,
}

impl DocumentKind {
    pub fn from_filename(name: &str) -> Self {
        let ext = name
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Self::Pdf,
            "png" | "jpg" | "jpeg" => Self::Image,
            _ => Self::Opaque,
        }
    }
}

/// Optical character recognition seam. The concrete engine is optional; a
/// deployment without one simply loses the scanned-document path.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_bytes: &[u8]) -> Option<String>;
}

#[derive(Clone, Default)]
pub struct TextExtractor {
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl TextExtractor {
    pub fn new(ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self { ocr }
    }

    /// Build with whatever OCR capability the binary was compiled with.
    pub fn detect() -> Self {
        #[cfg(feature = "ocr")]
        {
            tracing::info!("OCR engine enabled (tesseract, eng+tha)");
            return Self::new(Some(Arc::new(TesseractOcr::default())));
        }
        #[cfg(not(feature = "ocr"))]
        {
            tracing::info!("No OCR engine compiled in; scanned documents degrade to empty text");
            Self::new(None)
        }
    }

    /// Extract plain text, or an empty string when nothing can be obtained.
    pub fn extract(&self, bytes: &[u8], kind: DocumentKind) -> String {
        match kind {
            DocumentKind::Pdf => self.extract_pdf(bytes),
            DocumentKind::Image => self.run_ocr(bytes),
            DocumentKind::Opaque => String::new(),
        }
    }

    fn extract_pdf(&self, bytes: &[u8]) -> String {
        // Primary: text layer via pdf-extract
        let text = pdf_text_layer(bytes);
        if !text.trim().is_empty() {
            return text;
        }

        // Secondary: per-page extraction via lopdf
        let text = pdf_text_per_page(bytes);
        if !text.trim().is_empty() {
            return text;
        }

        // A scanned PDF would need page rasterization before OCR, which this
        // service does not carry. Degrades to empty.
        String::new()
    }

    fn run_ocr(&self, image_bytes: &[u8]) -> String {
        match &self.ocr {
            Some(engine) => engine.recognize(image_bytes).unwrap_or_default(),
            None => String::new(),
        }
    }
}

fn pdf_text_layer(bytes: &[u8]) -> String {
    match pdf_extract::extract_text_from_mem(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(error = %e, "pdf-extract found no text layer");
            String::new()
        }
    }
}

fn pdf_text_per_page(bytes: &[u8]) -> String {
    let doc = match lopdf::Document::load_mem(bytes) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::debug!(error = %e, "lopdf could not load document");
            return String::new();
        }
    };

    let mut out = String::new();
    for page_number in doc.get_pages().keys() {
        if let Ok(page_text) = doc.extract_text(&[*page_number]) {
            if !page_text.trim().is_empty() {
                out.push_str(&page_text);
                out.push('\n');
            }
        }
    }
    out
}

/// Tesseract-backed OCR with the dual-language model used on Thai electrical
/// drawings.
#[cfg(feature = "ocr")]
#[derive(Clone)]
pub struct TesseractOcr {
    language: String,
}

#[cfg(feature = "ocr")]
impl Default for TesseractOcr {
    fn default() -> Self {
        Self {
            language: "eng+tha".to_string(),
        }
    }
}

#[cfg(feature = "ocr")]
impl OcrEngine for TesseractOcr {
    fn recognize(&self, image_bytes: &[u8]) -> Option<String> {
        let mut tess = leptess::LepTess::new(None, &self.language)
            .map_err(|e| tracing::warn!(error = %e, "Tesseract init failed"))
            .ok()?;
        tess.set_image_from_mem(image_bytes)
            .map_err(|e| tracing::debug!(error = %e, "OCR could not read image"))
            .ok()?;
        tess.get_utf8_text().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedOcr(&'static str);

    impl OcrEngine for FixedOcr {
        fn recognize(&self, _image_bytes: &[u8]) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    #[test]
    fn kind_from_filename_extension() {
        assert_eq!(DocumentKind::from_filename("plan.PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("scan.jpeg"), DocumentKind::Image);
        assert_eq!(DocumentKind::from_filename("model.dwg"), DocumentKind::Opaque);
        assert_eq!(DocumentKind::from_filename("noext"), DocumentKind::Opaque);
    }

    #[test]
    fn corrupt_pdf_swallows_to_empty() {
        let extractor = TextExtractor::new(None);
        assert_eq!(extractor.extract(b"not a pdf at all", DocumentKind::Pdf), "");
    }

    #[test]
    fn opaque_kinds_are_never_extracted() {
        let extractor = TextExtractor::new(Some(Arc::new(FixedOcr("should not run"))));
        assert_eq!(extractor.extract(b"whatever", DocumentKind::Opaque), "");
    }

    #[test]
    fn images_go_through_the_ocr_seam() {
        let extractor = TextExtractor::new(Some(Arc::new(FixedOcr("EL-001 cable 10 m"))));
        assert_eq!(
            extractor.extract(b"fake image bytes", DocumentKind::Image),
            "EL-001 cable 10 m"
        );
    }

    #[test]
    fn images_without_ocr_degrade_to_empty() {
        let extractor = TextExtractor::new(None);
        assert_eq!(extractor.extract(b"fake image bytes", DocumentKind::Image), "");
    }
}
