//! Uploaded document handling
//!
//! Plain text is decoded here. Binary containers (PDF, word processor,
//! presentation) are handed to registered [`TextExtractor`]s.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use veriscan_core::{InputError, Result};

const UNSUPPORTED_MESSAGE: &str = "Unsupported file type. Use txt, pdf, docx, pptx, or ppt.";
const LEGACY_DOC_MESSAGE: &str = "Legacy .doc is not supported directly. Please convert to .docx.";

/// Upload container kinds, by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    /// `.txt`
    PlainText,
    /// `.pdf`
    Pdf,
    /// `.docx`, `.word`
    WordProcessor,
    /// `.pptx`, `.ppt`
    Presentation,
}

impl DocumentFormat {
    /// Classify by extension, case-insensitively
    pub fn from_filename(filename: &str) -> Result<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "txt" => Ok(Self::PlainText),
            "pdf" => Ok(Self::Pdf),
            "docx" | "word" => Ok(Self::WordProcessor),
            "pptx" | "ppt" => Ok(Self::Presentation),
            "doc" => Err(InputError::UnsupportedFormat(LEGACY_DOC_MESSAGE.into()).into()),
            _ => Err(InputError::UnsupportedFormat(UNSUPPORTED_MESSAGE.into()).into()),
        }
    }

    fn unreadable_message(self) -> String {
        match self {
            Self::Presentation => {
                "Unable to read .ppt file. Please convert it to .pptx and retry.".to_string()
            }
            Self::Pdf => "Unable to read .pdf file.".to_string(),
            Self::WordProcessor => "Unable to read .docx file.".to_string(),
            Self::PlainText => "Unable to read .txt file.".to_string(),
        }
    }
}

/// Converts one container format to plain text
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &str;

    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// UTF-8, falling back to Latin-1 for anything that is not valid UTF-8
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(_) => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

/// Text pulled from an upload, without classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub filename: String,
    pub text: String,

    /// Character count of `text`
    pub characters: usize,
}

/// Validates uploads and dispatches them to extractors
#[derive(Clone)]
pub struct UploadHandler {
    max_upload_bytes: usize,
    extractors: HashMap<DocumentFormat, Arc<dyn TextExtractor>>,
}

impl UploadHandler {
    /// Handler with the plain text extractor registered
    pub fn new(max_upload_bytes: usize) -> Self {
        let mut extractors: HashMap<DocumentFormat, Arc<dyn TextExtractor>> = HashMap::new();
        extractors.insert(DocumentFormat::PlainText, Arc::new(PlainTextExtractor));
        Self {
            max_upload_bytes,
            extractors,
        }
    }

    /// Register (or replace) the extractor for a format
    pub fn with_extractor(
        mut self,
        format: DocumentFormat,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        self.extractors.insert(format, extractor);
        self
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Trimmed, non-empty text of an upload
    pub fn extract_upload(&self, filename: &str, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(InputError::EmptyUpload.into());
        }
        if bytes.len() > self.max_upload_bytes {
            return Err(InputError::UploadTooLarge {
                max: self.max_upload_bytes,
                actual: bytes.len(),
            }
            .into());
        }

        let format = DocumentFormat::from_filename(filename)?;
        let extractor = self.extractors.get(&format).ok_or_else(|| {
            InputError::UnsupportedFormat(format!(
                "No text extractor available for {:?} uploads.",
                format
            ))
        })?;

        let text = extractor.extract(bytes).map_err(|e| {
            warn!(extractor = extractor.name(), error = %e, "Text extraction failed");
            InputError::UnsupportedFormat(format.unreadable_message())
        })?;

        let text = text.trim();
        if text.is_empty() {
            return Err(InputError::NoReadableText.into());
        }

        debug!(
            ?format,
            bytes = bytes.len(),
            characters = text.chars().count(),
            "Upload extracted"
        );
        Ok(text.to_string())
    }

    /// `extract_upload` plus the filename and character count
    pub fn extract_text(&self, filename: &str, bytes: &[u8]) -> Result<ExtractedText> {
        let text = self.extract_upload(filename, bytes)?;
        Ok(ExtractedText {
            filename: filename.to_string(),
            characters: text.chars().count(),
            text,
        })
    }
}

impl std::fmt::Debug for UploadHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut formats: Vec<_> = self.extractors.keys().collect();
        formats.sort_by_key(|kind| format!("{:?}", kind));
        f.debug_struct("UploadHandler")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("formats", &formats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriscan_core::Error;

    fn input_error(result: Result<String>) -> InputError {
        match result {
            Err(Error::Input(e)) => e,
            other => panic!("expected input error, got {:?}", other),
        }
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DocumentFormat::from_filename("notes.TXT").unwrap(),
            DocumentFormat::PlainText
        );
        assert_eq!(
            DocumentFormat::from_filename("essay.word").unwrap(),
            DocumentFormat::WordProcessor
        );
        assert_eq!(
            DocumentFormat::from_filename("deck.ppt").unwrap(),
            DocumentFormat::Presentation
        );
        assert!(DocumentFormat::from_filename(".txt").is_err());
    }

    #[test]
    fn test_upload_errors() {
        let handler = UploadHandler::new(8);

        assert_eq!(
            input_error(handler.extract_upload("a.txt", b"")),
            InputError::EmptyUpload
        );
        assert_eq!(
            input_error(handler.extract_upload("a.txt", b"123456789")).to_string(),
            "File too large. Maximum allowed size: 8 bytes"
        );
        assert_eq!(
            input_error(handler.extract_upload("a.doc", b"x")).to_string(),
            LEGACY_DOC_MESSAGE
        );
        assert_eq!(
            input_error(handler.extract_upload("a.rtf", b"x")).to_string(),
            UNSUPPORTED_MESSAGE
        );
        assert_eq!(
            input_error(handler.extract_upload("a.txt", b" \n\t ")),
            InputError::NoReadableText
        );
    }

    #[test]
    fn test_latin1_fallback() {
        let handler = UploadHandler::new(1024);
        let text = handler.extract_upload("a.txt", b"caf\xe9 au lait").unwrap();
        assert_eq!(text, "café au lait");
    }

    #[test]
    fn test_binary_formats_need_an_extractor() {
        let handler = UploadHandler::new(1024);
        let err = input_error(handler.extract_upload("paper.pdf", b"%PDF-1.7"));
        assert_eq!(err.code(), "UNSUPPORTED_FORMAT");
    }

    #[test]
    fn test_registered_extractor_is_used() {
        struct Fixed;
        impl TextExtractor for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
            fn extract(&self, _bytes: &[u8]) -> Result<String> {
                Ok("  Slide one text.  ".to_string())
            }
        }

        struct Broken;
        impl TextExtractor for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            fn extract(&self, _bytes: &[u8]) -> Result<String> {
                Err(Error::internal("corrupt container"))
            }
        }

        let handler = UploadHandler::new(1024)
            .with_extractor(DocumentFormat::Pdf, Arc::new(Fixed))
            .with_extractor(DocumentFormat::Presentation, Arc::new(Broken));

        let extracted = handler.extract_text("paper.pdf", b"%PDF").unwrap();
        assert_eq!(extracted.text, "Slide one text.");
        assert_eq!(extracted.characters, 15);
        assert_eq!(extracted.filename, "paper.pdf");

        let err = input_error(handler.extract_upload("deck.ppt", b"junk"));
        assert_eq!(
            err.to_string(),
            "Unable to read .ppt file. Please convert it to .pptx and retry."
        );
    }
}
