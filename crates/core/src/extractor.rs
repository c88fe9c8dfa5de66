use crate::error::IngestError;
use crate::models::PageText;
use crate::traits::TextExtractor;
use lopdf::Document;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use std::path::Path;

pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_TXT: &str = "text/plain";

/// Dispatches extraction by the MIME type recorded on the document.
pub struct ExtractorRegistry {
    extractors: HashMap<String, Box<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Registry covering the accepted upload types: PDF, DOCX, plain text.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MIME_PDF, Box::new(PdfTextExtractor));
        registry.register(MIME_DOCX, Box::new(DocxTextExtractor));
        registry.register(MIME_TXT, Box::new(PlainTextExtractor));
        registry
    }

    pub fn register(&mut self, mime_type: impl Into<String>, extractor: Box<dyn TextExtractor>) {
        self.extractors.insert(mime_type.into(), extractor);
    }

    pub fn get(&self, mime_type: &str) -> Option<&dyn TextExtractor> {
        self.extractors.get(mime_type).map(Box::as_ref)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// PDF extraction via lopdf, one entry per page with readable text.
#[derive(Default)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::Extraction(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::Extraction(error.to_string()))?;

            if !text.trim().is_empty() {
                pages.push(PageText {
                    number: page_no,
                    text,
                });
            }
        }

        if pages.is_empty() {
            return Err(IngestError::Extraction(format!(
                "pdf had no readable page text: {}",
                path.display()
            )));
        }

        Ok(pages)
    }
}

/// DOCX extraction: unzips `word/document.xml` and collects the `<w:t>` text
/// runs. Explicit page breaks (`<w:br w:type="page"/>`) start a new page;
/// paragraphs become newlines. DOCX has no fixed pagination otherwise, so a
/// document without explicit breaks is a single page.
#[derive(Default)]
pub struct DocxTextExtractor;

impl TextExtractor for DocxTextExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
        let bytes = fs::read(path)?;
        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(&bytes[..]))
            .map_err(|error| IngestError::Extraction(error.to_string()))?;

        let mut xml = Vec::new();
        archive
            .by_name("word/document.xml")
            .map_err(|error| IngestError::Extraction(error.to_string()))?
            .read_to_end(&mut xml)?;

        let pages = docx_pages(&xml)?;
        if pages.is_empty() {
            return Err(IngestError::Extraction(format!(
                "docx had no readable text: {}",
                path.display()
            )));
        }

        Ok(pages)
    }
}

fn docx_pages(xml: &[u8]) -> Result<Vec<PageText>, IngestError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut pages = Vec::new();
    let mut current = String::new();
    let mut page_number = 1u32;
    let mut in_text_run = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(element)) if element.local_name().as_ref() == b"t" => {
                in_text_run = true;
            }
            Ok(Event::End(element)) => match element.local_name().as_ref() {
                b"t" => in_text_run = false,
                b"p" => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(text)) if in_text_run => {
                let unescaped = text
                    .unescape()
                    .map_err(|error| IngestError::Extraction(error.to_string()))?;
                current.push_str(unescaped.as_ref());
            }
            Ok(Event::Empty(element)) if element.local_name().as_ref() == b"br" => {
                let is_page_break = element
                    .attributes()
                    .flatten()
                    .any(|attr| {
                        attr.key.as_ref().ends_with(b"type") && attr.value.as_ref() == b"page"
                    });
                if is_page_break {
                    push_page(&mut pages, &mut current, &mut page_number);
                }
            }
            Ok(Event::Eof) => break,
            Err(error) => return Err(IngestError::Extraction(error.to_string())),
            _ => {}
        }
        buf.clear();
    }

    push_page(&mut pages, &mut current, &mut page_number);
    Ok(pages)
}

fn push_page(pages: &mut Vec<PageText>, current: &mut String, page_number: &mut u32) {
    if !current.trim().is_empty() {
        pages.push(PageText {
            number: *page_number,
            text: std::mem::take(current),
        });
    } else {
        current.clear();
    }
    *page_number += 1;
}

/// Plain text files are a single page.
#[derive(Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
        let text = fs::read_to_string(path)?;

        if text.trim().is_empty() {
            return Err(IngestError::Extraction(format!(
                "text file is empty: {}",
                path.display()
            )));
        }

        Ok(vec![PageText { number: 1, text }])
    }
}
