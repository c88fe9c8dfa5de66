use crate::models::{NewChunk, PageText};

/// Splits extracted pages into fixed-size chunks of at most `max_chars`
/// characters. A page longer than the limit becomes several chunks that all
/// carry its page number; no chunk ever spans two pages. Whitespace-only
/// pages produce nothing.
pub fn split_pages(document_id: &str, pages: &[PageText], max_chars: usize) -> Vec<NewChunk> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();

    for page in pages {
        if page.text.trim().is_empty() {
            continue;
        }

        let chars: Vec<char> = page.text.chars().collect();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + max_chars).min(chars.len());
            let content: String = chars[start..end].iter().collect();
            chunks.push(NewChunk {
                document_id: document_id.to_string(),
                content,
                page: Some(page.number),
            });
            start = end;
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(number: u32, text: &str) -> PageText {
        PageText {
            number,
            text: text.to_string(),
        }
    }

    #[test]
    fn long_page_splits_into_fixed_windows() {
        let pages = vec![page(1, &"x".repeat(1200))];
        let chunks = split_pages("doc-1", &pages, 500);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content.chars().count(), 500);
        assert_eq!(chunks[1].content.chars().count(), 500);
        assert_eq!(chunks[2].content.chars().count(), 200);
        assert!(chunks.iter().all(|chunk| chunk.page == Some(1)));
        assert!(chunks.iter().all(|chunk| chunk.document_id == "doc-1"));
    }

    #[test]
    fn chunks_never_cross_page_boundaries() {
        let pages = vec![page(1, &"a".repeat(600)), page(2, &"b".repeat(100))];
        let chunks = split_pages("doc-1", &pages, 500);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].page, Some(1));
        assert_eq!(chunks[1].page, Some(1));
        assert_eq!(chunks[1].content.chars().count(), 100);
        assert_eq!(chunks[2].page, Some(2));
    }

    #[test]
    fn whitespace_only_pages_are_skipped() {
        let pages = vec![page(1, "  \n\t "), page(2, "real content")];
        let chunks = split_pages("doc-1", &pages, 500);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page, Some(2));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let pages = vec![page(1, &"é".repeat(7))];
        let chunks = split_pages("doc-1", &pages, 3);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content, "ééé");
        assert_eq!(chunks[2].content, "é");
    }
}
