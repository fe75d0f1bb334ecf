use async_trait::async_trait;
use lopdf::Document;
use std::sync::Arc;

use crate::extraction::{EngineError, PdfDocument, PdfEngine, PdfPage};

/// Pure-Rust PDF backend built on lopdf.
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        LopdfEngine
    }
}

impl Default for LopdfEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PdfEngine for LopdfEngine {
    async fn load(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, EngineError> {
        let bytes = bytes.to_vec();
        let (document, page_numbers) = blocking(move || {
            let document =
                Document::load_mem(&bytes).map_err(|e| EngineError::new(format!("lopdf: {e}")))?;
            // Page tree order, keyed by 1-based page number.
            let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
            Ok((document, page_numbers))
        })
        .await?;
        Ok(Box::new(LopdfDocument {
            document: Arc::new(document),
            page_numbers,
        }))
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}

struct LopdfDocument {
    document: Arc<Document>,
    page_numbers: Vec<u32>,
}

#[async_trait]
impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.page_numbers.len()
    }

    async fn page(&self, number: usize) -> Result<Box<dyn PdfPage>, EngineError> {
        let page_number = number
            .checked_sub(1)
            .and_then(|i| self.page_numbers.get(i))
            .copied()
            .ok_or_else(|| {
                EngineError::new(format!(
                    "page {number} out of range (document has {})",
                    self.page_numbers.len()
                ))
            })?;
        Ok(Box::new(LopdfPage {
            document: Arc::clone(&self.document),
            page_number,
        }))
    }
}

struct LopdfPage {
    document: Arc<Document>,
    page_number: u32,
}

#[async_trait]
impl PdfPage for LopdfPage {
    async fn text(&self) -> Result<Vec<String>, EngineError> {
        let document = Arc::clone(&self.document);
        let page_number = self.page_number;
        blocking(move || {
            let text = document
                .extract_text(&[page_number])
                .map_err(|e| EngineError::new(format!("lopdf: {e}")))?;
            Ok(tokenize(&text))
        })
        .await
    }
}

/// Run lopdf parsing on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, EngineError>
where
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| EngineError::new(format!("lopdf task failed: {e}")))?
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(String::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use crate::extraction::no_progress;
    use crate::extraction::pdf::PdfExtractor;
    use lopdf::{dictionary, Object, Stream};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn one_page_pdf(line: &str) -> Vec<u8> {
        pdf_with_pages(&[line])
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("  Hello\n world \t!"), vec!["Hello", "world", "!"]);
        assert!(tokenize("\n\n").is_empty());
    }

    #[tokio::test]
    async fn test_reads_generated_pdf() {
        let bytes = one_page_pdf("Hello World");
        let doc = LopdfEngine::new().load(&bytes).await.unwrap();
        assert_eq!(doc.page_count(), 1);

        let tokens = doc.page(1).await.unwrap().text().await.unwrap();
        let joined = tokens.join(" ");
        assert!(joined.contains("Hello"), "{joined}");
        assert!(joined.contains("World"), "{joined}");
    }

    #[tokio::test]
    async fn test_page_out_of_range() {
        let bytes = one_page_pdf("x");
        let doc = LopdfEngine::new().load(&bytes).await.unwrap();
        assert!(doc.page(0).await.is_err());
        assert!(doc.page(2).await.is_err());
    }

    #[tokio::test]
    async fn test_garbage_fails_to_load() {
        assert!(LopdfEngine::new().load(b"%PDF-nope").await.is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_other_tasks_run_during_extraction() {
        let lines: Vec<String> = (1..=40).map(|i| format!("Page number {i}")).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let bytes = pdf_with_pages(&refs);

        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = {
            let ticks = Arc::clone(&ticks);
            tokio::spawn(async move {
                loop {
                    ticks.fetch_add(1, Ordering::Relaxed);
                    tokio::task::yield_now().await;
                }
            })
        };

        let extractor = PdfExtractor::new(Arc::new(LopdfEngine::new()));
        let text = extractor.extract(&bytes, &no_progress).await.unwrap();
        ticker.abort();

        assert!(text.contains("Page number 40"), "{text}");
        assert!(ticks.load(Ordering::Relaxed) > 0);
    }
}
