#![allow(dead_code)]

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use pdf_rag::generation::NOT_FOUND_ANSWER;
use pdf_rag::providers::HashingEmbedder;
use pdf_rag::{EmbeddingProvider, Error, LanguageModel, RagConfig, Result, Session};

/// Build a PDF with one line of Courier text per page
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

pub fn write_pdf(dir: &Path, name: &str, pages: &[&str]) {
    std::fs::write(dir.join(name), pdf_with_pages(pages)).unwrap();
}

pub fn write_corrupt_pdf(dir: &Path, name: &str) {
    std::fs::write(dir.join(name), b"%PDF-1.7\nthis is not really a pdf").unwrap();
}

/// Hashing embedder that can be switched to fail
pub struct FlakyEmbedder {
    inner: HashingEmbedder,
    pub failing: AtomicBool,
}

impl FlakyEmbedder {
    pub fn new() -> Self {
        Self {
            inner: HashingEmbedder::new(256).unwrap(),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for FlakyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::embedding("embedding service unavailable"));
        }
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.failing.load(Ordering::SeqCst))
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}

/// Answers by quoting context sentences that share a word with the question
pub struct QuotingLlm {
    pub prompts: Mutex<Vec<String>>,
    pub failing: AtomicBool,
}

impl QuotingLlm {
    pub fn new() -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

fn section<'a>(prompt: &'a str, start: &str, end: &str) -> &'a str {
    let from = prompt.find(start).map(|i| i + start.len()).unwrap_or(0);
    let to = prompt[from..].find(end).map(|i| from + i).unwrap_or(prompt.len());
    &prompt[from..to]
}

const STOP_WORDS: &[&str] = &["the", "what", "which", "who", "how", "are", "was", "does"];

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| w.len() >= 3 && !STOP_WORDS.contains(&w.as_str()))
        .collect()
}

#[async_trait]
impl LanguageModel for QuotingLlm {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::model("HTTP 429 Too Many Requests"));
        }

        let context = section(prompt, "CONTEXT:\n", "\n\nSOURCES:");
        let question = words(section(prompt, "QUESTION: ", "\n"));

        let quoted: Vec<&str> = context
            .split_inclusive('.')
            .map(str::trim)
            .filter(|sentence| words(sentence).iter().any(|w| question.contains(w)))
            .collect();

        if quoted.is_empty() {
            Ok(NOT_FOUND_ANSWER.to_string())
        } else {
            Ok(quoted.join(" "))
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "quoting"
    }

    fn model(&self) -> &str {
        "quoting-1"
    }
}

pub fn session_with(
    config: RagConfig,
    embedder: Arc<FlakyEmbedder>,
    llm: Arc<QuotingLlm>,
) -> Session {
    Session::new(config, embedder, llm).unwrap()
}
