//! Document discovery and loading
//!
//! Walks a directory for matching files and extracts each one independently.
//! A file that cannot be read or parsed is reported as a [`LoadWarning`] and
//! left out of the batch; it never aborts the load.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{Document, Page};

use super::parser::{hash_content, ExtractorRegistry};

/// A file handed over by an upload front end
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Non-fatal problem with a single file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadWarning {
    /// File name (without directory)
    pub filename: String,
    /// Why the file was skipped
    pub reason: String,
}

impl LoadWarning {
    fn from_error(filename: &str, err: &Error) -> Self {
        let reason = match err {
            Error::Extraction { message, .. } => message.clone(),
            other => other.to_string(),
        };
        Self {
            filename: filename.to_string(),
            reason,
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error loading file {}: {}", self.filename, self.reason)
    }
}

/// Result of loading a batch of files
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Successfully extracted documents, in discovery order
    pub documents: Vec<Document>,
    /// Files that were skipped
    pub warnings: Vec<LoadWarning>,
}

impl LoadOutcome {
    /// All pages tagged with their document, documents in discovery order
    pub fn pages(&self) -> impl Iterator<Item = (&Document, &Page)> {
        self.documents
            .iter()
            .flat_map(|doc| doc.pages.iter().map(move |page| (doc, page)))
    }

    pub fn page_count(&self) -> usize {
        self.documents.iter().map(|d| d.pages.len()).sum()
    }
}

/// Loader options
#[derive(Debug, Clone)]
pub struct LoaderOptions {
    /// Lowercase extensions picked up during directory discovery
    pub extensions: Vec<String>,
    /// Follow symlinks while walking
    pub follow_links: bool,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["pdf".to_string()],
            follow_links: true,
        }
    }
}

/// Discovers files and extracts their pages
#[derive(Clone, Default)]
pub struct DocumentLoader {
    registry: ExtractorRegistry,
    options: LoaderOptions,
}

impl DocumentLoader {
    pub fn new(registry: ExtractorRegistry, options: LoaderOptions) -> Self {
        Self { registry, options }
    }

    /// Files under `dir` (recursively) with a configured extension, in sorted walk order
    pub fn discover(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let meta = std::fs::metadata(dir)?;
        if !meta.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("{} is not a directory", dir.display()),
            )));
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(dir)
            .follow_links(self.options.follow_links)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable path under {}: {}", dir.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && self.matches_extension(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.options.extensions.iter().any(|e| *e == ext))
    }

    /// Load every matching file under a directory
    pub fn load_directory(&self, dir: &Path) -> Result<LoadOutcome> {
        let files = self.discover(dir)?;
        tracing::info!("Found {} files under {}", files.len(), dir.display());

        let mut outcome = LoadOutcome::default();
        for path in files {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());

            let loaded = std::fs::read(&path)
                .map_err(Error::from)
                .and_then(|data| self.load_bytes(&filename, &data));

            match loaded {
                Ok(doc) => outcome.documents.push(doc.with_path(path)),
                Err(e) => self.record_warning(&mut outcome, &filename, &e),
            }
        }

        Ok(outcome)
    }

    /// Load in-memory uploads
    pub fn load_files(&self, files: &[UploadedFile]) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        for file in files {
            match self.load_bytes(&file.filename, &file.data) {
                Ok(doc) => outcome.documents.push(doc),
                Err(e) => self.record_warning(&mut outcome, &file.filename, &e),
            }
        }
        outcome
    }

    /// Extract a single file into a document
    pub fn load_bytes(&self, filename: &str, data: &[u8]) -> Result<Document> {
        let (file_type, pages) = self.registry.extract(filename, data)?;
        let doc = Document::new(
            filename.to_string(),
            file_type,
            hash_content(data),
            pages,
            data.len() as u64,
        );
        tracing::debug!("Loaded {} ({} pages)", filename, doc.page_count());
        Ok(doc)
    }

    fn record_warning(&self, outcome: &mut LoadOutcome, filename: &str, err: &Error) {
        let warning = LoadWarning::from_error(filename, err);
        tracing::warn!("{}", warning);
        outcome.warnings.push(warning);
    }
}
