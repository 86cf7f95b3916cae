//! Story catalog
//!
//! Stories are listed by an index document (a JSON array of references) and
//! each reference resolves to a story document:
//!
//! ```json
//! { "name": "...", "audio_name": "preview.mp3", "audio": "story.mp3",
//!   "emotions": [ { "time": 2.0, "emotion": "joie" } ] }
//! ```
//!
//! Documents are fetched one after another so the catalog order always
//! matches the index order.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use super::timeline::Cue;
use super::types::CatalogError;

/// A loaded story. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub name: String,
    /// Narration audio reference
    pub narration: String,
    /// Short preview clip reference
    pub preview: String,
    pub cues: Vec<Cue>,
}

/// On-disk story document
#[derive(Debug, Clone, Deserialize)]
pub struct StoryDocument {
    pub name: String,
    pub audio_name: String,
    pub audio: String,
    #[serde(default)]
    pub emotions: Vec<Cue>,
}

impl From<StoryDocument> for Story {
    fn from(doc: StoryDocument) -> Self {
        Self {
            name: doc.name,
            narration: doc.audio,
            preview: doc.audio_name,
            cues: doc.emotions,
        }
    }
}

/// Selectable entry handed to the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryEntry {
    pub index: usize,
    pub name: String,
    pub preview: String,
}

/// Where story documents come from
pub trait StorySource {
    /// Fetch the raw text behind a reference
    fn fetch(&self, reference: &str) -> Result<String, CatalogError>;
}

/// Reads references as paths below a root directory
#[derive(Debug, Clone)]
pub struct FileStorySource {
    root: PathBuf,
}

impl FileStorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path a reference points at
    pub fn resolve(&self, reference: &str) -> PathBuf {
        self.root.join(reference)
    }
}

impl StorySource for FileStorySource {
    fn fetch(&self, reference: &str) -> Result<String, CatalogError> {
        fs::read_to_string(self.resolve(reference)).map_err(|source| CatalogError::Fetch {
            reference: reference.to_string(),
            source,
        })
    }
}

/// Ordered list of available stories
#[derive(Debug, Default)]
pub struct StoryCatalog {
    stories: Vec<Arc<Story>>,
}

impl StoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_stories(stories: Vec<Story>) -> Self {
        Self {
            stories: stories.into_iter().map(Arc::new).collect(),
        }
    }

    /// Fetch the index and then every story it lists.
    ///
    /// The catalog is replaced only if everything loads; on error the
    /// previous contents are kept.
    pub fn load(&mut self, source: &dyn StorySource, index_ref: &str) -> Result<usize, CatalogError> {
        let index_text = source.fetch(index_ref)?;
        let references: Vec<String> =
            serde_json::from_str(&index_text).map_err(|err| CatalogError::Parse {
                reference: index_ref.to_string(),
                source: err,
            })?;

        let mut stories = Vec::with_capacity(references.len());
        for reference in &references {
            let text = source.fetch(reference)?;
            let doc: StoryDocument =
                serde_json::from_str(&text).map_err(|err| CatalogError::Parse {
                    reference: reference.clone(),
                    source: err,
                })?;
            log::debug!("Loaded story '{}' ({} cues)", doc.name, doc.emotions.len());
            stories.push(Arc::new(Story::from(doc)));
        }

        self.stories = stories;
        log::info!("Story catalog loaded: {} stories", self.stories.len());
        Ok(self.stories.len())
    }

    pub fn count(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Arc<Story>, CatalogError> {
        self.stories
            .get(index)
            .cloned()
            .ok_or(CatalogError::IndexOutOfRange {
                index,
                count: self.stories.len(),
            })
    }

    pub fn entries(&self) -> Vec<StoryEntry> {
        self.stories
            .iter()
            .enumerate()
            .map(|(index, story)| StoryEntry {
                index,
                name: story.name.clone(),
                preview: story.preview.clone(),
            })
            .collect()
    }
}
