//! Corpus byte sources
//!
//! The retrieval core only needs readable bytes; where they come from
//! (bundled assets, files, network) is up to the source implementation.

use crate::config::CorpusConfig;
use crate::errors::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supplies the raw JSON documents the repository loads once
#[async_trait]
pub trait CorpusSource: Send + Sync {
    /// Exercise corpus document
    async fn exercises(&self) -> Result<Vec<u8>>;

    /// Theorem corpus document
    async fn theorems(&self) -> Result<Vec<u8>>;

    /// Taxonomy document; `None` means synthesize it from the exercises
    async fn taxonomy(&self) -> Result<Option<Vec<u8>>>;
}

/// Reads corpus documents from the filesystem
#[derive(Debug, Clone)]
pub struct FileCorpusSource {
    exercises_path: PathBuf,
    theorems_path: PathBuf,
    taxonomy_path: Option<PathBuf>,
}

impl FileCorpusSource {
    pub fn new(
        exercises_path: impl Into<PathBuf>,
        theorems_path: impl Into<PathBuf>,
        taxonomy_path: Option<PathBuf>,
    ) -> Self {
        Self {
            exercises_path: exercises_path.into(),
            theorems_path: theorems_path.into(),
            taxonomy_path,
        }
    }

    pub fn from_config(config: &CorpusConfig) -> Self {
        Self::new(
            &config.exercises_path,
            &config.theorems_path,
            config.taxonomy_path.as_ref().map(PathBuf::from),
        )
    }

    async fn read(path: &Path) -> Result<Vec<u8>> {
        let bytes = tokio::fs::read(path).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "Read corpus file");
        Ok(bytes)
    }
}

#[async_trait]
impl CorpusSource for FileCorpusSource {
    async fn exercises(&self) -> Result<Vec<u8>> {
        Self::read(&self.exercises_path).await
    }

    async fn theorems(&self) -> Result<Vec<u8>> {
        Self::read(&self.theorems_path).await
    }

    async fn taxonomy(&self) -> Result<Option<Vec<u8>>> {
        match &self.taxonomy_path {
            Some(path) => Self::read(path).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Holds corpus documents in memory (embedded assets, tests)
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpusSource {
    exercises: Vec<u8>,
    theorems: Vec<u8>,
    taxonomy: Option<Vec<u8>>,
}

impl InMemoryCorpusSource {
    pub fn new(exercises: impl Into<Vec<u8>>, theorems: impl Into<Vec<u8>>) -> Self {
        Self {
            exercises: exercises.into(),
            theorems: theorems.into(),
            taxonomy: None,
        }
    }

    pub fn with_taxonomy(mut self, taxonomy: impl Into<Vec<u8>>) -> Self {
        self.taxonomy = Some(taxonomy.into());
        self
    }
}

#[async_trait]
impl CorpusSource for InMemoryCorpusSource {
    async fn exercises(&self) -> Result<Vec<u8>> {
        Ok(self.exercises.clone())
    }

    async fn theorems(&self) -> Result<Vec<u8>> {
        Ok(self.theorems.clone())
    }

    async fn taxonomy(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.taxonomy.clone())
    }
}
