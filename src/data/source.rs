use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::loader::{FileFormat, load_bytes, load_file};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// DataSource – where the current dataset comes from
// ---------------------------------------------------------------------------

/// The two places a dataset can come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    /// The bundled file at the configured default path.
    Default(PathBuf),
    /// A file the user picked; `digest` identifies the bytes that were parsed.
    Uploaded { path: PathBuf, digest: u64 },
}

impl DataSource {
    pub fn path(&self) -> &Path {
        match self {
            DataSource::Default(path) | DataSource::Uploaded { path, .. } => path,
        }
    }

    /// Short label for the top bar.
    pub fn label(&self) -> String {
        let name = self
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path().display().to_string());
        match self {
            DataSource::Default(_) => format!("{name} (default)"),
            DataSource::Uploaded { .. } => format!("{name} (uploaded)"),
        }
    }
}

fn content_digest(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.len().hash(&mut hasher);
    bytes.hash(&mut hasher);
    hasher.finish()
}

// ---------------------------------------------------------------------------
// DatasetCache – memoised loading keyed by source identity
// ---------------------------------------------------------------------------

/// Keeps the most recently loaded dataset for one source.
///
/// A request for the same source returns the cached dataset without
/// re-parsing; any other source replaces the entry. Failures are not cached.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entry: Option<(DataSource, Arc<Dataset>)>,
    loads: usize,
}

impl DatasetCache {
    pub fn get_or_load(&mut self, source: &DataSource) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.cached(source) {
            return Ok(dataset);
        }
        match source {
            DataSource::Default(path) => {
                self.entry = None;
                let dataset = load_file(path)?;
                Ok(self.store(source.clone(), dataset))
            }
            DataSource::Uploaded { path, .. } => self.upload(path).map(|(_, dataset)| dataset),
        }
    }

    /// Read a user-picked file once, key it by the digest of those bytes and
    /// parse the same bytes.
    pub fn upload(&mut self, path: &Path) -> Result<(DataSource, Arc<Dataset>)> {
        let format = FileFormat::from_path(path)?;
        let bytes = std::fs::read(path)
            .with_context(|| format!("reading uploaded file {}", path.display()))?;
        let source = DataSource::Uploaded {
            path: path.to_path_buf(),
            digest: content_digest(&bytes),
        };
        if let Some(dataset) = self.cached(&source) {
            return Ok((source, dataset));
        }

        self.entry = None;
        let dataset = load_bytes(path, format, bytes)?;
        let dataset = self.store(source.clone(), dataset);
        Ok((source, dataset))
    }

    fn cached(&self, source: &DataSource) -> Option<Arc<Dataset>> {
        match &self.entry {
            Some((cached, dataset)) if cached == source => {
                log::debug!("Dataset cache hit for {}", source.label());
                Some(Arc::clone(dataset))
            }
            _ => None,
        }
    }

    fn store(&mut self, source: DataSource, dataset: Dataset) -> Arc<Dataset> {
        let dataset = Arc::new(dataset);
        self.loads += 1;
        self.entry = Some((source, Arc::clone(&dataset)));
        dataset
    }

    /// Number of parses performed so far.
    pub fn loads(&self) -> usize {
        self.loads
    }
}
