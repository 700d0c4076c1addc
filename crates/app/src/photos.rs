//! Image files behind the photo timeline, kept in a flat directory and named
//! by the stored filename.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

/// Name and size of a file about to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
}

impl PhotoStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub async fn inspect(source: &Path) -> anyhow::Result<SourceFile> {
        let meta = tokio::fs::metadata(source)
            .await
            .with_context(|| format!("reading {}", source.display()))?;
        if !meta.is_file() {
            bail!("{} is not a file", source.display());
        }
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("{} has no usable file name", source.display()))?
            .to_string();
        Ok(SourceFile {
            name,
            size: meta.len(),
        })
    }

    /// Copy `source` into the store as `filename`.
    pub async fn save(&self, source: &Path, filename: &str) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("creating {}", self.root.display()))?;
        let target = self.path(filename);
        tokio::fs::copy(source, &target)
            .await
            .with_context(|| format!("copying {} to {}", source.display(), target.display()))?;
        Ok(target)
    }

    /// Remove a stored file. Returns `false` when it was already gone.
    pub async fn remove(&self, filename: &str) -> anyhow::Result<bool> {
        let target = self.path(filename);
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err).with_context(|| format!("removing {}", target.display())),
        }
    }
}
