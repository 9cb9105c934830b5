//! Filesystem-backed document store.

use crate::error::{Result, VaultError};
use crate::frontmatter::ParsedDocument;
use crate::index::LinkIndex;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use siblink_core::traits::FrontmatterMutation;
use siblink_core::{
    ChangeEvent, ChangeKind, DocumentId, DocumentStore, LinkResolver, StoreError, StoreResult,
};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A directory of Markdown documents.
///
/// Document identities are `/`-separated paths relative to the root. Files
/// and folders whose name starts with `.` are not part of the vault.
///
/// Frontmatter updates hold a per-document lock for the whole
/// read-modify-write and replace the file through a rename, so concurrent
/// merges into one document serialize and readers never see a torn write.
/// Files other than text documents can be link targets but are never
/// rewritten.
pub struct FsVault {
    root: PathBuf,
    text_extension: String,
    index: RwLock<LinkIndex>,
    locks: DashMap<DocumentId, Arc<Mutex<()>>>,
}

impl FsVault {
    /// Open the vault rooted at `root` and index its files.
    pub async fn open(root: impl Into<PathBuf>, text_extension: impl Into<String>) -> Result<Self> {
        let root = root.into();
        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|_| VaultError::NotADirectory(root.clone()))?;
        if !metadata.is_dir() {
            return Err(VaultError::NotADirectory(root));
        }
        let root = tokio::fs::canonicalize(&root)
            .await
            .map_err(|e| VaultError::io(&root, e))?;

        let vault = Self {
            root,
            text_extension: text_extension.into(),
            index: RwLock::new(LinkIndex::default()),
            locks: DashMap::new(),
        };
        let indexed = vault.refresh_index().await?;
        info!(root = %vault.root.display(), files = indexed, "Opened vault");
        Ok(vault)
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Extension of text documents, without the dot.
    pub fn text_extension(&self) -> &str {
        &self.text_extension
    }

    /// Absolute path of a document.
    pub fn path_of(&self, id: &DocumentId) -> PathBuf {
        id.as_str()
            .split('/')
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Identity of an absolute path inside the vault.
    ///
    /// `None` for paths outside the root or inside a hidden file or folder.
    pub fn document_id(&self, path: &Path) -> Option<DocumentId> {
        document_id_in(&self.root, path)
    }

    /// Rebuild the link index from disk. Returns the number of files indexed.
    pub async fn refresh_index(&self) -> Result<usize> {
        let files = self.walk_files().await?;
        let index = LinkIndex::from_documents(self.text_extension.clone(), files);
        let count = index.len();
        *self.index.write() = index;
        debug!(files = count, "Rebuilt link index");
        Ok(count)
    }

    /// Keep the link index in step with a file system change.
    pub fn apply_change(&self, event: &ChangeEvent) {
        let mut index = self.index.write();
        match event.kind {
            ChangeKind::Created | ChangeKind::Modified => {
                if index.insert(event.id.clone()) {
                    debug!(document = %event.id, "Indexed file");
                }
            }
            ChangeKind::Removed => {
                if index.remove(&event.id) {
                    debug!(document = %event.id, "Unindexed file");
                }
                self.locks.remove(&event.id);
            }
        }
    }

    async fn walk_files(&self) -> Result<Vec<DocumentId>> {
        let root = self.root.clone();
        let files = tokio::task::spawn_blocking(move || {
            let mut files = Vec::new();
            let walker = WalkDir::new(&root)
                .into_iter()
                .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));
            for entry in walker {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(error = %err, "Skipping unreadable vault entry");
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(id) = document_id_in(&root, entry.path()) {
                    files.push(id);
                }
            }
            files.sort();
            files
        })
        .await?;
        Ok(files)
    }

    fn is_text(&self, id: &DocumentId) -> bool {
        id.extension() == Some(self.text_extension.as_str())
    }

    fn lock_for(&self, id: &DocumentId) -> Arc<Mutex<()>> {
        self.locks.entry(id.clone()).or_default().clone()
    }
}

#[async_trait]
impl DocumentStore for FsVault {
    async fn list_documents(&self) -> StoreResult<Vec<DocumentId>> {
        let files = self.walk_files().await.map_err(|err| StoreError::Io {
            id: DocumentId::new(""),
            source: std::io::Error::other(err.to_string()),
        })?;

        let documents: Vec<DocumentId> =
            files.iter().filter(|id| self.is_text(id)).cloned().collect();
        *self.index.write() = LinkIndex::from_documents(self.text_extension.clone(), files);
        Ok(documents)
    }

    async fn read_text(&self, id: &DocumentId) -> StoreResult<String> {
        tokio::fs::read_to_string(self.path_of(id))
            .await
            .map_err(|err| StoreError::io(id.clone(), err))
    }

    async fn process_frontmatter(
        &self,
        id: &DocumentId,
        mutate: FrontmatterMutation<'_>,
    ) -> StoreResult<bool> {
        // Attachments resolve as link targets but never carry frontmatter.
        if !self.is_text(id) {
            debug!(document = %id, "Skipping frontmatter update of non-text file");
            return Ok(false);
        }

        let lock = self.lock_for(id);
        let _guard = lock.lock().await;

        let path = self.path_of(id);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|err| StoreError::io(id.clone(), err))?;
        let mut document = ParsedDocument::parse(&text).map_err(|message| StoreError::Parse {
            id: id.clone(),
            message,
        })?;

        if !mutate(&mut document.frontmatter) {
            return Ok(false);
        }

        let rendered = document.render().map_err(|err| StoreError::Parse {
            id: id.clone(),
            message: err.to_string(),
        })?;
        replace_file(&path, rendered.as_bytes())
            .await
            .map_err(|err| StoreError::io(id.clone(), err))?;
        debug!(document = %id, "Wrote frontmatter");
        Ok(true)
    }
}

#[async_trait]
impl LinkResolver for FsVault {
    async fn resolve(&self, token: &str, source: &DocumentId) -> Option<DocumentId> {
        self.index.read().resolve(token, source)
    }
}

/// Write `contents` beside `path` and rename it into place.
async fn replace_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{}.siblink-tmp", name));

    tokio::fs::write(&staging, contents).await?;
    if let Err(err) = tokio::fs::rename(&staging, path).await {
        let _ = tokio::fs::remove_file(&staging).await;
        return Err(err);
    }
    Ok(())
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Identity of `path` relative to `root`, if it lies inside the vault.
pub(crate) fn document_id_in(root: &Path, path: &Path) -> Option<DocumentId> {
    let relative = path.strip_prefix(root).ok()?;
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) if !is_hidden(segment) => {
                segments.push(segment.to_str()?.to_string());
            }
            _ => return None,
        }
    }
    if segments.is_empty() {
        return None;
    }
    Some(DocumentId::new(segments.join("/")))
}
