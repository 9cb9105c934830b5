//! Notify-based vault watching.
//!
//! Raw file system notifications are coalesced by `notify-debouncer-full`
//! over a short window, converted to [`ChangeEvent`]s and pushed onto a tokio
//! channel. The quiescence window that decides when to scan lives in the
//! core scheduler, not here.

use crate::error::Result;
use crate::store::document_id_in;
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{new_debouncer, DebounceEventResult, Debouncer, RecommendedCache};
use siblink_core::{ChangeEvent, ChangeKind};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

/// Coalescing window for raw notifications.
const FS_DEBOUNCE: Duration = Duration::from_millis(100);

/// Recursive watch over a vault directory.
///
/// Watching stops when the value is dropped.
pub struct VaultWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    root: PathBuf,
}

impl VaultWatcher {
    /// Start watching `root`, sending every change under it to `sender`.
    ///
    /// `root` should be canonical (see [`FsVault::root`](crate::FsVault::root)),
    /// since notification paths are reported canonicalized.
    pub fn start(root: &Path, sender: mpsc::UnboundedSender<ChangeEvent>) -> Result<Self> {
        let event_root = root.to_path_buf();
        let mut debouncer = new_debouncer(FS_DEBOUNCE, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        for change in change_events(&event_root, &event.event) {
                            debug!(document = %change.id, kind = ?change.kind, "File change");
                            if let Err(e) = sender.send(change) {
                                error!("Failed to send change event: {}", e);
                            }
                        }
                    }
                }
                Err(errors) => {
                    for error in errors {
                        error!("Notify error: {:?}", error);
                    }
                }
            }
        })?;

        debouncer.watch(root, RecursiveMode::Recursive)?;
        info!(root = %root.display(), "Watching vault");

        Ok(Self {
            debouncer,
            root: root.to_path_buf(),
        })
    }

    /// Watched root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching.
    pub fn stop(self) {
        info!(root = %self.root.display(), "Stopped watching vault");
        self.debouncer.stop();
    }
}

/// Convert one notification into document changes under `root`.
///
/// Paths outside the vault or inside hidden folders are dropped, as are
/// directory events and metadata-only modifications.
pub(crate) fn change_events(root: &Path, event: &Event) -> Vec<ChangeEvent> {
    let paths = &event.paths;
    let mut changes: Vec<(&PathBuf, ChangeKind)> = Vec::new();

    match event.kind {
        EventKind::Create(_) => {
            changes.extend(paths.iter().map(|p| (p, ChangeKind::Created)));
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => {}
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            changes.extend(paths.iter().map(|p| (p, ChangeKind::Removed)));
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            changes.extend(paths.iter().map(|p| (p, ChangeKind::Created)));
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            if let [from, to] = paths.as_slice() {
                changes.push((from, ChangeKind::Removed));
                changes.push((to, ChangeKind::Created));
            }
        }
        EventKind::Modify(ModifyKind::Name(_)) => {
            // Platforms that cannot pair rename halves report one side only.
            changes.extend(paths.iter().map(|p| {
                let kind = if p.exists() {
                    ChangeKind::Created
                } else {
                    ChangeKind::Removed
                };
                (p, kind)
            }));
        }
        EventKind::Modify(_) => {
            changes.extend(paths.iter().map(|p| (p, ChangeKind::Modified)));
        }
        EventKind::Remove(_) => {
            changes.extend(paths.iter().map(|p| (p, ChangeKind::Removed)));
        }
        EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
    }

    changes
        .into_iter()
        .filter(|(path, kind)| *kind == ChangeKind::Removed || !path.is_dir())
        .filter_map(|(path, kind)| {
            document_id_in(root, path).map(|id| ChangeEvent::new(id, kind))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use siblink_core::DocumentId;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |event, path| event.add_path(PathBuf::from(path)))
    }

    fn root() -> &'static Path {
        Path::new("/nonexistent-vault")
    }

    #[test]
    fn test_modify_maps_to_modified() {
        let changes = change_events(
            root(),
            &event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/nonexistent-vault/daily/2024-01-01.md"],
            ),
        );
        assert_eq!(changes, vec![ChangeEvent::modified("daily/2024-01-01.md")]);
    }

    #[test]
    fn test_create_and_remove() {
        let created = change_events(
            root(),
            &event(EventKind::Create(CreateKind::File), &["/nonexistent-vault/a.md"]),
        );
        assert_eq!(created, vec![ChangeEvent::new("a.md", ChangeKind::Created)]);

        let removed = change_events(
            root(),
            &event(EventKind::Remove(RemoveKind::File), &["/nonexistent-vault/a.md"]),
        );
        assert_eq!(removed, vec![ChangeEvent::new("a.md", ChangeKind::Removed)]);
    }

    #[test]
    fn test_paired_rename() {
        let changes = change_events(
            root(),
            &event(
                EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
                &["/nonexistent-vault/old.md", "/nonexistent-vault/new.md"],
            ),
        );
        assert_eq!(
            changes,
            vec![
                ChangeEvent::new("old.md", ChangeKind::Removed),
                ChangeEvent::new("new.md", ChangeKind::Created),
            ]
        );
    }

    #[test]
    fn test_metadata_and_hidden_paths_are_dropped() {
        let metadata = change_events(
            root(),
            &event(
                EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
                &["/nonexistent-vault/a.md"],
            ),
        );
        assert!(metadata.is_empty());

        let hidden = change_events(
            root(),
            &event(
                EventKind::Modify(ModifyKind::Data(DataChange::Content)),
                &["/nonexistent-vault/.obsidian/workspace.json", "/elsewhere/b.md"],
            ),
        );
        assert!(hidden.is_empty());
    }

    #[test]
    fn test_ids_are_vault_relative() {
        let changes = change_events(
            root(),
            &event(EventKind::Create(CreateKind::Any), &["/nonexistent-vault/people/Bob.md"]),
        );
        assert_eq!(changes[0].id, DocumentId::new("people/Bob.md"));
    }
}
