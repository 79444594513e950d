use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};
use zotsync_core::ZoteroError;

use super::library::Library;
use super::model::Item;
use super::paths::{PathError, pdf_filename, remote_join, segment_for, staging_path_for};
use super::remote::RemoteStore;
use super::transfer::{AttachmentFetcher, FetchError};
use super::tree::{CollectionTree, TreeNode};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to list items of collection {collection}: {source}")]
    Library {
        collection: String,
        #[source]
        source: ZoteroError,
    },
    #[error("failed to download {filename}: {source}")]
    AttachmentDownload {
        filename: String,
        #[source]
        source: FetchError,
    },
    #[error("staging path error: {0}")]
    Path(#[from] PathError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub directories_visited: usize,
    pub directories_created: usize,
    pub files_uploaded: usize,
    pub files_skipped: usize,
    pub items_without_attachment: usize,
    /// Failed mkdir or upload calls; the walk carries on past them.
    pub warnings: usize,
}

/// Mirrors a [`CollectionTree`] onto a [`RemoteStore`].
///
/// Nodes are handled depth-first in pre-order, one remote call at a time: the
/// node's directory is ensured, its top-level items are synced, then its
/// children are visited with the node's directory as their parent path. An item
/// is only downloaded and uploaded when `<dir>/<title>.pdf` does not exist
/// remotely, so re-running after a failure only transfers what is missing.
pub struct SyncWalker<'a, L, F, R> {
    library: &'a L,
    fetcher: &'a F,
    remote: &'a R,
    staging_root: PathBuf,
}

impl<'a, L, F, R> SyncWalker<'a, L, F, R>
where
    L: Library,
    F: AttachmentFetcher,
    R: RemoteStore,
{
    pub fn new(
        library: &'a L,
        fetcher: &'a F,
        remote: &'a R,
        staging_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            library,
            fetcher,
            remote,
            staging_root: staging_root.into(),
        }
    }

    pub async fn run(
        &self,
        tree: &CollectionTree,
        remote_root: &str,
    ) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        self.ensure_directory(remote_root, &mut report).await;

        let mut pending: Vec<(&TreeNode, String)> = vec![(tree.root(), remote_root.to_string())];
        while let Some((node, parent_path)) = pending.pop() {
            let destination = remote_join(&parent_path, node.name());
            self.sync_node(node, &destination, &mut report).await?;
            pending.extend(
                node.children
                    .iter()
                    .rev()
                    .map(|child| (child, destination.clone())),
            );
        }

        Ok(report)
    }

    async fn sync_node(
        &self,
        node: &TreeNode,
        destination: &str,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        info!(collection = node.name(), path = destination, "syncing collection");
        report.directories_visited += 1;
        self.ensure_directory(destination, report).await;

        let Some(collection) = node.source.collection() else {
            debug!(path = destination, "synthetic root has no items");
            return Ok(());
        };

        let items = self
            .library
            .list_top_items(&collection.key)
            .await
            .map_err(|source| SyncError::Library {
                collection: collection.key.clone(),
                source,
            })?;
        for item in &items {
            self.sync_item(item, &collection.name, destination, report)
                .await?;
        }
        Ok(())
    }

    async fn sync_item(
        &self,
        item: &Item,
        collection_name: &str,
        destination: &str,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let filename = pdf_filename(&item.title);
        let candidate = remote_join(destination, &filename);
        if self.remote.exists(&candidate).await {
            debug!(path = %candidate, "already on remote, skipping");
            report.files_skipped += 1;
            return Ok(());
        }
        if item.attachment.is_none() {
            debug!(item = %item.key, title = %item.title, "no attachment");
            report.items_without_attachment += 1;
            return Ok(());
        }

        let staging_dir = staging_path_for(&self.staging_root, &segment_for(collection_name))?;
        tokio::fs::create_dir_all(&staging_dir).await?;
        let staged = self
            .fetcher
            .fetch(item, &staging_dir, &filename)
            .await
            .map_err(|source| SyncError::AttachmentDownload {
                filename: filename.clone(),
                source,
            })?;
        let Some(staged) = staged else {
            report.items_without_attachment += 1;
            return Ok(());
        };

        match self.remote.upload(&staged, destination).await {
            Ok(()) => {
                info!(file = %filename, dir = destination, "uploaded");
                report.files_uploaded += 1;
            }
            Err(err) => {
                warn!(file = %filename, dir = destination, error = %err, "upload failed");
                report.warnings += 1;
            }
        }
        Ok(())
    }

    async fn ensure_directory(&self, path: &str, report: &mut SyncReport) {
        if self.remote.exists(path).await {
            debug!(path, "remote directory exists");
            return;
        }
        match self.remote.mkdir(path).await {
            Ok(()) => {
                debug!(path, "created remote directory");
                report.directories_created += 1;
            }
            Err(err) => {
                warn!(path, error = %err, "failed to create remote directory");
                report.warnings += 1;
            }
        }
    }
}

#[cfg(test)]
#[path = "walker_tests.rs"]
mod tests;
