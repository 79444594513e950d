use anyhow::Context;
use tracing::info;
use zotsync_core::ZoteroClient;

use crate::config::SyncConfig;
use crate::sync::library::Library;
use crate::sync::remote::RmapiStore;
use crate::sync::transfer::ZoteroFetcher;
use crate::sync::tree::build_tree;
use crate::sync::walker::{SyncReport, SyncWalker};

/// One full pass: list collections, build the tree, mirror it onto the tablet.
pub async fn sync_library(config: &SyncConfig) -> anyhow::Result<SyncReport> {
    let client = match config.api_base.as_deref() {
        Some(base) => ZoteroClient::with_base_url(base, config.library.clone(), &config.api_key),
        None => ZoteroClient::new(config.library.clone(), &config.api_key),
    }
    .context("invalid zotero api configuration")?;

    let collections = match Library::list_collections(&client).await {
        Ok(collections) => collections,
        Err(err) if err.is_auth_failure() => {
            return Err(anyhow::Error::new(err).context("zotero rejected the API key"));
        }
        Err(err) => {
            return Err(anyhow::Error::new(err).context(format!(
                "failed to list collections of {} library {}",
                config.library.library_type, config.library.id
            )));
        }
    };
    info!(count = collections.len(), "fetched collections");

    let tree = build_tree(collections, Some(&config.library_name))
        .context("failed to build collection tree")?;
    info!(nodes = tree.node_count(), root = tree.root().name(), "built collection tree");

    let fetcher = ZoteroFetcher::new(config.api_key.clone());
    let remote = RmapiStore::new(&config.rmapi_program);
    let walker = SyncWalker::new(&client, &fetcher, &remote, &config.staging_root);
    walker
        .run(&tree, &config.remote_root)
        .await
        .context("sync aborted")
}
