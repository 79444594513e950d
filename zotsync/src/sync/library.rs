use zotsync_core::{ZoteroClient, ZoteroError};

use super::model::{Collection, Item};

/// Read access to the reference library being mirrored.
#[allow(async_fn_in_trait)]
pub trait Library {
    async fn list_collections(&self) -> Result<Vec<Collection>, ZoteroError>;

    /// Items directly inside `collection_key`, not those of its sub-collections.
    async fn list_top_items(&self, collection_key: &str) -> Result<Vec<Item>, ZoteroError>;
}

impl Library for ZoteroClient {
    async fn list_collections(&self) -> Result<Vec<Collection>, ZoteroError> {
        let records = ZoteroClient::list_collections(self).await?;
        Ok(records.into_iter().map(Collection::from).collect())
    }

    async fn list_top_items(&self, collection_key: &str) -> Result<Vec<Item>, ZoteroError> {
        let records = ZoteroClient::list_top_items(self, collection_key).await?;
        Ok(records.into_iter().map(Item::from).collect())
    }
}
