use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::info;
use url::Url;

use super::model::Item;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("attachment download for item {item} returned {status}")]
    Status { item: String, status: StatusCode },
}

/// Downloads an item's attachment into local staging.
#[allow(async_fn_in_trait)]
pub trait AttachmentFetcher {
    /// Writes the attachment to `destination_dir/filename` and returns that path,
    /// or `None` when the item carries no attachment.
    async fn fetch(
        &self,
        item: &Item,
        destination_dir: &Path,
        filename: &str,
    ) -> Result<Option<PathBuf>, FetchError>;
}

/// Fetches Zotero attachment files, authenticating with the library's API key.
#[derive(Clone)]
pub struct ZoteroFetcher {
    http: Client,
    api_key: String,
}

impl ZoteroFetcher {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_http(Client::new(), api_key)
    }

    pub fn with_http(http: Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
        }
    }

    pub async fn download_to_path(
        &self,
        item_key: &str,
        attachment: &Url,
        target: &Path,
    ) -> Result<(), FetchError> {
        let url = self.file_url(attachment)?;
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status {
                item: item_key.to_string(),
                status: response.status(),
            });
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let partial = partial_path(target);
        if let Err(err) = write_body(response, &partial).await {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(err);
        }

        tokio::fs::rename(partial, target).await?;
        Ok(())
    }

    /// `<href>/file?key=<api key>`
    fn file_url(&self, attachment: &Url) -> Result<Url, FetchError> {
        let mut url = Url::parse(&format!(
            "{}/file",
            attachment.as_str().trim_end_matches('/')
        ))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

impl AttachmentFetcher for ZoteroFetcher {
    async fn fetch(
        &self,
        item: &Item,
        destination_dir: &Path,
        filename: &str,
    ) -> Result<Option<PathBuf>, FetchError> {
        let Some(attachment) = item.attachment.as_ref() else {
            return Ok(None);
        };
        let target = destination_dir.join(filename);
        info!(filename, dir = %destination_dir.display(), "downloading attachment");
        self.download_to_path(&item.key, &attachment.href, &target)
            .await?;
        Ok(Some(target))
    }
}

async fn write_body(response: reqwest::Response, partial: &Path) -> Result<(), FetchError> {
    let mut file = tokio::fs::File::create(partial).await?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

fn partial_path(target: &Path) -> PathBuf {
    target.with_extension(format!(
        "{}partial",
        target
            .extension()
            .map(|ext| format!("{}.", ext.to_string_lossy()))
            .unwrap_or_default()
    ))
}
