use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use url::Url;

use crate::library::LibraryRef;

const DEFAULT_BASE_URL: &str = "https://api.zotero.org";
const API_VERSION: &str = "3";
const DEFAULT_PAGE_SIZE: u32 = 100;
const TOTAL_RESULTS_HEADER: &str = "Total-Results";

#[derive(Debug, Error)]
pub enum ZoteroError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("api returned {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("invalid {name} header: {value}")]
    InvalidHeader { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct ZoteroClient {
    http: Client,
    base_url: Url,
    library: LibraryRef,
    api_key: String,
    page_size: u32,
}

impl ZoteroClient {
    pub fn new(library: LibraryRef, api_key: impl Into<String>) -> Result<Self, ZoteroError> {
        Self::with_base_url(DEFAULT_BASE_URL, library, api_key)
    }

    pub fn with_base_url(
        base_url: &str,
        library: LibraryRef,
        api_key: impl Into<String>,
    ) -> Result<Self, ZoteroError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(base_url)?,
            library,
            api_key: api_key.into(),
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub async fn list_collections_page(
        &self,
        start: u32,
        limit: u32,
    ) -> Result<Page<CollectionRecord>, ZoteroError> {
        let url = self.library_endpoint("collections")?;
        self.get_page(url, start, limit).await
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionRecord>, ZoteroError> {
        let url = self.library_endpoint("collections")?;
        self.get_all(url).await
    }

    /// Items that sit directly in `collection_key`. Items of sub-collections and
    /// child items (attachments, notes) are not included.
    pub async fn list_top_items(
        &self,
        collection_key: &str,
    ) -> Result<Vec<ItemRecord>, ZoteroError> {
        let url = self.library_endpoint(&format!("collections/{collection_key}/items/top"))?;
        self.get_all(url).await
    }

    async fn get_all<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<Vec<T>, ZoteroError> {
        let mut start = 0u32;
        let mut items = Vec::new();
        loop {
            let page = self.get_page(url.clone(), start, self.page_size).await?;
            if page.items.is_empty() {
                break;
            }
            let received = page.items.len() as u32;
            start = start.saturating_add(received);
            let total = page.total;
            items.extend(page.items);
            let done = match total {
                Some(total) => start >= total,
                None => received < self.page_size,
            };
            if done {
                break;
            }
        }
        Ok(items)
    }

    async fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        mut url: Url,
        start: u32,
        limit: u32,
    ) -> Result<Page<T>, ZoteroError> {
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("start", &start.to_string())
            .append_pair("limit", &limit.to_string());
        let response = self
            .http
            .get(url)
            .header("Zotero-API-Version", API_VERSION)
            .header("Zotero-API-Key", &self.api_key)
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let total = parse_total_results(&response)?;
        let items = response.json::<Vec<T>>().await?;
        Ok(Page { items, start, total })
    }

    fn library_endpoint(&self, route: &str) -> Result<Url, ZoteroError> {
        let path = format!("{}/{}", self.library.path_prefix(), route);
        Ok(self.base_url.join(&path)?)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ZoteroError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ZoteroError::Api { status, body })
        }
    }
}

impl ZoteroError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ZoteroError::Api { status, .. } => Some(*status),
            ZoteroError::Request(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}

fn parse_total_results(response: &reqwest::Response) -> Result<Option<u32>, ZoteroError> {
    let Some(value) = response.headers().get(TOTAL_RESULTS_HEADER) else {
        return Ok(None);
    };
    let text = value.to_str().unwrap_or_default();
    text.trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|_| ZoteroError::InvalidHeader {
            name: TOTAL_RESULTS_HEADER,
            value: text.to_string(),
        })
}

#[derive(Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub start: u32,
    /// Value of the `Total-Results` header, when the server sent one.
    pub total: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CollectionRecord {
    pub key: String,
    #[serde(default)]
    pub version: u64,
    pub data: CollectionData,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CollectionData {
    pub name: String,
    /// Zotero sends `false` for top-level collections.
    #[serde(
        rename = "parentCollection",
        default,
        deserialize_with = "parent_key_or_false"
    )]
    pub parent_collection: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ItemRecord {
    pub key: String,
    #[serde(default)]
    pub links: ItemLinks,
    pub data: ItemData,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ItemLinks {
    #[serde(default)]
    pub attachment: Option<AttachmentLink>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AttachmentLink {
    pub href: Url,
    #[serde(rename = "attachmentType", default)]
    pub attachment_type: Option<String>,
    #[serde(rename = "attachmentSize", default)]
    pub attachment_size: Option<u64>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ItemData {
    #[serde(default)]
    pub title: String,
}

fn parent_key_or_false<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ParentRef {
        Flag(bool),
        Key(String),
    }

    match Option::<ParentRef>::deserialize(deserializer)? {
        None | Some(ParentRef::Flag(false)) => Ok(None),
        Some(ParentRef::Key(key)) if !key.is_empty() => Ok(Some(key)),
        Some(ParentRef::Key(_)) => Ok(None),
        Some(ParentRef::Flag(true)) => Err(serde::de::Error::custom(
            "parentCollection must be a key or false",
        )),
    }
}
