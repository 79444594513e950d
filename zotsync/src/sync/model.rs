use url::Url;
use zotsync_core::{CollectionRecord, ItemRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub key: String,
    pub name: String,
    pub parent_key: Option<String>,
}

impl Collection {
    pub fn new(key: impl Into<String>, name: impl Into<String>, parent_key: Option<&str>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            parent_key: parent_key.map(str::to_string),
        }
    }
}

impl From<CollectionRecord> for Collection {
    fn from(record: CollectionRecord) -> Self {
        Self {
            key: record.key,
            name: record.data.name,
            parent_key: record.data.parent_collection,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub href: Url,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub key: String,
    pub title: String,
    pub attachment: Option<AttachmentRef>,
}

impl From<ItemRecord> for Item {
    fn from(record: ItemRecord) -> Self {
        Self {
            key: record.key,
            title: record.data.title,
            attachment: record.links.attachment.map(|link| AttachmentRef {
                href: link.href,
                content_type: link.attachment_type,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_from_record_keeps_attachment_href() {
        let record: ItemRecord = serde_json::from_value(serde_json::json!({
            "key": "I1",
            "links": {
                "attachment": {
                    "href": "https://api.zotero.org/users/1/items/A1",
                    "attachmentType": "application/pdf"
                }
            },
            "data": { "itemType": "journalArticle", "title": "Foo" }
        }))
        .unwrap();

        let item = Item::from(record);
        assert_eq!(item.title, "Foo");
        let attachment = item.attachment.unwrap();
        assert_eq!(
            attachment.href.as_str(),
            "https://api.zotero.org/users/1/items/A1"
        );
        assert_eq!(attachment.content_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn collection_from_record_maps_parent() {
        let record: CollectionRecord = serde_json::from_value(serde_json::json!({
            "key": "B",
            "data": { "name": "Papers", "parentCollection": "A" }
        }))
        .unwrap();

        assert_eq!(
            Collection::from(record),
            Collection::new("B", "Papers", Some("A"))
        );
    }
}
