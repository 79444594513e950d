mod client;
mod library;

pub use client::{
    AttachmentLink, CollectionData, CollectionRecord, ItemData, ItemLinks, ItemRecord, Page,
    ZoteroClient, ZoteroError,
};
pub use library::{LibraryRef, LibraryType};
