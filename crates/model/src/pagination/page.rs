use crate::core::identifiers::ItemId;
use serde::{Deserialize, Serialize};

/// Zero-based page index. Page 0 is the head of the collection and the only
/// page subject to time-based refresh.
pub type PageIndex = u32;

pub const FIRST_PAGE: PageIndex = 0;

/// One row of a cached collection page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CollectionEntry {
    pub item_id: ItemId,
    pub page: PageIndex,
    /// Position inside the page, in server order.
    pub page_order: u32,
}

/// An ordered page of a collection, in the order the server returned it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct CollectionPage {
    pub index: PageIndex,
    pub entries: Vec<CollectionEntry>,
}

impl CollectionPage {
    pub fn new(index: PageIndex, entries: Vec<CollectionEntry>) -> Self {
        Self { index, entries }
    }

    /// Builds a page from item ids, assigning `page_order` from their position.
    pub fn from_ids(index: PageIndex, ids: impl IntoIterator<Item = ItemId>) -> Self {
        let entries = ids
            .into_iter()
            .enumerate()
            .map(|(pos, item_id)| CollectionEntry {
                item_id,
                page: index,
                page_order: pos as u32,
            })
            .collect();
        Self { index, entries }
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        self.entries.iter().map(|e| e.item_id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_first(&self) -> bool {
        self.index == FIRST_PAGE
    }
}
