use crate::error::CliError;
use async_trait::async_trait;
use model::{
    core::identifiers::{CollectionKey, ItemId},
    pagination::page::PageIndex,
};
use serde::Deserialize;
use std::{collections::HashMap, path::Path, sync::Arc};
use sync_core::{collection::CollectionSource, enrich::EntityFetcher, error::FetchError};
use sync_runtime::Fetchers;
use tracing::debug;

/// Offline stand-in for the remote service, loaded from a JSON document:
///
/// ```json
/// { "pages": [[1, 2], [3]], "details": { "1": {...} }, "images": { "1": {...} } }
/// ```
///
/// Pages past the end are empty. Ids missing from `details` or `images`
/// fail with [`FetchError::NotFound`].
#[derive(Debug, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub pages: Vec<Vec<ItemId>>,
    #[serde(default)]
    pub details: HashMap<ItemId, serde_json::Value>,
    #[serde(default)]
    pub images: HashMap<ItemId, serde_json::Value>,
}

impl Fixture {
    pub fn from_json(source: &str) -> Result<Self, CliError> {
        serde_json::from_str(source).map_err(|source| CliError::Parse {
            what: "fixture",
            source,
        })
    }

    pub async fn load(path: &Path) -> Result<Self, CliError> {
        let source = tokio::fs::read_to_string(path).await?;
        Self::from_json(&source)
    }

    /// Splits the fixture into the page source and the two record fetchers.
    pub fn into_remote(self) -> (Arc<FixturePages>, Fetchers) {
        let pages = Arc::new(FixturePages { pages: self.pages });
        let fetchers = Fetchers {
            details: Arc::new(FixtureRecords::new("details", self.details)),
            images: Arc::new(FixtureRecords::new("images", self.images)),
        };
        (pages, fetchers)
    }
}

pub struct FixturePages {
    pages: Vec<Vec<ItemId>>,
}

#[async_trait]
impl CollectionSource for FixturePages {
    async fn fetch_page(
        &self,
        collection: &CollectionKey,
        page: PageIndex,
    ) -> Result<Vec<ItemId>, FetchError> {
        let ids = self.pages.get(page as usize).cloned().unwrap_or_default();
        debug!(collection = %collection, page, items = ids.len(), "Fixture page");
        Ok(ids)
    }
}

pub struct FixtureRecords {
    kind: &'static str,
    records: HashMap<ItemId, serde_json::Value>,
}

impl FixtureRecords {
    fn new(kind: &'static str, records: HashMap<ItemId, serde_json::Value>) -> Self {
        Self { kind, records }
    }
}

#[async_trait]
impl EntityFetcher for FixtureRecords {
    async fn fetch(&self, id: ItemId) -> Result<serde_json::Value, FetchError> {
        self.records
            .get(&id)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("{} for item {id}", self.kind)))
    }
}
