use chrono::{DateTime, Utc};
use model::pagination::page::PageIndex;
use serde::{Deserialize, Serialize};

/// Persisted paging state of one collection.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CursorRecord {
    /// Last page successfully fetched from the remote.
    pub last_page: Option<PageIndex>,
    /// When page 0 was last fetched from the remote.
    pub last_refresh: Option<DateTime<Utc>>,
}

impl CursorRecord {
    /// Applies a successful page commit on top of the previous record.
    pub fn committed(
        previous: Option<CursorRecord>,
        page: PageIndex,
        refreshed_at: Option<DateTime<Utc>>,
    ) -> Self {
        let previous = previous.unwrap_or_default();
        CursorRecord {
            last_page: Some(page),
            last_refresh: refreshed_at.or(previous.last_refresh),
        }
    }
}
