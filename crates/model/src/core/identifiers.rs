use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr, sync::Arc};

/// Identifier of a single item in a remote collection (a show, a product, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ItemId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Self)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Names a paginated collection, e.g. `popular` or `trending`.
/// Durable state (cursor, refresh timestamp, cached pages) is keyed by it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionKey(Arc<str>);

impl CollectionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Arc::from(key.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CollectionKey {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for CollectionKey {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for CollectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
