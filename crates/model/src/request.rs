use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Which page a sync invocation targets.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PageMode {
    /// Continue after the last fetched page (or start at page 0 if nothing was fetched).
    NextPage,
    /// Restart from page 0.
    Refresh,
}

impl fmt::Display for PageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageMode::NextPage => write!(f, "next_page"),
            PageMode::Refresh => write!(f, "refresh"),
        }
    }
}

impl FromStr for PageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "next" | "next_page" | "next-page" => Ok(PageMode::NextPage),
            "refresh" => Ok(PageMode::Refresh),
            other => Err(format!("unknown page mode '{other}'")),
        }
    }
}

/// Per-invocation input of the orchestrator. Created, used once, dropped.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncRequest {
    pub mode: PageMode,
    pub force_refresh: bool,
}

impl SyncRequest {
    pub fn new(mode: PageMode, force_refresh: bool) -> Self {
        Self {
            mode,
            force_refresh,
        }
    }

    pub fn next_page() -> Self {
        Self::new(PageMode::NextPage, false)
    }

    pub fn refresh() -> Self {
        Self::new(PageMode::Refresh, false)
    }

    pub fn forced(mut self) -> Self {
        self.force_refresh = true;
        self
    }
}
