use serde::{Deserialize, Serialize};
use std::time::Duration;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// What happens to the rest of the fan-out when one enrichment fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrichmentPolicy {
    /// Cancel everything still running and report the first failure.
    #[default]
    FailFast,
    /// Let every task finish and report failures alongside the outcome.
    BestEffort,
}

/// Freshness window of one cached enricher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnricherSettings {
    #[serde(with = "duration_secs")]
    pub max_age: Duration,
}

impl EnricherSettings {
    pub fn new(max_age: Duration) -> Self {
        Self { max_age }
    }

    pub fn details() -> Self {
        Self::new(14 * DAY)
    }

    pub fn images() -> Self {
        Self::new(28 * DAY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Page 0 older than this is fetched again even without a force flag.
    #[serde(with = "duration_secs")]
    pub refresh_max_age: Duration,
    pub enrichment_policy: EnrichmentPolicy,
    /// Upper bound on enrichment calls in flight. `0` means unbounded.
    pub max_concurrent_enrichments: usize,
    pub details: EnricherSettings,
    pub images: EnricherSettings,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            refresh_max_age: 7 * DAY,
            enrichment_policy: EnrichmentPolicy::FailFast,
            max_concurrent_enrichments: 16,
            details: EnricherSettings::details(),
            images: EnricherSettings::images(),
        }
    }
}

impl SyncSettings {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn with_refresh_max_age(mut self, max_age: Duration) -> Self {
        self.refresh_max_age = max_age;
        self
    }

    pub fn with_policy(mut self, policy: EnrichmentPolicy) -> Self {
        self.enrichment_policy = policy;
        self
    }

    pub fn with_max_concurrent_enrichments(mut self, limit: usize) -> Self {
        self.max_concurrent_enrichments = limit;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fail_fast_and_weekly_refresh() {
        let settings = SyncSettings::default();
        assert_eq!(settings.enrichment_policy, EnrichmentPolicy::FailFast);
        assert_eq!(settings.refresh_max_age, 7 * DAY);
        assert_eq!(settings.max_concurrent_enrichments, 16);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = SyncSettings::from_json(
            r#"{ "enrichment_policy": "best_effort", "refresh_max_age": 3600 }"#,
        )
        .unwrap();

        assert_eq!(settings.enrichment_policy, EnrichmentPolicy::BestEffort);
        assert_eq!(settings.refresh_max_age, Duration::from_secs(3600));
        assert_eq!(settings.details, EnricherSettings::details());
        assert_eq!(settings.max_concurrent_enrichments, 16);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        assert!(SyncSettings::from_json(r#"{ "enrichment_policy": "yolo" }"#).is_err());
    }
}
