//! Asset bundles, enriched activities, and the retrieval response.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::activity::{ActivityRecord, FilterCriteria};

/// Step name → base64-encoded image content for one activity.
///
/// Keys are file base names with the extension stripped (`step1.png` →
/// `step1`). An empty bundle is valid: the activity simply has no
/// flashcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetBundle(BTreeMap<String, String>);

impl AssetBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a step, returning the content it replaced, if any.
    pub fn insert(&mut self, step: impl Into<String>, encoded: String) -> Option<String> {
        self.0.insert(step.into(), encoded)
    }

    pub fn get(&self, step: &str) -> Option<&str> {
        self.0.get(step).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// How enrichment went for one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum EnrichmentStatus {
    /// Every listed image was fetched.
    Complete,
    /// No images exist under the activity's prefix.
    Empty,
    /// The listing hit the page cap; assets past it were not fetched.
    Truncated { pages_read: usize },
    /// The content store failed; the bundle was replaced with an empty one.
    Failed { reason: String },
}

impl EnrichmentStatus {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// An activity record joined with its instructional assets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedActivity {
    #[serde(flatten)]
    pub record: ActivityRecord,

    #[serde(rename = "Instructions")]
    pub instructions: AssetBundle,

    #[serde(rename = "Instructions Status")]
    pub status: EnrichmentStatus,
}

impl EnrichedActivity {
    pub fn new(record: ActivityRecord, instructions: AssetBundle, status: EnrichmentStatus) -> Self {
        Self {
            record,
            instructions,
            status,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }
}

/// The full response of one retrieval request.
///
/// `count` is derived from the activity list at construction and cannot be
/// set independently.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityResponse {
    filters: FilterCriteria,
    count: usize,
    activities: Vec<EnrichedActivity>,
}

impl ActivityResponse {
    pub fn new(filters: FilterCriteria, activities: Vec<EnrichedActivity>) -> Self {
        Self {
            filters,
            count: activities.len(),
            activities,
        }
    }

    pub fn filters(&self) -> &FilterCriteria {
        &self.filters
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn activities(&self) -> &[EnrichedActivity] {
        &self.activities
    }

    /// Number of activities whose enrichment failed.
    pub fn failed_enrichments(&self) -> usize {
        self.activities.iter().filter(|a| a.status.is_failed()).count()
    }
}
