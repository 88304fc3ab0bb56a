//! Activity records and the filter criteria used to select them.
//!
//! Activity documents in the catalog are loosely shaped JSON written by an
//! upstream catalog-management process. [`ActivityRecord`] pins that shape
//! down to a typed record with explicit defaults:
//! - missing descriptive fields are `None`
//! - missing or non-list `Themes` is an empty list
//! - `Age` may be a number or a numeric string
//! - `Diagnosis` may be a string or a list of strings (joined with `", "`)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::catalog::CatalogQuery;
use crate::error::{Error, Result};

/// A single catalog activity, as stored in the `activity_data` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Opaque identifier (typically a UUID). Also names the asset prefix.
    #[serde(rename = "Activity ID", default, deserialize_with = "lenient_string")]
    pub id: String,

    #[serde(rename = "Activity Name", default, deserialize_with = "lenient_opt_string")]
    pub name: Option<String>,

    #[serde(rename = "Activity Description", default, deserialize_with = "lenient_opt_string")]
    pub description: Option<String>,

    #[serde(rename = "Therapy Goal", default, deserialize_with = "lenient_opt_string")]
    pub therapy_goal: Option<String>,

    #[serde(rename = "Learning Goal", default, deserialize_with = "lenient_opt_string")]
    pub learning_goal: Option<String>,

    /// Target age in years.
    #[serde(rename = "Age", default, deserialize_with = "lenient_age")]
    pub age: Option<u32>,

    /// Thematic tags, original casing preserved.
    #[serde(rename = "Themes", default, deserialize_with = "lenient_string_list")]
    pub themes: Vec<String>,

    /// Free-text diagnosis tags.
    #[serde(rename = "Diagnosis", default, deserialize_with = "lenient_diagnosis")]
    pub diagnosis: Option<String>,
}

impl ActivityRecord {
    /// Create a record with only an identifier set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            therapy_goal: None,
            learning_goal: None,
            age: None,
            themes: Vec::new(),
            diagnosis: None,
        }
    }

    /// Parse an `activity_data` JSON document.
    ///
    /// `row_id` is the row's `activity_id` column; it becomes the identifier
    /// when the document carries no `"Activity ID"` of its own.
    pub fn from_document(row_id: &str, document: &str) -> serde_json::Result<Self> {
        let mut record: Self = serde_json::from_str(document)?;
        if record.id.trim().is_empty() {
            record.id = row_id.to_string();
        }
        Ok(record)
    }

    /// True if any of `wanted` (already lowercased) equals one of this
    /// record's themes, compared case-insensitively.
    pub fn matches_any_theme(&self, wanted: &[String]) -> bool {
        let own: Vec<String> = self.themes.iter().map(|t| t.to_lowercase()).collect();
        wanted.iter().any(|w| own.contains(w))
    }
}

// --- Lenient field decoders ---

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<String, D::Error> {
    Ok(lenient_opt_string(d)?.unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_age<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<u32>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_string_list<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

fn lenient_diagnosis<'de, D: Deserializer<'de>>(
    d: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        _ => None,
    })
}

// --- Filter criteria ---

/// Normalized filter inputs for one retrieval request.
///
/// Every field is independently optional. An absent field places no
/// constraint on its dimension. Serializes as the `filters` echo of the
/// response: `{"age": .., "diagnosis": .., "themes": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Exact target age.
    pub age: Option<u32>,
    /// Case-insensitive substring of the diagnosis field.
    pub diagnosis: Option<String>,
    /// Match ANY of these themes, case-insensitively. Empty = no constraint.
    #[serde(default)]
    pub themes: Vec<String>,
}

impl FilterCriteria {
    /// Build criteria, normalizing the diagnosis and theme inputs.
    pub fn new(age: Option<u32>, diagnosis: Option<String>, themes: Vec<String>) -> Self {
        let diagnosis = diagnosis
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let themes = themes
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            age,
            diagnosis,
            themes,
        }
    }

    /// Parse raw request parameters.
    ///
    /// `themes` is a comma-separated list. Blank values for any parameter
    /// are treated as absent. A non-numeric or negative age is rejected.
    pub fn parse(age: Option<&str>, diagnosis: Option<&str>, themes: Option<&str>) -> Result<Self> {
        let age = match age.map(str::trim).filter(|a| !a.is_empty()) {
            Some(raw) => Some(raw.parse::<u32>().map_err(|_| {
                Error::InvalidFilter(format!("age must be a non-negative integer, got '{raw}'"))
            })?),
            None => None,
        };
        let themes = themes.map(Self::split_themes).unwrap_or_default();
        Ok(Self::new(age, diagnosis.map(str::to_string), themes))
    }

    /// Split a comma-separated theme string, trimming tokens and dropping
    /// empty ones.
    pub fn split_themes(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// True when no dimension is constrained.
    pub fn is_unconstrained(&self) -> bool {
        self.age.is_none() && self.diagnosis.is_none() && self.themes.is_empty()
    }

    /// The part of the criteria pushed down to the structured store.
    pub fn catalog_query(&self) -> CatalogQuery {
        CatalogQuery {
            age: self.age,
            diagnosis: self.diagnosis.clone(),
        }
    }

    /// Requested themes, lowercased for matching.
    pub fn theme_keys(&self) -> Vec<String> {
        self.themes.iter().map(|t| t.to_lowercase()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_document() {
        let doc = r#"{
            "Activity ID": "A1",
            "Activity Name": "Breathing Buddies",
            "Activity Description": "Belly breathing with a stuffed toy",
            "Therapy Goal": "Self-regulation",
            "Learning Goal": "Notice the breath",
            "Age": 8,
            "Themes": ["Emotional Regulation", "Motor Skills"],
            "Diagnosis": "Mild ADHD, anxiety"
        }"#;
        let record = ActivityRecord::from_document("row-1", doc).unwrap();
        assert_eq!(record.id, "A1");
        assert_eq!(record.name.as_deref(), Some("Breathing Buddies"));
        assert_eq!(record.age, Some(8));
        assert_eq!(record.themes.len(), 2);
        assert_eq!(record.diagnosis.as_deref(), Some("Mild ADHD, anxiety"));
    }

    #[test]
    fn missing_fields_take_explicit_defaults() {
        let record = ActivityRecord::from_document("row-7", "{}").unwrap();
        assert_eq!(record.id, "row-7");
        assert!(record.name.is_none());
        assert!(record.age.is_none());
        assert!(record.themes.is_empty());
        assert!(record.diagnosis.is_none());
    }

    #[test]
    fn non_list_themes_are_empty() {
        let record =
            ActivityRecord::from_document("x", r#"{"Themes": "Motor Skills"}"#).unwrap();
        assert!(record.themes.is_empty());

        let record =
            ActivityRecord::from_document("x", r#"{"Themes": ["Calm", 3, null]}"#).unwrap();
        assert_eq!(record.themes, vec!["Calm".to_string()]);
    }

    #[test]
    fn age_accepts_numeric_string() {
        let record = ActivityRecord::from_document("x", r#"{"Age": " 9 "}"#).unwrap();
        assert_eq!(record.age, Some(9));
        let record = ActivityRecord::from_document("x", r#"{"Age": -3}"#).unwrap();
        assert!(record.age.is_none());
    }

    #[test]
    fn diagnosis_list_is_joined() {
        let record =
            ActivityRecord::from_document("x", r#"{"Diagnosis": ["ADHD", "Anxiety"]}"#).unwrap();
        assert_eq!(record.diagnosis.as_deref(), Some("ADHD, Anxiety"));
    }

    #[test]
    fn non_object_document_is_rejected() {
        assert!(ActivityRecord::from_document("x", "[1, 2]").is_err());
    }

    #[test]
    fn theme_matching_is_case_insensitive_any() {
        let mut record = ActivityRecord::new("A1");
        record.themes = vec!["Emotional Regulation".into(), "Motor Skills".into()];

        let wanted = FilterCriteria::new(None, None, vec!["motor skills".into()]).theme_keys();
        assert!(record.matches_any_theme(&wanted));

        let wanted = FilterCriteria::new(None, None, vec!["Social Skills".into()]).theme_keys();
        assert!(!record.matches_any_theme(&wanted));
    }

    #[test]
    fn record_serializes_with_catalog_keys() {
        let record = ActivityRecord::new("A1");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Activity ID"], "A1");
        assert!(json["Activity Name"].is_null());
        assert_eq!(json["Themes"], serde_json::json!([]));
    }

    #[test]
    fn parse_splits_and_trims_themes() {
        let criteria = FilterCriteria::parse(
            Some("8"),
            Some("ADHD"),
            Some(" Emotional Regulation , Motor Skills,, "),
        )
        .unwrap();
        assert_eq!(criteria.age, Some(8));
        assert_eq!(criteria.diagnosis.as_deref(), Some("ADHD"));
        assert_eq!(criteria.themes, vec!["Emotional Regulation", "Motor Skills"]);
    }

    #[test]
    fn empty_theme_string_equals_absent() {
        let empty = FilterCriteria::parse(None, None, Some("")).unwrap();
        let absent = FilterCriteria::parse(None, None, None).unwrap();
        assert_eq!(empty, absent);
        assert!(empty.is_unconstrained());
    }

    #[test]
    fn blank_diagnosis_is_no_filter() {
        let criteria = FilterCriteria::parse(None, Some("   "), None).unwrap();
        assert!(criteria.diagnosis.is_none());
    }

    #[test]
    fn malformed_age_is_rejected() {
        assert!(matches!(
            FilterCriteria::parse(Some("eight"), None, None),
            Err(Error::InvalidFilter(_))
        ));
        assert!(FilterCriteria::parse(Some("-1"), None, None).is_err());
        assert!(FilterCriteria::parse(Some(""), None, None).unwrap().age.is_none());
    }

    #[test]
    fn filters_echo_shape() {
        let criteria = FilterCriteria::new(Some(8), None, vec![]);
        let json = serde_json::to_value(&criteria).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"age": 8, "diagnosis": null, "themes": []})
        );
    }
}
