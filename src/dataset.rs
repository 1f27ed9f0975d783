//! Generated dataset types and their wire representation.
//!
//! A [`GeneratedDataset`] is constructed once per generation call, serialized
//! to zero, one, or two sinks, and never mutated afterwards. Its JSON shape
//! is fixed: rows serialize as flat objects (`sample_id`, `group`, then one
//! key per feature in catalog order) so stored documents round-trip
//! byte-for-byte.

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One generated sample: identifier, group label, and feature values.
///
/// Feature values keep their catalog order, which is why this is a `Vec`
/// rather than a map.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    /// `{group_label}_{index:03}`, 1-based within the group.
    pub sample_id: String,
    /// Group label this sample belongs to.
    pub group: String,
    /// Feature name/value pairs, rounded to 3 decimal places.
    pub values: Vec<(String, f64)>,
}

impl SampleRow {
    /// Returns the value for a feature, if present.
    pub fn value(&self, feature: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == feature)
            .map(|(_, v)| *v)
    }

    /// Returns the feature names carried by this row, in order.
    pub fn feature_names(&self) -> Vec<&str> {
        self.values.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl Serialize for SampleRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.values.len()))?;
        map.serialize_entry("sample_id", &self.sample_id)?;
        map.serialize_entry("group", &self.group)?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct SampleRowVisitor;

impl<'de> Visitor<'de> for SampleRowVisitor {
    type Value = SampleRow;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a sample row object with sample_id, group, and feature values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<SampleRow, A::Error> {
        let mut sample_id: Option<String> = None;
        let mut group: Option<String> = None;
        let mut values = Vec::new();

        while let Some(key) = access.next_key::<String>()? {
            match key.as_str() {
                "sample_id" => sample_id = Some(access.next_value()?),
                "group" => group = Some(access.next_value()?),
                _ => values.push((key, access.next_value::<f64>()?)),
            }
        }

        Ok(SampleRow {
            sample_id: sample_id.ok_or_else(|| de::Error::missing_field("sample_id"))?,
            group: group.ok_or_else(|| de::Error::missing_field("group"))?,
            values,
        })
    }
}

impl<'de> Deserialize<'de> for SampleRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SampleRowVisitor)
    }
}

/// A complete synthetic dataset plus its generation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedDataset {
    /// Domain tag as requested by the caller (unknown tags are kept verbatim
    /// even though generation used the fallback preset).
    pub data_type: String,
    /// Samples generated per group.
    pub num_samples_per_group: usize,
    /// Number of experimental groups.
    pub num_groups: usize,
    /// Always `num_samples_per_group * num_groups`.
    pub total_samples: usize,
    /// Feature names, in row order.
    pub features: Vec<String>,
    /// Group labels, in generation order.
    pub groups: Vec<String>,
    /// Unit label for the feature values.
    pub units: String,
    /// Whether Gaussian noise was applied.
    pub noise_included: bool,
    /// The generated rows, grouped by group in generation order.
    pub data: Vec<SampleRow>,
    /// Descriptive CSV header for the row layout.
    pub csv_format: String,
}

impl GeneratedDataset {
    /// Rows belonging to a given group label.
    pub fn rows_for_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a SampleRow> + 'a {
        self.data.iter().filter(move |row| row.group == group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> SampleRow {
        SampleRow {
            sample_id: "Control_001".to_string(),
            group: "Control".to_string(),
            values: vec![("IL6".to_string(), 12.5), ("CRP".to_string(), 3.125)],
        }
    }

    #[test]
    fn test_row_serializes_flat_in_feature_order() {
        let json = serde_json::to_string(&sample_row()).expect("serialize");
        assert_eq!(
            json,
            r#"{"sample_id":"Control_001","group":"Control","IL6":12.5,"CRP":3.125}"#
        );
    }

    #[test]
    fn test_row_round_trip_preserves_order() {
        let row = sample_row();
        let json = serde_json::to_string(&row).expect("serialize");
        let parsed: SampleRow = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, row);
        assert_eq!(parsed.feature_names(), vec!["IL6", "CRP"]);
    }

    #[test]
    fn test_row_missing_group_is_rejected() {
        let result = serde_json::from_str::<SampleRow>(r#"{"sample_id":"x","IL6":1.0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_row_value_lookup() {
        let row = sample_row();
        assert_eq!(row.value("CRP"), Some(3.125));
        assert_eq!(row.value("TNF_alpha"), None);
    }
}
