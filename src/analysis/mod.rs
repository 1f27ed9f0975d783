//! Descriptive statistics over generated datasets.
//!
//! Computes per-group, per-feature summaries (mean, min, max, sample count)
//! for a dataset loaded back from storage. Pure computation, no I/O.

use serde::Serialize;

use crate::dataset::GeneratedDataset;

/// Summary statistics for one feature within one group.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureStats {
    /// Feature name.
    pub feature: String,
    /// Mean value, rounded to 3 decimals.
    pub mean: f64,
    /// Minimum value, rounded to 3 decimals.
    pub min: f64,
    /// Maximum value, rounded to 3 decimals.
    pub max: f64,
    /// Number of samples contributing.
    pub n: usize,
}

/// All feature summaries for one group.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    /// Group label.
    pub group: String,
    /// Per-feature statistics, in feature order.
    pub features: Vec<FeatureStats>,
}

/// Per-group statistics for a whole dataset.
#[derive(Debug, Clone, Serialize)]
pub struct DatasetSummary {
    /// Domain tag of the summarized dataset.
    pub data_type: String,
    /// Total samples covered.
    pub total_samples: usize,
    /// One summary per group, in group order.
    pub groups: Vec<GroupSummary>,
}

/// Computes per-group descriptive statistics for a dataset.
///
/// Groups and features keep the dataset's declared order. Features missing
/// from every row of a group are skipped rather than reported with n = 0.
pub fn summarize(dataset: &GeneratedDataset) -> DatasetSummary {
    let groups = dataset
        .groups
        .iter()
        .map(|group| GroupSummary {
            group: group.clone(),
            features: dataset
                .features
                .iter()
                .filter_map(|feature| {
                    let values: Vec<f64> = dataset
                        .rows_for_group(group)
                        .filter_map(|row| row.value(feature))
                        .collect();
                    feature_stats(feature, &values)
                })
                .collect(),
        })
        .collect();

    DatasetSummary {
        data_type: dataset.data_type.clone(),
        total_samples: dataset.total_samples,
        groups,
    }
}

fn feature_stats(feature: &str, values: &[f64]) -> Option<FeatureStats> {
    if values.is_empty() {
        return None;
    }

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    Some(FeatureStats {
        feature: feature.to_string(),
        mean: round3(mean),
        min: round3(min),
        max: round3(max),
        n,
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::SampleRow;

    fn dataset_with_known_values() -> GeneratedDataset {
        let rows = vec![
            SampleRow {
                sample_id: "Control_001".to_string(),
                group: "Control".to_string(),
                values: vec![("IL6".to_string(), 10.0)],
            },
            SampleRow {
                sample_id: "Control_002".to_string(),
                group: "Control".to_string(),
                values: vec![("IL6".to_string(), 20.0)],
            },
            SampleRow {
                sample_id: "Disease_001".to_string(),
                group: "Disease".to_string(),
                values: vec![("IL6".to_string(), 40.0)],
            },
        ];

        GeneratedDataset {
            data_type: "proteomics".to_string(),
            num_samples_per_group: 2,
            num_groups: 2,
            total_samples: 3,
            features: vec!["IL6".to_string()],
            groups: vec!["Control".to_string(), "Disease".to_string()],
            units: "ng/mL".to_string(),
            noise_included: false,
            data: rows,
            csv_format: "sample_id,group,IL6".to_string(),
        }
    }

    #[test]
    fn test_summarize_computes_group_stats() {
        let summary = summarize(&dataset_with_known_values());
        assert_eq!(summary.groups.len(), 2);

        let control = &summary.groups[0];
        assert_eq!(control.group, "Control");
        assert_eq!(control.features[0].mean, 15.0);
        assert_eq!(control.features[0].min, 10.0);
        assert_eq!(control.features[0].max, 20.0);
        assert_eq!(control.features[0].n, 2);

        let disease = &summary.groups[1];
        assert_eq!(disease.features[0].mean, 40.0);
        assert_eq!(disease.features[0].n, 1);
    }

    #[test]
    fn test_mean_is_rounded_to_3_decimals() {
        let stats = feature_stats("x", &[1.0, 2.0, 2.0]).expect("stats");
        assert_eq!(stats.mean, 1.667);
    }

    #[test]
    fn test_empty_group_is_skipped() {
        assert!(feature_stats("x", &[]).is_none());
    }
}
