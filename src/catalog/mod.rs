//! Compiled-in generation presets for each scientific domain.
//!
//! The catalog maps a domain tag ("genomics", "clinical_trial", ...) to the
//! feature names, value range, unit label, and group labels used by the
//! synthesizer. Lookup is total: unrecognized tags resolve to the proteomics
//! preset instead of failing.

use serde::Serialize;

/// The domain every unrecognized tag falls back to.
pub const DEFAULT_DOMAIN: &str = "proteomics";

/// Generation parameters for one scientific domain.
#[derive(Debug, Clone, Serialize)]
pub struct DomainParams {
    /// Canonical domain tag.
    pub tag: &'static str,
    /// Measured feature names, in the order they appear in rows.
    pub features: &'static [&'static str],
    /// Unit label, informational only.
    pub units: &'static str,
    /// Half-open base value range `[low, high)`.
    pub base_range: (f64, f64),
    /// Canonical labels for the two-group default design.
    pub default_groups: [&'static str; 2],
    /// Prefix used to synthesize labels for other group counts.
    pub group_prefix: &'static str,
}

impl DomainParams {
    /// Returns group labels sized to `num_groups`.
    ///
    /// The canonical two-group labels are used when `num_groups == 2`;
    /// any other count gets generic `{prefix}{i}` labels, 1-based.
    pub fn group_labels(&self, num_groups: usize) -> Vec<String> {
        if num_groups == 2 {
            self.default_groups.iter().map(|g| g.to_string()).collect()
        } else {
            (1..=num_groups)
                .map(|i| format!("{}{}", self.group_prefix, i))
                .collect()
        }
    }
}

static DOMAINS: &[DomainParams] = &[
    DomainParams {
        tag: "proteomics",
        features: &[
            "Protein_A",
            "Protein_B",
            "Protein_C",
            "Protein_D",
            "Protein_E",
            "IL6",
            "TNF_alpha",
            "CRP",
            "Albumin",
            "Hemoglobin",
        ],
        units: "ng/mL",
        base_range: (10.0, 1000.0),
        default_groups: ["Control", "Disease"],
        group_prefix: "Group_",
    },
    DomainParams {
        tag: "genomics",
        features: &[
            "BRCA1", "TP53", "EGFR", "KRAS", "MYC", "PTEN", "APC", "RB1", "CDKN2A", "PIK3CA",
        ],
        units: "TPM",
        base_range: (0.1, 500.0),
        default_groups: ["Wild_Type", "Mutant"],
        group_prefix: "Group_",
    },
    DomainParams {
        tag: "clinical_trial",
        features: &[
            "Blood_Pressure_Systolic",
            "Blood_Pressure_Diastolic",
            "Heart_Rate",
            "BMI",
            "Cholesterol_Total",
            "Cholesterol_LDL",
            "Cholesterol_HDL",
            "Glucose_Fasting",
            "HbA1c",
            "Creatinine",
        ],
        units: "mixed",
        base_range: (50.0, 200.0),
        default_groups: ["Placebo", "Treatment"],
        group_prefix: "Arm_",
    },
    DomainParams {
        tag: "environmental",
        features: &[
            "Temperature_C",
            "pH",
            "Dissolved_O2",
            "Salinity",
            "Nitrate",
            "Phosphate",
            "Chlorophyll_a",
            "Turbidity",
        ],
        units: "mixed",
        base_range: (0.0, 50.0),
        default_groups: ["Site_Control", "Site_Impact"],
        group_prefix: "Site_",
    },
    DomainParams {
        tag: "behavioral",
        features: &[
            "Response_Time_ms",
            "Accuracy_Pct",
            "Error_Rate",
            "Trials_Completed",
            "Learning_Rate",
            "Fatigue_Index",
        ],
        units: "mixed",
        base_range: (100.0, 1000.0),
        default_groups: ["Control", "Experimental"],
        group_prefix: "Condition_",
    },
];

/// Resolves a domain tag to its generation parameters.
///
/// Never fails: unknown tags fall back to the [`DEFAULT_DOMAIN`] preset,
/// with a warning so typos are visible in the logs.
pub fn lookup(tag: &str) -> &'static DomainParams {
    match DOMAINS.iter().find(|d| d.tag == tag) {
        Some(params) => params,
        None => {
            tracing::warn!(
                tag,
                fallback = DEFAULT_DOMAIN,
                "unknown domain tag, using fallback preset"
            );
            DOMAINS
                .iter()
                .find(|d| d.tag == DEFAULT_DOMAIN)
                .expect("default domain is present in the catalog")
        }
    }
}

/// Returns the tags of all known domains.
pub fn known_domains() -> Vec<&'static str> {
    DOMAINS.iter().map(|d| d.tag).collect()
}
