//! Patient record contract with the data ingestion layer.
//!
//! Ingestion owns parsing (free-text weight changes, comma-formatted
//! numerics, "(n/10)" preference scores) and hands the builder one typed
//! record per row. The threshold classifiers that derive the `*_class`
//! fields are encoded here so the contract is testable in one place.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Qualitative banding used for steps, caloric intake, and diet
/// flexibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// Activity banding: Low < 5000, Medium < 8000, else High.
    pub fn from_steps(steps: u32) -> Self {
        match steps {
            0..=4999 => Level::Low,
            5000..=7999 => Level::Medium,
            _ => Level::High,
        }
    }

    /// Caloric intake banding: Low < 1700, Medium < 2300, else High.
    pub fn from_calories(calories: u32) -> Self {
        match calories {
            0..=1699 => Level::Low,
            1700..=2299 => Level::Medium,
            _ => Level::High,
        }
    }

    /// Diet flexibility banding over a 0-10 score: Low < 4, Medium < 8,
    /// else High.
    pub fn from_flexibility(score: u8) -> Self {
        match score {
            0..=3 => Level::Low,
            4..=7 => Level::Medium,
            _ => Level::High,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Low => "Low",
            Level::Medium => "Medium",
            Level::High => "High",
        };
        f.write_str(s)
    }
}

/// Outcome category, derived upstream by first keyword match in this
/// precedence order over the free-text weight change column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeightChangeCategory {
    Successful,
    Slow,
    Increase,
    Moderate,
    Unknown,
}

impl fmt::Display for WeightChangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WeightChangeCategory::Successful => "Successful",
            WeightChangeCategory::Slow => "Slow",
            WeightChangeCategory::Increase => "Increase",
            WeightChangeCategory::Moderate => "Moderate",
            WeightChangeCategory::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// One patient row, already parsed and classified by the ingestion layer.
///
/// The builder trusts this record: classification fields are assumed
/// consistent with their numeric counterparts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    /// Unique per record.
    pub id: String,
    /// Weight change in kg (negative = loss).
    pub weight_change_value: f64,
    pub weight_change_category: WeightChangeCategory,
    /// HbA1c percentage; carried for downstream consumers, unused by rules.
    pub hba1c: f64,
    pub daily_steps: u32,
    pub daily_steps_class: Level,
    pub caloric_intake: u32,
    pub caloric_intake_class: Level,
    /// Dietary flexibility preference score, 0-10.
    pub diet_flexibility_score: u8,
    pub diet_flexibility_label: String,
    pub diet_flexibility_class: Level,
    /// Rate-of-weight-loss preference score, 0-10.
    pub weight_loss_pref_score: u8,
    pub weight_loss_pref_label: String,
}

impl PatientRecord {
    /// Node id of this patient's diet flexibility preference.
    pub fn diet_pref_node_id(&self) -> String {
        format!("{}_DietFlexPref", self.id)
    }

    /// Node id of this patient's rate-of-weight-loss preference.
    pub fn weight_loss_pref_node_id(&self) -> String {
        format!("{}_WeightLossPref", self.id)
    }

    /// Node id of this patient's outcome.
    pub fn outcome_node_id(&self) -> String {
        format!("{}_Outcome", self.id)
    }
}
