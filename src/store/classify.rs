//! Blood-pressure classification
//!
//! Rules are checked in order and the first match wins. The bands overlap
//! (125/85 is inside both the Elevated systolic band and the Stage 1
//! diastolic band), so the order is part of the rule.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BpCategory {
    HypertensiveCrisis,
    HypertensionStage2,
    HypertensionStage1,
    Elevated,
    Normal,
    Unknown,
}

impl BpCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::HypertensiveCrisis => "Hypertensive Crisis",
            Self::HypertensionStage2 => "Hypertension Stage 2",
            Self::HypertensionStage1 => "Hypertension Stage 1",
            Self::Elevated => "Elevated",
            Self::Normal => "Normal",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for BpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a reading in mmHg
pub fn classify_bp(systolic: i64, diastolic: i64) -> BpCategory {
    if systolic > 180 || diastolic > 120 {
        BpCategory::HypertensiveCrisis
    } else if systolic >= 140 || diastolic >= 90 {
        BpCategory::HypertensionStage2
    } else if (130..=139).contains(&systolic) || (80..=89).contains(&diastolic) {
        BpCategory::HypertensionStage1
    } else if (120..=129).contains(&systolic) && diastolic < 80 {
        BpCategory::Elevated
    } else if systolic < 120 && diastolic < 80 {
        BpCategory::Normal
    } else {
        BpCategory::Unknown
    }
}
