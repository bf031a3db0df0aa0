use serde::{Deserialize, Serialize};

use crate::models::{Program, StudentProfile};

/// How unset boolean preferences are interpreted
///
/// The default is permissive: an unset flag never costs a program points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompliancePolicy {
    #[serde(default)]
    pub requires_english_when_unset: bool,
    #[serde(default)]
    pub requires_housing_when_unset: bool,
    #[serde(default = "default_accepts_test")]
    pub accepts_test_when_unset: bool,
}

fn default_accepts_test() -> bool {
    true
}

impl Default for CompliancePolicy {
    fn default() -> Self {
        Self::permissive()
    }
}

impl CompliancePolicy {
    pub fn permissive() -> Self {
        Self {
            requires_english_when_unset: false,
            requires_housing_when_unset: false,
            accepts_test_when_unset: true,
        }
    }

    /// Treat every unknown answer as the demanding one
    pub fn strict() -> Self {
        Self {
            requires_english_when_unset: true,
            requires_housing_when_unset: true,
            accepts_test_when_unset: false,
        }
    }
}

/// Satisfaction (0 or 1) of each boolean requirement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScores {
    pub english: f64,
    pub housing: f64,
    pub admission_test: f64,
}

impl ComplianceScores {
    pub fn total(&self) -> f64 {
        self.english + self.housing + self.admission_test
    }
}

#[inline]
fn as_score(satisfied: bool) -> f64 {
    if satisfied {
        1.0
    } else {
        0.0
    }
}

/// Score a program against the student's boolean requirements
#[inline]
pub fn compliance_scores(
    profile: &StudentProfile,
    program: &Program,
    policy: &CompliancePolicy,
) -> ComplianceScores {
    let needs_english = profile
        .wants_english_instruction
        .unwrap_or(policy.requires_english_when_unset);
    let needs_housing = profile
        .wants_housing
        .unwrap_or(policy.requires_housing_when_unset);
    let accepts_test = profile
        .accepts_admission_test
        .unwrap_or(policy.accepts_test_when_unset);

    ComplianceScores {
        english: as_score(!needs_english || program.offers_english_instruction),
        housing: as_score(!needs_housing || program.has_housing),
        admission_test: as_score(accepts_test || !program.requires_admission_test),
    }
}
