use serde::{Deserialize, Serialize};

use crate::core::{
    distance::{origin_distance, DEFAULT_FALLBACK_DISTANCE_KM},
    filters::{compliance_scores, CompliancePolicy},
    similarity::FacetSimilarity,
};
use crate::models::{Program, ScoreBreakdown, ScoringWeights, StudentProfile};

/// Largest domestic distance, used to normalize distances into [0, 1]
pub const DEFAULT_REFERENCE_MAX_KM: f64 = 1045.75;

/// Geography score of a program in the student's requested city
pub const DEFAULT_TARGET_MATCH_SCORE: f64 = 1.2;

/// Cap on the over-budget exponent so the penalty stays finite
pub const MAX_OVERRUN_EXPONENT: f64 = 700.0;

/// Tunables of the geography scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeographyConfig {
    #[serde(default = "default_reference_max_km")]
    pub reference_max_km: f64,
    #[serde(default = "default_fallback_distance_km")]
    pub fallback_distance_km: f64,
    #[serde(default = "default_target_match_score")]
    pub target_match_score: f64,
    #[serde(default)]
    pub prefers_far_when_unset: bool,
}

fn default_reference_max_km() -> f64 { DEFAULT_REFERENCE_MAX_KM }
fn default_fallback_distance_km() -> f64 { DEFAULT_FALLBACK_DISTANCE_KM }
fn default_target_match_score() -> f64 { DEFAULT_TARGET_MATCH_SCORE }

impl Default for GeographyConfig {
    fn default() -> Self {
        Self {
            reference_max_km: DEFAULT_REFERENCE_MAX_KM,
            fallback_distance_km: DEFAULT_FALLBACK_DISTANCE_KM,
            target_match_score: DEFAULT_TARGET_MATCH_SCORE,
            prefers_far_when_unset: false,
        }
    }
}

/// Calculate the budget score
///
/// * no budget (absent, zero or negative): 1.0
/// * affordable: `ln(|budget - cost| + 1) / ln(budget + 1)`, 0.0 at `cost == budget`
/// * over budget: `-exp((cost - budget) / budget)`, always below -1.0
///
/// The penalty is unclamped at 0 so over-budget programs
/// sink below every affordable one.
#[inline]
pub fn budget_score(budget: Option<f64>, annual_cost: f64) -> f64 {
    let budget = match budget.filter(|b| b.is_finite() && *b > 0.0) {
        Some(b) => b,
        None => return 1.0,
    };
    let cost = if annual_cost.is_finite() { annual_cost.max(0.0) } else { 0.0 };

    if cost <= budget {
        (budget - cost).abs().ln_1p() / budget.ln_1p()
    } else {
        let overrun = ((cost - budget) / budget).min(MAX_OVERRUN_EXPONENT);
        -overrun.exp()
    }
}

/// Calculate the geography score from a precomputed distance
///
/// Evaluated in order:
/// 1. the program's city contains the requested target city: `target_match_score`
///    (1.2 by default). This sits above the [0, 1] range so an explicit
///    city request outranks any pure distance preference.
/// 2. a distance cap is set and exceeded: 0.0
/// 3. the student wants to go far: normalized distance
/// 4. otherwise: `max(0, 1 - normalized^(1/4))`, a slow decay with distance
#[inline]
pub fn geography_score(
    distance_km: f64,
    city: &str,
    target_city: Option<&str>,
    max_distance_km: Option<f64>,
    prefers_far: bool,
    config: &GeographyConfig,
) -> f64 {
    if let Some(target) = target_city {
        if city.to_lowercase().contains(&target.to_lowercase()) {
            return config.target_match_score;
        }
    }

    if let Some(cap) = max_distance_km {
        if distance_km > cap {
            return 0.0;
        }
    }

    let normalized = if config.reference_max_km > 0.0 {
        (distance_km / config.reference_max_km).max(0.0)
    } else {
        0.0
    };

    if prefers_far {
        normalized
    } else {
        (1.0 - normalized.powf(0.25)).max(0.0)
    }
}

/// Distance and geography score of a program for a student
#[inline]
pub fn geography_fit(
    profile: &StudentProfile,
    program: &Program,
    config: &GeographyConfig,
) -> (f64, f64) {
    let distance_km = origin_distance(
        profile.origin.as_deref(),
        &program.city,
        program.coordinates,
        config.fallback_distance_km,
    );

    let score = geography_score(
        distance_km,
        &program.city,
        profile.target_city(),
        profile.distance_cap(),
        profile
            .wants_far_from_home
            .unwrap_or(config.prefers_far_when_unset),
        config,
    );

    (distance_km, score)
}

/// Calculate the full score record of a program
///
/// Scoring formula:
/// final = (
///     academic * w_academic +
///     aspiration * w_aspiration +
///     lifestyle * w_lifestyle +
///     budget_score * w_budget +
///     geography_score * w_geography +
///     (english + housing + admission_test) * w_bool / 3
/// )
///
/// Returns the breakdown and the origin distance in km.
pub fn calculate_match_score(
    profile: &StudentProfile,
    program: &Program,
    similarity: &FacetSimilarity,
    weights: &ScoringWeights,
    geography: &GeographyConfig,
    policy: &CompliancePolicy,
) -> (ScoreBreakdown, f64) {
    let budget = budget_score(profile.budget_limit(), program.annual_cost);
    let (distance_km, geo) = geography_fit(profile, program, geography);
    let compliance = compliance_scores(profile, program, policy);

    let final_score = weights.academic * similarity.academic
        + weights.aspiration * similarity.aspiration
        + weights.lifestyle * similarity.lifestyle
        + weights.budget * budget
        + weights.geography * geo
        + weights.boolean / 3.0 * compliance.total();

    let breakdown = ScoreBreakdown {
        academic: similarity.academic,
        aspiration: similarity.aspiration,
        lifestyle: similarity.lifestyle,
        semantic: similarity.aggregated,
        budget,
        geography: geo,
        english: compliance.english,
        housing: compliance.housing,
        admission_test: compliance.admission_test,
        final_score,
    };

    (breakdown, distance_km)
}
