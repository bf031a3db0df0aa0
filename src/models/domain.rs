use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::error::RankingError;

/// Sentinels the conversational layer uses for "any city is fine"
const NO_PREFERENCE_SENTINELS: &[&str] = &["all", "any", "none"];

/// Tolerance used when checking that a weight vector sums to one
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A student's stated preferences
///
/// Every field is optional. The engine degrades to documented fallbacks
/// for anything left unset instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct StudentProfile {
    #[validate(length(max = 4000))]
    #[serde(default, alias = "academic_profile")]
    pub academic_interest: Option<String>,
    #[validate(length(max = 4000))]
    #[serde(default, alias = "aspiration_values")]
    pub aspiration_text: Option<String>,
    #[validate(length(max = 4000))]
    #[serde(default, alias = "lifestyle_preferences")]
    pub lifestyle_text: Option<String>,

    /// Yearly budget; absent or zero means unconstrained
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub budget: Option<f64>,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub origin: Option<String>,
    #[validate(length(max = 200))]
    #[serde(default, alias = "location")]
    pub target_location: Option<String>,
    /// Maximum acceptable distance from origin, km
    #[validate(range(min = 0.0))]
    #[serde(default)]
    pub max_distance: Option<f64>,
    /// Prior performance on a 0-10 scale
    #[validate(range(min = 0.0, max = 10.0))]
    #[serde(default)]
    pub gpa: Option<f64>,

    #[serde(default, alias = "far_from_home")]
    pub wants_far_from_home: Option<bool>,
    #[serde(default, alias = "english_language")]
    pub wants_english_instruction: Option<bool>,
    #[serde(default, alias = "dorms_nearby")]
    pub wants_housing: Option<bool>,
    #[serde(default, alias = "admission_test")]
    pub accepts_admission_test: Option<bool>,

    #[serde(default)]
    pub weights: Option<WeightsInput>,
}

impl StudentProfile {
    /// Overlay every field set in `patch` onto this profile
    pub fn merge(&mut self, patch: StudentProfile) {
        fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        overlay(&mut self.academic_interest, patch.academic_interest);
        overlay(&mut self.aspiration_text, patch.aspiration_text);
        overlay(&mut self.lifestyle_text, patch.lifestyle_text);
        overlay(&mut self.budget, patch.budget);
        overlay(&mut self.origin, patch.origin);
        overlay(&mut self.target_location, patch.target_location);
        overlay(&mut self.max_distance, patch.max_distance);
        overlay(&mut self.gpa, patch.gpa);
        overlay(&mut self.wants_far_from_home, patch.wants_far_from_home);
        overlay(&mut self.wants_english_instruction, patch.wants_english_instruction);
        overlay(&mut self.wants_housing, patch.wants_housing);
        overlay(&mut self.accepts_admission_test, patch.accepts_admission_test);
        overlay(&mut self.weights, patch.weights);
    }

    /// Names of the preference fields that are still unset
    ///
    /// `weights` is not a preference and is never reported.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks: [(&'static str, bool); 12] = [
            ("academic_interest", has_text(&self.academic_interest)),
            ("aspiration_text", has_text(&self.aspiration_text)),
            ("lifestyle_text", has_text(&self.lifestyle_text)),
            ("budget", self.budget.is_some()),
            ("origin", has_text(&self.origin)),
            ("target_location", self.target_location.is_some()),
            ("max_distance", self.max_distance.is_some()),
            ("gpa", self.gpa.is_some()),
            ("wants_far_from_home", self.wants_far_from_home.is_some()),
            ("wants_english_instruction", self.wants_english_instruction.is_some()),
            ("wants_housing", self.wants_housing.is_some()),
            ("accepts_admission_test", self.accepts_admission_test.is_some()),
        ];

        checks
            .into_iter()
            .filter(|(_, present)| !present)
            .map(|(name, _)| name)
            .collect()
    }

    /// Budget as an active constraint, if any
    pub fn budget_limit(&self) -> Option<f64> {
        self.budget.filter(|b| b.is_finite() && *b > 0.0)
    }

    /// Target city, or `None` when the student has no preference
    pub fn target_city(&self) -> Option<&str> {
        let target = self.target_location.as_deref()?.trim();
        if target.is_empty()
            || NO_PREFERENCE_SENTINELS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(target))
        {
            None
        } else {
            Some(target)
        }
    }

    /// Maximum distance as an active cutoff, if any
    pub fn distance_cap(&self) -> Option<f64> {
        self.max_distance.filter(|d| d.is_finite() && *d > 0.0)
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Geographic coordinate pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// One academic program in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: u32,
    pub name: String,
    pub program: String,
    pub city: String,
    pub annual_cost: f64,
    pub coordinates: Option<Coordinates>,
    pub min_gpa: f64,
    pub prestige_rank: u32,
    pub duration_years: u8,
    pub employment_rate: u8,
    pub academic_profile: String,
    pub aspiration_values: String,
    pub lifestyle_preferences: String,
    #[serde(rename = "english_courses")]
    pub offers_english_instruction: bool,
    #[serde(rename = "dorms_available")]
    pub has_housing: bool,
    #[serde(rename = "admission_test_required")]
    pub requires_admission_test: bool,
}

/// The three facet embeddings of a profile or a program
#[derive(Debug, Clone, PartialEq)]
pub struct FacetEmbeddings {
    pub academic: Vec<f32>,
    pub aspiration: Vec<f32>,
    pub lifestyle: Vec<f32>,
}

impl FacetEmbeddings {
    pub fn zeros(dimension: usize) -> Self {
        Self {
            academic: vec![0.0; dimension],
            aspiration: vec![0.0; dimension],
            lifestyle: vec![0.0; dimension],
        }
    }

    fn facets(&self) -> [&[f32]; 3] {
        [&self.academic, &self.aspiration, &self.lifestyle]
    }

    /// Check every facet has `dimension` finite components
    pub fn check_dimension(&self, dimension: usize) -> Result<(), RankingError> {
        for facet in self.facets() {
            if facet.len() != dimension {
                return Err(RankingError::DimensionMismatch {
                    expected: dimension,
                    actual: facet.len(),
                });
            }
            if facet.iter().any(|v| !v.is_finite()) {
                return Err(RankingError::MalformedEmbedding(
                    "vector contains non-finite values".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Catalog snapshot paired with its precomputed facet embeddings
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct EmbeddedCatalog {
    programs: Vec<Program>,
    embeddings: Vec<FacetEmbeddings>,
    dimension: usize,
}

impl EmbeddedCatalog {
    pub fn new(
        programs: Vec<Program>,
        embeddings: Vec<FacetEmbeddings>,
    ) -> Result<Self, RankingError> {
        if programs.is_empty() {
            return Err(RankingError::EmptyCatalog);
        }
        if programs.len() != embeddings.len() {
            return Err(RankingError::CatalogMismatch {
                programs: programs.len(),
                embeddings: embeddings.len(),
            });
        }

        let dimension = embeddings[0].academic.len();
        if dimension == 0 {
            return Err(RankingError::MalformedEmbedding(
                "embedding vectors are empty".to_string(),
            ));
        }
        for triple in &embeddings {
            triple.check_dimension(dimension)?;
        }

        Ok(Self {
            programs,
            embeddings,
            dimension,
        })
    }

    pub fn programs(&self) -> &[Program] {
        &self.programs
    }

    pub fn embeddings(&self) -> &[FacetEmbeddings] {
        &self.embeddings
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }
}

/// Weight vector of the final linear model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    #[serde(rename = "academic_similarity")]
    pub academic: f64,
    #[serde(rename = "aspiration_similarity")]
    pub aspiration: f64,
    #[serde(rename = "lifestyle_similarity")]
    pub lifestyle: f64,
    #[serde(rename = "budget_score")]
    pub budget: f64,
    #[serde(rename = "geography_fit")]
    pub geography: f64,
    #[serde(rename = "bool")]
    pub boolean: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            academic: 0.25,
            aspiration: 0.15,
            lifestyle: 0.10,
            budget: 0.15,
            geography: 0.15,
            boolean: 0.20,
        }
    }
}

impl ScoringWeights {
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.academic,
            self.aspiration,
            self.lifestyle,
            self.budget,
            self.geography,
            self.boolean,
        ]
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, RankingError> {
        match values {
            [academic, aspiration, lifestyle, budget, geography, boolean] => Ok(Self {
                academic: *academic,
                aspiration: *aspiration,
                lifestyle: *lifestyle,
                budget: *budget,
                geography: *geography,
                boolean: *boolean,
            }),
            _ => Err(RankingError::InvalidWeights(format!(
                "expected 6 weights, got {}",
                values.len()
            ))),
        }
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Validate and rescale so the weights sum to one
    ///
    /// Negative, non-finite or all-zero vectors are rejected.
    pub fn normalized(&self) -> Result<Self, RankingError> {
        let values = self.as_array();
        if let Some(bad) = values.iter().find(|w| !w.is_finite()) {
            return Err(RankingError::InvalidWeights(format!(
                "weight {bad} is not finite"
            )));
        }
        if let Some(bad) = values.iter().find(|w| **w < 0.0) {
            return Err(RankingError::InvalidWeights(format!(
                "weight {bad} is negative"
            )));
        }

        let sum = self.sum();
        if sum <= f64::EPSILON {
            return Err(RankingError::InvalidWeights(
                "weights sum to zero".to_string(),
            ));
        }
        if (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
            return Ok(*self);
        }

        tracing::debug!("Normalizing weight vector summing to {}", sum);
        let scaled: Vec<f64> = values.iter().map(|w| w / sum).collect();
        Self::from_slice(&scaled)
    }
}

/// Weight vector as supplied by callers: named fields or a bare list of six
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WeightsInput {
    Named(ScoringWeights),
    List(Vec<f64>),
}

impl WeightsInput {
    pub fn resolve(&self) -> Result<ScoringWeights, RankingError> {
        let weights = match self {
            WeightsInput::Named(weights) => *weights,
            WeightsInput::List(values) => ScoringWeights::from_slice(values)?,
        };
        weights.normalized()
    }
}

impl From<ScoringWeights> for WeightsInput {
    fn from(weights: ScoringWeights) -> Self {
        WeightsInput::Named(weights)
    }
}

/// Per-candidate score record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub academic: f64,
    pub aspiration: f64,
    pub lifestyle: f64,
    /// Fixed 0.5/0.3/0.2 blend of the three facet similarities
    pub semantic: f64,
    pub budget: f64,
    pub geography: f64,
    pub english: f64,
    pub housing: f64,
    pub admission_test: f64,
    pub final_score: f64,
}

/// A ranked program with everything needed to explain its position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// 1-based position in the ranking
    pub rank: usize,
    pub program: Program,
    pub scores: ScoreBreakdown,
    pub distance_km: f64,
}

impl Recommendation {
    pub fn final_score(&self) -> f64 {
        self.scores.final_score
    }
}

/// Flattened view of a recommendation for display and narrative generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramSummary {
    pub rank: usize,
    #[serde(flatten)]
    pub program: Program,
    pub score_breakdown: ScoreBreakdown,
    pub final_score: f64,
    pub distance_km: f64,
    /// Whether the student's GPA reaches the program minimum, when known
    pub meets_gpa_threshold: Option<bool>,
}

impl ProgramSummary {
    pub fn from_recommendation(rec: &Recommendation, profile: &StudentProfile) -> Self {
        Self {
            rank: rec.rank,
            program: rec.program.clone(),
            score_breakdown: rec.scores,
            final_score: rec.scores.final_score,
            distance_km: rec.distance_km,
            meets_gpa_threshold: profile.gpa.map(|gpa| gpa >= rec.program.min_gpa),
        }
    }
}
