use rayon::prelude::*;

use crate::core::{
    error::RankingError,
    filters::CompliancePolicy,
    scoring::{calculate_match_score, GeographyConfig},
    similarity::facet_similarities,
};
use crate::models::{
    EmbeddedCatalog, FacetEmbeddings, ProgramSummary, Recommendation, ScoringWeights,
    StudentProfile,
};

/// Result of one ranking call
#[derive(Debug, Clone)]
pub struct RankingResult {
    /// Every catalog program, best first
    pub recommendations: Vec<Recommendation>,
    /// Weights actually applied, after normalization
    pub weights: ScoringWeights,
}

impl RankingResult {
    pub fn total_candidates(&self) -> usize {
        self.recommendations.len()
    }

    /// The `n` best programs, best first
    pub fn top(&self, n: usize) -> &[Recommendation] {
        &self.recommendations[..n.min(self.recommendations.len())]
    }

    /// The `n` least recommended programs, worst first
    pub fn bottom(&self, n: usize) -> Vec<&Recommendation> {
        self.recommendations.iter().rev().take(n).collect()
    }

    /// Flattened projection of the `n` best programs
    pub fn top_summaries(&self, n: usize, profile: &StudentProfile) -> Vec<ProgramSummary> {
        self.top(n)
            .iter()
            .map(|rec| ProgramSummary::from_recommendation(rec, profile))
            .collect()
    }

    /// Flattened projection of the `n` least recommended programs, worst first
    pub fn bottom_summaries(&self, n: usize, profile: &StudentProfile) -> Vec<ProgramSummary> {
        self.bottom(n)
            .into_iter()
            .map(|rec| ProgramSummary::from_recommendation(rec, profile))
            .collect()
    }
}

/// Ranking orchestrator
///
/// # Pipeline Stages
/// 1. Weight resolution and validation
/// 2. Facet similarity against the precomputed catalog embeddings
/// 3. Budget, geography and boolean scoring per program
/// 4. Weighted aggregation and stable sort
///
/// Stateless: every call reads only its arguments, so one instance is
/// shared freely between concurrent requests.
#[derive(Debug, Clone)]
pub struct Recommender {
    weights: ScoringWeights,
    geography: GeographyConfig,
    policy: CompliancePolicy,
}

impl Recommender {
    /// Build a recommender, rejecting an invalid default weight vector
    pub fn new(
        weights: ScoringWeights,
        geography: GeographyConfig,
        policy: CompliancePolicy,
    ) -> Result<Self, RankingError> {
        Ok(Self {
            weights: weights.normalized()?,
            geography,
            policy,
        })
    }

    pub fn with_default_weights() -> Self {
        Self {
            weights: ScoringWeights::default(),
            geography: GeographyConfig::default(),
            policy: CompliancePolicy::default(),
        }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn policy(&self) -> &CompliancePolicy {
        &self.policy
    }

    pub fn geography(&self) -> &GeographyConfig {
        &self.geography
    }

    /// Pick the weights for a request: explicit override, then the
    /// profile's own weights, then the configured default
    pub fn resolve_weights(
        &self,
        profile: &StudentProfile,
        weights_override: Option<&ScoringWeights>,
    ) -> Result<ScoringWeights, RankingError> {
        match (weights_override, &profile.weights) {
            (Some(weights), _) => weights.normalized(),
            (None, Some(input)) => input.resolve(),
            (None, None) => Ok(self.weights),
        }
    }

    /// Rank every program of the catalog for a student
    ///
    /// # Arguments
    /// * `profile` - The student's preferences
    /// * `profile_embeddings` - Facet embeddings of the profile texts
    /// * `catalog` - Programs with their precomputed embeddings
    /// * `weights_override` - Optional per-request weight vector
    ///
    /// # Returns
    /// All programs ordered by final score, descending. Ties keep catalog order.
    pub fn rank(
        &self,
        profile: &StudentProfile,
        profile_embeddings: &FacetEmbeddings,
        catalog: &EmbeddedCatalog,
        weights_override: Option<&ScoringWeights>,
    ) -> Result<RankingResult, RankingError> {
        let weights = self.resolve_weights(profile, weights_override)?;
        profile_embeddings.check_dimension(catalog.dimension())?;

        tracing::debug!(
            "Ranking {} programs with weights {:?}",
            catalog.len(),
            weights
        );

        let similarities = facet_similarities(profile_embeddings, catalog.embeddings());

        let mut recommendations: Vec<Recommendation> = catalog
            .programs()
            .par_iter()
            .zip(similarities.par_iter())
            .map(|(program, similarity)| {
                let (scores, distance_km) = calculate_match_score(
                    profile,
                    program,
                    similarity,
                    &weights,
                    &self.geography,
                    &self.policy,
                );

                Recommendation {
                    rank: 0,
                    program: program.clone(),
                    scores,
                    distance_km,
                }
            })
            .collect();

        if let Some(rec) = recommendations.iter().find(|r| !r.final_score().is_finite()) {
            tracing::error!("Non-finite score for program {}", rec.program.id);
            return Err(RankingError::NonFiniteScore {
                program_id: rec.program.id,
            });
        }

        // Stable: equal scores keep catalog order
        recommendations.sort_by(|a, b| b.final_score().total_cmp(&a.final_score()));

        for (position, rec) in recommendations.iter_mut().enumerate() {
            rec.rank = position + 1;
        }

        Ok(RankingResult {
            recommendations,
            weights,
        })
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::with_default_weights()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::lookup_place;
    use crate::models::{Program, WeightsInput};

    fn create_program(id: u32, city: &str, cost: f64) -> Program {
        Program {
            id,
            name: format!("University {}", id),
            program: "Engineering".to_string(),
            city: city.to_string(),
            annual_cost: cost,
            coordinates: lookup_place(city),
            min_gpa: 6.0,
            prestige_rank: id,
            duration_years: 3,
            employment_rate: 75,
            academic_profile: String::new(),
            aspiration_values: String::new(),
            lifestyle_preferences: String::new(),
            offers_english_instruction: false,
            has_housing: false,
            requires_admission_test: false,
        }
    }

    fn uniform(value: f32) -> FacetEmbeddings {
        FacetEmbeddings {
            academic: vec![value, 1.0],
            aspiration: vec![value, 1.0],
            lifestyle: vec![value, 1.0],
        }
    }

    fn create_catalog(programs: Vec<Program>) -> EmbeddedCatalog {
        let embeddings = programs.iter().map(|_| uniform(1.0)).collect();
        EmbeddedCatalog::new(programs, embeddings).unwrap()
    }

    #[test]
    fn test_rank_orders_by_score() {
        let recommender = Recommender::with_default_weights();
        let catalog = create_catalog(vec![
            create_program(1, "Milano", 12000.0),
            create_program(2, "Roma", 2000.0),
            create_program(3, "Bologna", 4000.0),
        ]);
        let profile = StudentProfile {
            origin: Some("Roma".to_string()),
            budget: Some(5000.0),
            ..Default::default()
        };

        let result = recommender.rank(&profile, &uniform(1.0), &catalog, None).unwrap();

        assert_eq!(result.total_candidates(), 3);
        assert_eq!(result.recommendations[0].program.id, 2);
        assert_eq!(result.recommendations[2].program.id, 1);
        for (i, rec) in result.recommendations.iter().enumerate() {
            assert_eq!(rec.rank, i + 1);
        }
        for pair in result.recommendations.windows(2) {
            assert!(pair[0].final_score() >= pair[1].final_score());
        }
    }

    #[test]
    fn test_tiny_budget_ranks_with_finite_scores() {
        let recommender = Recommender::with_default_weights();
        let catalog = create_catalog(vec![
            create_program(1, "Roma", 0.0),
            create_program(2, "Milano", 3000.0),
        ]);
        let profile = StudentProfile {
            budget: Some(1e-17),
            ..Default::default()
        };

        let result = recommender.rank(&profile, &uniform(1.0), &catalog, None).unwrap();

        assert!(result.recommendations.iter().all(|r| r.final_score().is_finite()));
        assert_eq!(result.recommendations[0].program.id, 1);
        assert_eq!(result.recommendations[1].program.id, 2);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let recommender = Recommender::with_default_weights();
        let catalog = create_catalog(vec![
            create_program(10, "Pisa", 1000.0),
            create_program(11, "Pisa", 1000.0),
            create_program(12, "Pisa", 1000.0),
        ]);

        let result = recommender
            .rank(&StudentProfile::default(), &uniform(1.0), &catalog, None)
            .unwrap();

        let ids: Vec<u32> = result.recommendations.iter().map(|r| r.program.id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
    }

    #[test]
    fn test_weight_precedence() {
        let recommender = Recommender::with_default_weights();
        let budget_only = ScoringWeights::from_slice(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
        let geo_only = ScoringWeights::from_slice(&[0.0, 0.0, 0.0, 0.0, 2.0, 0.0]).unwrap();

        let profile = StudentProfile {
            weights: Some(WeightsInput::Named(budget_only)),
            ..Default::default()
        };
        assert_eq!(recommender.resolve_weights(&profile, None).unwrap(), budget_only);

        let resolved = recommender.resolve_weights(&profile, Some(&geo_only)).unwrap();
        assert_eq!(resolved.geography, 1.0);

        assert_eq!(
            recommender.resolve_weights(&StudentProfile::default(), None).unwrap(),
            ScoringWeights::default()
        );
    }

    #[test]
    fn test_invalid_weights_fail_the_request() {
        let recommender = Recommender::with_default_weights();
        let catalog = create_catalog(vec![create_program(1, "Roma", 1000.0)]);
        let profile = StudentProfile {
            weights: Some(WeightsInput::List(vec![0.5, 0.5])),
            ..Default::default()
        };

        let result = recommender.rank(&profile, &uniform(1.0), &catalog, None);
        assert!(matches!(result, Err(RankingError::InvalidWeights(_))));
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let recommender = Recommender::with_default_weights();
        let catalog = create_catalog(vec![create_program(1, "Roma", 1000.0)]);
        let profile_embeddings = FacetEmbeddings::zeros(5);

        let result = recommender.rank(&StudentProfile::default(), &profile_embeddings, &catalog, None);
        assert_eq!(
            result.unwrap_err(),
            RankingError::DimensionMismatch { expected: 2, actual: 5 }
        );
    }

    #[test]
    fn test_new_rejects_invalid_default_weights() {
        let negative = ScoringWeights::from_slice(&[1.0, 0.0, 0.0, 0.0, 0.0, -0.5]).unwrap();
        assert!(Recommender::new(
            negative,
            GeographyConfig::default(),
            CompliancePolicy::default()
        )
        .is_err());
    }

    #[test]
    fn test_top_and_bottom() {
        let recommender = Recommender::with_default_weights();
        let catalog = create_catalog(vec![
            create_program(1, "Roma", 1000.0),
            create_program(2, "Roma", 9000.0),
            create_program(3, "Roma", 20000.0),
        ]);
        let profile = StudentProfile {
            budget: Some(10000.0),
            gpa: Some(5.0),
            ..Default::default()
        };

        let result = recommender.rank(&profile, &uniform(1.0), &catalog, None).unwrap();
        assert_eq!(result.top(2).len(), 2);
        assert_eq!(result.top(10).len(), 3);

        let bottom = result.bottom(1);
        assert_eq!(bottom[0].program.id, 3);

        let summaries = result.top_summaries(1, &profile);
        assert_eq!(summaries[0].rank, 1);
        assert_eq!(summaries[0].meets_gpa_threshold, Some(false));
        assert_eq!(summaries[0].final_score, result.recommendations[0].final_score());
    }
}
