use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::FacetEmbeddings;

/// Fixed blend of the facet similarities into one semantic score
pub const ACADEMIC_MIX: f64 = 0.5;
pub const ASPIRATION_MIX: f64 = 0.3;
pub const LIFESTYLE_MIX: f64 = 0.2;

/// Cosine similarities of one candidate against the profile, per facet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FacetSimilarity {
    pub academic: f64,
    pub aspiration: f64,
    pub lifestyle: f64,
    pub aggregated: f64,
}

impl FacetSimilarity {
    pub fn new(academic: f64, aspiration: f64, lifestyle: f64) -> Self {
        Self {
            academic,
            aspiration,
            lifestyle,
            aggregated: ACADEMIC_MIX * academic
                + ASPIRATION_MIX * aspiration
                + LIFESTYLE_MIX * lifestyle,
        }
    }
}

/// Cosine similarity `dot(a, b) / (|a| * |b|)`
///
/// Returns 0.0 when either vector has zero magnitude. Both vectors must
/// share a dimension.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "cosine similarity over mismatched dimensions");
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator <= f64::EPSILON {
        return 0.0;
    }

    (dot / denominator).clamp(-1.0, 1.0)
}

/// Facet similarities of one candidate
pub fn facet_similarity(profile: &FacetEmbeddings, candidate: &FacetEmbeddings) -> FacetSimilarity {
    FacetSimilarity::new(
        cosine_similarity(&profile.academic, &candidate.academic),
        cosine_similarity(&profile.aspiration, &candidate.aspiration),
        cosine_similarity(&profile.lifestyle, &candidate.lifestyle),
    )
}

/// Facet similarities for every candidate, in input order
pub fn facet_similarities(
    profile: &FacetEmbeddings,
    candidates: &[FacetEmbeddings],
) -> Vec<FacetSimilarity> {
    candidates
        .par_iter()
        .map(|candidate| facet_similarity(profile, candidate))
        .collect()
}
