use thiserror::Error;

/// Errors raised by the ranking engine
///
/// Missing profile data never ends up here: unset fields resolve to
/// documented fallbacks inside the scorers. These are the cases where a
/// complete ranking cannot be produced at all.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RankingError {
    #[error("Invalid weight vector: {0}")]
    InvalidWeights(String),

    #[error("Catalog is empty")]
    EmptyCatalog,

    #[error("Catalog has {programs} programs but {embeddings} embedding triples")]
    CatalogMismatch { programs: usize, embeddings: usize },

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Malformed embedding: {0}")]
    MalformedEmbedding(String),

    #[error("Program {program_id} produced a non-finite score")]
    NonFiniteScore { program_id: u32 },
}
