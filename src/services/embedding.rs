use async_trait::async_trait;
use futures::{stream, StreamExt, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::models::{FacetEmbeddings, Program, StudentProfile};

/// Errors that can occur when talking to the embedding service
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Embedding service returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Embedding service returned an empty vector")]
    EmptyVector,

    #[error("Embedding service returned non-finite values")]
    NonFiniteValue,

    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Turns a piece of text into a fixed-length vector
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Model identifier, for logging and health reporting
    fn model(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Client for an OpenAI-compatible `/embeddings` endpoint (Ollama, vLLM, OpenAI)
pub struct HttpEmbeddingClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl HttpEmbeddingClient {
    /// Create a new embedding client
    pub fn new(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EmbeddingError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            model,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));

        let mut request = self.client.post(&url).json(&EmbeddingRequest {
            model: &self.model,
            input: text,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Embedding request failed: {} - {}", status, body);
            return Err(EmbeddingError::ApiError { status, body });
        }

        let payload: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        let vector = payload
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::InvalidResponse("Missing data array entry".into()))?;

        check_vector(&vector)?;
        Ok(vector)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn check_vector(vector: &[f32]) -> Result<(), EmbeddingError> {
    if vector.is_empty() {
        return Err(EmbeddingError::EmptyVector);
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(EmbeddingError::NonFiniteValue);
    }
    Ok(())
}

fn check_dimension(vector: &[f32], expected: usize) -> Result<(), EmbeddingError> {
    if vector.len() != expected {
        return Err(EmbeddingError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

async fn embed_checked(
    provider: &dyn EmbeddingProvider,
    text: &str,
) -> Result<Vec<f32>, EmbeddingError> {
    let vector = provider.embed(text).await?;
    check_vector(&vector)?;
    Ok(vector)
}

/// Embed one profile facet; unset or blank text becomes a zero vector
async fn embed_facet(
    provider: &dyn EmbeddingProvider,
    text: Option<&str>,
    dimension: usize,
) -> Result<Vec<f32>, EmbeddingError> {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => {
            let vector = embed_checked(provider, text).await?;
            check_dimension(&vector, dimension)?;
            Ok(vector)
        }
        None => Ok(vec![0.0; dimension]),
    }
}

/// Embed the three text facets of a profile concurrently
///
/// `dimension` is the catalog's embedding dimension; every returned vector
/// must match it.
pub async fn embed_profile(
    provider: &dyn EmbeddingProvider,
    profile: &StudentProfile,
    dimension: usize,
) -> Result<FacetEmbeddings, EmbeddingError> {
    let (academic, aspiration, lifestyle) = futures::try_join!(
        embed_facet(provider, profile.academic_interest.as_deref(), dimension),
        embed_facet(provider, profile.aspiration_text.as_deref(), dimension),
        embed_facet(provider, profile.lifestyle_text.as_deref(), dimension),
    )?;

    Ok(FacetEmbeddings {
        academic,
        aspiration,
        lifestyle,
    })
}

async fn embed_program(
    provider: &dyn EmbeddingProvider,
    program: &Program,
) -> Result<FacetEmbeddings, EmbeddingError> {
    let (academic, aspiration, lifestyle) = futures::try_join!(
        embed_checked(provider, &program.academic_profile),
        embed_checked(provider, &program.aspiration_values),
        embed_checked(provider, &program.lifestyle_preferences),
    )?;

    Ok(FacetEmbeddings {
        academic,
        aspiration,
        lifestyle,
    })
}

/// Embed every program of the catalog, preserving catalog order
///
/// At most `concurrency` programs are in flight at once. The first failure
/// aborts the whole batch; a partially embedded catalog is never returned.
pub async fn embed_catalog(
    provider: &dyn EmbeddingProvider,
    programs: &[Program],
    concurrency: usize,
) -> Result<Vec<FacetEmbeddings>, EmbeddingError> {
    let embeddings: Vec<FacetEmbeddings> = stream::iter(programs)
        .map(|program| embed_program(provider, program))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    if let Some(first) = embeddings.first() {
        let dimension = first.academic.len();
        for triple in &embeddings {
            check_dimension(&triple.academic, dimension)?;
            check_dimension(&triple.aspiration, dimension)?;
            check_dimension(&triple.lifestyle, dimension)?;
        }
    }

    tracing::debug!("Embedded {} programs", embeddings.len());
    Ok(embeddings)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic embedder: vector derived from the text length
    struct LengthEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![text.len() as f32, 1.0, 0.5])
        }

        fn model(&self) -> &str {
            "length"
        }
    }

    struct BrokenEmbedder;

    #[async_trait]
    impl EmbeddingProvider for BrokenEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![f32::NAN, 1.0, 0.5])
        }

        fn model(&self) -> &str {
            "broken"
        }
    }

    fn create_program(id: u32, academic: &str) -> Program {
        Program {
            id,
            name: format!("University {}", id),
            program: "Physics".to_string(),
            city: "Pisa".to_string(),
            annual_cost: 2500.0,
            coordinates: None,
            min_gpa: 7.0,
            prestige_rank: 1,
            duration_years: 3,
            employment_rate: 90,
            academic_profile: academic.to_string(),
            aspiration_values: "ambitious".to_string(),
            lifestyle_preferences: "quiet".to_string(),
            offers_english_instruction: true,
            has_housing: true,
            requires_admission_test: true,
        }
    }

    #[tokio::test]
    async fn test_embed_profile_blank_facets_are_zero() {
        let profile = StudentProfile {
            academic_interest: Some("Physics".to_string()),
            aspiration_text: Some("   ".to_string()),
            ..Default::default()
        };

        let embeddings = embed_profile(&LengthEmbedder, &profile, 3).await.unwrap();
        assert_eq!(embeddings.academic, vec![7.0, 1.0, 0.5]);
        assert_eq!(embeddings.aspiration, vec![0.0; 3]);
        assert_eq!(embeddings.lifestyle, vec![0.0; 3]);
    }

    #[tokio::test]
    async fn test_embed_profile_dimension_mismatch() {
        let profile = StudentProfile {
            academic_interest: Some("Physics".to_string()),
            ..Default::default()
        };
        let result = embed_profile(&LengthEmbedder, &profile, 8).await;
        assert!(matches!(
            result,
            Err(EmbeddingError::DimensionMismatch { expected: 8, actual: 3 })
        ));
    }

    #[tokio::test]
    async fn test_embed_catalog_preserves_order() {
        let programs = vec![
            create_program(1, "a"),
            create_program(2, "abcd"),
            create_program(3, "ab"),
        ];
        let embeddings = embed_catalog(&LengthEmbedder, &programs, 2).await.unwrap();
        let lengths: Vec<f32> = embeddings.iter().map(|e| e.academic[0]).collect();
        assert_eq!(lengths, vec![1.0, 4.0, 2.0]);
    }

    #[tokio::test]
    async fn test_non_finite_vectors_are_rejected() {
        let programs = vec![create_program(1, "a")];
        let result = embed_catalog(&BrokenEmbedder, &programs, 1).await;
        assert!(matches!(result, Err(EmbeddingError::NonFiniteValue)));
    }

    #[tokio::test]
    async fn test_http_client_parses_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/embeddings")
            .match_header("authorization", "Bearer secret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}], "model": "m"}"#)
            .create_async()
            .await;

        let client = HttpEmbeddingClient::new(
            format!("{}/v1/", server.url()),
            "granite-embedding:30m".to_string(),
            Some("secret".to_string()),
            Duration::from_secs(5),
        )
        .unwrap();

        let vector = client.embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
        assert_eq!(client.model(), "granite-embedding:30m");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_client_surfaces_api_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(503)
            .with_body("model loading")
            .create_async()
            .await;

        let client = HttpEmbeddingClient::new(
            server.url(),
            "m".to_string(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        match client.embed("hello").await {
            Err(EmbeddingError::ApiError { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "model loading");
            }
            other => panic!("expected ApiError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_client_rejects_empty_vector() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/embeddings")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": [{"embedding": []}]}"#)
            .create_async()
            .await;

        let client = HttpEmbeddingClient::new(
            server.url(),
            "m".to_string(),
            None,
            Duration::from_secs(5),
        )
        .unwrap();

        assert!(matches!(client.embed("hello").await, Err(EmbeddingError::EmptyVector)));
    }
}
