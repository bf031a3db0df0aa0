// Service exports
pub mod catalog;
pub mod embedding;
pub mod session;

pub use catalog::{load_catalog, parse_catalog, CatalogError};
pub use embedding::{
    embed_catalog, embed_profile, EmbeddingError, EmbeddingProvider, HttpEmbeddingClient,
};
pub use session::{ProfileSession, SessionError, SessionStore};
