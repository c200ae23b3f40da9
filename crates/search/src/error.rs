//! Error type for search service operations.

use embedding::EmbeddingError;

use crate::{catalog::CatalogError, ranker::RankError};

/// Failures the service surfaces to its caller.
///
/// "Nothing to show" outcomes (blank query, missing data, no match) are not
/// errors; they come back as a not-found [`SearchResponse`](crate::SearchResponse).
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
  /// Embedding backend failed or was unavailable.
  #[error("Embedding error: {0}")]
  Embedding(#[from] EmbeddingError),
  /// Query and corpus vectors disagree on dimensionality.
  #[error("Ranking error: {0}")]
  Rank(#[from] RankError),
  /// Explicit catalog reload failed.
  #[error("Catalog error: {0}")]
  Catalog(#[from] CatalogError),
}

impl SearchError {
  /// True when the failure came from the embedding backend.
  pub fn is_backend(&self) -> bool {
    matches!(self, Self::Embedding(_))
  }
}
