//! Cosine ranking of a query vector against the corpus.
//!
//! Vectors are normalized by `norm + NORM_EPSILON`, so all-zero vectors score
//! 0.0 against everything instead of dividing by zero.

use serde::{Deserialize, Serialize};

pub const NORM_EPSILON: f64 = 1e-10;

/// Top score at or above this is an exact match.
pub const EXACT_THRESHOLD: f64 = 0.70;
/// Top score at or above this (and below exact) is a partial match.
pub const PARTIAL_THRESHOLD: f64 = 0.40;

pub const DEFAULT_MIN_SIMILARITY: f64 = 0.30;
pub const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
  Exact,
  Partial,
  Related,
}

impl MatchTier {
  /// Classify by the best score in the result set.
  pub fn classify(top_score: f64) -> Self {
    if top_score >= EXACT_THRESHOLD {
      MatchTier::Exact
    } else if top_score >= PARTIAL_THRESHOLD {
      MatchTier::Partial
    } else {
      MatchTier::Related
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      MatchTier::Exact => "exact",
      MatchTier::Partial => "partial",
      MatchTier::Related => "related",
    }
  }
}

impl std::fmt::Display for MatchTier {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RankError {
  #[error("Query vector has {query} dimensions but corpus vector {index} has {corpus}")]
  DimensionMismatch { query: usize, corpus: usize, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedHit {
  /// Row index into the catalog snapshot the corpus was built from
  pub index: usize,
  pub score: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
  /// Non-empty, descending by score, ties in catalog order
  pub hits: Vec<RankedHit>,
  pub tier: MatchTier,
}

impl Ranking {
  pub fn top_score(&self) -> f64 {
    self.hits.first().map(|h| h.score).unwrap_or(0.0)
  }
}

fn norm(v: &[f32]) -> f64 {
  v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
  a.iter().zip(b).map(|(x, y)| (*x as f64) * (*y as f64)).sum()
}

/// Cosine similarity of two equal-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
  dot(a, b) / ((norm(a) + NORM_EPSILON) * (norm(b) + NORM_EPSILON))
}

/// Score every corpus vector against `query`, in corpus order.
pub fn cosine_similarities(query: &[f32], corpus: &[Vec<f32>]) -> Result<Vec<f64>, RankError> {
  let query_norm = norm(query) + NORM_EPSILON;

  corpus
    .iter()
    .enumerate()
    .map(|(index, vector)| {
      if vector.len() != query.len() {
        return Err(RankError::DimensionMismatch {
          query: query.len(),
          corpus: vector.len(),
          index,
        });
      }
      Ok(dot(query, vector) / (query_norm * (norm(vector) + NORM_EPSILON)))
    })
    .collect()
}

/// Keep scores `>= min_similarity`, order them descending and truncate to
/// `max_results`. Returns `None` when nothing survives.
pub fn rank(
  query: &[f32],
  corpus: &[Vec<f32>],
  min_similarity: f64,
  max_results: usize,
) -> Result<Option<Ranking>, RankError> {
  let scores = cosine_similarities(query, corpus)?;

  let mut hits: Vec<RankedHit> = scores
    .into_iter()
    .enumerate()
    .filter(|(_, score)| *score >= min_similarity)
    .map(|(index, score)| RankedHit { index, score })
    .collect();

  // sort_by is stable, so equal scores stay in catalog order
  hits.sort_by(|a, b| b.score.total_cmp(&a.score));
  hits.truncate(max_results);

  let Some(top) = hits.first() else {
    return Ok(None);
  };
  let tier = MatchTier::classify(top.score);
  Ok(Some(Ranking { hits, tier }))
}
