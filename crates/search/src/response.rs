//! Search response shapes.
//!
//! Serialized with a `status` tag:
//!
//! ```json
//! {"status": "success", "matched_type": "exact", "total_results": 1,
//!  "courses": [{"Course Name": "...", "similarity_score": 0.83}]}
//! {"status": "not_found", "message": "..."}
//! ```

use finder_core::CourseRecord;
use serde::Serialize;

use crate::ranker::MatchTier;

pub const DEFAULT_NOT_FOUND_MESSAGE: &str =
  "Sorry, I couldn't find any courses matching that. Try checking your spelling or ask for a broader topic.";
pub const DATA_UNAVAILABLE_MESSAGE: &str = "Data file could not be loaded.";
pub const EMBEDDINGS_UNAVAILABLE_MESSAGE: &str = "Failed to generate embeddings.";

/// Why a search produced no courses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
  EmptyQuery,
  NoMatch,
  DataUnavailable,
  EmbeddingsUnavailable,
}

impl NotFoundReason {
  pub fn message(&self) -> &'static str {
    match self {
      Self::EmptyQuery | Self::NoMatch => DEFAULT_NOT_FOUND_MESSAGE,
      Self::DataUnavailable => DATA_UNAVAILABLE_MESSAGE,
      Self::EmbeddingsUnavailable => EMBEDDINGS_UNAVAILABLE_MESSAGE,
    }
  }
}

/// A course with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseMatch {
  #[serde(flatten)]
  pub course: CourseRecord,
  pub similarity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchResponse {
  Success {
    matched_type: MatchTier,
    total_results: usize,
    courses: Vec<CourseMatch>,
  },
  NotFound {
    message: String,
    #[serde(skip)]
    reason: NotFoundReason,
  },
}

impl SearchResponse {
  pub fn success(matched_type: MatchTier, courses: Vec<CourseMatch>) -> Self {
    Self::Success {
      matched_type,
      total_results: courses.len(),
      courses,
    }
  }

  pub fn not_found(reason: NotFoundReason) -> Self {
    Self::NotFound {
      message: reason.message().to_string(),
      reason,
    }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, Self::Success { .. })
  }

  pub fn courses(&self) -> &[CourseMatch] {
    match self {
      Self::Success { courses, .. } => courses,
      Self::NotFound { .. } => &[],
    }
  }

  pub fn total_results(&self) -> usize {
    self.courses().len()
  }

  pub fn matched_type(&self) -> Option<MatchTier> {
    match self {
      Self::Success { matched_type, .. } => Some(*matched_type),
      Self::NotFound { .. } => None,
    }
  }

  pub fn not_found_reason(&self) -> Option<NotFoundReason> {
    match self {
      Self::NotFound { reason, .. } => Some(*reason),
      Self::Success { .. } => None,
    }
  }

  pub fn message(&self) -> Option<&str> {
    match self {
      Self::NotFound { message, .. } => Some(message),
      Self::Success { .. } => None,
    }
  }
}
