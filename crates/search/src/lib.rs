//! Semantic course search.
//!
//! A [`SearchService`] loads the course catalog, embeds every course once
//! through an [`embedding::EmbeddingProvider`], and ranks courses by cosine
//! similarity to a free-text query.

pub mod catalog;
pub mod corpus;
mod error;
pub mod ranker;
pub mod response;
mod service;

pub use catalog::{Catalog, CatalogError, CatalogFilters, CatalogSource, JsonFileSource, StaticSource};
pub use corpus::{Corpus, CorpusCache, descriptive_text};
pub use error::SearchError;
pub use ranker::{MatchTier, RankError, RankedHit, Ranking};
pub use response::{CourseMatch, NotFoundReason, SearchResponse};
pub use service::{PreloadSummary, SearchService};
