//! Search facade.
//!
//! Ties the catalog, the embedding backend, the corpus cache and the ranker
//! together behind a single `search(query)` entry point. The service is meant
//! to be shared (`Arc<SearchService>`); all state is behind async locks.

use std::sync::Arc;
use std::time::Instant;

use embedding::{EmbeddingError, EmbeddingProvider};
use finder_core::{Config, CourseRecord, SearchConfig};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
  catalog::{Catalog, CatalogFilters, CatalogSource, JsonFileSource},
  corpus::CorpusCache,
  error::SearchError,
  ranker,
  response::{CourseMatch, NotFoundReason, SearchResponse},
};

/// Outcome of an eager warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreloadSummary {
  pub courses: usize,
  pub embedded: bool,
  pub dimensions: usize,
}

pub struct SearchService {
  source: Arc<dyn CatalogSource>,
  embedding: Arc<dyn EmbeddingProvider>,
  config: SearchConfig,
  catalog: Mutex<Option<Arc<Catalog>>>,
  corpus: CorpusCache,
}

impl SearchService {
  pub fn new(source: Arc<dyn CatalogSource>, embedding: Arc<dyn EmbeddingProvider>, config: SearchConfig) -> Self {
    Self {
      source,
      embedding,
      config,
      catalog: Mutex::new(None),
      corpus: CorpusCache::new(),
    }
  }

  /// Service reading the configured catalog file with the configured backend.
  pub fn from_config(config: &Config) -> Self {
    Self::new(
      Arc::new(JsonFileSource::new(&config.catalog.path)),
      <dyn EmbeddingProvider>::from_config(&config.embedding),
      config.search.clone(),
    )
  }

  pub fn config(&self) -> &SearchConfig {
    &self.config
  }

  pub fn embedding(&self) -> &Arc<dyn EmbeddingProvider> {
    &self.embedding
  }

  /// Current catalog snapshot, loading it on first use.
  ///
  /// A failed load is logged and reported as an empty catalog. The failure is
  /// not cached, so the next call tries again.
  pub async fn catalog(&self) -> Arc<Catalog> {
    let mut slot = self.catalog.lock().await;
    if let Some(catalog) = slot.as_ref() {
      return catalog.clone();
    }

    match self.source.load().await {
      Ok(records) => {
        let catalog = Arc::new(Catalog::new(records));
        info!(source = %self.source.describe(), courses = catalog.len(), "Course catalog loaded");
        *slot = Some(catalog.clone());
        catalog
      }
      Err(e) => {
        warn!(source = %self.source.describe(), err = %e, "Course catalog unavailable");
        Arc::new(Catalog::default())
      }
    }
  }

  /// Catalog records in row order.
  pub async fn courses(&self) -> Vec<CourseRecord> {
    self.catalog().await.courses().to_vec()
  }

  /// Distinct department, level, domain and type values.
  pub async fn filters(&self) -> CatalogFilters {
    self.catalog().await.filters()
  }

  /// Search chips for an empty search box.
  pub async fn suggestions(&self) -> Vec<String> {
    self.catalog().await.suggestions()
  }

  /// Rank catalog courses against a free-text query.
  ///
  /// Backend and dimension failures propagate; every other "nothing to show"
  /// case is a not-found response.
  pub async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
    let query = query.trim();
    if query.is_empty() {
      debug!("Empty query");
      return Ok(SearchResponse::not_found(NotFoundReason::EmptyQuery));
    }

    let start = Instant::now();
    let catalog = self.catalog().await;
    if catalog.is_empty() {
      return Ok(SearchResponse::not_found(NotFoundReason::DataUnavailable));
    }

    let Some(corpus) = self.corpus.get_or_build(&catalog, self.embedding.as_ref()).await? else {
      return Ok(SearchResponse::not_found(NotFoundReason::EmbeddingsUnavailable));
    };

    let query_vector = self
      .embedding
      .embed_batch(&[query])
      .await?
      .into_iter()
      .next()
      .ok_or_else(|| EmbeddingError::ProviderError("No embedding returned for query".into()))?;

    let ranking = ranker::rank(
      &query_vector,
      corpus.vectors(),
      self.config.min_similarity,
      self.config.max_results,
    )?;

    let Some(ranking) = ranking else {
      debug!(query, elapsed_ms = start.elapsed().as_millis(), "No course above threshold");
      return Ok(SearchResponse::not_found(NotFoundReason::NoMatch));
    };

    let courses: Vec<CourseMatch> = ranking
      .hits
      .iter()
      .filter_map(|hit| {
        corpus.catalog().get(hit.index).map(|course| CourseMatch {
          course: course.clone(),
          similarity_score: hit.score,
        })
      })
      .collect();

    if let Some(top) = ranking.hits.first() {
      debug!(
        query,
        score = top.score,
        text = corpus.texts().get(top.index).map(String::as_str).unwrap_or_default(),
        "Top match"
      );
    }

    info!(
      query,
      results = courses.len(),
      tier = %ranking.tier,
      top_score = ranking.top_score(),
      elapsed_ms = start.elapsed().as_millis(),
      "Search complete"
    );
    Ok(SearchResponse::success(ranking.tier, courses))
  }

  /// Load the catalog and build corpus embeddings ahead of the first search.
  pub async fn preload(&self) -> Result<PreloadSummary, SearchError> {
    let catalog = self.catalog().await;
    let corpus = self.corpus.get_or_build(&catalog, self.embedding.as_ref()).await?;

    Ok(PreloadSummary {
      courses: catalog.len(),
      embedded: corpus.is_some(),
      dimensions: corpus.map(|c| c.dimensions()).unwrap_or(0),
    })
  }

  /// Re-read the catalog and drop the corpus built from the old snapshot.
  ///
  /// On failure the current snapshot stays in place.
  pub async fn reload(&self) -> Result<usize, SearchError> {
    let mut slot = self.catalog.lock().await;
    let records = self.source.load().await?;
    let catalog = Arc::new(Catalog::new(records));
    let count = catalog.len();
    *slot = Some(catalog);
    self.corpus.invalidate().await;
    info!(source = %self.source.describe(), courses = count, "Course catalog reloaded");
    Ok(count)
  }

  pub async fn is_warm(&self) -> bool {
    self.corpus.is_built().await
  }
}

impl std::fmt::Debug for SearchService {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SearchService")
      .field("source", &self.source.describe())
      .field("provider", &self.embedding.name())
      .field("config", &self.config)
      .finish_non_exhaustive()
  }
}
