//! End-to-end tests for SearchService with fake embedding backends.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{FailingProvider, FakeProvider, SwappableSource, at_cosine, service_with};
use embedding::EmbeddingError;
use finder_core::{CourseField, CourseRecord, SearchConfig};
use futures::future::join_all;
use pretty_assertions::assert_eq;
use search::response::{DATA_UNAVAILABLE_MESSAGE, DEFAULT_NOT_FOUND_MESSAGE, EMBEDDINGS_UNAVAILABLE_MESSAGE};
use search::{JsonFileSource, MatchTier, NotFoundReason, SearchError, SearchService, descriptive_text};

fn sample_catalog() -> Vec<CourseRecord> {
  vec![
    CourseRecord::named("Intro to Data Science")
      .with(CourseField::Department, "Computer Science")
      .with(CourseField::Skills, "Python, Statistics")
      .with(CourseField::CourseLevel, "Beginner"),
    CourseRecord::named("Digital Marketing Fundamentals")
      .with(CourseField::Department, "Business")
      .with(CourseField::Skills, "SEO, Advertising")
      .with(CourseField::IndustryDomain, "Retail"),
    CourseRecord::named("Organic Chemistry")
      .with(CourseField::Department, "Chemistry")
      .with(CourseField::Skills, "Lab Safety, Synthesis"),
  ]
}

fn names(response: &search::SearchResponse) -> Vec<&str> {
  response.courses().iter().map(|c| c.course.course_name.as_str()).collect()
}

#[tokio::test]
async fn test_blank_query_skips_backend() {
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = service_with(sample_catalog(), provider.clone());

  for query in ["", "   ", "\n\t"] {
    let response = service.search(query).await.unwrap();
    assert_eq!(response.not_found_reason(), Some(NotFoundReason::EmptyQuery));
    assert_eq!(response.message(), Some(DEFAULT_NOT_FOUND_MESSAGE));
  }
  assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_empty_dataset_reports_data_unavailable() {
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = service_with(vec![], provider.clone());

  let response = service.search("anything").await.unwrap();
  assert!(!response.is_success());
  assert_eq!(response.message(), Some(DATA_UNAVAILABLE_MESSAGE));
  assert_eq!(response.total_results(), 0);
  assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_unreadable_catalog_is_retried() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("courses.json");
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = SearchService::new(
    Arc::new(JsonFileSource::new(&path)),
    provider.clone(),
    SearchConfig::default(),
  );

  let response = service.search("data science").await.unwrap();
  assert_eq!(response.not_found_reason(), Some(NotFoundReason::DataUnavailable));

  std::fs::write(
    &path,
    r#"[{"Course Name": "Intro to Data Science", "Department": "nan", "Skills": null}]"#,
  )
  .unwrap();

  let response = service.search("Intro to Data Science").await.unwrap();
  assert!(response.is_success());
  assert_eq!(response.courses()[0].course.department, "");
}

#[tokio::test]
async fn test_verbatim_course_name_is_exact() {
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = service_with(vec![CourseRecord::named("Intro to Data Science")], provider);

  let response = service.search("Intro to Data Science").await.unwrap();
  assert!(response.is_success());
  assert_eq!(response.matched_type(), Some(MatchTier::Exact));
  assert_eq!(response.total_results(), 1);
  assert!((response.courses()[0].similarity_score - 1.0).abs() < 1e-6);
}

#[tokio::test]
async fn test_descriptive_text_query_scores_highest() {
  let catalog = sample_catalog();
  let target = descriptive_text(&catalog[1]);
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = service_with(catalog, provider);

  let response = service.search(&target).await.unwrap();
  let courses = response.courses();
  assert_eq!(courses[0].course.course_name, "Digital Marketing Fundamentals");
  assert!((courses[0].similarity_score - 1.0).abs() < 1e-6);
  assert!(courses.iter().all(|c| c.similarity_score <= courses[0].similarity_score));
}

#[tokio::test]
async fn test_below_threshold_is_not_found() {
  let provider = Arc::new(FakeProvider::fixed(
    [("Organic Chemistry", at_cosine(0.2)), ("Poetry", at_cosine(0.29))],
    vec![1.0, 0.0],
  ));
  let service = service_with(
    vec![CourseRecord::named("Organic Chemistry"), CourseRecord::named("Poetry")],
    provider,
  );

  let response = service.search("machine learning").await.unwrap();
  assert_eq!(response.not_found_reason(), Some(NotFoundReason::NoMatch));
  assert_eq!(response.total_results(), 0);
}

#[tokio::test]
async fn test_max_results_truncates_in_score_order() {
  let cosines = [0.6, 0.9, 0.55, 0.95, 0.7, 0.5, 0.85, 0.65, 0.8, 0.75];
  let records: Vec<_> = (0..10).map(|i| CourseRecord::named(format!("course-{}", i))).collect();
  let provider = Arc::new(FakeProvider::fixed(
    cosines
      .iter()
      .enumerate()
      .map(|(i, cos)| (format!("course-{}", i), at_cosine(*cos))),
    vec![1.0, 0.0],
  ));
  let service = service_with(records, provider);

  let response = service.search("query").await.unwrap();
  assert_eq!(response.total_results(), 5);
  assert_eq!(names(&response), vec!["course-3", "course-1", "course-6", "course-8", "course-9"]);

  let scores: Vec<f64> = response.courses().iter().map(|c| c.similarity_score).collect();
  assert!(scores.windows(2).all(|w| w[0] >= w[1]), "scores not descending: {scores:?}");
}

#[tokio::test]
async fn test_tier_follows_top_score() {
  let cases = [(0.85, MatchTier::Exact), (0.55, MatchTier::Partial), (0.35, MatchTier::Related)];

  for (cos, tier) in cases {
    let provider = Arc::new(FakeProvider::fixed([("only", at_cosine(cos))], vec![1.0, 0.0]));
    let service = service_with(vec![CourseRecord::named("only")], provider);
    let response = service.search("query").await.unwrap();
    assert_eq!(response.matched_type(), Some(tier), "cosine {cos}");
  }
}

#[tokio::test]
async fn test_custom_thresholds() {
  let provider = Arc::new(FakeProvider::fixed(
    [("a", at_cosine(0.5)), ("b", at_cosine(0.2)), ("c", at_cosine(0.9))],
    vec![1.0, 0.0],
  ));
  let service = SearchService::new(
    Arc::new(search::StaticSource::new(vec![
      CourseRecord::named("a"),
      CourseRecord::named("b"),
      CourseRecord::named("c"),
    ])),
    provider,
    SearchConfig {
      min_similarity: 0.1,
      max_results: 2,
    },
  );

  let response = service.search("query").await.unwrap();
  assert_eq!(names(&response), vec!["c", "a"]);
}

#[tokio::test]
async fn test_corpus_embedded_once() {
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = service_with(sample_catalog(), provider.clone());

  service.search("data science").await.unwrap();
  service.search("marketing").await.unwrap();
  service.preload().await.unwrap();

  // one corpus batch, then one single-text batch per query
  assert_eq!(provider.batch_sizes(), vec![3, 1, 1]);
  assert!(service.is_warm().await);
}

#[tokio::test]
async fn test_concurrent_first_searches_build_once() {
  let provider = Arc::new(FakeProvider::bag_of_words().with_delay(Duration::from_millis(30)));
  let service = Arc::new(service_with(sample_catalog(), provider.clone()));

  let searches = (0..8).map(|_| {
    let service = service.clone();
    async move { service.search("chemistry lab").await }
  });
  for result in join_all(searches).await {
    assert_eq!(result.unwrap().matched_type(), Some(MatchTier::Exact));
  }

  let sizes = provider.batch_sizes();
  assert_eq!(sizes.iter().filter(|s| **s == 3).count(), 1);
  assert_eq!(sizes.iter().filter(|s| **s == 1).count(), 8);
}

#[tokio::test]
async fn test_preload_is_idempotent() {
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = service_with(sample_catalog(), provider.clone());

  let first = service.preload().await.unwrap();
  let second = service.preload().await.unwrap();
  assert_eq!(first, second);
  assert_eq!(first.courses, 3);
  assert!(first.embedded);
  assert_eq!(first.dimensions, common::BAG_DIMENSIONS);
  assert_eq!(provider.calls(), 1);

  let empty = service_with(vec![], provider.clone()).preload().await.unwrap();
  assert!(!empty.embedded);
  assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_reload_rebuilds_in_lockstep() {
  let source = Arc::new(SwappableSource::new(vec![CourseRecord::named("Organic Chemistry")]));
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = SearchService::new(source.clone(), provider.clone(), SearchConfig::default());

  let response = service.search("Organic Chemistry").await.unwrap();
  assert_eq!(names(&response), vec!["Organic Chemistry"]);

  // Replacing the source alone changes nothing until an explicit reload
  source.replace(vec![
    CourseRecord::named("Astronomy Basics"),
    CourseRecord::named("Organic Chemistry"),
  ]);
  let response = service.search("Astronomy Basics").await.unwrap();
  assert!(!response.is_success());
  assert_eq!(source.loads.load(Ordering::SeqCst), 1);

  assert_eq!(service.reload().await.unwrap(), 2);
  assert!(!service.is_warm().await);

  let response = service.search("Astronomy Basics").await.unwrap();
  assert_eq!(names(&response), vec!["Astronomy Basics"]);
  let response = service.search("Organic Chemistry").await.unwrap();
  assert_eq!(names(&response), vec!["Organic Chemistry"]);

  // corpus(1), two queries, rebuilt corpus(2), two queries
  assert_eq!(provider.batch_sizes(), vec![1, 1, 1, 2, 1, 1]);
  assert_eq!(service.courses().await.len(), 2);
}

#[tokio::test]
async fn test_backend_failure_propagates() {
  let provider = Arc::new(FailingProvider::default());
  let service = service_with(sample_catalog(), provider.clone());

  let err = service.search("data science").await.unwrap_err();
  assert!(matches!(err, SearchError::Embedding(EmbeddingError::Network(_))), "got {err:?}");
  assert!(!service.is_warm().await);

  // not cached as a failure; the next request tries the backend again
  service.search("data science").await.unwrap_err();
  assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

  let err = service.preload().await.unwrap_err();
  assert!(err.is_backend());
}

#[tokio::test]
async fn test_blank_records_only_reports_embeddings_unavailable() {
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = service_with(vec![CourseRecord::default(), CourseRecord::named("nan")], provider.clone());

  let response = service.search("anything").await.unwrap();
  assert_eq!(response.message(), Some(EMBEDDINGS_UNAVAILABLE_MESSAGE));
  assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_query_dimension_mismatch_is_an_error() {
  let provider = Arc::new(FakeProvider::fixed([("course", vec![1.0, 0.0])], vec![1.0, 0.0, 0.0]));
  let service = service_with(vec![CourseRecord::named("course")], provider);

  let err = service.search("query").await.unwrap_err();
  assert!(matches!(err, SearchError::Rank(_)), "got {err:?}");
}

#[tokio::test]
async fn test_result_items_carry_all_attributes() {
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = service_with(sample_catalog(), provider);

  let response = service.search("Intro to Data Science").await.unwrap();
  let value = serde_json::to_value(&response).unwrap();
  let top = &value["courses"][0];
  assert_eq!(value["status"], "success");
  assert_eq!(top["Course Name"], "Intro to Data Science");
  assert_eq!(top["Skills"], "Python, Statistics");
  assert_eq!(top["Course Level"], "Beginner");
  assert!(top["similarity_score"].as_f64().unwrap() > 0.3);
}

#[tokio::test]
async fn test_filters_from_loaded_catalog() {
  let service = service_with(sample_catalog(), Arc::new(FakeProvider::bag_of_words()));

  let filters = service.filters().await;
  assert_eq!(filters.departments, vec!["Computer Science", "Business", "Chemistry"]);
  assert_eq!(filters.course_levels, vec!["Beginner"]);
  assert_eq!(filters.industry_domains, vec!["Retail"]);
  assert!(filters.course_types.is_empty());
}

#[tokio::test]
async fn test_suggestions_and_courses_skip_backend() {
  let provider = Arc::new(FakeProvider::bag_of_words());
  let service = service_with(sample_catalog(), provider.clone());

  assert_eq!(
    service.suggestions().await,
    vec!["Beginner courses", "Communication", "Rural & culture", "Education"]
  );
  assert_eq!(service.courses().await, sample_catalog());
  assert_eq!(service.catalog().await.len(), 3);
  assert_eq!(provider.calls(), 0);
  assert!(!service.is_warm().await);
}
