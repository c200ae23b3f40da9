//! Catalog inspection and warm-up commands

use anyhow::{Context, Result};
use finder_core::Config;
use search::SearchService;
use tracing::warn;

use crate::format::{format_course_list, format_filters, format_suggestions};

/// Load the catalog and embed it, reporting what was built
pub async fn cmd_preload(config: &Config) -> Result<()> {
  let service = SearchService::from_config(config);
  let start = std::time::Instant::now();
  let summary = service.preload().await.context("Preload failed")?;

  if summary.courses == 0 {
    println!("No courses loaded from {:?}", config.catalog.path);
  } else if summary.embedded {
    println!(
      "Embedded {} courses ({} dimensions, {}) in {:.1}s",
      summary.courses,
      summary.dimensions,
      service.embedding().model_id(),
      start.elapsed().as_secs_f64()
    );
  } else {
    println!("Loaded {} courses but none had text to embed", summary.courses);
  }
  Ok(())
}

pub async fn cmd_courses(config: &Config, json_output: bool) -> Result<()> {
  let service = SearchService::from_config(config);
  let catalog = service.catalog().await;

  if json_output {
    println!("{}", serde_json::to_string_pretty(catalog.courses())?);
    return Ok(());
  }

  if catalog.is_empty() {
    warn!(path = %config.catalog.path.display(), "Catalog is empty or unreadable");
    println!("No courses loaded from {:?}", config.catalog.path);
  } else {
    print!("{}", format_course_list(catalog.courses()));
  }
  Ok(())
}

pub async fn cmd_filters(config: &Config, json_output: bool) -> Result<()> {
  let service = SearchService::from_config(config);
  let filters = service.filters().await;

  if json_output {
    println!("{}", serde_json::to_string_pretty(&filters)?);
  } else {
    print!("{}", format_filters(&filters));
  }
  Ok(())
}

pub async fn cmd_suggestions(config: &Config, json_output: bool) -> Result<()> {
  let service = SearchService::from_config(config);
  let suggestions = service.suggestions().await;

  if json_output {
    println!(
      "{}",
      serde_json::to_string_pretty(&serde_json::json!({ "suggestions": suggestions }))?
    );
  } else {
    print!("{}", format_suggestions(&suggestions));
  }
  Ok(())
}
