//! Course search command

use anyhow::{Context, Result};
use finder_core::Config;
use search::SearchService;
use tracing::debug;

use crate::format::format_search_response;

/// Leading text of a suggestion chip pasted back into the search box.
const SEARCH_PREFIXES: [&str; 2] = ["Try searching for:", "Try searching for"];

/// Drop a leading "Try searching for" (case-insensitive, optional colon).
pub fn strip_search_prefix(query: &str) -> &str {
  let query = query.trim();
  for prefix in SEARCH_PREFIXES {
    let matches = query
      .get(..prefix.len())
      .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
    if matches {
      return query[prefix.len()..].trim();
    }
  }
  query
}

pub async fn cmd_search(config: &Config, query: &str, json_output: bool) -> Result<()> {
  let query = strip_search_prefix(query);
  debug!(query, "Searching");

  let service = SearchService::from_config(config);
  let response = service.search(query).await.context("Search failed")?;

  if json_output {
    println!("{}", serde_json::to_string_pretty(&response)?);
  } else {
    print!("{}", format_search_response(query, &response));
  }
  Ok(())
}
