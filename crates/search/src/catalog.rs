//! Course catalog loading.
//!
//! The catalog is read once per process (or per explicit reload) and shared as
//! an immutable [`Catalog`] snapshot. Cleaning happens here: values are
//! trimmed, and null, missing and `nan` cells become empty strings.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use finder_core::{CourseField, CourseRecord, is_missing};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, trace};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
  #[error("Failed to read catalog {path:?}: {source}")]
  Io { path: PathBuf, source: std::io::Error },
  #[error("Failed to parse catalog {path:?}: {source}")]
  Parse { path: PathBuf, source: serde_json::Error },
  #[error("Catalog {path:?} has an unexpected shape: {reason}")]
  InvalidShape { path: PathBuf, reason: String },
}

/// Supplies the ordered course records. Row order is the record identity.
#[async_trait]
pub trait CatalogSource: Send + Sync {
  /// Human-readable origin, used in logs.
  fn describe(&self) -> String;

  async fn load(&self) -> Result<Vec<CourseRecord>, CatalogError>;
}

/// Reads a JSON array of objects keyed by catalog column headers.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
  path: PathBuf,
}

impl JsonFileSource {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

#[async_trait]
impl CatalogSource for JsonFileSource {
  fn describe(&self) -> String {
    self.path.display().to_string()
  }

  async fn load(&self) -> Result<Vec<CourseRecord>, CatalogError> {
    let content = tokio::fs::read_to_string(&self.path)
      .await
      .map_err(|source| CatalogError::Io {
        path: self.path.clone(),
        source,
      })?;

    let value: Value = serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
      path: self.path.clone(),
      source,
    })?;

    let records = parse_records(value).map_err(|reason| CatalogError::InvalidShape {
      path: self.path.clone(),
      reason,
    })?;
    debug!(path = %self.path.display(), courses = records.len(), "Parsed course catalog");
    Ok(records)
  }
}

/// Fixed in-memory records.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
  records: Vec<CourseRecord>,
}

impl StaticSource {
  pub fn new(records: Vec<CourseRecord>) -> Self {
    Self { records }
  }
}

#[async_trait]
impl CatalogSource for StaticSource {
  fn describe(&self) -> String {
    format!("in-memory ({} courses)", self.records.len())
  }

  async fn load(&self) -> Result<Vec<CourseRecord>, CatalogError> {
    Ok(self.records.clone())
  }
}

/// Convert a parsed JSON document into course records.
///
/// Unknown columns are ignored; absent columns stay empty.
pub fn parse_records(value: Value) -> Result<Vec<CourseRecord>, String> {
  let Value::Array(rows) = value else {
    return Err("expected a JSON array of course objects".to_string());
  };

  rows
    .into_iter()
    .enumerate()
    .map(|(row, item)| {
      let Value::Object(cells) = item else {
        return Err(format!("row {} is not an object", row));
      };

      let mut record = CourseRecord::default();
      for (header, cell) in cells {
        match CourseField::from_column(&header) {
          Some(field) => record.set(field, clean_cell(cell)),
          None => trace!(row, column = %header, "Ignoring unknown catalog column"),
        }
      }
      Ok(record)
    })
    .collect()
}

fn clean_cell(cell: Value) -> String {
  let text = match cell {
    Value::Null => return String::new(),
    Value::String(s) => s,
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    other => other.to_string(),
  };

  if is_missing(&text) {
    String::new()
  } else {
    text.trim().to_string()
  }
}

/// Topics always offered as search chips, after the level chip.
pub const PRIORITY_TOPICS: [&str; 3] = ["Communication", "Rural & culture", "Education"];

/// Upper bound on the number of suggestion chips.
pub const MAX_SUGGESTIONS: usize = 4;

/// Departments considered when topping up the suggestion chips.
const SUGGESTION_DEPARTMENTS: usize = 10;

/// Department chips must stay shorter than this many characters.
const MAX_DEPARTMENT_CHIP_CHARS: usize = 20;

/// Immutable snapshot of the loaded catalog.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
  courses: Vec<CourseRecord>,
}

/// Distinct values offered as browse filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogFilters {
  pub departments: Vec<String>,
  pub course_levels: Vec<String>,
  pub industry_domains: Vec<String>,
  pub course_types: Vec<String>,
}

impl Catalog {
  pub fn new(courses: Vec<CourseRecord>) -> Self {
    Self { courses }
  }

  pub fn len(&self) -> usize {
    self.courses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.courses.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&CourseRecord> {
    self.courses.get(index)
  }

  pub fn courses(&self) -> &[CourseRecord] {
    &self.courses
  }

  pub fn iter(&self) -> impl Iterator<Item = &CourseRecord> {
    self.courses.iter()
  }

  /// Non-empty values of `field` in first-seen order, without duplicates.
  pub fn unique_values(&self, field: CourseField) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    self
      .courses
      .iter()
      .map(|course| course.get(field))
      .filter(|value| !value.is_empty() && seen.insert(*value))
      .map(str::to_string)
      .collect()
  }

  pub fn filters(&self) -> CatalogFilters {
    CatalogFilters {
      departments: self.unique_values(CourseField::Department),
      course_levels: self.unique_values(CourseField::CourseLevel),
      industry_domains: self.unique_values(CourseField::IndustryDomain),
      course_types: self.unique_values(CourseField::CourseType),
    }
  }

  /// Non-empty values of `field` ordered by frequency, ties in first-seen order.
  pub fn values_by_frequency(&self, field: CourseField) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for value in self.courses.iter().map(|course| course.get(field)) {
      if value.is_empty() {
        continue;
      }
      match positions.get(value) {
        Some(&pos) => counts[pos].1 += 1,
        None => {
          positions.insert(value, counts.len());
          counts.push((value.to_string(), 1));
        }
      }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
  }

  /// Up to [`MAX_SUGGESTIONS`] search chips.
  ///
  /// A level chip comes first ("Beginner courses" when that level exists,
  /// otherwise the first level seen), then [`PRIORITY_TOPICS`], then the most
  /// frequent departments cut at their first `(`.
  pub fn suggestions(&self) -> Vec<String> {
    let mut chips: Vec<String> = Vec::new();

    let levels = self.unique_values(CourseField::CourseLevel);
    if levels.iter().any(|level| level == "Beginner") {
      chips.push("Beginner courses".to_string());
    } else if let Some(first) = levels.first() {
      chips.push(format!("{} courses", first));
    }

    for topic in PRIORITY_TOPICS {
      if !chips.iter().any(|chip| chip == topic) {
        chips.push(topic.to_string());
      }
    }

    if chips.len() < MAX_SUGGESTIONS {
      for (department, _) in self
        .values_by_frequency(CourseField::Department)
        .into_iter()
        .take(SUGGESTION_DEPARTMENTS)
      {
        let short = department.split('(').next().unwrap_or_default().trim();
        if !short.is_empty()
          && short.chars().count() < MAX_DEPARTMENT_CHIP_CHARS
          && !chips.iter().any(|chip| chip == short)
        {
          chips.push(short.to_string());
        }
        if chips.len() >= MAX_SUGGESTIONS {
          break;
        }
      }
    }

    chips.truncate(MAX_SUGGESTIONS);
    chips
  }
}
