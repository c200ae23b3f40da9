//! Course catalog domain types.
//!
//! A [`CourseRecord`] is one row of the catalog. Its identity is the row index
//! in the snapshot it was loaded from; records are never mutated once loaded.

use serde::{Deserialize, Serialize};

/// Placeholder that spreadsheet exports write for empty cells.
pub const MISSING_PLACEHOLDER: &str = "nan";

/// Returns true when a cell value carries no information.
pub fn is_missing(value: &str) -> bool {
  let value = value.trim();
  value.is_empty() || value.eq_ignore_ascii_case(MISSING_PLACEHOLDER)
}

/// The fixed set of course attributes, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseField {
  CourseName,
  Department,
  Skills,
  IndustryDomain,
  CourseType,
  CoursePathway,
  CourseLevel,
  JobRoleToSkill,
}

impl CourseField {
  /// All fields in the order they appear in descriptive text and responses.
  pub const ALL: [CourseField; 8] = [
    CourseField::CourseName,
    CourseField::Department,
    CourseField::Skills,
    CourseField::IndustryDomain,
    CourseField::CourseType,
    CourseField::CoursePathway,
    CourseField::CourseLevel,
    CourseField::JobRoleToSkill,
  ];

  /// Column header used by the source dataset.
  pub fn column(&self) -> &'static str {
    match self {
      CourseField::CourseName => "Course Name",
      CourseField::Department => "Department",
      CourseField::Skills => "Skills",
      CourseField::IndustryDomain => "Industry Domain",
      CourseField::CourseType => "Course type",
      CourseField::CoursePathway => "Course Pathway",
      CourseField::CourseLevel => "Course Level",
      CourseField::JobRoleToSkill => "job role to skill",
    }
  }

  /// Key used when a record is rendered in a search response.
  pub fn label(&self) -> &'static str {
    match self {
      CourseField::JobRoleToSkill => "Job role to skill",
      other => other.column(),
    }
  }

  /// Resolve a dataset column header (case-insensitive, surrounding whitespace ignored).
  pub fn from_column(header: &str) -> Option<Self> {
    let header = header.trim();
    Self::ALL
      .into_iter()
      .find(|field| field.column().eq_ignore_ascii_case(header))
  }
}

impl std::fmt::Display for CourseField {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.label())
  }
}

/// One catalog entry. Missing values are stored as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
  #[serde(rename = "Course Name", default)]
  pub course_name: String,
  #[serde(rename = "Department", default)]
  pub department: String,
  #[serde(rename = "Skills", default)]
  pub skills: String,
  #[serde(rename = "Industry Domain", default)]
  pub industry_domain: String,
  #[serde(rename = "Course type", default)]
  pub course_type: String,
  #[serde(rename = "Course Pathway", default)]
  pub course_pathway: String,
  #[serde(rename = "Course Level", default)]
  pub course_level: String,
  #[serde(rename = "Job role to skill", alias = "job role to skill", default)]
  pub job_role_to_skill: String,
}

impl CourseRecord {
  /// Record with only a course name, the rest left empty.
  pub fn named(name: impl Into<String>) -> Self {
    Self {
      course_name: name.into(),
      ..Default::default()
    }
  }

  pub fn get(&self, field: CourseField) -> &str {
    match field {
      CourseField::CourseName => &self.course_name,
      CourseField::Department => &self.department,
      CourseField::Skills => &self.skills,
      CourseField::IndustryDomain => &self.industry_domain,
      CourseField::CourseType => &self.course_type,
      CourseField::CoursePathway => &self.course_pathway,
      CourseField::CourseLevel => &self.course_level,
      CourseField::JobRoleToSkill => &self.job_role_to_skill,
    }
  }

  pub fn set(&mut self, field: CourseField, value: impl Into<String>) {
    let slot = match field {
      CourseField::CourseName => &mut self.course_name,
      CourseField::Department => &mut self.department,
      CourseField::Skills => &mut self.skills,
      CourseField::IndustryDomain => &mut self.industry_domain,
      CourseField::CourseType => &mut self.course_type,
      CourseField::CoursePathway => &mut self.course_pathway,
      CourseField::CourseLevel => &mut self.course_level,
      CourseField::JobRoleToSkill => &mut self.job_role_to_skill,
    };
    *slot = value.into();
  }

  /// Builder-style setter, mostly for fixtures.
  pub fn with(mut self, field: CourseField, value: impl Into<String>) -> Self {
    self.set(field, value);
    self
  }

  /// Attribute values in catalog order.
  pub fn values(&self) -> impl Iterator<Item = (CourseField, &str)> {
    CourseField::ALL.into_iter().map(move |field| (field, self.get(field)))
  }
}
