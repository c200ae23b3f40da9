//! Human-readable rendering of search results and catalog listings.

use finder_core::{CourseField, CourseRecord};
use search::{CatalogFilters, MatchTier, SearchResponse};

/// Fields shown under each course name, in order.
const DETAIL_FIELDS: [CourseField; 7] = [
  CourseField::Department,
  CourseField::CourseLevel,
  CourseField::CourseType,
  CourseField::IndustryDomain,
  CourseField::CoursePathway,
  CourseField::Skills,
  CourseField::JobRoleToSkill,
];

fn headline(query: &str, tier: MatchTier, count: usize) -> String {
  match tier {
    MatchTier::Exact => format!("Found {} course(s) matching \"{}\":", count, query),
    MatchTier::Partial => format!("Closest matches for \"{}\":", query),
    MatchTier::Related => format!("No close match for \"{}\". You might also like:", query),
  }
}

/// Indented `Label: value` lines for the non-empty attributes of a course.
pub fn format_details(course: &CourseRecord) -> String {
  let mut out = String::new();
  for field in DETAIL_FIELDS {
    let value = course.get(field);
    if !value.is_empty() {
      out.push_str(&format!("   {}: {}\n", field.label(), value));
    }
  }
  out
}

pub fn format_search_response(query: &str, response: &SearchResponse) -> String {
  match response {
    SearchResponse::NotFound { message, .. } => format!("{}\n", message),
    SearchResponse::Success {
      matched_type, courses, ..
    } => {
      let mut out = headline(query.trim(), *matched_type, courses.len());
      out.push_str("\n\n");
      for (i, item) in courses.iter().enumerate() {
        out.push_str(&format!(
          "{}. {} (similarity {:.2})\n",
          i + 1,
          item.course.course_name,
          item.similarity_score
        ));
        out.push_str(&format_details(&item.course));
        out.push('\n');
      }
      out
    }
  }
}

pub fn format_course_list(courses: &[CourseRecord]) -> String {
  let mut out = format!("{} courses:\n\n", courses.len());
  for (i, course) in courses.iter().enumerate() {
    let name = if course.course_name.is_empty() {
      "(unnamed)"
    } else {
      &course.course_name
    };
    if course.department.is_empty() {
      out.push_str(&format!("{:>4}. {}\n", i + 1, name));
    } else {
      out.push_str(&format!("{:>4}. {} [{}]\n", i + 1, name, course.department));
    }
  }
  out
}

pub fn format_filters(filters: &CatalogFilters) -> String {
  let sections = [
    (CourseField::Department, &filters.departments),
    (CourseField::CourseLevel, &filters.course_levels),
    (CourseField::IndustryDomain, &filters.industry_domains),
    (CourseField::CourseType, &filters.course_types),
  ];

  let mut out = String::new();
  for (field, values) in sections {
    out.push_str(&format!("{} ({}):\n", field.label(), values.len()));
    for value in values {
      out.push_str(&format!("  - {}\n", value));
    }
    out.push('\n');
  }
  out
}

pub fn format_suggestions(suggestions: &[String]) -> String {
  if suggestions.is_empty() {
    return "No suggestions available.\n".to_string();
  }
  let mut out = String::from("Try searching for:\n");
  for chip in suggestions {
    out.push_str(&format!("  - {}\n", chip));
  }
  out
}
