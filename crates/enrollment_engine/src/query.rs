/* 📖 # Why linear scans for search and sorting?

Course catalogs are small (tens to a few hundred entries) and the collection is already in
memory. A linear case-insensitive substring scan and a stable sort over a copy are simple,
predictable, and keep results in catalog order. An index would need invalidation on every
seat change for no measurable gain.
*/

use enrollment_base::{EnrollmentError, EnrollmentResult};

use crate::model::Course;

pub const MISSING_QUERY_MESSAGE: &str = "Please provide a course name to search.";
pub const NO_MATCHES_MESSAGE: &str = "No courses found matching the query.";

/// Courses whose name contains `query`, ignoring case, in catalog order.
///
/// An empty query is an invalid request. No matches is reported as `NotFound`
/// so callers can present it as "no results".
pub fn search_courses(courses: &[Course], query: &str) -> EnrollmentResult<Vec<Course>> {
    if query.is_empty() {
        return Err(Box::new(EnrollmentError::invalid_request(
            MISSING_QUERY_MESSAGE,
        )));
    }

    let needle = query.to_lowercase();
    let matches: Vec<Course> = courses
        .iter()
        .filter(|course| course.name.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    if matches.is_empty() {
        return Err(Box::new(EnrollmentError::not_found(NO_MATCHES_MESSAGE)));
    }
    Ok(matches)
}

/// A copy of `courses` ordered by descending popularity.
///
/// `sort_by` is a stable sort, so courses with equal popularity keep their
/// catalog order.
pub fn sort_by_popularity(courses: &[Course]) -> Vec<Course> {
    let mut sorted = courses.to_vec();
    sorted.sort_by(|a, b| b.popularity_rank().total_cmp(&a.popularity_rank()));
    sorted
}
