/* 📖 # Why keep unknown course fields?

`courses.json` is maintained by hand and by other tools, and records often carry
more than the fields the catalog reads (instructor, schedule, description). Every
enrollment rewrites the whole snapshot, so anything not captured here would be
silently dropped on the first write. The flattened `extra` map carries those keys
through untouched.
*/

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Identifier of a course, assigned outside the catalog.
///
/// Data files use JSON strings or numbers for ids. The two kinds never match
/// each other, so `1` and `"1"` name different courses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CourseId {
    Text(String),
    Number(Number),
}

impl CourseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self::Text(id.into())
    }

    /// Empty or whitespace-only text. Numeric ids are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            CourseId::Text(text) => text.trim().is_empty(),
            CourseId::Number(_) => false,
        }
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CourseId::Text(text) => f.write_str(text),
            CourseId::Number(number) => write!(f, "{}", number),
        }
    }
}

impl From<&str> for CourseId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for CourseId {
    fn from(id: String) -> Self {
        Self::Text(id)
    }
}

impl From<u64> for CourseId {
    fn from(id: u64) -> Self {
        Self::Number(Number::from(id))
    }
}

/// Sequential identifier of an enrollment record, starting at 1.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EnrollmentId(u64);

impl EnrollmentId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EnrollmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An enrollable course with its seat counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub name: String,
    pub available_slots: u32,
    /// Absent until the first enrollment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled_students: Option<u32>,
    /// Left out of the written record when the source record had none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<Number>,
    /// Total seats, when the data file records it explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Course {
    pub fn new(id: impl Into<CourseId>, name: impl Into<String>, available_slots: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            available_slots,
            enrolled_students: None,
            popularity: None,
            capacity: None,
            extra: Map::new(),
        }
    }

    pub fn with_popularity(mut self, popularity: impl Into<Number>) -> Self {
        self.popularity = Some(popularity.into());
        self
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Number of enrolled students, treating an absent counter as zero.
    pub fn enrolled_count(&self) -> u32 {
        self.enrolled_students.unwrap_or(0)
    }

    /// Popularity as a float for ordering, zero when absent. Non-finite values
    /// never occur in JSON.
    pub fn popularity_rank(&self) -> f64 {
        self.popularity
            .as_ref()
            .and_then(Number::as_f64)
            .unwrap_or(0.0)
    }

    pub fn has_free_seat(&self) -> bool {
        self.available_slots > 0
    }
}

/// A record linking one student to one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub id: EnrollmentId,
    pub student_name: String,
    pub course_id: CourseId,
}

impl Enrollment {
    pub fn is_for(&self, student_name: &str, course_id: &CourseId) -> bool {
        self.student_name == student_name && &self.course_id == course_id
    }
}

/// Body of an enrollment request. Both fields are optional at the parse level so
/// a missing field is reported as an invalid request, not a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentRequest {
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub course_id: Option<CourseId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn test_course_parses_minimal_record() {
        let course: Course =
            serde_json::from_str(r#"{"id": "c1", "name": "Algebra", "availableSlots": 3}"#)
                .unwrap();
        assert_eq!(course.id, CourseId::from("c1"));
        assert_eq!(course.enrolled_students, None);
        assert_eq!(course.popularity_rank(), 0.0);
        assert!(course.extra.is_empty());
    }

    #[test]
    fn test_course_without_popularity_stays_without() {
        let source = r#"{"id":"c1","name":"Algebra","availableSlots":3}"#;
        let mut course: Course = serde_json::from_str(source).unwrap();
        course.available_slots -= 1;
        course.enrolled_students = Some(1);

        expect![[r#"{"id":"c1","name":"Algebra","availableSlots":2,"enrolledStudents":1}"#]]
            .assert_eq(&serde_json::to_string(&course).unwrap());
    }

    #[test]
    fn test_numeric_course_id_keeps_its_type() {
        let course: Course =
            serde_json::from_str(r#"{"id": 7, "name": "Algebra", "availableSlots": 3}"#).unwrap();
        assert_eq!(course.id, CourseId::from(7u64));
        assert_ne!(course.id, CourseId::from("7"));
        assert_eq!(course.id.to_string(), "7");

        expect![[r#"{"id":7,"name":"Algebra","availableSlots":3}"#]]
            .assert_eq(&serde_json::to_string(&course).unwrap());
    }

    #[test]
    fn test_course_id_must_be_scalar() {
        let result: Result<Course, _> =
            serde_json::from_str(r#"{"id": true, "name": "Algebra", "availableSlots": 3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_course_ids() {
        assert!(CourseId::from("").is_blank());
        assert!(CourseId::from("  ").is_blank());
        assert!(!CourseId::from("c1").is_blank());
        assert!(!CourseId::from(0u64).is_blank());
    }

    #[test]
    fn test_course_serialization_keeps_unknown_fields() {
        let source = r#"{"id":"c1","name":"Algebra","availableSlots":1,"popularity":10,"instructor":"Dr. Noether","room":"B12"}"#;
        let course: Course = serde_json::from_str(source).unwrap();
        assert_eq!(course.extra.len(), 2);

        expect![[r#"{"id":"c1","name":"Algebra","availableSlots":1,"popularity":10,"instructor":"Dr. Noether","room":"B12"}"#]]
            .assert_eq(&serde_json::to_string(&course).unwrap());
    }

    #[test]
    fn test_course_serialization_with_counters() {
        let mut course = Course::new("c2", "Biology", 4)
            .with_popularity(7)
            .with_capacity(5);
        course.enrolled_students = Some(1);

        expect![[r#"{"id":"c2","name":"Biology","availableSlots":4,"enrolledStudents":1,"popularity":7,"capacity":5}"#]]
            .assert_eq(&serde_json::to_string(&course).unwrap());
    }

    #[test]
    fn test_fractional_popularity_round_trips() {
        let course: Course = serde_json::from_str(
            r#"{"id": "c1", "name": "Algebra", "availableSlots": 3, "popularity": 4.5}"#,
        )
        .unwrap();
        assert_eq!(course.popularity_rank(), 4.5);
        assert!(serde_json::to_string(&course).unwrap().contains(r#""popularity":4.5"#));
    }

    #[test]
    fn test_negative_slots_rejected() {
        let result: Result<Course, _> =
            serde_json::from_str(r#"{"id": "c1", "name": "Algebra", "availableSlots": -1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_enrollment_json_shape() {
        let enrollment = Enrollment {
            id: EnrollmentId::new(1),
            student_name: "Alice".to_string(),
            course_id: CourseId::from("c1"),
        };
        expect![[r#"{"id":1,"studentName":"Alice","courseId":"c1"}"#]]
            .assert_eq(&serde_json::to_string(&enrollment).unwrap());
    }

    #[test]
    fn test_enrollment_request_missing_fields() {
        let request: EnrollmentRequest = serde_json::from_str(r#"{"studentName": "Bob"}"#).unwrap();
        assert_eq!(request.student_name.as_deref(), Some("Bob"));
        assert!(request.course_id.is_none());
    }

    #[test]
    fn test_enrollment_request_numeric_course_id() {
        let request: EnrollmentRequest =
            serde_json::from_str(r#"{"studentName": "Bob", "courseId": 1}"#).unwrap();
        assert_eq!(request.course_id, Some(CourseId::from(1u64)));

        let request: EnrollmentRequest =
            serde_json::from_str(r#"{"studentName": "Bob", "courseId": null}"#).unwrap();
        assert!(request.course_id.is_none());
    }
}
