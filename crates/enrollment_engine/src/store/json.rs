/* 📖 # Why write snapshots through a temporary file?

Snapshots are rewritten in full on every enrollment. Writing in place means a crash halfway
through leaves a truncated file that fails to load on the next start. Writing to
`<file>.tmp` and renaming it over the target replaces the snapshot in one step.

The two snapshots are still written one after the other (courses, then enrollments).
A crash between the two writes leaves the seat counters one enrollment ahead of the
enrollment list; the startup audit reports that mismatch.
*/

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};

use enrollment_base::{
    EnrollmentError, EnrollmentResult, ErrorKind, FilePath, PalHandle, ResultExt,
};

use crate::model::{Course, Enrollment};
use crate::store::traits::SnapshotStore;

/// Indentation used for snapshot files.
const SNAPSHOT_INDENT: &[u8] = b"    ";

/// Snapshot store keeping each collection as a pretty-printed JSON array file.
#[derive(Debug, Clone)]
pub struct JsonSnapshotStore {
    pal: PalHandle,
    courses_path: FilePath,
    enrollments_path: FilePath,
}

impl JsonSnapshotStore {
    pub fn new(pal: PalHandle, courses_path: FilePath, enrollments_path: FilePath) -> Self {
        Self {
            pal,
            courses_path,
            enrollments_path,
        }
    }

    pub fn courses_path(&self) -> &FilePath {
        &self.courses_path
    }

    pub fn enrollments_path(&self) -> &FilePath {
        &self.enrollments_path
    }

    fn read_snapshot<T: DeserializeOwned>(&self, path: &FilePath) -> EnrollmentResult<Vec<T>> {
        let content = self.pal.read_file_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            Box::new(EnrollmentError::message(format!(
                "Failed to parse snapshot {}: {}",
                path, e
            )))
        })
    }

    fn write_snapshot<T: Serialize>(
        &self,
        path: &FilePath,
        records: &[T],
    ) -> EnrollmentResult<()> {
        let content = to_snapshot_json(records)?;
        self.pal
            .write_file_atomic(path, &content)
            .with_context(|| format!("Failed to write snapshot {}", path))?;
        debug!(%path, records = records.len(), bytes = content.len(), "snapshot written");
        Ok(())
    }
}

/// Serialize records as a JSON array indented with four spaces.
fn to_snapshot_json<T: Serialize>(records: &[T]) -> EnrollmentResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(SNAPSHOT_INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    records.serialize(&mut serializer).map_err(|e| {
        Box::new(EnrollmentError::message(format!(
            "JSON serialization error: {}",
            e
        )))
    })?;
    Ok(buffer)
}

impl SnapshotStore for JsonSnapshotStore {
    #[instrument(skip(self), fields(path = %self.courses_path))]
    fn load_courses(&self) -> EnrollmentResult<Vec<Course>> {
        if !self.pal.file_exists(&self.courses_path)? {
            return Err(Box::new(EnrollmentError::new(ErrorKind::StoreUnavailable {
                path: self.courses_path.as_path().to_path_buf(),
            })));
        }
        let courses: Vec<Course> = self.read_snapshot(&self.courses_path)?;
        info!(count = courses.len(), "courses loaded");
        Ok(courses)
    }

    #[instrument(skip(self), fields(path = %self.enrollments_path))]
    fn load_enrollments(&self) -> EnrollmentResult<Vec<Enrollment>> {
        if !self.pal.file_exists(&self.enrollments_path)? {
            info!("enrollments snapshot missing, creating an empty one");
            if let Some(parent) = self.enrollments_path.parent() {
                self.pal.create_directory_all(&parent)?;
            }
            self.write_snapshot::<Enrollment>(&self.enrollments_path, &[])?;
            return Ok(Vec::new());
        }
        let enrollments: Vec<Enrollment> = self.read_snapshot(&self.enrollments_path)?;
        info!(count = enrollments.len(), "enrollments loaded");
        Ok(enrollments)
    }

    #[instrument(skip(self, courses), fields(path = %self.courses_path))]
    fn save_courses(&self, courses: &[Course]) -> EnrollmentResult<()> {
        self.write_snapshot(&self.courses_path, courses)
    }

    #[instrument(skip(self, enrollments), fields(path = %self.enrollments_path))]
    fn save_enrollments(&self, enrollments: &[Enrollment]) -> EnrollmentResult<()> {
        self.write_snapshot(&self.enrollments_path, enrollments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CourseId, EnrollmentId};
    use enrollment_base::{MockPal, RealPal};
    use expect_test::expect;

    fn mock_store() -> (MockPal, JsonSnapshotStore) {
        let mock = MockPal::new();
        let store = JsonSnapshotStore::new(
            PalHandle::new(mock.clone()),
            FilePath::from("courses.json"),
            FilePath::from("enrollments.json"),
        );
        (mock, store)
    }

    #[test]
    fn test_missing_courses_is_store_unavailable() {
        let (_mock, store) = mock_store();
        let error = store.load_courses().unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::StoreUnavailable { .. }));
    }

    #[test]
    fn test_malformed_courses_fails_to_load() {
        let (mock, store) = mock_store();
        mock.add_file(FilePath::from("courses.json"), b"[{\"id\": ".to_vec());
        let error = store.load_courses().unwrap_err();
        assert!(error.to_string().starts_with("Failed to parse snapshot courses.json"));
    }

    #[test]
    fn test_missing_enrollments_created_empty() {
        let (mock, store) = mock_store();
        let enrollments = store.load_enrollments().unwrap();
        assert!(enrollments.is_empty());
        assert_eq!(
            mock.file_content(&FilePath::from("enrollments.json")),
            Some("[]".to_string())
        );
    }

    #[test]
    fn test_missing_enrollments_in_subdirectory() {
        let mock = MockPal::new();
        let store = JsonSnapshotStore::new(
            PalHandle::new(mock.clone()),
            FilePath::from("data/courses.json"),
            FilePath::from("data/enrollments.json"),
        );
        assert!(store.load_enrollments().unwrap().is_empty());
        assert!(mock.directory_exists(&FilePath::from("data")));
        assert_eq!(
            mock.file_content(&FilePath::from("data/enrollments.json")),
            Some("[]".to_string())
        );
    }

    #[test]
    fn test_snapshot_format() {
        let (mock, store) = mock_store();
        let mut course = Course::new("c1", "Algebra", 0).with_popularity(10);
        course.enrolled_students = Some(1);
        store.save_courses(&[course]).unwrap();
        store
            .save_enrollments(&[Enrollment {
                id: EnrollmentId::new(1),
                student_name: "Alice".to_string(),
                course_id: CourseId::from("c1"),
            }])
            .unwrap();

        expect![[r#"
            [
                {
                    "id": "c1",
                    "name": "Algebra",
                    "availableSlots": 0,
                    "enrolledStudents": 1,
                    "popularity": 10
                }
            ]"#]]
        .assert_eq(&mock.file_content(&FilePath::from("courses.json")).unwrap());
        expect![[r#"
            [
                {
                    "id": 1,
                    "studentName": "Alice",
                    "courseId": "c1"
                }
            ]"#]]
        .assert_eq(&mock.file_content(&FilePath::from("enrollments.json")).unwrap());
    }

    #[test]
    fn test_round_trip_on_disk() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = JsonSnapshotStore::new(
            PalHandle::new(RealPal::new(temp_dir.path().to_path_buf())),
            FilePath::from("courses.json"),
            FilePath::from("enrollments.json"),
        );
        let courses: Vec<Course> = serde_json::from_str(
            r#"[
                {"id": "c1", "name": "Algebra", "availableSlots": 2, "popularity": 10, "room": "A1"},
                {"id": "c2", "name": "Biology", "availableSlots": 0, "enrolledStudents": 3, "popularity": 2.5, "capacity": 3},
                {"id": 3, "name": "Chemistry", "availableSlots": 4}
            ]"#,
        )
        .unwrap();
        let enrollments = vec![
            Enrollment {
                id: EnrollmentId::new(1),
                student_name: "Bob".to_string(),
                course_id: CourseId::from("c2"),
            },
            Enrollment {
                id: EnrollmentId::new(2),
                student_name: "Bob".to_string(),
                course_id: CourseId::from(3u64),
            },
        ];

        store.save_courses(&courses).unwrap();
        store.save_enrollments(&enrollments).unwrap();

        assert_eq!(store.load_courses().unwrap(), courses);
        assert_eq!(store.load_enrollments().unwrap(), enrollments);
    }

    #[test]
    fn test_failed_write_keeps_previous_snapshot() {
        let (mock, store) = mock_store();
        store.save_courses(&[Course::new("c1", "Algebra", 1)]).unwrap();
        let before = mock.file_content(&FilePath::from("courses.json"));

        mock.fail_writes_to(FilePath::from("courses.json.tmp"));
        let error = store.save_courses(&[]).unwrap_err();

        assert!(error.to_string().starts_with("Failed to write snapshot courses.json"));
        assert_eq!(mock.file_content(&FilePath::from("courses.json")), before);
    }
}
