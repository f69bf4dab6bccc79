/* 📖 # Why a SnapshotStore trait?

The catalog only needs whole-collection load and save. Putting that behind a trait keeps
the business rules independent of the file format: the catalog never sees paths, JSON
or the PAL, only collections.
*/

use enrollment_base::EnrollmentResult;

use crate::model::{Course, Enrollment};

/// Whole-snapshot persistence for the two catalog collections.
///
/// Every save replaces the previous snapshot entirely; there are no partial writes.
pub trait SnapshotStore: Send + Sync + 'static {
    /// Load all courses.
    ///
    /// Fails with `ErrorKind::StoreUnavailable` if the courses snapshot does not exist.
    fn load_courses(&self) -> EnrollmentResult<Vec<Course>>;

    /// Load all enrollments.
    ///
    /// A missing snapshot is created empty and an empty collection is returned.
    fn load_enrollments(&self) -> EnrollmentResult<Vec<Enrollment>>;

    /// Replace the courses snapshot.
    fn save_courses(&self, courses: &[Course]) -> EnrollmentResult<()>;

    /// Replace the enrollments snapshot.
    fn save_enrollments(&self, enrollments: &[Enrollment]) -> EnrollmentResult<()>;
}
