/* 📖 # Why roll back the in-memory change when a snapshot write fails?

The in-memory catalog is what every later request reads. If an enrollment was kept in
memory after its snapshot failed to write, the client would get an error while the seat
stays taken until restart, and then the seat silently reappears. Restoring the course and
dropping the new record keeps memory equal to what the client was told.

The courses snapshot is written before the enrollments snapshot. When the first write
succeeds and the second fails, the courses file on disk is one seat ahead until the next
successful enrollment rewrites both; the startup audit reports that state.
*/

use tracing::{debug, info, instrument, warn};

use enrollment_base::{EnrollmentError, EnrollmentResult, ErrorKind, ResultExt};

use crate::catalog::Catalog;
use crate::model::{Course, CourseId, Enrollment, EnrollmentId};

pub const MISSING_FIELDS_MESSAGE: &str = "Student name and course ID are required.";
pub const COURSE_NOT_FOUND_MESSAGE: &str = "Course not found.";

/// Outcome of a successful enrollment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentReceipt {
    pub enrollment: Enrollment,
    /// The course as it is after taking the seat.
    pub course: Course,
}

impl EnrollmentReceipt {
    /// Confirmation text shown to the student.
    pub fn message(&self) -> String {
        format!(
            "Student {} successfully enrolled in course {}!",
            self.enrollment.student_name, self.course.name
        )
    }
}

impl Catalog {
    /// Enroll `student_name` in the course `course_id`.
    ///
    /// Checks run in a fixed order and the first failure wins: missing input,
    /// unknown course, no free seat, already enrolled. On success the course
    /// loses one available slot, gains one enrolled student, and both snapshots
    /// are written.
    ///
    /// A student name or text course id made only of whitespace counts as
    /// missing. This is deliberately stricter than a plain emptiness test, so
    /// `"   "` never becomes a stored student.
    #[instrument(skip(self))]
    pub fn enroll(
        &mut self,
        student_name: &str,
        course_id: &CourseId,
    ) -> EnrollmentResult<EnrollmentReceipt> {
        if student_name.trim().is_empty() || course_id.is_blank() {
            return Err(Box::new(EnrollmentError::invalid_request(
                MISSING_FIELDS_MESSAGE,
            )));
        }

        let index = self.course_index(course_id).ok_or_else(|| {
            Box::new(EnrollmentError::not_found(COURSE_NOT_FOUND_MESSAGE))
        })?;

        if !self.courses[index].has_free_seat() {
            return Err(Box::new(EnrollmentError::new(ErrorKind::CapacityExceeded {
                course_id: course_id.to_string(),
            })));
        }

        if self
            .enrollments
            .iter()
            .any(|enrollment| enrollment.is_for(student_name, course_id))
        {
            return Err(Box::new(EnrollmentError::new(
                ErrorKind::DuplicateEnrollment {
                    student_name: student_name.to_string(),
                    course_id: course_id.to_string(),
                },
            )));
        }

        let previous = self.courses[index].clone();
        let enrollment = Enrollment {
            id: EnrollmentId::new(self.enrollments.len() as u64 + 1),
            student_name: student_name.to_string(),
            course_id: course_id.clone(),
        };

        let course = &mut self.courses[index];
        course.available_slots -= 1;
        course.enrolled_students = Some(previous.enrolled_count() + 1);
        self.enrollments.push(enrollment.clone());

        if let Err(error) = self.persist() {
            warn!(
                "Rolling back enrollment of {} in {}: {}",
                student_name, course_id, error
            );
            self.enrollments.pop();
            self.courses[index] = previous;
            return Err(error);
        }

        info!(
            "Enrolled {} in {} (id {})",
            student_name, course_id, enrollment.id
        );
        Ok(EnrollmentReceipt {
            enrollment,
            course: self.courses[index].clone(),
        })
    }

    fn persist(&self) -> EnrollmentResult<()> {
        debug!("Persisting catalog snapshots");
        self.store
            .save_courses(&self.courses)
            .context("Failed to persist courses")?;
        self.store
            .save_enrollments(&self.enrollments)
            .context("Failed to persist enrollments")?;
        Ok(())
    }
}
