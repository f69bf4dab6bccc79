/* 📖 # Why one lock around courses and enrollments together?

An enrollment reads a course, checks the enrollment list for duplicates, then updates both
collections and writes both snapshots. If those steps could interleave with another
enrollment, two requests for the last seat would both pass the capacity check. Holding a
single write lock for the whole sequence makes check-then-act atomic. Reads take the
shared lock and return owned copies, so no caller ever holds a reference into the catalog
after the lock is released.
*/

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use enrollment_base::EnrollmentResult;

use crate::enrollment::EnrollmentReceipt;
use crate::model::{Course, CourseId, Enrollment, EnrollmentId};
use crate::query;
use crate::store::SnapshotStore;

/// A data inconsistency found when auditing loaded snapshots.
///
/// None of these prevent startup; they are reported so an operator can fix the files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyIssue {
    /// The course's `enrolledStudents` counter disagrees with the enrollment list.
    EnrolledCountMismatch {
        course_id: CourseId,
        recorded: u32,
        actual: u32,
    },
    /// `availableSlots + enrolledStudents` does not add up to the recorded capacity.
    CapacityMismatch {
        course_id: CourseId,
        capacity: u32,
        available_slots: u32,
        enrolled_students: u32,
    },
    /// An enrollment references a course that is not in the catalog.
    UnknownCourse {
        enrollment_id: EnrollmentId,
        course_id: CourseId,
    },
    /// The same student appears more than once for the same course.
    DuplicateEnrollment {
        student_name: String,
        course_id: CourseId,
    },
    /// Two courses share an id; lookups only ever see the first.
    DuplicateCourseId { course_id: CourseId },
}

impl fmt::Display for ConsistencyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsistencyIssue::EnrolledCountMismatch {
                course_id,
                recorded,
                actual,
            } => write!(
                f,
                "course {} records {} enrolled students but has {} enrollments",
                course_id, recorded, actual
            ),
            ConsistencyIssue::CapacityMismatch {
                course_id,
                capacity,
                available_slots,
                enrolled_students,
            } => write!(
                f,
                "course {} has capacity {} but {} available + {} enrolled",
                course_id, capacity, available_slots, enrolled_students
            ),
            ConsistencyIssue::UnknownCourse {
                enrollment_id,
                course_id,
            } => write!(
                f,
                "enrollment {} references unknown course {}",
                enrollment_id, course_id
            ),
            ConsistencyIssue::DuplicateEnrollment {
                student_name,
                course_id,
            } => write!(
                f,
                "student {} is enrolled more than once in course {}",
                student_name, course_id
            ),
            ConsistencyIssue::DuplicateCourseId { course_id } => {
                write!(f, "course id {} appears more than once", course_id)
            }
        }
    }
}

/// The course and enrollment collections together with the store that persists them.
pub struct Catalog {
    pub(crate) courses: Vec<Course>,
    pub(crate) enrollments: Vec<Enrollment>,
    pub(crate) store: Box<dyn SnapshotStore>,
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("courses", &self.courses.len())
            .field("enrollments", &self.enrollments.len())
            .finish()
    }
}

impl Catalog {
    /// Load both snapshots from `store` and audit them.
    ///
    /// A missing courses snapshot is fatal, a missing enrollments snapshot is
    /// created empty by the store. Audit findings are logged as warnings.
    #[instrument(skip(store))]
    pub fn open(store: impl SnapshotStore) -> EnrollmentResult<Self> {
        let courses = store.load_courses()?;
        let enrollments = store.load_enrollments()?;
        let catalog = Self {
            courses,
            enrollments,
            store: Box::new(store),
        };

        for issue in catalog.audit() {
            warn!("Inconsistent catalog data: {}", issue);
        }
        info!(
            "Catalog loaded with {} courses and {} enrollments",
            catalog.courses.len(),
            catalog.enrollments.len()
        );
        Ok(catalog)
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn enrollments(&self) -> &[Enrollment] {
        &self.enrollments
    }

    /// The first course with the given id.
    pub fn course(&self, course_id: &CourseId) -> Option<&Course> {
        self.courses.iter().find(|course| &course.id == course_id)
    }

    pub(crate) fn course_index(&self, course_id: &CourseId) -> Option<usize> {
        self.courses.iter().position(|course| &course.id == course_id)
    }

    /// Check the loaded data against the catalog invariants.
    pub fn audit(&self) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();

        let mut seen_courses = HashSet::new();
        for course in &self.courses {
            if !seen_courses.insert(&course.id) {
                issues.push(ConsistencyIssue::DuplicateCourseId {
                    course_id: course.id.clone(),
                });
            }
        }

        let mut per_course: HashMap<&CourseId, u32> = HashMap::new();
        let mut seen_pairs = HashSet::new();
        for enrollment in &self.enrollments {
            if !seen_courses.contains(&enrollment.course_id) {
                issues.push(ConsistencyIssue::UnknownCourse {
                    enrollment_id: enrollment.id,
                    course_id: enrollment.course_id.clone(),
                });
            }
            if !seen_pairs.insert((&enrollment.student_name, &enrollment.course_id)) {
                issues.push(ConsistencyIssue::DuplicateEnrollment {
                    student_name: enrollment.student_name.clone(),
                    course_id: enrollment.course_id.clone(),
                });
            }
            *per_course.entry(&enrollment.course_id).or_default() += 1;
        }

        for course in &self.courses {
            let actual = per_course.get(&course.id).copied().unwrap_or(0);
            if course.enrolled_count() != actual {
                issues.push(ConsistencyIssue::EnrolledCountMismatch {
                    course_id: course.id.clone(),
                    recorded: course.enrolled_count(),
                    actual,
                });
            }
            if let Some(capacity) = course.capacity {
                let total = course.available_slots.saturating_add(course.enrolled_count());
                if total != capacity {
                    issues.push(ConsistencyIssue::CapacityMismatch {
                        course_id: course.id.clone(),
                        capacity,
                        available_slots: course.available_slots,
                        enrolled_students: course.enrolled_count(),
                    });
                }
            }
        }

        issues
    }
}

/// Shared, thread-safe handle to the catalog.
///
/// Cloning is cheap (via Arc). Writers take the lock exclusively for the whole
/// enrollment, readers get owned copies.
#[derive(Clone)]
pub struct CatalogHandle(Arc<RwLock<Catalog>>);

impl CatalogHandle {
    pub fn new(catalog: Catalog) -> Self {
        Self(Arc::new(RwLock::new(catalog)))
    }

    /// Enroll a student. See [`Catalog::enroll`].
    pub fn enroll(
        &self,
        student_name: &str,
        course_id: &CourseId,
    ) -> EnrollmentResult<EnrollmentReceipt> {
        self.0.write().enroll(student_name, course_id)
    }

    pub fn list_courses(&self) -> Vec<Course> {
        self.0.read().courses().to_vec()
    }

    pub fn list_enrollments(&self) -> Vec<Enrollment> {
        self.0.read().enrollments().to_vec()
    }

    pub fn search_courses(&self, query: &str) -> EnrollmentResult<Vec<Course>> {
        query::search_courses(self.0.read().courses(), query)
    }

    pub fn sort_by_popularity(&self) -> Vec<Course> {
        query::sort_by_popularity(self.0.read().courses())
    }

    pub fn audit(&self) -> Vec<ConsistencyIssue> {
        self.0.read().audit()
    }
}
