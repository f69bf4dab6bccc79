use relative_path::{RelativePath, RelativePathBuf};
use std::path::Path;

/* 📖 # Why use RelativePathBuf for FilePath?

FilePath wraps RelativePathBuf so that every path handed to the PAL is relative to the
PAL's base directory (the server's working directory). Configured snapshot, log and upload
locations are all expressed this way, which lets MockPal key its in-memory files by the
same value RealPal resolves on disk.
*/

/// Type-safe wrapper for file paths relative to PAL base directory.
///
/// # Examples
///
/// ```
/// use enrollment_base::FilePath;
///
/// let courses = FilePath::from("courses.json");
/// let upload = FilePath::from("uploads").join("1700000000000-notes.txt");
/// assert_eq!(upload.to_string(), "uploads/1700000000000-notes.txt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FilePath(RelativePathBuf);

impl FilePath {
    /// Returns the underlying RelativePathBuf as a reference.
    pub fn as_relative(&self) -> &RelativePath {
        &self.0
    }

    /// Converts to a regular Path for use with std::fs operations.
    /// This returns the relative path portion without a base directory.
    pub fn as_path(&self) -> &Path {
        Path::new(self.as_relative().as_str())
    }

    /// Appends a path segment.
    pub fn join(&self, segment: impl AsRef<str>) -> Self {
        Self(self.0.join(segment.as_ref()))
    }

    /// Returns a sibling path with `suffix` appended to the file name,
    /// e.g. `courses.json` -> `courses.json.tmp`.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self(RelativePathBuf::from(format!("{}{}", self.0, suffix)))
    }

    /// Returns the parent directory, if the path has one.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .map(Self::from)
    }
}

impl From<&str> for FilePath {
    fn from(s: &str) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<String> for FilePath {
    fn from(s: String) -> Self {
        Self(RelativePathBuf::from(s))
    }
}

impl From<&RelativePath> for FilePath {
    fn from(p: &RelativePath) -> Self {
        Self(p.to_relative_path_buf())
    }
}

impl std::fmt::Display for FilePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<RelativePath> for FilePath {
    fn as_ref(&self) -> &RelativePath {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_path_from_str() {
        let path = FilePath::from("data/courses.json");
        assert_eq!(path.as_path(), Path::new("data/courses.json"));
    }

    #[test]
    fn test_file_path_join() {
        let path = FilePath::from("uploads").join("a.txt");
        assert_eq!(path, FilePath::from("uploads/a.txt"));
    }

    #[test]
    fn test_file_path_with_suffix() {
        let path = FilePath::from("data/courses.json").with_suffix(".tmp");
        assert_eq!(path.to_string(), "data/courses.json.tmp");
    }

    #[test]
    fn test_file_path_parent() {
        assert_eq!(
            FilePath::from("data/courses.json").parent(),
            Some(FilePath::from("data"))
        );
        assert_eq!(FilePath::from("courses.json").parent(), None);
    }

    #[test]
    fn test_file_path_hash() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(FilePath::from("courses.json"));
        assert!(set.contains(&FilePath::from("courses.json")));
        assert!(!set.contains(&FilePath::from("enrollments.json")));
    }
}
