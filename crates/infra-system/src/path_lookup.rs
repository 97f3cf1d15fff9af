// PATH lookup
use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Full path of `binary` in the first `PATH` entry that contains it
///
/// # Example
/// ```no_run
/// use hostexec_infra_system::find_in_path;
///
/// assert!(find_in_path("sh").is_some());
/// ```
pub fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    find_in_dirs(binary, &path)
}

pub fn is_in_path(binary: &str) -> bool {
    find_in_path(binary).is_some()
}

/// Same lookup over an explicit `PATH`-style list
pub fn find_in_dirs(binary: &str, dirs: &OsStr) -> Option<PathBuf> {
    if binary.is_empty() {
        return None;
    }
    env::split_paths(dirs)
        .map(|dir| dir.join(binary))
        .find(|candidate| exists(candidate))
}

fn exists(candidate: &Path) -> bool {
    candidate.try_exists().unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_first_matching_dir_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join("tool"), "").unwrap();
        std::fs::write(first.path().join("other"), "").unwrap();

        let dirs = env::join_paths([first.path(), second.path()]).unwrap();
        assert_eq!(
            find_in_dirs("tool", &dirs),
            Some(second.path().join("tool"))
        );

        std::fs::write(first.path().join("tool"), "").unwrap();
        assert_eq!(find_in_dirs("tool", &dirs), Some(first.path().join("tool")));
    }

    #[test]
    fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = OsString::from(dir.path());
        assert_eq!(find_in_dirs("no-such-binary", &dirs), None);
        assert_eq!(find_in_dirs("", &dirs), None);
    }

    #[test]
    fn test_shell_is_in_path() {
        assert!(is_in_path("sh"));
        assert!(!is_in_path("hostexec-no-such-binary"));
    }
}
