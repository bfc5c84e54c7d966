use std::io;
use std::path::{Path, PathBuf};

/// Activity file formats Garmin Connect accepts for upload.
pub const UPLOAD_EXTENSIONS: &[&str] = &["fit", "gpx", "tcx"];

/// Errors that can occur during path validation
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside allowed upload directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Cannot resolve path '{path}': {error}")]
    CannotCanonicalize { path: PathBuf, error: io::Error },

    #[error("File does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("Not a regular file: '{path}'")]
    NotAFile { path: PathBuf },

    #[error("Unsupported file type '{path}'. Use one of: .fit, .gpx, .tcx")]
    UnsupportedExtension { path: PathBuf },

    #[error("Upload directory '{path}' is not usable: {error}")]
    InvalidRoot { path: PathBuf, error: io::Error },
}

/// Resolve an activity file the server is allowed to upload.
///
/// Relative paths are taken relative to `root`. The resolved file, after
/// following `..` and symlinks, must sit inside `root` and carry one of
/// [`UPLOAD_EXTENSIONS`] (case-insensitive).
pub fn validate_upload_path(input_path: &str, root: &Path) -> Result<PathBuf, PathSecurityError> {
    let canonical_root = root
        .canonicalize()
        .map_err(|e| PathSecurityError::InvalidRoot {
            path: root.to_path_buf(),
            error: e,
        })?;

    let path = Path::new(input_path);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        canonical_root.join(path)
    };

    let canonical_path = path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathSecurityError::PathNotFound { path: path.clone() }
        } else {
            PathSecurityError::CannotCanonicalize {
                path: path.clone(),
                error: e,
            }
        }
    })?;

    if !canonical_path.starts_with(&canonical_root) {
        return Err(PathSecurityError::OutsideRootDirectory {
            path: canonical_path,
            root: canonical_root,
        });
    }

    if !canonical_path.is_file() {
        return Err(PathSecurityError::NotAFile {
            path: canonical_path,
        });
    }

    if upload_extension(&canonical_path).is_none() {
        return Err(PathSecurityError::UnsupportedExtension {
            path: canonical_path,
        });
    }

    Ok(canonical_path)
}

/// Lower-cased upload extension of `path`, if it is one Garmin accepts.
pub fn upload_extension(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    UPLOAD_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_file_within_root() {
        let root = TempDir::new().unwrap();
        let file = root.path().join("ride.fit");
        fs::write(&file, b"fit").unwrap();

        let resolved = validate_upload_path(file.to_str().unwrap(), root.path()).unwrap();
        assert_eq!(resolved, file.canonicalize().unwrap());
    }

    #[test]
    fn test_relative_path_resolves_against_root() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("run.GPX"), b"<gpx/>").unwrap();

        let resolved = validate_upload_path("run.GPX", root.path()).unwrap();
        assert!(resolved.ends_with("run.GPX"));
        assert_eq!(upload_extension(&resolved).as_deref(), Some("gpx"));
    }

    #[test]
    fn test_path_outside_root() {
        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let file = outside.path().join("ride.fit");
        fs::write(&file, b"fit").unwrap();

        let result = validate_upload_path(file.to_str().unwrap(), root.path());
        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }

    #[test]
    fn test_path_traversal_blocked() {
        let temp_dir = TempDir::new().unwrap();
        let subdir = temp_dir.path().join("uploads");
        fs::create_dir(&subdir).unwrap();
        fs::write(temp_dir.path().join("secret.fit"), b"fit").unwrap();

        let result = validate_upload_path("../secret.fit", &subdir);
        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let root = TempDir::new().unwrap();
        let result = validate_upload_path("nope.fit", root.path());
        assert!(matches!(result, Err(PathSecurityError::PathNotFound { .. })));
    }

    #[test]
    fn test_wrong_extension() {
        let root = TempDir::new().unwrap();
        fs::write(root.path().join("notes.txt"), b"hi").unwrap();

        let result = validate_upload_path("notes.txt", root.path());
        assert!(matches!(
            result,
            Err(PathSecurityError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn test_directory_rejected() {
        let root = TempDir::new().unwrap();
        fs::create_dir(root.path().join("folder.fit")).unwrap();

        let result = validate_upload_path("folder.fit", root.path());
        assert!(matches!(result, Err(PathSecurityError::NotAFile { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_outside_root_blocked() {
        use std::os::unix::fs::symlink;

        let root = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let target = outside.path().join("target.fit");
        fs::write(&target, b"fit").unwrap();
        symlink(&target, root.path().join("link.fit")).unwrap();

        let result = validate_upload_path("link.fit", root.path());
        assert!(matches!(
            result,
            Err(PathSecurityError::OutsideRootDirectory { .. })
        ));
    }
}
